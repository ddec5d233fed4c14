//! 订单实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::OrderStatus;

/// 用户上传的订单
///
/// `number` 为全局唯一的自然键；`accrual_cents` 仅在 PROCESSED 时有值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub number: String,
    /// 上传者，创建后不可变
    pub user_id: i64,
    pub status: OrderStatus,
    #[sqlx(default)]
    pub accrual_cents: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// 是否仍需对账
    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}
