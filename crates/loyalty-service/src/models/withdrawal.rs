//! 提现记录实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 提现记录，只追加不修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    /// 关联单号，通过 Luhn 校验，不要求对应已上传的订单
    pub order_number: String,
    pub amount_cents: i64,
    pub processed_at: DateTime<Utc>,
}

/// 新建提现记录请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub order_number: String,
    pub amount_cents: i64,
}
