//! 余额实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户积分余额，金额单位为分
///
/// `current_cents + withdrawn_cents` 等于累计入账总额，只增不减
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Balance {
    pub user_id: i64,
    /// 当前可用积分，不为负
    pub current_cents: i64,
    /// 累计已提现积分
    pub withdrawn_cents: i64,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// 新建空余额
    pub fn empty(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            current_cents: 0,
            withdrawn_cents: 0,
            updated_at: now,
        }
    }

    /// 累计入账总额
    pub fn total_credited_cents(&self) -> i64 {
        self.current_cents + self.withdrawn_cents
    }
}

/// 条件扣减的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebitOutcome {
    /// 扣减成功，返回扣减后的余额
    Debited(Balance),
    /// 余额不足，未做任何修改
    Insufficient { available_cents: i64 },
}
