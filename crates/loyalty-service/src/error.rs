//! 积分核心错误类型
//!
//! 定义业务错误和存储层错误的统一出口，供调用方按类型匹配

use thiserror::Error;

use crate::repository::StoreError;

/// 输入校验错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("订单号为空")]
    EmptyOrderNumber,

    #[error("订单号只能包含数字")]
    NonDigitOrderNumber,

    #[error("订单号校验位错误")]
    BadChecksum,

    #[error("金额必须大于 0")]
    NonPositiveAmount,

    #[error("金额超出可表示范围")]
    AmountOutOfRange,
}

/// 积分核心错误类型
#[derive(Debug, Error)]
pub enum LoyaltyError {
    // === 业务错误 ===
    #[error("参数校验失败: {0}")]
    Validation(#[from] ValidationError),

    #[error("订单已被其他用户上传: {number}")]
    OrderConflict { number: String },

    #[error("订单不存在: {0}")]
    OrderNotFound(String),

    #[error("用户余额不存在: user_id={0}")]
    BalanceNotFound(i64),

    #[error("余额不足: 可用 {available_cents} 分, 需要 {requested_cents} 分")]
    InsufficientFunds {
        available_cents: i64,
        requested_cents: i64,
    },

    // === 系统错误 ===
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),

    #[error(
        "账务不一致: user_id={user_id}, order={order_number}, amount_cents={amount_cents}, {reason}"
    )]
    Inconsistency {
        user_id: i64,
        order_number: String,
        amount_cents: i64,
        reason: String,
    },
}

/// 积分核心 Result 类型别名
pub type Result<T> = std::result::Result<T, LoyaltyError>;

impl LoyaltyError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::OrderConflict { .. }
                | Self::OrderNotFound(_)
                | Self::BalanceNotFound(_)
                | Self::InsufficientFunds { .. }
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::EmptyOrderNumber) => "EMPTY_ORDER_NUMBER",
            Self::Validation(ValidationError::NonDigitOrderNumber)
            | Self::Validation(ValidationError::BadChecksum) => "INVALID_ORDER_NUMBER",
            Self::Validation(ValidationError::NonPositiveAmount)
            | Self::Validation(ValidationError::AmountOutOfRange) => "INVALID_AMOUNT",
            Self::OrderConflict { .. } => "ORDER_CONFLICT",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::BalanceNotFound(_) => "BALANCE_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Store(_) => "STORE_ERROR",
            Self::Inconsistency { .. } => "LEDGER_INCONSISTENCY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        let unavailable = LoyaltyError::Store(StoreError::Unavailable("pool closed".to_string()));
        assert!(unavailable.is_retryable());
        assert!(!LoyaltyError::OrderNotFound("12345678903".to_string()).is_retryable());
        assert!(
            !LoyaltyError::InsufficientFunds {
                available_cents: 100,
                requested_cents: 500
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_is_business_error() {
        assert!(LoyaltyError::from(ValidationError::BadChecksum).is_business_error());
        assert!(
            LoyaltyError::OrderConflict {
                number: "12345678903".to_string()
            }
            .is_business_error()
        );
        assert!(
            !LoyaltyError::Store(StoreError::Unavailable("pool closed".to_string()))
                .is_business_error()
        );
        assert!(
            !LoyaltyError::Inconsistency {
                user_id: 1,
                order_number: "2377225624".to_string(),
                amount_cents: 100,
                reason: "补偿失败".to_string(),
            }
            .is_business_error()
        );
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            LoyaltyError::from(ValidationError::EmptyOrderNumber).error_code(),
            "EMPTY_ORDER_NUMBER"
        );
        assert_eq!(
            LoyaltyError::from(ValidationError::BadChecksum).error_code(),
            "INVALID_ORDER_NUMBER"
        );
        assert_eq!(
            LoyaltyError::InsufficientFunds {
                available_cents: 1,
                requested_cents: 2
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
    }

    #[test]
    fn test_error_display() {
        let err = LoyaltyError::InsufficientFunds {
            available_cents: 100,
            requested_cents: 500,
        };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("500"));
    }
}
