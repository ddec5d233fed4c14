//! 统一基础设施错误模块
//!
//! 只覆盖与业务无关的故障（数据库、配置），业务错误由各服务自己的错误类型表达。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum MartError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    #[error("无效的配置项: {field} - {message}")]
    InvalidConfig { field: String, message: String },
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, MartError>;

impl MartError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }

    /// 是否为可重试错误
    ///
    /// 只有连接层面的瞬时故障（连接被拒、连接池超时或关闭）可重试。
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            Self::Config(_) | Self::InvalidConfig { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = MartError::InvalidConfig {
            field: "accrual.base_url".to_string(),
            message: "不能为空".to_string(),
        };
        assert_eq!(err.code(), "INVALID_CONFIG");
        assert_eq!(
            MartError::Database(sqlx::Error::PoolClosed).code(),
            "DATABASE_ERROR"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(MartError::Database(sqlx::Error::PoolTimedOut).is_retryable());

        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert!(MartError::Database(sqlx::Error::Io(refused)).is_retryable());

        let invalid = MartError::InvalidConfig {
            field: "database.url".to_string(),
            message: "empty".to_string(),
        };
        assert!(!invalid.is_retryable());
        assert!(!MartError::Database(sqlx::Error::RowNotFound).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = MartError::InvalidConfig {
            field: "RUN_ADDRESS".to_string(),
            message: "无法解析端口: localhost:x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "无效的配置项: RUN_ADDRESS - 无法解析端口: localhost:x"
        );
    }
}
