//! 存储层错误类型
//!
//! 唯一约束冲突等数据库错误按错误类别归类，不依赖错误消息文本。

use thiserror::Error;

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} 不存在: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} 已存在: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("{entity} 违反约束: {reason}")]
    Constraint {
        entity: &'static str,
        reason: String,
    },

    #[error("数据库错误: {0}")]
    Database(sqlx::Error),

    #[error("存储暂不可用: {0}")]
    Unavailable(String),
}

/// 存储层 Result 类型别名
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// 将 sqlx 错误按数据库错误类别归类
    ///
    /// 唯一约束冲突映射为 `Duplicate`，检查约束与外键冲突映射为 `Constraint`，
    /// 连接池耗尽或关闭映射为 `Unavailable`。
    pub fn classify(err: sqlx::Error, entity: &'static str, key: impl ToString) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return Self::Duplicate {
                    entity,
                    key: key.to_string(),
                };
            }
            if db_err.is_check_violation() || db_err.is_foreign_key_violation() {
                return Self::Constraint {
                    entity,
                    reason: db_err.message().to_string(),
                };
            }
        }
        Self::from(err)
    }

    /// 是否为瞬时故障
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Database(e) => matches!(e, sqlx::Error::Io(_) | sqlx::Error::Protocol(_)),
            Self::NotFound { .. } | Self::Duplicate { .. } | Self::Constraint { .. } => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::Unavailable("连接池获取连接超时".to_string()),
            sqlx::Error::PoolClosed => Self::Unavailable("连接池已关闭".to_string()),
            other => Self::Database(other),
        }
    }
}
