//! PostgreSQL 连接池
//!
//! 服务启动时数据库可能尚未就绪，`connect_with_retry` 按 `database.startup_*`
//! 配置退避重试；配置错误这类不可恢复的失败立即返回。

use crate::config::DatabaseConfig;
use crate::error::{MartError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// 数据库连接池包装
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 建立连接池，单次尝试
    #[instrument(skip(config))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        info!(
            max_connections = config.max_connections,
            "数据库连接池已建立"
        );
        Ok(Self { pool })
    }

    /// 启动期连接：瞬时故障按配置退避重试，重试耗尽后返回最后一次错误
    pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<Self> {
        with_startup_retry(config, || Self::connect(config)).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `SELECT 1` 探测连通性
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("数据库连接池已关闭");
    }
}

async fn with_startup_retry<T, F, Fut>(config: &DatabaseConfig, mut attempt_connect: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        let err: MartError = match attempt_connect().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !err.is_retryable() || attempt >= config.startup_retries {
            warn!(attempt, error = %err, "数据库连接失败，放弃重试");
            return Err(err);
        }

        let delay = config.startup_backoff(attempt);
        warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "数据库暂不可用，退避后重试"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_startup_retry_waits_for_database() {
        let config = DatabaseConfig::default();
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = with_startup_retry(&config, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(MartError::Database(sqlx::Error::PoolTimedOut))
                } else {
                    Ok("connected")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 500ms + 1s
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_retry_gives_up_after_configured_retries() {
        let config = DatabaseConfig {
            startup_retries: 2,
            ..Default::default()
        };
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_startup_retry(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(MartError::Database(sqlx::Error::PoolTimedOut)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_retry() {
        let config = DatabaseConfig {
            url: "not-a-database-url".to_string(),
            ..Default::default()
        };
        let started = std::time::Instant::now();

        assert!(Database::connect_with_retry(&config).await.is_err());
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    #[ignore] // 需要数据库连接
    async fn test_database_connection() {
        let mut config = DatabaseConfig::default();
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.url = url;
        }
        let db = Database::connect_with_retry(&config).await.unwrap();
        db.health_check().await.unwrap();
        db.close().await;
    }
}
