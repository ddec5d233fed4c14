//! 健康检查端点
//!
//! 在服务监听地址上提供存活与数据库连通性检查：
//! - `GET /api/health/check` 恒返回 `{"status":"ok"}`
//! - `GET /api/health/db` 探测数据库，失败时返回 503

use std::sync::Arc;

use async_trait::async_trait;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use gophermart_shared::database::Database;
use serde::Serialize;
use tracing::warn;

/// 数据库连通性探测
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    async fn ping(&self) -> Result<(), String>;
}

#[async_trait]
impl DatabaseProbe for Database {
    async fn ping(&self) -> Result<(), String> {
        self.health_check().await.map_err(|e| e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

/// 构建健康检查路由
pub fn health_routes(probe: Arc<dyn DatabaseProbe>) -> Router {
    Router::new()
        .route("/api/health/check", get(liveness))
        .route("/api/health/db", get(database_health))
        .with_state(probe)
}

async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        database: None,
    })
}

async fn database_health(
    State(probe): State<Arc<dyn DatabaseProbe>>,
) -> (StatusCode, Json<HealthResponse>) {
    match probe.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: Some("connected"),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "数据库健康检查失败");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "error",
                    database: Some("unavailable"),
                }),
            )
        }
    }
}
