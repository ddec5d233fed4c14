//! Mock 积分计算系统路由
//!
//! - `GET /api/orders/{number}`: 按预置脚本返回订单积分信息，未登记返回 204
//! - `POST /api/orders`: 登记或覆盖订单脚本
//! - `DELETE /api/orders/{number}`: 删除订单脚本
//!
//! 限流只作用于查询接口，超限时返回 429、`Retry-After` 头和纯文本说明。

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::store::{AccrualState, OrderScript, ScriptStore};

/// 服务状态
#[derive(Debug)]
pub struct MockAccrualState {
    pub scripts: ScriptStore,
    limiter: Option<RateLimiter>,
    requests: AtomicU64,
}

impl MockAccrualState {
    pub fn new(rate_limit: Option<RateLimitConfig>) -> Self {
        Self {
            scripts: ScriptStore::new(),
            limiter: rate_limit.map(RateLimiter::new),
            requests: AtomicU64::new(0),
        }
    }

    /// 已收到的查询请求数（含被限流的请求）
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl Default for MockAccrualState {
    fn default() -> Self {
        Self::new(None)
    }
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 订单积分响应
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderAccrualResponse {
    pub order: String,
    pub status: AccrualState,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub accrual: Option<Decimal>,
}

/// 登记订单请求
#[derive(Debug, Deserialize)]
pub struct RegisterOrderRequest {
    pub order: String,
    #[serde(flatten)]
    pub script: OrderScript,
}

// ============================================================================
// 路由定义
// ============================================================================

pub fn accrual_routes(state: Arc<MockAccrualState>) -> Router {
    Router::new()
        .route("/api/orders", post(register_order))
        .route("/api/orders/{number}", get(get_order).delete(remove_order))
        .with_state(state)
}

/// 在指定地址上启动服务，返回实际监听地址（端口为 0 时由系统分配）
pub async fn serve(
    addr: SocketAddr,
    state: Arc<MockAccrualState>,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let app = accrual_routes(state);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Mock 积分服务异常退出");
        }
    });

    info!("Mock 积分服务已启动: http://{}", local_addr);
    Ok((local_addr, handle))
}

// ============================================================================
// 路由处理器
// ============================================================================

/// GET /api/orders/{number}
async fn get_order(
    State(state): State<Arc<MockAccrualState>>,
    Path(number): Path<String>,
) -> Response {
    state.requests.fetch_add(1, Ordering::Relaxed);

    if let Some(limiter) = &state.limiter {
        if let Err(retry_after) = limiter.try_acquire() {
            debug!(order = %number, retry_after, "请求超限");
            let body = format!(
                "No more than {} requests per {} seconds allowed",
                limiter.config().max_requests,
                limiter.config().window.as_secs()
            );
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                body,
            )
                .into_response();
        }
    }

    match state.scripts.get(&number) {
        None => StatusCode::NO_CONTENT.into_response(),
        Some(OrderScript::Reply { status, accrual }) => Json(OrderAccrualResponse {
            order: number,
            status,
            accrual,
        })
        .into_response(),
        Some(OrderScript::Failure { code }) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Some(OrderScript::Raw { body }) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
    }
}

/// POST /api/orders
async fn register_order(
    State(state): State<Arc<MockAccrualState>>,
    Json(req): Json<RegisterOrderRequest>,
) -> StatusCode {
    if req.order.is_empty() || !req.order.chars().all(|c| c.is_ascii_digit()) {
        return StatusCode::BAD_REQUEST;
    }
    info!(order = %req.order, script = ?req.script, "登记订单脚本");
    state.scripts.register(&req.order, req.script);
    StatusCode::ACCEPTED
}

/// DELETE /api/orders/{number}
async fn remove_order(
    State(state): State<Arc<MockAccrualState>>,
    Path(number): Path<String>,
) -> StatusCode {
    match state.scripts.remove(&number) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

// ============================================================================
// 单元测试
// ============================================================================
