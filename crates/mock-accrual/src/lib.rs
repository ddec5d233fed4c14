//! Mock Accrual
//!
//! 模拟积分计算系统的 HTTP 服务，用于开发和集成测试。
//!
//! # 主要模块
//!
//! - `store`: 按订单号预置的响应脚本
//! - `rate_limit`: 固定窗口限流，超限返回 429 + Retry-After
//! - `routes`: Axum 路由
//!
//! # 使用示例
//!
//! ```rust
//! use mock_accrual::{AccrualState, MockAccrualState, OrderScript, accrual_routes};
//! use std::sync::Arc;
//!
//! let state = Arc::new(MockAccrualState::new(None));
//! state.scripts.register("79927398713", OrderScript::processed(500.into()));
//! state.scripts.register("12345678903", OrderScript::reply(AccrualState::Processing));
//!
//! let app = accrual_routes(state);
//! # let _ = app;
//! ```

pub mod rate_limit;
pub mod routes;
pub mod store;

pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use routes::{MockAccrualState, accrual_routes, serve};
pub use store::{AccrualState, OrderScript, ScriptStore};
