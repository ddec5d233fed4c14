//! 积分计算系统集成
//!
//! - `client`: 无状态 HTTP 客户端，响应映射为封闭的 `AccrualOutcome`
//! - `worker`: 后台对账 Worker，推进待处理订单并结算入账

mod client;
mod models;
mod worker;

pub use client::{AccrualClient, AccrualSource, parse_retry_after};
pub use models::{AccrualOutcome, AccrualRecord, AccrualResponse, AccrualStatus};
pub use worker::{PassReport, ReconciliationWorker};
