//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    server_handle: tokio::task::JoinHandle<()>,
}

impl MetricsHandle {
    /// 停止指标 HTTP 服务
    pub fn shutdown(self) {
        self.server_handle.abort();
    }
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle { server_handle })
}

/// 注册通用指标描述，出现在 /metrics 端点的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!(
        "accrual_requests_total",
        "Total number of accrual service requests by outcome"
    );
    metrics::describe_histogram!(
        "accrual_pass_duration_seconds",
        "Reconciliation pass duration in seconds"
    );
    metrics::describe_counter!(
        "orders_settled_total",
        "Total number of orders moved to a terminal status"
    );
    metrics::describe_counter!(
        "ledger_operations_total",
        "Total number of balance ledger operations"
    );
    metrics::describe_counter!("withdrawals_total", "Total number of withdrawal attempts");
    metrics::describe_gauge!(
        "worker_last_run_timestamp",
        "Unix timestamp of the last completed worker pass"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("指标服务监听于 {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("指标服务异常退出: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录一次积分系统请求的结果
#[inline]
pub fn record_accrual_request(outcome: &str) {
    metrics::counter!("accrual_requests_total", "outcome" => outcome.to_string()).increment(1);
}

/// 记录一轮对账耗时
#[inline]
pub fn record_accrual_pass(duration_secs: f64) {
    metrics::histogram!("accrual_pass_duration_seconds").record(duration_secs);
}

/// 记录订单进入终态（PROCESSED / INVALID）
#[inline]
pub fn record_order_settled(status: &str) {
    metrics::counter!("orders_settled_total", "status" => status.to_string()).increment(1);
}

/// 记录账本操作
#[inline]
pub fn record_ledger_operation(op: &str, status: &str) {
    metrics::counter!(
        "ledger_operations_total",
        "op" => op.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录提现结果
#[inline]
pub fn record_withdrawal(status: &str) {
    metrics::counter!("withdrawals_total", "status" => status.to_string()).increment(1);
}

/// 更新后台任务最近一次完成的时间戳
#[inline]
pub fn set_worker_last_run(worker: &str) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    metrics::gauge!("worker_last_run_timestamp", "worker" => worker.to_string()).set(now);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 即使没有初始化 recorder，这些函数也不应该 panic
        record_accrual_request("found");
        record_accrual_pass(0.2);
        record_order_settled("PROCESSED");
        record_ledger_operation("credit", "success");
        record_withdrawal("insufficient_funds");
        set_worker_last_run("accrual");
    }
}
