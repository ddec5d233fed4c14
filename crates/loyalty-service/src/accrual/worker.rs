//! 积分对账 Worker
//!
//! 定期拉取待处理订单（NEW / PROCESSING），逐个查询积分计算系统并推进订单状态：
//! 1. REGISTERED / PROCESSING 映射为 PROCESSING
//! 2. PROCESSED 通过 `SettlementStore` 原子地结算并入账
//! 3. INVALID 置为终态，不影响余额
//!
//! 启动后立即执行一轮，之后按固定间隔执行，直到收到关闭信号。
//! 单个订单失败只记录日志，订单保持待处理状态，下一轮重试。

use std::sync::Arc;
use std::time::Duration;

use gophermart_shared::observability::metrics;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::client::AccrualSource;
use super::models::{AccrualOutcome, AccrualRecord, AccrualStatus};
use crate::models::{Order, OrderStatus};
use crate::repository::{OrderStore, SettlementStore, StoreError};

const WORKER_NAME: &str = "accrual_reconciliation";

/// 一轮对账的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// 本轮查询过的订单数
    pub examined: usize,
    /// 结算为 PROCESSED 的订单数
    pub settled: usize,
    /// 置为 INVALID 的订单数
    pub invalidated: usize,
    /// NEW 推进为 PROCESSING 的订单数
    pub advanced: usize,
    /// 无需变更或已被其他方处理的订单数
    pub skipped: usize,
    /// 查询或写入失败、留待下一轮的订单数
    pub failed: usize,
    /// 本轮是否因限流提前结束
    pub rate_limited: bool,
}

/// 单个订单的处理结果
enum Step {
    Settled,
    Invalidated,
    Advanced,
    Skipped,
    Failed,
    RateLimited(Duration),
}

/// 积分对账 Worker
pub struct ReconciliationWorker {
    source: Arc<dyn AccrualSource>,
    orders: Arc<dyn OrderStore>,
    settlement: Arc<dyn SettlementStore>,
    /// 轮询间隔
    poll_interval: Duration,
}

impl ReconciliationWorker {
    pub fn new(
        source: Arc<dyn AccrualSource>,
        orders: Arc<dyn OrderStore>,
        settlement: Arc<dyn SettlementStore>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            orders,
            settlement,
            poll_interval,
        }
    }

    /// 主循环：立即执行一轮，之后每个间隔执行一轮，直到关闭信号置为 true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(poll_interval = ?self.poll_interval, "积分对账 Worker 已启动");

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // 偏向关闭信号，保证收到关闭时能尽快退出
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                _ = ticker.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    self.run_pass(&mut shutdown).await;
                }
            }
        }

        info!("收到关闭信号，积分对账 Worker 退出");
    }

    /// 执行一轮对账
    ///
    /// 订单按上传时间正序逐个处理；每处理一个订单前检查一次关闭信号。
    /// 遇到限流时等待 Retry-After 指定的时长后结束本轮，等待可被关闭信号打断。
    pub async fn run_pass(&self, shutdown: &mut watch::Receiver<bool>) -> PassReport {
        let started = Instant::now();
        let mut report = PassReport::default();

        let pending = match self.orders.get_orders_by_status(&OrderStatus::PENDING).await {
            Ok(orders) => orders,
            Err(e) => {
                error!(error = %e, "获取待处理订单失败");
                return report;
            }
        };

        if pending.is_empty() {
            debug!("没有待处理订单");
        }

        for order in &pending {
            if *shutdown.borrow() {
                info!("收到关闭信号，中止本轮对账");
                break;
            }

            report.examined += 1;
            match self.process_order(order).await {
                Step::Settled => report.settled += 1,
                Step::Invalidated => report.invalidated += 1,
                Step::Advanced => report.advanced += 1,
                Step::Skipped => report.skipped += 1,
                Step::Failed => report.failed += 1,
                Step::RateLimited(retry_after) => {
                    report.rate_limited = true;
                    warn!(
                        order = %order.number,
                        retry_after_secs = retry_after.as_secs(),
                        "积分系统限流，暂停后结束本轮"
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => {
                            info!("限流等待期间收到关闭信号");
                        }
                        _ = tokio::time::sleep(retry_after) => {}
                    }
                    break;
                }
            }
        }

        metrics::record_accrual_pass(started.elapsed().as_secs_f64());
        metrics::set_worker_last_run(WORKER_NAME);

        if report.examined > 0 {
            info!(
                examined = report.examined,
                settled = report.settled,
                invalidated = report.invalidated,
                advanced = report.advanced,
                skipped = report.skipped,
                failed = report.failed,
                rate_limited = report.rate_limited,
                "本轮对账完成"
            );
        }
        report
    }

    async fn process_order(&self, order: &Order) -> Step {
        let outcome = self.source.fetch(&order.number).await;
        metrics::record_accrual_request(outcome.label());

        match outcome {
            AccrualOutcome::Found(record) => self.apply_record(order, record).await,
            AccrualOutcome::NotRegistered => {
                debug!(order = %order.number, "订单尚未在积分系统登记");
                Step::Skipped
            }
            AccrualOutcome::RateLimited(retry_after) => Step::RateLimited(retry_after),
            AccrualOutcome::UpstreamError(code) => {
                warn!(order = %order.number, status = code, "积分系统返回异常状态码");
                Step::Failed
            }
            AccrualOutcome::TransportFailure(cause) => {
                warn!(order = %order.number, error = %cause, "请求积分系统失败");
                Step::Failed
            }
            AccrualOutcome::Malformed(reason) => {
                warn!(order = %order.number, reason = %reason, "积分系统响应不合约定，跳过");
                Step::Failed
            }
        }
    }

    async fn apply_record(&self, order: &Order, record: AccrualRecord) -> Step {
        match record.status {
            AccrualStatus::Registered | AccrualStatus::Processing => {
                if order.status == OrderStatus::Processing {
                    return Step::Skipped;
                }
                let result = self
                    .orders
                    .update_order_status(&order.number, OrderStatus::Processing, None)
                    .await;
                self.finish(order, OrderStatus::Processing, result, Step::Advanced)
            }
            AccrualStatus::Invalid => {
                let result = self
                    .orders
                    .update_order_status(&order.number, OrderStatus::Invalid, None)
                    .await;
                self.finish(order, OrderStatus::Invalid, result, Step::Invalidated)
            }
            AccrualStatus::Processed => {
                let accrual_cents = record.accrual_cents.unwrap_or(0);
                let result = self
                    .settlement
                    .settle_processed(&order.number, order.user_id, accrual_cents)
                    .await;
                if result.is_ok() {
                    info!(
                        order = %order.number,
                        user_id = order.user_id,
                        accrual_cents,
                        "订单已结算并入账"
                    );
                }
                self.finish(order, OrderStatus::Processed, result, Step::Settled)
            }
        }
    }

    fn finish(
        &self,
        order: &Order,
        target: OrderStatus,
        result: Result<(), StoreError>,
        on_success: Step,
    ) -> Step {
        match result {
            Ok(()) => {
                if target.is_terminal() {
                    metrics::record_order_settled(target.as_str());
                }
                debug!(order = %order.number, from = %order.status, to = %target, "订单状态已更新");
                on_success
            }
            Err(StoreError::NotFound { .. }) => {
                info!(
                    order = %order.number,
                    target = %target,
                    "订单已不存在或已处于终态，跳过"
                );
                Step::Skipped
            }
            Err(e) => {
                error!(
                    order = %order.number,
                    target = %target,
                    error = %e,
                    "更新订单失败，下一轮重试"
                );
                Step::Failed
            }
        }
    }
}
