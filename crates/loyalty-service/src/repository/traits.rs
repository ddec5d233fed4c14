//! 存储 Trait 定义
//!
//! 服务层依赖抽象而非具体实现，支持 Postgres、内存实现与 mock 测试

use async_trait::async_trait;

use super::error::StoreResult;
use crate::models::{Balance, DebitOutcome, NewWithdrawal, Order, OrderStatus, Withdrawal};

/// 订单存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// 创建 NEW 状态的订单，订单号已存在时返回 `StoreError::Duplicate`
    async fn create_order(&self, user_id: i64, number: &str) -> StoreResult<Order>;

    async fn get_order_by_number(&self, number: &str) -> StoreResult<Option<Order>>;

    /// 按上传时间倒序
    async fn get_orders_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Order>>;

    /// 按上传时间正序
    async fn get_orders_by_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<Order>>;

    /// 更新待处理订单的状态，订单不存在或已处于终态时返回 `StoreError::NotFound`
    async fn update_order_status(
        &self,
        number: &str,
        status: OrderStatus,
        accrual_cents: Option<i64>,
    ) -> StoreResult<()>;
}

/// 余额存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// 余额不存在时返回 `StoreError::NotFound`
    async fn get_balance(&self, user_id: i64) -> StoreResult<Balance>;

    /// 创建空余额，已存在时返回 `Ok(false)`
    async fn create_balance(&self, user_id: i64) -> StoreResult<bool>;

    /// 原子地调整余额，余额不存在时返回 `StoreError::NotFound`
    async fn update_balance(
        &self,
        user_id: i64,
        current_delta: i64,
        withdrawn_delta: i64,
    ) -> StoreResult<Balance>;

    /// 条件扣减：可用余额足够时将 amount 从 current 转入 withdrawn
    async fn debit_balance(&self, user_id: i64, amount_cents: i64) -> StoreResult<DebitOutcome>;
}

/// 提现记录存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WithdrawalStore: Send + Sync {
    async fn create_withdrawal(&self, withdrawal: &NewWithdrawal) -> StoreResult<Withdrawal>;

    /// 按处理时间倒序
    async fn get_withdrawals_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Withdrawal>>;
}

/// 订单结算接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// 在同一原子单元内将待处理订单置为 PROCESSED 并为订单所有者入账
    ///
    /// 订单不存在、所有者不符或已处于终态时返回 `StoreError::NotFound`，且不产生任何修改。
    /// `accrual_cents` 为 0 时只更新订单状态。
    async fn settle_processed(
        &self,
        number: &str,
        user_id: i64,
        accrual_cents: i64,
    ) -> StoreResult<()>;
}
