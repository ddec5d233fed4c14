//! 订单结算仓储
//!
//! 订单状态变更与余额入账在同一个数据库事务中完成，任一步失败整体回滚

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::balance_repo::BalanceRepository;
use super::error::StoreResult;
use super::order_repo::OrderRepository;
use super::traits::SettlementStore;
use crate::models::OrderStatus;

/// 订单结算仓储
pub struct SettlementRepository {
    pool: PgPool,
}

impl SettlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 结算订单并入账
    pub async fn settle_processed(
        &self,
        number: &str,
        user_id: i64,
        accrual_cents: i64,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        OrderRepository::update_status_in_tx(
            &mut tx,
            number,
            Some(user_id),
            OrderStatus::Processed,
            Some(accrual_cents),
        )
        .await?;

        if accrual_cents > 0 {
            BalanceRepository::create_in_tx(&mut tx, user_id).await?;
            BalanceRepository::update_in_tx(&mut tx, user_id, accrual_cents, 0).await?;
        }

        tx.commit().await?;

        debug!(order = %number, user_id, accrual_cents, "订单结算事务已提交");
        Ok(())
    }
}

#[async_trait]
impl SettlementStore for SettlementRepository {
    async fn settle_processed(
        &self,
        number: &str,
        user_id: i64,
        accrual_cents: i64,
    ) -> StoreResult<()> {
        self.settle_processed(number, user_id, accrual_cents).await
    }
}
