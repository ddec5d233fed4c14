//! 余额仓储
//!
//! 所有变更都是单条 UPDATE 语句，依赖行锁保证同一用户余额的原子性

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::error::{StoreError, StoreResult};
use super::traits::BalanceStore;
use crate::models::{Balance, DebitOutcome};

const BALANCE_COLUMNS: &str = "user_id, current_cents, withdrawn_cents, updated_at";

/// 余额仓储
pub struct BalanceRepository {
    pool: PgPool,
}

impl BalanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 查询余额
    pub async fn get_balance(&self, user_id: i64) -> StoreResult<Balance> {
        let sql = format!(
            "SELECT {} FROM user_balances WHERE user_id = $1",
            BALANCE_COLUMNS
        );
        sqlx::query_as::<_, Balance>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("balance", user_id))
    }

    /// 创建空余额，已存在时返回 false
    pub async fn create_balance(&self, user_id: i64) -> StoreResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::create_in_tx(&mut conn, user_id).await
    }

    /// 在事务中创建空余额
    pub async fn create_in_tx(conn: &mut PgConnection, user_id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_balances (user_id, current_cents, withdrawn_cents)
            VALUES ($1, 0, 0)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(conn)
        .await
        .map_err(|e| StoreError::classify(e, "balance", user_id))?;

        Ok(result.rows_affected() == 1)
    }

    /// 原子地调整余额
    pub async fn update_balance(
        &self,
        user_id: i64,
        current_delta: i64,
        withdrawn_delta: i64,
    ) -> StoreResult<Balance> {
        let mut conn = self.pool.acquire().await?;
        Self::update_in_tx(&mut conn, user_id, current_delta, withdrawn_delta).await
    }

    /// 在事务中调整余额
    pub async fn update_in_tx(
        conn: &mut PgConnection,
        user_id: i64,
        current_delta: i64,
        withdrawn_delta: i64,
    ) -> StoreResult<Balance> {
        let sql = format!(
            r#"
            UPDATE user_balances
            SET current_cents = current_cents + $2,
                withdrawn_cents = withdrawn_cents + $3
            WHERE user_id = $1
            RETURNING {}
            "#,
            BALANCE_COLUMNS
        );
        sqlx::query_as::<_, Balance>(&sql)
            .bind(user_id)
            .bind(current_delta)
            .bind(withdrawn_delta)
            .fetch_optional(conn)
            .await
            .map_err(|e| StoreError::classify(e, "balance", user_id))?
            .ok_or_else(|| StoreError::not_found("balance", user_id))
    }

    /// 条件扣减
    ///
    /// 扣减条件写在 WHERE 子句中，余额检查与扣减在同一语句内完成。
    /// 未命中时再读取一次余额以区分「余额不足」与「余额不存在」。
    pub async fn debit_balance(&self, user_id: i64, amount_cents: i64) -> StoreResult<DebitOutcome> {
        let sql = format!(
            r#"
            UPDATE user_balances
            SET current_cents = current_cents - $2,
                withdrawn_cents = withdrawn_cents + $2
            WHERE user_id = $1 AND current_cents >= $2
            RETURNING {}
            "#,
            BALANCE_COLUMNS
        );
        let debited = sqlx::query_as::<_, Balance>(&sql)
            .bind(user_id)
            .bind(amount_cents)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::classify(e, "balance", user_id))?;

        match debited {
            Some(balance) => Ok(DebitOutcome::Debited(balance)),
            None => {
                let balance = self.get_balance(user_id).await?;
                Ok(DebitOutcome::Insufficient {
                    available_cents: balance.current_cents,
                })
            }
        }
    }
}

#[async_trait]
impl BalanceStore for BalanceRepository {
    async fn get_balance(&self, user_id: i64) -> StoreResult<Balance> {
        self.get_balance(user_id).await
    }

    async fn create_balance(&self, user_id: i64) -> StoreResult<bool> {
        self.create_balance(user_id).await
    }

    async fn update_balance(
        &self,
        user_id: i64,
        current_delta: i64,
        withdrawn_delta: i64,
    ) -> StoreResult<Balance> {
        self.update_balance(user_id, current_delta, withdrawn_delta)
            .await
    }

    async fn debit_balance(&self, user_id: i64, amount_cents: i64) -> StoreResult<DebitOutcome> {
        self.debit_balance(user_id, amount_cents).await
    }
}
