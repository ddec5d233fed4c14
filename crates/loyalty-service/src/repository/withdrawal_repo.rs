//! 提现记录仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::error::{StoreError, StoreResult};
use super::traits::WithdrawalStore;
use crate::models::{NewWithdrawal, Withdrawal};

/// 提现记录仓储
pub struct WithdrawalRepository {
    pool: PgPool,
}

impl WithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 追加提现记录
    pub async fn create_withdrawal(&self, withdrawal: &NewWithdrawal) -> StoreResult<Withdrawal> {
        sqlx::query_as::<_, Withdrawal>(
            r#"
            INSERT INTO withdrawals (user_id, order_number, amount_cents)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, order_number, amount_cents, processed_at
            "#,
        )
        .bind(withdrawal.user_id)
        .bind(&withdrawal.order_number)
        .bind(withdrawal.amount_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::classify(e, "withdrawal", &withdrawal.order_number))
    }

    /// 列出用户的提现记录，按处理时间倒序
    pub async fn get_withdrawals_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Withdrawal>> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, user_id, order_number, amount_cents, processed_at
            FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(withdrawals)
    }
}

#[async_trait]
impl WithdrawalStore for WithdrawalRepository {
    async fn create_withdrawal(&self, withdrawal: &NewWithdrawal) -> StoreResult<Withdrawal> {
        self.create_withdrawal(withdrawal).await
    }

    async fn get_withdrawals_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Withdrawal>> {
        self.get_withdrawals_by_user_id(user_id).await
    }
}
