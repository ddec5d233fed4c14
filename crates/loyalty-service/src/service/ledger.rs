//! 余额账本
//!
//! 对整数分余额提供原子入账与条件扣减。余额行在首次访问时懒创建，
//! 重复创建不视为错误。

use std::sync::Arc;

use gophermart_shared::observability::metrics;
use tracing::{debug, instrument, warn};

use crate::error::{LoyaltyError, Result, ValidationError};
use crate::models::{Balance, DebitOutcome};
use crate::repository::{BalanceStore, StoreError};

/// 余额账本
#[derive(Clone)]
pub struct BalanceLedger {
    store: Arc<dyn BalanceStore>,
}

impl BalanceLedger {
    pub fn new(store: Arc<dyn BalanceStore>) -> Self {
        Self { store }
    }

    /// 确保用户余额行存在
    pub async fn ensure_balance(&self, user_id: i64) -> Result<()> {
        if self.store.create_balance(user_id).await? {
            debug!(user_id, "已为用户创建余额");
        }
        Ok(())
    }

    /// 入账
    #[instrument(skip(self))]
    pub async fn credit(&self, user_id: i64, amount_cents: i64) -> Result<Balance> {
        if amount_cents <= 0 {
            return Err(ValidationError::NonPositiveAmount.into());
        }

        let result = async {
            self.ensure_balance(user_id).await?;
            let balance = self.store.update_balance(user_id, amount_cents, 0).await?;
            Ok::<_, LoyaltyError>(balance)
        }
        .await;

        match &result {
            Ok(balance) => {
                metrics::record_ledger_operation("credit", "success");
                debug!(
                    user_id,
                    amount_cents,
                    current_cents = balance.current_cents,
                    "入账成功"
                );
            }
            Err(e) => {
                metrics::record_ledger_operation("credit", "error");
                warn!(user_id, amount_cents, error = %e, "入账失败");
            }
        }
        result
    }

    /// 扣减
    ///
    /// 余额检查与扣减在存储层的单个原子步骤内完成；余额不足时不做任何修改。
    #[instrument(skip(self))]
    pub async fn debit(&self, user_id: i64, amount_cents: i64) -> Result<Balance> {
        if amount_cents <= 0 {
            return Err(ValidationError::NonPositiveAmount.into());
        }

        self.ensure_balance(user_id).await?;
        let outcome = self.store.debit_balance(user_id, amount_cents).await;

        match outcome {
            Ok(DebitOutcome::Debited(balance)) => {
                metrics::record_ledger_operation("debit", "success");
                debug!(
                    user_id,
                    amount_cents,
                    current_cents = balance.current_cents,
                    "扣减成功"
                );
                Ok(balance)
            }
            Ok(DebitOutcome::Insufficient { available_cents }) => {
                metrics::record_ledger_operation("debit", "insufficient_funds");
                Err(LoyaltyError::InsufficientFunds {
                    available_cents,
                    requested_cents: amount_cents,
                })
            }
            Err(e) => {
                metrics::record_ledger_operation("debit", "error");
                Err(e.into())
            }
        }
    }

    /// 查询余额，不存在时先创建
    pub async fn get_balance(&self, user_id: i64) -> Result<Balance> {
        self.ensure_balance(user_id).await?;
        self.store.get_balance(user_id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => LoyaltyError::BalanceNotFound(user_id),
            other => other.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryStore, MockBalanceStore};

    fn ledger() -> (BalanceLedger, InMemoryStore) {
        let store = InMemoryStore::new();
        (BalanceLedger::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_get_balance_creates_lazily() {
        let (ledger, _) = ledger();
        let balance = ledger.get_balance(11).await.unwrap();
        assert_eq!(balance.current_cents, 0);
        assert_eq!(balance.withdrawn_cents, 0);

        // 重复访问不报错
        ledger.get_balance(11).await.unwrap();
    }

    #[tokio::test]
    async fn test_credits_and_debits_keep_invariant() {
        let (ledger, _) = ledger();
        let credits = [1000, 250, 75000];
        let debits = [300, 50];
        for c in credits {
            ledger.credit(1, c).await.unwrap();
        }
        for d in debits {
            ledger.debit(1, d).await.unwrap();
        }

        let balance = ledger.get_balance(1).await.unwrap();
        let credited: i64 = credits.iter().sum();
        let debited: i64 = debits.iter().sum();
        assert_eq!(balance.current_cents, credited - debited);
        assert_eq!(balance.withdrawn_cents, debited);
        assert_eq!(balance.total_credited_cents(), credited);
    }

    #[tokio::test]
    async fn test_over_debit_leaves_balance_unchanged() {
        let (ledger, _) = ledger();
        ledger.credit(2, 500).await.unwrap();

        let err = ledger.debit(2, 501).await.unwrap_err();
        assert!(matches!(
            err,
            LoyaltyError::InsufficientFunds {
                available_cents: 500,
                requested_cents: 501
            }
        ));

        let balance = ledger.get_balance(2).await.unwrap();
        assert_eq!(balance.current_cents, 500);
        assert_eq!(balance.withdrawn_cents, 0);
    }

    #[tokio::test]
    async fn test_credit_after_debit_never_lowers_withdrawn() {
        let (ledger, _) = ledger();
        ledger.credit(4, 900).await.unwrap();
        ledger.debit(4, 400).await.unwrap();

        let balance = ledger.credit(4, 400).await.unwrap();
        assert_eq!(balance.current_cents, 900);
        assert_eq!(balance.withdrawn_cents, 400);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let (ledger, _) = ledger();
        assert!(matches!(
            ledger.credit(1, 0).await,
            Err(LoyaltyError::Validation(ValidationError::NonPositiveAmount))
        ));
        assert!(matches!(
            ledger.debit(1, -10).await,
            Err(LoyaltyError::Validation(ValidationError::NonPositiveAmount))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_debits_never_overdraw() {
        let (ledger, _) = ledger();
        ledger.credit(5, 1000).await.unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.debit(5, 100).await })
            })
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        let balance = ledger.get_balance(5).await.unwrap();
        assert_eq!(balance.current_cents, 0);
        assert_eq!(balance.withdrawn_cents, 1000);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let mut store = MockBalanceStore::new();
        store.expect_create_balance().returning(|_| Ok(false));
        store
            .expect_update_balance()
            .returning(|_, _, _| Err(StoreError::Unavailable("连接池已关闭".to_string())));

        let ledger = BalanceLedger::new(Arc::new(store));
        let err = ledger.credit(1, 100).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
