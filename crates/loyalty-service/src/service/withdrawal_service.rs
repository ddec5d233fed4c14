//! 提现协调服务
//!
//! 处理积分提现的核心业务逻辑，包括：
//! - 单号与金额校验
//! - 余额条件扣减
//! - 追加提现记录
//! - 记录失败时的补偿（将扣减金额重新入账）
//!
//! ## 提现流程
//!
//! 1. 参数校验 -> 2. 扣减余额 -> 3. 追加提现记录 -> 4. 失败时补偿

use std::sync::Arc;

use gophermart_shared::observability::metrics;
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use super::ledger::BalanceLedger;
use crate::error::{LoyaltyError, Result};
use crate::luhn::validate_order_number;
use crate::models::{NewWithdrawal, Withdrawal};
use crate::money::decimal_to_cents;
use crate::repository::WithdrawalStore;

/// 提现协调服务
pub struct WithdrawalCoordinator {
    ledger: BalanceLedger,
    withdrawals: Arc<dyn WithdrawalStore>,
}

impl WithdrawalCoordinator {
    pub fn new(ledger: BalanceLedger, withdrawals: Arc<dyn WithdrawalStore>) -> Self {
        Self {
            ledger,
            withdrawals,
        }
    }

    /// 提现
    ///
    /// 扣减成功后若提现记录写入失败，会将扣减金额重新入账并返回原始错误；
    /// 已累计的 withdrawn 不回退。
    /// 补偿也失败时返回 `LoyaltyError::Inconsistency`。
    #[instrument(skip(self), fields(amount = %amount))]
    pub async fn withdraw(
        &self,
        user_id: i64,
        order_number: &str,
        amount: Decimal,
    ) -> Result<Withdrawal> {
        let order_number = order_number.trim();
        let amount_cents = match validate_order_number(order_number)
            .and_then(|_| decimal_to_cents(amount))
        {
            Ok(cents) => cents,
            Err(e) => {
                metrics::record_withdrawal("invalid");
                return Err(e.into());
            }
        };

        if let Err(e) = self.ledger.debit(user_id, amount_cents).await {
            let status = match &e {
                LoyaltyError::InsufficientFunds { .. } => "insufficient_funds",
                _ => "error",
            };
            metrics::record_withdrawal(status);
            warn!(user_id, order = %order_number, amount_cents, error = %e, "提现扣减失败");
            return Err(e);
        }

        let request = NewWithdrawal {
            user_id,
            order_number: order_number.to_string(),
            amount_cents,
        };
        match self.withdrawals.create_withdrawal(&request).await {
            Ok(withdrawal) => {
                metrics::record_withdrawal("success");
                info!(
                    user_id,
                    order = %order_number,
                    amount_cents,
                    "提现成功"
                );
                Ok(withdrawal)
            }
            Err(append_err) => {
                error!(
                    critical = true,
                    user_id,
                    order = %order_number,
                    amount_cents,
                    error = %append_err,
                    "提现记录写入失败，开始回补入账"
                );
                metrics::record_withdrawal("compensated");
                self.compensate(user_id, order_number, amount_cents, append_err.into())
                    .await
            }
        }
    }

    /// 补偿：成功时返回原始错误，失败时返回账务不一致错误
    async fn compensate(
        &self,
        user_id: i64,
        order_number: &str,
        amount_cents: i64,
        original: LoyaltyError,
    ) -> Result<Withdrawal> {
        match self.ledger.credit(user_id, amount_cents).await {
            Ok(_) => {
                info!(user_id, order = %order_number, amount_cents, "扣减金额已回补");
                Err(original)
            }
            Err(comp_err) => {
                metrics::record_withdrawal("inconsistent");
                error!(
                    critical = true,
                    user_id,
                    order = %order_number,
                    amount_cents,
                    original_error = %original,
                    compensation_error = %comp_err,
                    "回补入账失败，账务不一致，需人工处理"
                );
                Err(LoyaltyError::Inconsistency {
                    user_id,
                    order_number: order_number.to_string(),
                    amount_cents,
                    reason: format!("提现记录写入失败: {}; 回补入账失败: {}", original, comp_err),
                })
            }
        }
    }

    /// 列出用户的提现记录，按处理时间倒序
    pub async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        Ok(self.withdrawals.get_withdrawals_by_user_id(user_id).await?)
    }

    /// 用户余额
    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }
}
