//! 内存存储实现
//!
//! 所有数据放在同一把锁之后，订单结算与余额变更天然原子。
//! 用于本地运行、集成测试以及不依赖数据库的场景。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::error::{StoreError, StoreResult};
use super::traits::{BalanceStore, OrderStore, SettlementStore, WithdrawalStore};
use crate::models::{Balance, DebitOutcome, NewWithdrawal, Order, OrderStatus, Withdrawal};

#[derive(Default)]
struct MemoryState {
    orders: HashMap<String, Order>,
    balances: HashMap<i64, Balance>,
    withdrawals: Vec<Withdrawal>,
    next_order_id: i64,
    next_withdrawal_id: i64,
}

impl MemoryState {
    fn pending_order_mut(&mut self, number: &str) -> StoreResult<&mut Order> {
        self.orders
            .get_mut(number)
            .filter(|o| o.is_pending())
            .ok_or_else(|| StoreError::not_found("pending order", number))
    }

    fn adjust_balance(
        &mut self,
        user_id: i64,
        current_delta: i64,
        withdrawn_delta: i64,
    ) -> StoreResult<Balance> {
        let balance = self
            .balances
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::not_found("balance", user_id))?;

        let current = balance.current_cents.checked_add(current_delta);
        let withdrawn = balance.withdrawn_cents.checked_add(withdrawn_delta);
        match (current, withdrawn) {
            (Some(current), Some(withdrawn)) if current >= 0 && withdrawn >= 0 => {
                balance.current_cents = current;
                balance.withdrawn_cents = withdrawn;
                balance.updated_at = Utc::now();
                Ok(balance.clone())
            }
            _ => Err(StoreError::Constraint {
                entity: "balance",
                reason: format!(
                    "user_id={} 调整后余额非法: current_delta={}, withdrawn_delta={}",
                    user_id, current_delta, withdrawn_delta
                ),
            }),
        }
    }
}

/// 内存存储
///
/// 克隆后共享同一份数据。
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, user_id: i64, number: &str) -> StoreResult<Order> {
        let mut state = self.state.lock();
        if state.orders.contains_key(number) {
            return Err(StoreError::Duplicate {
                entity: "order",
                key: number.to_string(),
            });
        }

        state.next_order_id += 1;
        let now = Utc::now();
        let order = Order {
            id: state.next_order_id,
            number: number.to_string(),
            user_id,
            status: OrderStatus::New,
            accrual_cents: None,
            uploaded_at: now,
            updated_at: now,
        };
        state.orders.insert(number.to_string(), order.clone());
        Ok(order)
    }

    async fn get_order_by_number(&self, number: &str) -> StoreResult<Option<Order>> {
        Ok(self.state.lock().orders.get(number).cloned())
    }

    async fn get_orders_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Order>> {
        let state = self.state.lock();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| (b.uploaded_at, b.id).cmp(&(a.uploaded_at, a.id)));
        Ok(orders)
    }

    async fn get_orders_by_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<Order>> {
        let state = self.state.lock();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| statuses.contains(&o.status))
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.uploaded_at, o.id));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        number: &str,
        status: OrderStatus,
        accrual_cents: Option<i64>,
    ) -> StoreResult<()> {
        if (status == OrderStatus::Processed) != accrual_cents.is_some() {
            return Err(StoreError::Constraint {
                entity: "order",
                reason: format!("状态 {} 与积分值 {:?} 不匹配", status, accrual_cents),
            });
        }

        let mut state = self.state.lock();
        let order = state.pending_order_mut(number)?;
        order.status = status;
        order.accrual_cents = accrual_cents;
        order.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl BalanceStore for InMemoryStore {
    async fn get_balance(&self, user_id: i64) -> StoreResult<Balance> {
        self.state
            .lock()
            .balances
            .get(&user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("balance", user_id))
    }

    async fn create_balance(&self, user_id: i64) -> StoreResult<bool> {
        let mut state = self.state.lock();
        if state.balances.contains_key(&user_id) {
            return Ok(false);
        }
        state
            .balances
            .insert(user_id, Balance::empty(user_id, Utc::now()));
        Ok(true)
    }

    async fn update_balance(
        &self,
        user_id: i64,
        current_delta: i64,
        withdrawn_delta: i64,
    ) -> StoreResult<Balance> {
        self.state
            .lock()
            .adjust_balance(user_id, current_delta, withdrawn_delta)
    }

    async fn debit_balance(&self, user_id: i64, amount_cents: i64) -> StoreResult<DebitOutcome> {
        let mut state = self.state.lock();
        let available_cents = state
            .balances
            .get(&user_id)
            .map(|b| b.current_cents)
            .ok_or_else(|| StoreError::not_found("balance", user_id))?;

        if available_cents < amount_cents {
            return Ok(DebitOutcome::Insufficient { available_cents });
        }
        let balance = state.adjust_balance(user_id, -amount_cents, amount_cents)?;
        Ok(DebitOutcome::Debited(balance))
    }
}

#[async_trait]
impl WithdrawalStore for InMemoryStore {
    async fn create_withdrawal(&self, withdrawal: &NewWithdrawal) -> StoreResult<Withdrawal> {
        let mut state = self.state.lock();
        state.next_withdrawal_id += 1;
        let record = Withdrawal {
            id: state.next_withdrawal_id,
            user_id: withdrawal.user_id,
            order_number: withdrawal.order_number.clone(),
            amount_cents: withdrawal.amount_cents,
            processed_at: Utc::now(),
        };
        state.withdrawals.push(record.clone());
        Ok(record)
    }

    async fn get_withdrawals_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Withdrawal>> {
        let state = self.state.lock();
        let mut withdrawals: Vec<Withdrawal> = state
            .withdrawals
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        withdrawals.sort_by(|a, b| (b.processed_at, b.id).cmp(&(a.processed_at, a.id)));
        Ok(withdrawals)
    }
}

#[async_trait]
impl SettlementStore for InMemoryStore {
    async fn settle_processed(
        &self,
        number: &str,
        user_id: i64,
        accrual_cents: i64,
    ) -> StoreResult<()> {
        let mut state = self.state.lock();

        // 先完成全部检查再修改，保证失败时不留下部分结果
        let owner_matches = state
            .pending_order_mut(number)
            .map(|o| o.user_id == user_id)?;
        if !owner_matches {
            return Err(StoreError::not_found("pending order", number));
        }
        if accrual_cents > 0 {
            let credited = state
                .balances
                .get(&user_id)
                .map_or(Some(accrual_cents), |b| b.current_cents.checked_add(accrual_cents));
            if credited.is_none() {
                return Err(StoreError::Constraint {
                    entity: "balance",
                    reason: format!("user_id={} 入账后溢出", user_id),
                });
            }
        }

        let now = Utc::now();
        let order = state.pending_order_mut(number)?;
        order.status = OrderStatus::Processed;
        order.accrual_cents = Some(accrual_cents);
        order.updated_at = now;

        if accrual_cents > 0 {
            state
                .balances
                .entry(user_id)
                .or_insert_with(|| Balance::empty(user_id, now));
            state.adjust_balance(user_id, accrual_cents, 0)?;
        }
        Ok(())
    }
}
