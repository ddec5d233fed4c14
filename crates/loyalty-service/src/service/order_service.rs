//! 订单上传服务
//!
//! 同一用户重复上传视为幂等成功，其他用户已上传的订单号返回冲突。
//! 并发上传同一订单号时由存储层唯一约束裁决，失败方重新读取后按同样规则解释。

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::error::{LoyaltyError, Result};
use crate::luhn::validate_order_number;
use crate::models::Order;
use crate::repository::{OrderStore, StoreError};

/// 订单上传结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 新订单已受理
    Accepted,
    /// 当前用户此前已上传过该订单
    AlreadyUploaded,
}

/// 订单上传服务
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// 上传订单号
    #[instrument(skip(self))]
    pub async fn submit(&self, user_id: i64, number: &str) -> Result<SubmitOutcome> {
        let number = number.trim();
        validate_order_number(number)?;

        if let Some(existing) = self.orders.get_order_by_number(number).await? {
            return Self::interpret_existing(&existing, user_id);
        }

        match self.orders.create_order(user_id, number).await {
            Ok(order) => {
                info!(user_id, order = %order.number, "订单已受理");
                Ok(SubmitOutcome::Accepted)
            }
            Err(StoreError::Duplicate { .. }) => {
                debug!(user_id, order = %number, "订单号并发冲突，重新读取");
                let existing = self
                    .orders
                    .get_order_by_number(number)
                    .await?
                    .ok_or_else(|| LoyaltyError::OrderNotFound(number.to_string()))?;
                Self::interpret_existing(&existing, user_id)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn interpret_existing(existing: &Order, user_id: i64) -> Result<SubmitOutcome> {
        if existing.user_id == user_id {
            Ok(SubmitOutcome::AlreadyUploaded)
        } else {
            Err(LoyaltyError::OrderConflict {
                number: existing.number.clone(),
            })
        }
    }

    /// 列出用户的订单，按上传时间倒序
    pub async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        Ok(self.orders.get_orders_by_user_id(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::models::OrderStatus;
    use crate::repository::{InMemoryStore, MockOrderStore};
    use chrono::Utc;

    const ORDER: &str = "12345678903";

    fn order_owned_by(user_id: i64) -> Order {
        Order {
            id: 1,
            number: ORDER.to_string(),
            user_id,
            status: OrderStatus::New,
            accrual_cents: None,
            uploaded_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_submit_is_idempotent_per_user() {
        let store = InMemoryStore::new();
        let service = OrderService::new(Arc::new(store.clone()));

        assert_eq!(
            service.submit(1, ORDER).await.unwrap(),
            SubmitOutcome::Accepted
        );
        assert_eq!(
            service.submit(1, ORDER).await.unwrap(),
            SubmitOutcome::AlreadyUploaded
        );
        assert_eq!(service.list_orders(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_conflict_across_users() {
        let store = InMemoryStore::new();
        let service = OrderService::new(Arc::new(store.clone()));

        service.submit(1, ORDER).await.unwrap();
        let err = service.submit(2, ORDER).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::OrderConflict { .. }));

        assert!(service.list_orders(2).await.unwrap().is_empty());
        let owner = store.get_order_by_number(ORDER).await.unwrap().unwrap();
        assert_eq!(owner.user_id, 1);
    }

    #[tokio::test]
    async fn test_submit_validates_number() {
        let service = OrderService::new(Arc::new(InMemoryStore::new()));
        assert!(matches!(
            service.submit(1, "   ").await,
            Err(LoyaltyError::Validation(ValidationError::EmptyOrderNumber))
        ));
        assert!(matches!(
            service.submit(1, "12ab").await,
            Err(LoyaltyError::Validation(ValidationError::NonDigitOrderNumber))
        ));
        assert!(matches!(
            service.submit(1, "12345678904").await,
            Err(LoyaltyError::Validation(ValidationError::BadChecksum))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_race_is_reinterpreted() {
        let mut store = MockOrderStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_get_order_by_number()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        store
            .expect_create_order()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, number| {
                Err(StoreError::Duplicate {
                    entity: "order",
                    key: number.to_string(),
                })
            });
        store
            .expect_get_order_by_number()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(order_owned_by(2))));

        let service = OrderService::new(Arc::new(store));
        let err = service.submit(1, ORDER).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::OrderConflict { .. }));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = InMemoryStore::new();
        let service = OrderService::new(Arc::new(store.clone()));
        for number in ["12345678903", "79927398713", "2377225624"] {
            service.submit(3, number).await.unwrap();
        }

        let orders = service.list_orders(3).await.unwrap();
        let numbers: Vec<&str> = orders.iter().map(|o| o.number.as_str()).collect();
        assert_eq!(numbers, vec!["2377225624", "79927398713", "12345678903"]);
    }
}
