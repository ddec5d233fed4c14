//! 订单仓储
//!
//! 订单号唯一性由数据库唯一约束保证，并发上传同一订单号时由约束裁决

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::error::{StoreError, StoreResult};
use super::traits::OrderStore;
use crate::models::{Order, OrderStatus};

const ORDER_COLUMNS: &str = "id, number, user_id, status, accrual_cents, uploaded_at, updated_at";

/// 订单仓储
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建订单
    pub async fn create_order(&self, user_id: i64, number: &str) -> StoreResult<Order> {
        let sql = format!(
            "INSERT INTO orders (number, user_id, status) VALUES ($1, $2, $3) RETURNING {}",
            ORDER_COLUMNS
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(number)
            .bind(user_id)
            .bind(OrderStatus::New)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::classify(e, "order", number))
    }

    /// 按订单号查询
    pub async fn get_order_by_number(&self, number: &str) -> StoreResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE number = $1", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// 列出用户的订单，按上传时间倒序
    pub async fn get_orders_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, id DESC",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// 按状态列出订单，按上传时间正序
    pub async fn get_orders_by_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<Order>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let sql = format!(
            "SELECT {} FROM orders WHERE status = ANY($1) ORDER BY uploaded_at ASC, id ASC",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(names)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// 更新待处理订单的状态
    pub async fn update_order_status(
        &self,
        number: &str,
        status: OrderStatus,
        accrual_cents: Option<i64>,
    ) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::update_status_in_tx(&mut conn, number, None, status, accrual_cents).await
    }

    /// 在事务中更新待处理订单的状态
    ///
    /// 仅匹配 NEW / PROCESSING 状态的订单，保证终态不可回退；
    /// 给出 `owner` 时同时校验订单所有者。
    pub async fn update_status_in_tx(
        conn: &mut PgConnection,
        number: &str,
        owner: Option<i64>,
        status: OrderStatus,
        accrual_cents: Option<i64>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, accrual_cents = $3
            WHERE number = $1
              AND status IN ('NEW', 'PROCESSING')
              AND ($4::BIGINT IS NULL OR user_id = $4)
            "#,
        )
        .bind(number)
        .bind(status)
        .bind(accrual_cents)
        .bind(owner)
        .execute(conn)
        .await
        .map_err(|e| StoreError::classify(e, "order", number))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("pending order", number));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn create_order(&self, user_id: i64, number: &str) -> StoreResult<Order> {
        self.create_order(user_id, number).await
    }

    async fn get_order_by_number(&self, number: &str) -> StoreResult<Option<Order>> {
        self.get_order_by_number(number).await
    }

    async fn get_orders_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Order>> {
        self.get_orders_by_user_id(user_id).await
    }

    async fn get_orders_by_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<Order>> {
        self.get_orders_by_status(statuses).await
    }

    async fn update_order_status(
        &self,
        number: &str,
        status: OrderStatus,
        accrual_cents: Option<i64>,
    ) -> StoreResult<()> {
        self.update_order_status(number, status, accrual_cents).await
    }
}
