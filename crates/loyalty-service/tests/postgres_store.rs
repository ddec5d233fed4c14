//! PostgreSQL 存储集成测试
//!
//! 需要可用的数据库，通过 DATABASE_URL 指定：
//! `DATABASE_URL=postgres://... cargo test -p loyalty-service -- --ignored`

use std::sync::Arc;

use gophermart_shared::config::DatabaseConfig;
use gophermart_shared::database::Database;
use loyalty::LoyaltyError;
use loyalty::models::OrderStatus;
use loyalty::repository::{
    BalanceRepository, OrderRepository, OrderStore, SettlementRepository, SettlementStore,
    StoreError, WithdrawalRepository,
};
use loyalty::service::{BalanceLedger, WithdrawalCoordinator};
use rust_decimal_macros::dec;
use sqlx::PgPool;

async fn setup() -> PgPool {
    let mut config = DatabaseConfig::default();
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.url = url;
    }
    let db = Database::connect(&config).await.unwrap();
    sqlx::migrate!("../../migrations").run(db.pool()).await.unwrap();
    db.pool().clone()
}

/// 创建测试用户，登录名带时间戳避免冲突
async fn create_user(pool: &PgPool) -> i64 {
    let login = format!(
        "test-{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    sqlx::query_scalar("INSERT INTO users (login, password_hash) VALUES ($1, 'x') RETURNING id")
        .bind(login)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// 生成唯一的合法订单号
fn unique_order_number() -> String {
    let prefix = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .to_string();
    loyalty::luhn::generate_valid_luhn(&prefix).unwrap()
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_order_lifecycle_and_settlement() {
    let pool = setup().await;
    let user_id = create_user(&pool).await;
    let other_user = create_user(&pool).await;

    let orders = OrderRepository::new(pool.clone());
    let settlement = SettlementRepository::new(pool.clone());
    let balances = Arc::new(BalanceRepository::new(pool.clone()));
    let ledger = BalanceLedger::new(balances);

    let number = unique_order_number();
    let order = orders.create_order(user_id, &number).await.unwrap();
    assert_eq!(order.status, OrderStatus::New);

    let dup = orders.create_order(other_user, &number).await.unwrap_err();
    assert!(matches!(dup, StoreError::Duplicate { .. }));

    OrderStore::update_order_status(&orders, &number, OrderStatus::Processing, None)
        .await
        .unwrap();

    // 所有者不符时不做任何修改
    let err = SettlementStore::settle_processed(&settlement, &number, other_user, 1000)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    SettlementStore::settle_processed(&settlement, &number, user_id, 72998)
        .await
        .unwrap();
    let settled = orders.get_order_by_number(&number).await.unwrap().unwrap();
    assert_eq!(settled.status, OrderStatus::Processed);
    assert_eq!(settled.accrual_cents, Some(72998));
    assert_eq!(ledger.get_balance(user_id).await.unwrap().current_cents, 72998);

    // 终态订单不能再次结算
    let err = SettlementStore::settle_processed(&settlement, &number, user_id, 72998)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(ledger.get_balance(user_id).await.unwrap().current_cents, 72998);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_withdrawal_against_postgres() {
    let pool = setup().await;
    let user_id = create_user(&pool).await;

    let ledger = BalanceLedger::new(Arc::new(BalanceRepository::new(pool.clone())));
    let coordinator =
        WithdrawalCoordinator::new(ledger.clone(), Arc::new(WithdrawalRepository::new(pool)));

    ledger.credit(user_id, 50000).await.unwrap();

    let withdrawal = coordinator
        .withdraw(user_id, "2377225624", dec!(751.5))
        .await
        .unwrap_err();
    assert!(matches!(withdrawal, LoyaltyError::InsufficientFunds { .. }));

    let withdrawal = coordinator
        .withdraw(user_id, "2377225624", dec!(120.25))
        .await
        .unwrap();
    assert_eq!(withdrawal.amount_cents, 12025);

    let balance = ledger.get_balance(user_id).await.unwrap();
    assert_eq!(balance.current_cents, 37975);
    assert_eq!(balance.withdrawn_cents, 12025);

    let history = coordinator.list_withdrawals(user_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].order_number, "2377225624");
}
