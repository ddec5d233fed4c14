//! 对外视图
//!
//! 金额在此处由分换算为十进制，并按原有 JSON 形状序列化为数字

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Balance, Order, OrderStatus, Withdrawal};
use crate::money::cents_to_decimal;

/// 余额视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceView {
    #[serde(with = "rust_decimal::serde::float")]
    pub current: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub withdrawn: Decimal,
}

impl From<&Balance> for BalanceView {
    fn from(balance: &Balance) -> Self {
        Self {
            current: cents_to_decimal(balance.current_cents),
            withdrawn: cents_to_decimal(balance.withdrawn_cents),
        }
    }
}

/// 订单视图，未结算订单不输出 accrual 字段
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub number: String,
    pub status: OrderStatus,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub accrual: Option<Decimal>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.number.clone(),
            status: order.status,
            accrual: order.accrual_cents.map(cents_to_decimal),
            uploaded_at: order.uploaded_at,
        }
    }
}

/// 提现记录视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawalView {
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl From<&Withdrawal> for WithdrawalView {
    fn from(withdrawal: &Withdrawal) -> Self {
        Self {
            order: withdrawal.order_number.clone(),
            sum: cents_to_decimal(withdrawal.amount_cents),
            processed_at: withdrawal.processed_at,
        }
    }
}
