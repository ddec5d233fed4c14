//! 响应脚本存储
//!
//! 使用 DashMap 按订单号保存预置响应，重复登记时覆盖，以便模拟状态推进。

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 积分计算系统中的订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualState {
    Registered,
    Processing,
    Invalid,
    Processed,
}

/// 单个订单的预置响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderScript {
    /// 返回 200 及订单状态
    Reply {
        status: AccrualState,
        #[serde(
            default,
            with = "rust_decimal::serde::float_option",
            skip_serializing_if = "Option::is_none"
        )]
        accrual: Option<Decimal>,
    },
    /// 返回指定的 HTTP 状态码，不带响应体
    Failure { code: u16 },
    /// 返回 200 及原样的响应体，用于模拟不合约定的响应
    Raw { body: String },
}

impl OrderScript {
    pub fn reply(status: AccrualState) -> Self {
        Self::Reply {
            status,
            accrual: None,
        }
    }

    pub fn processed(accrual: Decimal) -> Self {
        Self::Reply {
            status: AccrualState::Processed,
            accrual: Some(accrual),
        }
    }

    pub fn failure(code: u16) -> Self {
        Self::Failure { code }
    }
}

/// 按订单号索引的脚本存储
#[derive(Debug, Clone, Default)]
pub struct ScriptStore {
    data: Arc<DashMap<String, OrderScript>>,
}

impl ScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记或覆盖订单脚本
    pub fn register(&self, order: &str, script: OrderScript) {
        self.data.insert(order.to_string(), script);
    }

    pub fn get(&self, order: &str) -> Option<OrderScript> {
        self.data.get(order).map(|v| v.clone())
    }

    pub fn remove(&self, order: &str) -> Option<OrderScript> {
        self.data.remove(order).map(|(_, v)| v)
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn clear(&self) {
        self.data.clear();
    }
}
