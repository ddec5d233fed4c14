//! 积分计算系统的数据模型
//!
//! `AccrualResponse` 是线上 JSON 形状；经过校验后得到只含整数分的 `AccrualRecord`。

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::money::to_cents;

/// 积分计算系统中的订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    /// 已登记，尚未开始计算
    Registered,
    /// 计算中
    Processing,
    /// 拒绝计算
    Invalid,
    /// 计算完成
    Processed,
}

/// `GET /api/orders/{number}` 的 200 响应体
#[derive(Debug, Clone, Deserialize)]
pub struct AccrualResponse {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default)]
    pub accrual: Option<Decimal>,
}

/// 校验通过的积分记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualRecord {
    pub order: String,
    pub status: AccrualStatus,
    /// 仅 PROCESSED 时可能有值
    pub accrual_cents: Option<i64>,
}

impl AccrualResponse {
    /// 按约定校验响应
    ///
    /// - `order` 非空且与请求的订单号一致
    /// - `accrual` 不为负
    /// - 非 PROCESSED 状态不得携带正的 `accrual`
    pub fn into_record(self, requested: &str) -> Result<AccrualRecord, String> {
        if self.order.trim().is_empty() {
            return Err("order 字段为空".to_string());
        }
        if self.order != requested {
            return Err(format!(
                "订单号不一致: 请求 {}, 响应 {}",
                requested, self.order
            ));
        }

        let accrual_cents = match self.accrual {
            None => None,
            Some(value) if value < Decimal::ZERO => {
                return Err(format!("accrual 为负数: {}", value));
            }
            Some(value) => Some(to_cents(value).ok_or_else(|| format!("accrual 超出范围: {}", value))?),
        };

        if self.status != AccrualStatus::Processed && accrual_cents.is_some_and(|c| c > 0) {
            return Err(format!(
                "状态 {:?} 不应携带正的 accrual: {:?}",
                self.status, self.accrual
            ));
        }

        Ok(AccrualRecord {
            order: self.order,
            status: self.status,
            accrual_cents,
        })
    }
}

/// 一次查询的结果，封闭集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// 200，已校验的记录
    Found(AccrualRecord),
    /// 204，订单未在积分系统登记
    NotRegistered,
    /// 429，需等待给定时长后再请求
    RateLimited(Duration),
    /// 5xx 或其他非预期状态码
    UpstreamError(u16),
    /// 网络错误、超时或读取响应体失败
    TransportFailure(String),
    /// 响应体无法解析或违反约定
    Malformed(String),
}

impl AccrualOutcome {
    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NotRegistered => "not_registered",
            Self::RateLimited(_) => "rate_limited",
            Self::UpstreamError(_) => "upstream_error",
            Self::TransportFailure(_) => "transport_failure",
            Self::Malformed(_) => "malformed",
        }
    }
}
