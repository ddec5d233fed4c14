//! 积分计算系统 HTTP 客户端
//!
//! 将 HTTP 响应映射为封闭的 `AccrualOutcome` 集合，调用之间不保留任何状态。
//! 通过 `AccrualSource` trait 抽象，便于测试时注入 mock 实现。

use std::time::Duration;

use async_trait::async_trait;
use gophermart_shared::config::AccrualConfig;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use tracing::debug;

use super::models::{AccrualOutcome, AccrualResponse};

// ---------------------------------------------------------------------------
// Trait 抽象
// ---------------------------------------------------------------------------

/// 积分查询来源
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccrualSource: Send + Sync {
    async fn fetch(&self, order_number: &str) -> AccrualOutcome;
}

// ---------------------------------------------------------------------------
// HTTP 实现
// ---------------------------------------------------------------------------

/// 积分计算系统客户端
#[derive(Clone)]
pub struct AccrualClient {
    http: reqwest::Client,
    base_url: String,
    default_retry_after: Duration,
}

impl AccrualClient {
    pub fn new(config: &AccrualConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_retry_after: config.default_retry_after(),
        })
    }

    fn order_url(&self, order_number: &str) -> String {
        format!("{}/api/orders/{}", self.base_url, order_number)
    }

    async fn fetch_inner(&self, order_number: &str) -> AccrualOutcome {
        let response = match self.http.get(self.order_url(order_number)).send().await {
            Ok(resp) => resp,
            Err(e) => return AccrualOutcome::TransportFailure(e.to_string()),
        };

        match response.status() {
            StatusCode::OK => {
                let body = match response.bytes().await {
                    Ok(body) => body,
                    Err(e) => {
                        return AccrualOutcome::TransportFailure(format!("读取响应体失败: {}", e));
                    }
                };
                match serde_json::from_slice::<AccrualResponse>(&body) {
                    Ok(parsed) => match parsed.into_record(order_number) {
                        Ok(record) => AccrualOutcome::Found(record),
                        Err(reason) => AccrualOutcome::Malformed(reason),
                    },
                    Err(e) => AccrualOutcome::Malformed(format!("响应体解析失败: {}", e)),
                }
            }
            StatusCode::NO_CONTENT => AccrualOutcome::NotRegistered,
            StatusCode::TOO_MANY_REQUESTS => {
                let header = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok());
                AccrualOutcome::RateLimited(parse_retry_after(header, self.default_retry_after))
            }
            other => AccrualOutcome::UpstreamError(other.as_u16()),
        }
    }
}

#[async_trait]
impl AccrualSource for AccrualClient {
    async fn fetch(&self, order_number: &str) -> AccrualOutcome {
        let outcome = self.fetch_inner(order_number).await;
        debug!(order = %order_number, outcome = outcome.label(), "积分系统查询完成");
        outcome
    }
}

/// 解析 Retry-After 头（整数秒），缺失或无法解析时使用默认值
pub fn parse_retry_after(header: Option<&str>, default: Duration) -> Duration {
    header
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
