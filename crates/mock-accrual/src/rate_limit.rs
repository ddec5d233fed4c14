//! 固定窗口限流
//!
//! 每个窗口内最多放行 `max_requests` 个请求，超出的请求得到窗口剩余时间
//! （向上取整到秒，至少 1 秒），作为 Retry-After 返回。

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// 限流配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    used: u32,
}

/// 固定窗口限流器
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    window: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            window: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// 尝试占用一个请求名额，超限时返回需要等待的秒数
    pub fn try_acquire(&self) -> Result<(), u64> {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> Result<(), u64> {
        let mut window = self.window.lock();

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.config.window {
            window.started = now;
            window.used = 0;
        }

        if window.used < self.config.max_requests {
            window.used += 1;
            return Ok(());
        }

        let remaining = self
            .config
            .window
            .saturating_sub(now.saturating_duration_since(window.started));
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        Err(secs.max(1))
    }
}
