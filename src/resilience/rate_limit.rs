//! 按用户的出站请求限流（滑动窗口）
//!
//! 每个用户一个时间戳队列，检查时惰性清理窗口外的记录；
//! 每 [`CLEANUP_INTERVAL`] 次检查顺带移除已经空闲的用户

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// 两次空闲用户清理之间的检查次数
pub const CLEANUP_INTERVAL: u64 = 256;

/// 限流配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// 窗口长度（秒）
    pub window_secs: u64,
    /// 窗口内允许的最大请求数，0 表示不限制
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 10,
        }
    }
}

impl RateLimitConfig {
    pub fn new(window_secs: u64, max_requests: u32) -> Self {
        Self {
            window_secs,
            max_requests,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// 滑动窗口限流器
#[derive(Debug, Default)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, VecDeque<Instant>>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// 检查并登记一次请求
    ///
    /// 允许时记录当前时间并返回 `Ok`；超限时不记录，返回还需等待的时长
    pub fn check(&self, user_id: &str) -> Result<(), Duration> {
        if self.config.max_requests == 0 {
            return Ok(());
        }

        // 必须在持有任何条目引用之前清理，retain 需要所有分片的写锁
        if (self.checks.fetch_add(1, Ordering::Relaxed) + 1) % CLEANUP_INTERVAL == 0 {
            let removed = self.cleanup_expired();
            if removed > 0 {
                tracing::debug!(removed, "清理空闲的限流记录");
            }
        }

        let now = Instant::now();
        let window = self.config.window();
        let mut timestamps = self.windows.entry(user_id.to_string()).or_default();

        while let Some(front) = timestamps.front() {
            if now.duration_since(*front) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.config.max_requests as usize {
            let retry_after = timestamps
                .front()
                .map(|oldest| window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(window);
            return Err(retry_after);
        }

        timestamps.push_back(now);
        Ok(())
    }

    /// 窗口内已登记的请求数
    pub fn current_count(&self, user_id: &str) -> usize {
        let now = Instant::now();
        let window = self.config.window();
        self.windows
            .get(user_id)
            .map(|ts| ts.iter().filter(|t| now.duration_since(**t) < window).count())
            .unwrap_or(0)
    }

    /// 清理已经没有有效记录的用户，返回清理数量
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let window = self.config.window();
        let before = self.windows.len();
        self.windows.retain(|_, ts| {
            ts.back()
                .is_some_and(|last| now.duration_since(*last) < window)
        });
        before.saturating_sub(self.windows.len())
    }

    /// 当前记录中的用户数
    pub fn tracked_users(&self) -> usize {
        self.windows.len()
    }
}
