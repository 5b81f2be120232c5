//! Provider 性能统计
//!
//! 每个 Provider 一条累计记录，进程生命周期内单调递增，不做淘汰

use crate::models::ProviderId;
use dashmap::DashMap;
use serde::Serialize;

/// 冷启动时的成功率
pub const COLD_START_SUCCESS_RATE: f64 = 0.5;

/// 单个 Provider 的累计记录
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceRecord {
    /// 总尝试次数
    pub total: u64,
    /// 成功次数
    pub successful: u64,
    /// 成功请求的累计延迟（秒）
    pub cumulative_latency: f64,
}

impl PerformanceRecord {
    /// 成功率，无记录时为 0.5
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            COLD_START_SUCCESS_RATE
        } else {
            self.successful as f64 / self.total as f64
        }
    }

    /// 成功请求的平均延迟（秒），无成功记录时为 0
    pub fn avg_latency(&self) -> f64 {
        if self.successful == 0 {
            0.0
        } else {
            self.cumulative_latency / self.successful as f64
        }
    }
}

/// 性能追踪器
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    records: DashMap<ProviderId, PerformanceRecord>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次尝试
    ///
    /// 失败时 `latency_secs` 被忽略
    pub fn record(&self, provider: &ProviderId, success: bool, latency_secs: f64) {
        let mut entry = self.records.entry(provider.clone()).or_default();
        entry.total += 1;
        if success {
            entry.successful += 1;
            entry.cumulative_latency += latency_secs.max(0.0);
        }
    }

    pub fn success_rate(&self, provider: &ProviderId) -> f64 {
        self.snapshot(provider).success_rate()
    }

    pub fn avg_latency(&self, provider: &ProviderId) -> f64 {
        self.snapshot(provider).avg_latency()
    }

    /// 当前记录的拷贝，未出现过的 Provider 返回全零记录
    pub fn snapshot(&self, provider: &ProviderId) -> PerformanceRecord {
        self.records
            .get(provider)
            .map(|r| *r)
            .unwrap_or_default()
    }
}
