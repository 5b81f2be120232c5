//! Provider 选择器
//!
//! 综合静态优先级、实时性能与可用性，为每次请求挑选一个 Provider

use crate::catalog::ProviderCatalog;
use crate::credential::CredentialStore;
use crate::models::{Provider, ProviderId};
use crate::resilience::UnavailableSet;
use crate::telemetry::PerformanceTracker;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// 评分系数
///
/// ```text
/// score = (priority_base - priority) * priority_step
///       + success_rate * success_weight
///       - avg_latency * latency_weight
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub priority_base: f64,
    pub priority_step: f64,
    pub success_weight: f64,
    pub latency_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            priority_base: 10.0,
            priority_step: 1.0,
            success_weight: 10.0,
            latency_weight: 1.0,
        }
    }
}

impl ScoringConfig {
    /// 按给定指标计算分数
    pub fn score(&self, priority: i32, success_rate: f64, avg_latency: f64) -> f64 {
        (self.priority_base - priority as f64) * self.priority_step
            + success_rate * self.success_weight
            - avg_latency * self.latency_weight
    }
}

/// Provider 选择器
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    catalog: Arc<ProviderCatalog>,
    credentials: Arc<CredentialStore>,
    tracker: Arc<PerformanceTracker>,
    unavailable: Arc<UnavailableSet>,
    scoring: ScoringConfig,
}

impl ProviderSelector {
    pub fn new(
        catalog: Arc<ProviderCatalog>,
        credentials: Arc<CredentialStore>,
        tracker: Arc<PerformanceTracker>,
        unavailable: Arc<UnavailableSet>,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            catalog,
            credentials,
            tracker,
            unavailable,
            scoring,
        }
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// 当前分数；目录中不存在的 Provider 返回负无穷
    pub fn score(&self, provider: &ProviderId) -> f64 {
        match self.catalog.get(provider) {
            Some(p) => self.score_provider(p),
            None => f64::NEG_INFINITY,
        }
    }

    fn score_provider(&self, provider: &Provider) -> f64 {
        let record = self.tracker.snapshot(&provider.id);
        self.scoring
            .score(provider.priority, record.success_rate(), record.avg_latency())
    }

    /// 挑选下一个 Provider
    ///
    /// 候选：不在 `exclude` 中、不在不可用集合中、且至少有一个 Key。
    /// 没有候选且所有有 Key 的 Provider 都不可用时，清空不可用集合后重选。
    /// 分数最高者胜出，同分取声明顺序靠前者。
    pub fn pick_next(&self, exclude: &HashSet<ProviderId>) -> Option<ProviderId> {
        let keyed: Vec<&Provider> = self
            .catalog
            .iter()
            .filter(|p| self.credentials.has_keys(&p.id))
            .collect();

        if let Some(id) = self.best_candidate(&keyed, exclude) {
            return Some(id);
        }

        if self
            .unavailable
            .reset_if_all_unavailable(keyed.iter().map(|p| &p.id))
        {
            return self.best_candidate(&keyed, exclude);
        }

        None
    }

    fn best_candidate(
        &self,
        keyed: &[&Provider],
        exclude: &HashSet<ProviderId>,
    ) -> Option<ProviderId> {
        let mut best: Option<(&Provider, f64)> = None;
        for provider in keyed {
            if exclude.contains(&provider.id) || self.unavailable.contains(&provider.id) {
                continue;
            }
            let score = self.score_provider(provider);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((provider, score)),
            }
        }

        best.map(|(provider, score)| {
            tracing::debug!(provider = %provider.id, score, "选中 Provider");
            provider.id.clone()
        })
    }
}
