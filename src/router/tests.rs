//! 路由模块属性测试
//!
//! 使用 proptest 进行属性测试

use crate::catalog::ProviderCatalog;
use crate::credential::CredentialStore;
use crate::models::{ProtocolFamily, Provider, ProviderId};
use crate::resilience::UnavailableSet;
use crate::router::{ProviderSelector, ScoringConfig};
use crate::telemetry::PerformanceTracker;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// 单个 Provider 的随机状态：优先级、成功/失败次数、平均延迟、是否有 Key、是否不可用
#[derive(Debug, Clone)]
struct ProviderState {
    priority: i32,
    successes: u32,
    failures: u32,
    latency: f64,
    keyed: bool,
    unavailable: bool,
}

fn arb_provider_state() -> impl Strategy<Value = ProviderState> {
    (
        1i32..=6,
        0u32..20,
        0u32..20,
        0.0f64..5.0,
        prop::bool::weighted(0.8),
        prop::bool::weighted(0.2),
    )
        .prop_map(
            |(priority, successes, failures, latency, keyed, unavailable)| ProviderState {
                priority,
                successes,
                failures,
                latency,
                keyed,
                unavailable,
            },
        )
}

fn build(states: &[ProviderState]) -> ProviderSelector {
    let providers = states
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Provider::new(
                format!("p{i}"),
                ProtocolFamily::OpenaiCompatible,
                format!("http://p{i}"),
                &["m"],
                s.priority,
            )
        })
        .collect();
    let catalog = Arc::new(ProviderCatalog::new(providers));

    let mut credentials = CredentialStore::new();
    let tracker = Arc::new(PerformanceTracker::new());
    let unavailable = Arc::new(UnavailableSet::new());
    for (i, s) in states.iter().enumerate() {
        let id = ProviderId::new(format!("p{i}"));
        if s.keyed {
            credentials = credentials.with_keys(id.clone(), &["k"]);
        }
        for _ in 0..s.successes {
            tracker.record(&id, true, s.latency);
        }
        for _ in 0..s.failures {
            tracker.record(&id, false, 0.0);
        }
        if s.unavailable {
            unavailable.mark(&id);
        }
    }

    ProviderSelector::new(
        catalog,
        Arc::new(credentials),
        tracker,
        unavailable,
        ScoringConfig::default(),
    )
}

proptest! {
    /// 相同状态下 pick_next 的结果确定
    #[test]
    fn prop_pick_next_is_deterministic(
        states in proptest::collection::vec(arb_provider_state(), 1..8),
        excluded in proptest::collection::hash_set(0usize..8, 0..3)
    ) {
        let exclude: HashSet<ProviderId> =
            excluded.iter().map(|i| ProviderId::new(format!("p{i}"))).collect();

        let first = build(&states).pick_next(&exclude);
        let second = build(&states).pick_next(&exclude);
        prop_assert_eq!(first, second);
    }

    /// 选中的 Provider 有 Key、未被排除，且分数不低于其他任何候选
    #[test]
    fn prop_pick_next_is_best_candidate(
        states in proptest::collection::vec(arb_provider_state(), 1..8)
    ) {
        let any_available = states.iter().any(|s| s.keyed && !s.unavailable);
        let selector = build(&states);

        match selector.pick_next(&HashSet::new()) {
            Some(chosen) => {
                let index: usize = chosen.as_str()[1..].parse().unwrap();
                prop_assert!(states[index].keyed);
                let chosen_score = selector.score(&chosen);

                for (i, s) in states.iter().enumerate() {
                    let eligible = s.keyed && (!any_available || !s.unavailable);
                    if !eligible {
                        continue;
                    }
                    let score = selector.score(&ProviderId::new(format!("p{i}")));
                    prop_assert!(score <= chosen_score);
                    if i < index {
                        prop_assert!(score < chosen_score, "同分时应选择靠前的 p{}", i);
                    }
                }
            }
            None => prop_assert!(states.iter().all(|s| !s.keyed)),
        }
    }
}
