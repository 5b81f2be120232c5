//! 故障转移：Provider 级别的熔断集合
//!
//! 某个 Provider 的所有 Key 都被排除后进入不可用集合，选择器跳过它。
//! 所有配置了 Key 的 Provider 都不可用时整体清空，保证系统始终可用。

use crate::models::ProviderId;
use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct UnavailableSet {
    providers: DashSet<ProviderId>,
}

impl UnavailableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记为不可用，返回是否为新加入
    pub fn mark(&self, provider: &ProviderId) -> bool {
        let inserted = self.providers.insert(provider.clone());
        if inserted {
            tracing::warn!(provider = %provider, "Provider 的所有 Key 均已失效，暂时停用");
        }
        inserted
    }

    pub fn contains(&self, provider: &ProviderId) -> bool {
        self.providers.contains(provider)
    }

    pub fn remove(&self, provider: &ProviderId) -> bool {
        self.providers.remove(provider).is_some()
    }

    pub fn clear(&self) {
        self.providers.clear();
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// 当前不可用的 Provider（排序后）
    pub fn snapshot(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.providers.iter().map(|id| id.key().clone()).collect();
        ids.sort();
        ids
    }

    /// 若 `keyed` 中每个 Provider 都不可用则清空集合，返回是否发生了清空
    ///
    /// `keyed` 为空时不做任何事
    pub fn reset_if_all_unavailable<'a, I>(&self, keyed: I) -> bool
    where
        I: IntoIterator<Item = &'a ProviderId>,
    {
        let mut any = false;
        for id in keyed {
            any = true;
            if !self.contains(id) {
                return false;
            }
        }
        if any {
            tracing::info!("所有 Provider 均不可用，重置不可用集合");
            self.clear();
        }
        any
    }
}
