//! 凭证管理模块
//!
//! 每个 Provider 一个 [`KeyRotator`]，启动时从环境变量加载

mod env;
mod rotator;

pub use env::{load_keys_from_env, load_keys_from_vars};
pub use rotator::{ApiKey, KeyRotator, KeyUsage};

use crate::catalog::ProviderCatalog;
use crate::models::ProviderId;
use std::collections::HashMap;
use std::sync::Arc;

/// 凭证仓库：Provider id -> 轮换器
#[derive(Debug, Default, Clone)]
pub struct CredentialStore {
    rotators: HashMap<ProviderId, Arc<KeyRotator>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为目录中的每个 Provider 从环境变量加载 Key
    ///
    /// 没有 Key 的 Provider 同样会登记一个空轮换器，选择时会被跳过
    pub fn from_env(catalog: &ProviderCatalog) -> Self {
        let mut store = Self::new();
        for provider in catalog.iter() {
            let keys = load_keys_from_env(&provider.id);
            if keys.is_empty() {
                tracing::debug!(provider = %provider.id, "未配置 API Key");
            } else {
                tracing::info!(provider = %provider.id, keys = keys.len(), "已加载 API Key");
            }
            store.insert(provider.id.clone(), keys);
        }
        store
    }

    /// 登记（或替换）某个 Provider 的 Key
    pub fn insert(&mut self, provider: ProviderId, keys: Vec<ApiKey>) {
        let rotator = Arc::new(KeyRotator::new(provider.clone(), keys));
        self.rotators.insert(provider, rotator);
    }

    /// 链式登记，便于测试与嵌入方构建
    pub fn with_keys(mut self, provider: impl Into<ProviderId>, keys: &[&str]) -> Self {
        self.insert(provider.into(), keys.iter().map(ApiKey::new).collect());
        self
    }

    pub fn get(&self, provider: &ProviderId) -> Option<&Arc<KeyRotator>> {
        self.rotators.get(provider)
    }

    /// Provider 是否至少配置了一个 Key
    pub fn has_keys(&self, provider: &ProviderId) -> bool {
        self.rotators.get(provider).is_some_and(|r| !r.is_empty())
    }

    /// 已配置 Key 的 Provider 数量
    pub fn configured_count(&self) -> usize {
        self.rotators.values().filter(|r| !r.is_empty()).count()
    }
}
