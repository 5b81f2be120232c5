//! 适配器注册表：Provider id -> 适配器实例

use super::cerebras::CerebrasAdapter;
use super::cohere::CohereAdapter;
use super::gemini::GeminiAdapter;
use super::openai::OpenAiCompatibleAdapter;
use super::traits::ChatAdapter;
use crate::catalog::ProviderCatalog;
use crate::models::{ProtocolFamily, ProviderId};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;

/// 按协议族创建默认适配器
pub fn adapter_for(protocol: ProtocolFamily, client: Client) -> Arc<dyn ChatAdapter> {
    match protocol {
        ProtocolFamily::OpenaiCompatible => Arc::new(OpenAiCompatibleAdapter::new(client)),
        ProtocolFamily::Gemini => Arc::new(GeminiAdapter::new(client)),
        ProtocolFamily::Cerebras => Arc::new(CerebrasAdapter::new(client)),
        ProtocolFamily::Cohere => Arc::new(CohereAdapter::new(client)),
    }
}

#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ProviderId, Arc<dyn ChatAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为目录中每个 Provider 创建其协议族的默认适配器
    ///
    /// `reqwest::Client` 内部是 `Arc`，所有适配器共享同一个连接池
    pub fn for_catalog(catalog: &ProviderCatalog, client: &Client) -> Self {
        let mut registry = Self::new();
        for provider in catalog.iter() {
            registry.register(provider.id.clone(), adapter_for(provider.protocol, client.clone()));
        }
        registry
    }

    /// 登记或覆盖某个 Provider 的适配器
    pub fn register(&mut self, provider: ProviderId, adapter: Arc<dyn ChatAdapter>) {
        self.adapters.insert(provider, adapter);
    }

    pub fn get(&self, provider: &ProviderId) -> Option<Arc<dyn ChatAdapter>> {
        self.adapters.get(provider).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<(&str, &'static str)> = self
            .adapters
            .iter()
            .map(|(id, adapter)| (id.as_str(), adapter.name()))
            .collect();
        entries.sort_unstable();
        f.debug_map().entries(entries).finish()
    }
}
