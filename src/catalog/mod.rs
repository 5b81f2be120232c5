//! Provider 目录
//!
//! 启动时加载的静态 Provider 描述，保持声明顺序（用于同分时的决胜）

use crate::config::RouterConfig;
use crate::models::{ProtocolFamily, Provider, ProviderId};
use indexmap::IndexMap;

/// Gemini 默认地址
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Groq（OpenAI 兼容）默认地址
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Cerebras 默认地址
pub const CEREBRAS_BASE_URL: &str = "https://api.cerebras.ai/v1";
/// OpenRouter（OpenAI 兼容）默认地址
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Cohere 默认地址
pub const COHERE_BASE_URL: &str = "https://api.cohere.com";

/// Provider 目录
#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    providers: IndexMap<ProviderId, Provider>,
}

impl ProviderCatalog {
    /// 从 Provider 列表构建，重复 id 以先声明者为准
    pub fn new(providers: Vec<Provider>) -> Self {
        let mut map = IndexMap::with_capacity(providers.len());
        for provider in providers {
            if map.contains_key(&provider.id) {
                tracing::warn!(provider = %provider.id, "重复的 Provider 声明已忽略");
                continue;
            }
            map.insert(provider.id.clone(), provider);
        }
        Self { providers: map }
    }

    /// 内置目录
    pub fn builtin() -> Self {
        Self::new(vec![
            Provider::new(
                "gemini",
                ProtocolFamily::Gemini,
                GEMINI_BASE_URL,
                &["gemini-2.0-flash", "gemini-1.5-flash"],
                1,
            )
            .with_rpm(15)
            .with_tpm(1_000_000),
            Provider::new(
                "groq",
                ProtocolFamily::OpenaiCompatible,
                GROQ_BASE_URL,
                &["llama-3.3-70b-versatile", "llama-3.1-8b-instant"],
                2,
            )
            .with_rpm(30)
            .with_tpm(6_000),
            Provider::new(
                "cerebras",
                ProtocolFamily::Cerebras,
                CEREBRAS_BASE_URL,
                &["llama-3.3-70b", "llama3.1-8b"],
                3,
            )
            .with_rpm(30)
            .with_tpm(60_000),
            Provider::new(
                "openrouter",
                ProtocolFamily::OpenaiCompatible,
                OPENROUTER_BASE_URL,
                &["meta-llama/llama-3.3-70b-instruct:free"],
                4,
            )
            .with_rpm(20),
            Provider::new(
                "cohere",
                ProtocolFamily::Cohere,
                COHERE_BASE_URL,
                &["command-r-plus", "command-r"],
                5,
            )
            .with_rpm(20),
        ])
    }

    /// 配置中提供了 Provider 列表则使用之，否则使用内置目录
    pub fn from_config(config: &RouterConfig) -> Self {
        match &config.providers {
            Some(providers) => Self::new(providers.clone()),
            None => Self::builtin(),
        }
    }

    pub fn get(&self, id: &ProviderId) -> Option<&Provider> {
        self.providers.get(id)
    }

    /// 按声明顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ProviderId> {
        self.providers.keys()
    }

    /// 声明顺序中的位置
    pub fn position(&self, id: &ProviderId) -> Option<usize> {
        self.providers.get_index_of(id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
