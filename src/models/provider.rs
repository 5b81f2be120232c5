//! Provider 配置模型
//!
//! 进程启动时从静态配置创建，之后不再修改

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Provider 标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 环境变量前缀：大写，`-` 替换为 `_`
    ///
    /// `open-router` -> `OPEN_ROUTER`
    pub fn env_prefix(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                '-' | '.' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect()
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ProviderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// 协议族，决定使用哪个适配器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolFamily {
    /// OpenAI Chat Completions 兼容
    OpenaiCompatible,
    /// Google Gemini generateContent
    Gemini,
    /// Cerebras（OpenAI 变体）
    Cerebras,
    /// Cohere v2 chat
    Cohere,
}

impl std::fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolFamily::OpenaiCompatible => write!(f, "openai_compatible"),
            ProtocolFamily::Gemini => write!(f, "gemini"),
            ProtocolFamily::Cerebras => write!(f, "cerebras"),
            ProtocolFamily::Cohere => write!(f, "cohere"),
        }
    }
}

/// 建议性速率限制（仅用于日志与展示，不强制执行）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_per_minute: Option<u32>,
}

/// Provider 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub protocol: ProtocolFamily,
    pub base_url: String,
    /// 支持的模型，第一个为默认模型
    pub models: Vec<String>,
    /// 优先级（数字越小越优先）
    pub priority: i32,
    #[serde(default)]
    pub limits: AdvisoryLimits,
}

impl Provider {
    pub fn new(
        id: impl Into<ProviderId>,
        protocol: ProtocolFamily,
        base_url: impl Into<String>,
        models: &[&str],
        priority: i32,
    ) -> Self {
        Self {
            id: id.into(),
            protocol,
            base_url: base_url.into(),
            models: models.iter().map(|m| m.to_string()).collect(),
            priority,
            limits: AdvisoryLimits::default(),
        }
    }

    pub fn with_rpm(mut self, requests_per_minute: u32) -> Self {
        self.limits.requests_per_minute = Some(requests_per_minute);
        self
    }

    pub fn with_tpm(mut self, tokens_per_minute: u32) -> Self {
        self.limits.tokens_per_minute = Some(tokens_per_minute);
        self
    }

    /// 默认模型
    pub fn default_model(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }

    /// 解析本次请求使用的模型：偏好模型在支持列表中则使用，否则回退到默认模型
    pub fn resolve_model(&self, preferred: Option<&str>) -> Option<&str> {
        match preferred {
            Some(model) => self
                .models
                .iter()
                .find(|m| m.as_str() == model)
                .map(String::as_str)
                .or_else(|| self.default_model()),
            None => self.default_model(),
        }
    }

    /// 去掉末尾 `/` 的 base URL
    pub fn endpoint_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
