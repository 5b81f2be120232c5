//! OpenAI 兼容协议适配器
//!
//! 适用于 Groq、OpenRouter 以及任何实现 `/chat/completions` 的服务

use super::http::{non_empty, send_json};
use super::traits::{AdapterRequest, AdapterResponse, BackendError, ChatAdapter};
use crate::models::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// 默认采样温度
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role.as_str(),
            content: &msg.content,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    /// 取第一个 choice 的文本
    pub(crate) fn into_text(self, provider: &str) -> Result<String, BackendError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::malformed(format!("{provider} 响应缺少 choices[0].message.content")))?;
        non_empty(content, provider)
    }
}

/// OpenAI 兼容适配器
pub struct OpenAiCompatibleAdapter {
    client: Client,
    temperature: Option<f32>,
}

impl OpenAiCompatibleAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            temperature: Some(DEFAULT_TEMPERATURE),
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl ChatAdapter for OpenAiCompatibleAdapter {
    fn name(&self) -> &'static str {
        "openai_compatible"
    }

    async fn execute(&self, request: AdapterRequest<'_>) -> Result<AdapterResponse, BackendError> {
        let url = format!("{}/chat/completions", request.provider.endpoint_base());
        let body = ChatCompletionRequest {
            model: request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: self.temperature,
        };

        let builder = self
            .client
            .post(&url)
            .bearer_auth(request.key.expose())
            .json(&body);

        let (response, latency) = send_json::<ChatCompletionResponse>(builder).await?;
        let content = response.into_text(request.provider.id.as_str())?;
        Ok(AdapterResponse { content, latency })
    }
}
