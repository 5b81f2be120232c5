//! Cerebras 适配器
//!
//! OpenAI 请求体的变体：使用 `max_completion_tokens`，温度上限 1.5

use super::http::send_json;
use super::openai::{ChatCompletionResponse, WireMessage, DEFAULT_TEMPERATURE};
use super::traits::{AdapterRequest, AdapterResponse, BackendError, ChatAdapter};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Cerebras 接受的最大温度
pub const MAX_TEMPERATURE: f32 = 1.5;
/// 默认最大输出 token 数
pub const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct CerebrasRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_completion_tokens: u32,
    temperature: f32,
}

pub struct CerebrasAdapter {
    client: Client,
    temperature: f32,
    max_completion_tokens: u32,
}

impl CerebrasAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            temperature: DEFAULT_TEMPERATURE,
            max_completion_tokens: DEFAULT_MAX_COMPLETION_TOKENS,
        }
    }

    /// 超出范围的温度会被截断到 `[0, 1.5]`
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, MAX_TEMPERATURE);
        self
    }

    pub fn with_max_completion_tokens(mut self, tokens: u32) -> Self {
        self.max_completion_tokens = tokens;
        self
    }
}

#[async_trait]
impl ChatAdapter for CerebrasAdapter {
    fn name(&self) -> &'static str {
        "cerebras"
    }

    async fn execute(&self, request: AdapterRequest<'_>) -> Result<AdapterResponse, BackendError> {
        let url = format!("{}/chat/completions", request.provider.endpoint_base());
        let body = CerebrasRequest {
            model: request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_completion_tokens: self.max_completion_tokens,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::ApiKey;
    use crate::models::{ChatMessage, ProtocolFamily, Provider};
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_temperature_is_clamped() {
        let adapter = CerebrasAdapter::new(Client::new()).with_temperature(2.0);
        assert_eq!(adapter.temperature, MAX_TEMPERATURE);
        let adapter = CerebrasAdapter::new(Client::new()).with_temperature(-1.0);
        assert_eq!(adapter.temperature, 0.0);
    }

    #[tokio::test]
    async fn test_request_uses_max_completion_tokens() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer csk-abc")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "model": "llama-3.3-70b",
                    "max_completion_tokens": 512
                })),
                Matcher::Regex(r#""temperature":1\.5"#.to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let provider = Provider::new(
            "cerebras",
            ProtocolFamily::Cerebras,
            format!("{}/v1/", server.url()),
            &["llama-3.3-70b"],
            3,
        );
        let key = ApiKey::new("csk-abc");
        let messages = vec![ChatMessage::user("ping")];
        let response = CerebrasAdapter::new(Client::new())
            .with_temperature(9.0)
            .with_max_completion_tokens(512)
            .execute(AdapterRequest {
                provider: &provider,
                key: &key,
                messages: &messages,
                model: "llama-3.3-70b",
            })
            .await
            .unwrap();

        assert_eq!(response.content, "ok");
        mock.assert_async().await;
    }
}
