//! Cohere v2 chat 适配器

use super::http::{non_empty, send_json};
use super::openai::WireMessage;
use super::traits::{AdapterRequest, AdapterResponse, BackendError, ChatAdapter};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// 默认客户端名称（`X-Client-Name`）
pub const DEFAULT_CLIENT_NAME: &str = "ai-router";

#[derive(Debug, Serialize)]
struct CohereChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct CohereChatResponse {
    #[serde(default)]
    message: Option<CohereMessage>,
}

#[derive(Debug, Deserialize)]
struct CohereMessage {
    #[serde(default)]
    content: Vec<CohereContent>,
}

#[derive(Debug, Deserialize)]
struct CohereContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl CohereChatResponse {
    fn into_text(self) -> Result<String, BackendError> {
        let message = self
            .message
            .ok_or_else(|| BackendError::malformed("cohere 响应缺少 message 字段"))?;
        let text: String = message
            .content
            .into_iter()
            .filter(|c| c.kind == "text")
            .filter_map(|c| c.text)
            .collect();
        non_empty(text, "cohere")
    }
}

pub struct CohereAdapter {
    client: Client,
    client_name: String,
}

impl CohereAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }
}

#[async_trait]
impl ChatAdapter for CohereAdapter {
    fn name(&self) -> &'static str {
        "cohere"
    }

    async fn execute(&self, request: AdapterRequest<'_>) -> Result<AdapterResponse, BackendError> {
        let url = format!("{}/v2/chat", request.provider.endpoint_base());
        let body = CohereChatRequest {
            model: request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
        };

        let builder = self
            .client
            .post(&url)
            .bearer_auth(request.key.expose())
            .header("X-Client-Name", &self.client_name)
            .json(&body);

        let (response, latency) = send_json::<CohereChatResponse>(builder).await?;
        let content = response.into_text()?;
        Ok(AdapterResponse { content, latency })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ErrorKind;
    use crate::credential::ApiKey;
    use crate::models::{ChatMessage, ProtocolFamily, Provider};
    use mockito::Matcher;
    use serde_json::json;

    fn cohere_provider(url: String) -> Provider {
        Provider::new("cohere", ProtocolFamily::Cohere, url, &["command-r"], 5)
    }

    #[tokio::test]
    async fn test_execute_filters_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/chat")
            .match_header("authorization", "Bearer co-key")
            .match_header("x-client-name", "tg-bot")
            .match_body(Matcher::PartialJson(json!({
                "model": "command-r",
                "messages": [{"role": "system", "content": "s"}, {"role": "user", "content": "u"}]
            })))
            .with_status(200)
            .with_body(
                r#"{"id":"x","message":{"role":"assistant","content":[{"type":"text","text":"one "},{"type":"thinking","text":"hidden"},{"type":"text","text":"two"}]}}"#,
            )
            .create_async()
            .await;

        let provider = cohere_provider(server.url());
        let key = ApiKey::new("co-key");
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let response = CohereAdapter::new(Client::new())
            .with_client_name("tg-bot")
            .execute(AdapterRequest {
                provider: &provider,
                key: &key,
                messages: &messages,
                model: "command-r",
            })
            .await
            .unwrap();

        assert_eq!(response.content, "one two");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_message_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/chat")
            .with_status(200)
            .with_body(r#"{"id":"x"}"#)
            .create_async()
            .await;

        let provider = cohere_provider(server.url());
        let key = ApiKey::new("co-key");
        let messages = vec![ChatMessage::user("u")];
        let err = CohereAdapter::new(Client::new())
            .execute(AdapterRequest {
                provider: &provider,
                key: &key,
                messages: &messages,
                model: "command-r",
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
    }
}
