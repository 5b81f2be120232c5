//! Gemini generateContent 适配器
//!
//! - Key 通过查询参数 `key=` 传递
//! - system 消息折叠进 `systemInstruction`
//! - assistant 映射为 `model`，连续同角色的消息合并为一个 turn

use super::http::{non_empty, send_json};
use super::traits::{AdapterRequest, AdapterResponse, BackendError, ChatAdapter};
use crate::models::{ChatMessage, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// 把通用消息列表转换为 Gemini 请求体
pub(crate) fn build_request(messages: &[ChatMessage]) -> GenerateContentRequest {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let mut system_instruction = (!system.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part {
            text: system.join("\n\n"),
        }],
    });

    let mut contents: Vec<Content> = Vec::new();
    for msg in messages.iter().filter(|m| m.role != Role::System) {
        let role = match msg.role {
            Role::Assistant => "model",
            _ => "user",
        };
        match contents.last_mut() {
            Some(last) if last.role.as_deref() == Some(role) => {
                last.parts.push(Part {
                    text: msg.content.clone(),
                });
            }
            _ => contents.push(Content {
                role: Some(role.to_string()),
                parts: vec![Part {
                    text: msg.content.clone(),
                }],
            }),
        }
    }

    // contents 不能为空：只有 system 消息时作为唯一的 user turn 发送
    if contents.is_empty() {
        if let Some(mut instruction) = system_instruction.take() {
            instruction.role = Some("user".to_string());
            contents.push(instruction);
        }
    }

    GenerateContentRequest {
        system_instruction,
        contents,
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, BackendError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(BackendError::malformed(format!("gemini 未返回候选结果: {reason}")));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    non_empty(text, "gemini")
}

pub struct GeminiAdapter {
    client: Client,
}

impl GeminiAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatAdapter for GeminiAdapter {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn execute(&self, request: AdapterRequest<'_>) -> Result<AdapterResponse, BackendError> {
        let url = format!(
            "{}/models/{}:generateContent",
            request.provider.endpoint_base(),
            request.model
        );
        let body = build_request(request.messages);

        let builder = self
            .client
            .post(&url)
            .query(&[("key", request.key.expose())])
            .json(&body);

        let (response, latency) = send_json::<GenerateContentResponse>(builder).await?;
        let content = extract_text(response)?;
        Ok(AdapterResponse { content, latency })
    }
}
