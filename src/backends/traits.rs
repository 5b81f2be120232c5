//! 协议适配层 Trait 定义
//!
//! 适配器只负责：序列化请求、附加凭证、解析成功响应、把失败归类为 [`ErrorKind`]。
//! 适配器内部不做任何重试，重试策略统一由调度器负责。

use crate::credential::ApiKey;
use crate::logger::sanitize_error_body;
use crate::models::{ChatMessage, Provider};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 配额超限相关的错误消息关键词
pub const QUOTA_EXCEEDED_KEYWORDS: &[&str] = &[
    "quota",
    "rate limit",
    "rate_limit",
    "too many requests",
    "resource_exhausted",
    "throttl",
];

/// 错误体写入日志前的最大长度
const MAX_ERROR_BODY_CHARS: usize = 300;

/// 适配器错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 凭证被拒绝（401/403）
    Auth,
    /// 厂商配额 / 429
    RateLimitedRemote,
    /// 服务端错误（5xx）
    Server,
    /// 请求超时
    Timeout,
    /// 网络错误
    Network,
    /// 2xx 但无法解析，或厂商拒绝了请求格式
    MalformedResponse,
}

impl ErrorKind {
    /// 是否在同一个 Key 上重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Server | ErrorKind::Timeout | ErrorKind::Network
        )
    }

    /// 是否直接放弃当前 Provider（不再尝试它的其他 Key）
    pub fn abandons_provider(&self) -> bool {
        matches!(self, ErrorKind::MalformedResponse)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "AuthError"),
            Self::RateLimitedRemote => write!(f, "RateLimitedRemote"),
            Self::Server => write!(f, "ServerError"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Network => write!(f, "NetworkError"),
            Self::MalformedResponse => write!(f, "MalformedResponse"),
        }
    }
}

/// 适配器错误
///
/// `message` 已脱敏、截断，只用于日志，不会返回给调用方
#[derive(Debug, Clone, Error)]
#[error("{kind}{}: {message}", .status_code.map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct BackendError {
    pub kind: ErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
}

impl BackendError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(kind: ErrorKind, message: impl Into<String>, status: u16) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: Some(status),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    /// 从 HTTP 状态码与响应体推断错误类型
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => ErrorKind::Auth,
            429 => ErrorKind::RateLimitedRemote,
            408 => ErrorKind::Timeout,
            500..=599 => ErrorKind::Server,
            400..=499 if mentions_quota(body) => ErrorKind::RateLimitedRemote,
            _ => ErrorKind::MalformedResponse,
        };
        Self::with_status(kind, sanitize_error_body(body, MAX_ERROR_BODY_CHARS), status)
    }

    /// 从 reqwest 传输层错误推断错误类型
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_decode() {
            ErrorKind::MalformedResponse
        } else {
            ErrorKind::Network
        };
        // reqwest 的错误信息里带 URL，Gemini 的 key 在查询参数中
        let message = sanitize_error_body(&err.without_url().to_string(), MAX_ERROR_BODY_CHARS);
        Self::new(kind, message)
    }
}

fn mentions_quota(body: &str) -> bool {
    let lower = body.to_lowercase();
    QUOTA_EXCEEDED_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// 单次适配器调用的输入
#[derive(Debug, Clone, Copy)]
pub struct AdapterRequest<'a> {
    pub provider: &'a Provider,
    pub key: &'a ApiKey,
    pub messages: &'a [ChatMessage],
    pub model: &'a str,
}

/// 单次适配器调用的输出
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterResponse {
    pub content: String,
    pub latency: Duration,
}

/// 协议适配器 Trait
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// 适配器名称（用于日志）
    fn name(&self) -> &'static str;

    /// 发送一次聊天请求
    async fn execute(&self, request: AdapterRequest<'_>) -> Result<AdapterResponse, BackendError>;
}
