//! 测试用的脚本化适配器

use super::traits::{AdapterRequest, AdapterResponse, BackendError, ChatAdapter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

type Script = dyn Fn(&AdapterRequest<'_>) -> Result<String, BackendError> + Send + Sync;

/// 一次调用的记录
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub key: String,
    pub model: String,
    pub last_message: String,
    pub at: Instant,
}

/// 按脚本返回结果并记录每次调用
pub(crate) struct ScriptedAdapter {
    script: Box<Script>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedAdapter {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&AdapterRequest<'_>) -> Result<String, BackendError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 每次调用先等待 `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ChatAdapter for ScriptedAdapter {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn execute(&self, request: AdapterRequest<'_>) -> Result<AdapterResponse, BackendError> {
        self.calls.lock().push(RecordedCall {
            key: request.key.expose().to_string(),
            model: request.model.to_string(),
            last_message: request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default(),
            at: Instant::now(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.script)(&request).map(|content| AdapterResponse {
            content,
            latency: Duration::from_millis(250),
        })
    }
}
