//! 超时控制实现
//!
//! 单次尝试的超时，以及调用方的协作式取消

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// 超时配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// 单次请求超时（毫秒），0 表示无超时
    pub request_timeout_ms: u64,
    /// 建立连接超时（毫秒），0 表示无超时
    pub connect_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
        }
    }
}

impl TimeoutConfig {
    pub fn new(request_timeout_ms: u64, connect_timeout_ms: u64) -> Self {
        Self {
            request_timeout_ms,
            connect_timeout_ms,
        }
    }

    pub fn no_timeout() -> Self {
        Self::new(0, 0)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }
}

/// 超时错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeoutError {
    #[error("请求超时: 配置 {timeout_ms}ms, 已耗时 {elapsed_ms}ms")]
    RequestTimeout { timeout_ms: u64, elapsed_ms: u64 },
    #[error("操作已取消")]
    Cancelled,
}

/// 超时控制器
#[derive(Debug, Clone, Default)]
pub struct TimeoutController {
    config: TimeoutConfig,
}

impl TimeoutController {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TimeoutConfig {
        &self.config
    }

    /// 带超时执行异步操作
    pub async fn execute_with_timeout<F, T>(&self, operation: F) -> Result<T, TimeoutError>
    where
        F: Future<Output = T>,
    {
        let start = Instant::now();

        match self.config.request_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, operation).await.map_err(|_| {
                TimeoutError::RequestTimeout {
                    timeout_ms: self.config.request_timeout_ms,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                }
            }),
            None => Ok(operation.await),
        }
    }

    /// 执行操作直到完成或被取消（不附加超时）
    pub async fn execute_with_cancel<F, T>(
        &self,
        operation: F,
        cancel_token: &CancellationToken,
    ) -> Result<T, TimeoutError>
    where
        F: Future<Output = T>,
    {
        if cancel_token.is_cancelled() {
            return Err(TimeoutError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => Err(TimeoutError::Cancelled),
            result = operation => Ok(result),
        }
    }
}
