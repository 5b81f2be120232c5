//! 重试机制实现
//!
//! 同一个 Key 上的有限次重试，指数退避（不加抖动）

use crate::backends::BackendError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// 重试配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// 单个 Key 的最大尝试次数（包括首次）
    pub max_attempts: u32,
    /// 基础延迟（毫秒）
    pub base_delay_ms: u64,
    /// 最大延迟（毫秒）
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 30000,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
        }
    }
}

/// 重试耗尽或遇到不可重试错误
#[derive(Debug, Clone)]
pub struct RetryError {
    /// 实际尝试次数
    pub attempts: u32,
    /// 最后一次错误
    pub last_error: BackendError,
}

impl std::fmt::Display for RetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "尝试 {} 次后失败 - {}", self.attempts, self.last_error)
    }
}

impl std::error::Error for RetryError {}

/// 重试器
#[derive(Debug, Clone)]
pub struct Retrier {
    config: RetryConfig,
}

impl Retrier {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// 第 N 次失败后的退避时间（N 从 0 开始）
    ///
    /// 公式: min(base_delay * 2^attempt, max_delay)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay = self
            .config
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.config.max_delay_ms);
        Duration::from_millis(delay)
    }

    /// 完整的退避序列
    pub fn compute_backoff_sequence(&self) -> Vec<Duration> {
        (0..self.config.max_attempts)
            .map(|attempt| self.backoff_delay(attempt))
            .collect()
    }

    /// 带重试执行一次后端调用
    ///
    /// 只有 [`ErrorKind::is_retryable`](crate::backends::ErrorKind::is_retryable)
    /// 的错误才会重试。最后一次失败后立即返回，不再退避；
    /// 换 Key 前的间隔由调用方按 `backoff_delay(attempts - 1)` 决定。
    /// `operation` 的参数是从 1 开始的尝试序号。
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match operation(attempt).await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !error.kind.is_retryable() {
                        return Err(RetryError {
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    if attempt >= max_attempts {
                        return Err(RetryError {
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    let delay = self.backoff_delay(attempt - 1);
                    tracing::debug!(
                        attempt,
                        kind = %error.kind,
                        delay_ms = delay.as_millis() as u64,
                        "可重试错误，退避"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::backends::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 2000);
        assert_eq!(config.max_delay_ms, 30000);
    }

    #[test]
    fn test_backoff_sequence() {
        let retrier = Retrier::with_defaults();
        assert_eq!(
            retrier.compute_backoff_sequence(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[test]
    fn test_backoff_delay_max_cap() {
        let retrier = Retrier::new(RetryConfig::new(10, 1000, 5000));
        assert_eq!(retrier.backoff_delay(5), Duration::from_millis(5000));
        assert_eq!(retrier.backoff_delay(63), Duration::from_millis(5000));
        assert_eq!(retrier.backoff_delay(200), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_execute_success_first_try() {
        let retrier = Retrier::with_defaults();
        let result = retrier.execute(|_| async { Ok::<_, BackendError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_execute_non_retryable_error() {
        let retrier = Retrier::with_defaults();
        let calls = AtomicU32::new(0);

        let err = retrier
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<i32, _>(BackendError::with_status(ErrorKind::Auth, "denied", 401)) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(err.last_error.kind, ErrorKind::Auth);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_retries_then_succeeds() {
        let retrier = Retrier::with_defaults();
        let start = tokio::time::Instant::now();

        let result = retrier
            .execute(|attempt| async move {
                if attempt < 3 {
                    Err(BackendError::new(ErrorKind::Network, "reset"))
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_exhausted_returns_without_final_backoff() {
        let retrier = Retrier::with_defaults();
        let start = tokio::time::Instant::now();

        let err = retrier
            .execute(|_| async { Err::<(), _>(BackendError::with_status(ErrorKind::Server, "boom", 500)) })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }
}
