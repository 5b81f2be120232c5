//! 请求调度器
//!
//! 对调用方只暴露"发送一段对话，拿回文本"。内部流程：
//!
//! ```text
//! 限流检查 -> 选择 Provider -> 取 Key -> 尝试（同 Key 重试）
//!          -> 成功 | 换 Key | 换 Provider -> ... -> 成功 | 全部耗尽
//! ```
//!
//! 每个请求维护自己的 `tried` 集合，一个 Provider 在同一请求中最多被选中一次。

use crate::backends::{
    AdapterRegistry, AdapterRequest, AdapterResponse, BackendError, ChatAdapter, ErrorKind,
};
use crate::catalog::ProviderCatalog;
use crate::config::RouterConfig;
use crate::credential::{ApiKey, CredentialStore, KeyRotator};
use crate::models::{ChatMessage, Provider, ProviderId};
use crate::proxy::{ClientFactoryError, HttpClientFactory};
use crate::resilience::{
    CancellationToken, RateLimiter, Retrier, RetryError, TimeoutController, UnavailableSet,
};
use crate::router::ProviderSelector;
use crate::telemetry::PerformanceTracker;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// 调度错误（对调用方可见）
///
/// 消息与厂商无关，不包含任何凭证或上游错误细节
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("请求过于频繁，请 {}s 后重试", .retry_after.as_secs().max(1))]
    RateLimitedLocally { retry_after: Duration },

    #[error("AI 服务暂时不可用，请稍后重试")]
    AllProvidersExhausted,

    #[error("请求已取消")]
    Cancelled,
}

/// 成功响应
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub content: String,
    pub provider: ProviderId,
    pub model: String,
    pub latency: Duration,
}

/// Provider 状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStatus {
    pub id: ProviderId,
    pub priority: i32,
    pub keys: usize,
    pub usable_keys: usize,
    pub available: bool,
    pub success_rate: f64,
    pub avg_latency: f64,
    pub total_attempts: u64,
    pub score: f64,
}

/// 单个 Provider 回合的结果
enum TurnOutcome {
    Success(ChatReply),
    NextProvider,
}

/// 请求调度器
pub struct Dispatcher {
    catalog: Arc<ProviderCatalog>,
    credentials: Arc<CredentialStore>,
    registry: AdapterRegistry,
    tracker: Arc<PerformanceTracker>,
    unavailable: Arc<UnavailableSet>,
    selector: ProviderSelector,
    rate_limiter: RateLimiter,
    retrier: Retrier,
    timeouts: TimeoutController,
}

impl Dispatcher {
    /// 使用显式组件构建
    pub fn new(
        catalog: ProviderCatalog,
        credentials: CredentialStore,
        registry: AdapterRegistry,
        config: &RouterConfig,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let credentials = Arc::new(credentials);
        let tracker = Arc::new(PerformanceTracker::new());
        let unavailable = Arc::new(UnavailableSet::new());
        let selector = ProviderSelector::new(
            catalog.clone(),
            credentials.clone(),
            tracker.clone(),
            unavailable.clone(),
            config.scoring.clone(),
        );

        Self {
            catalog,
            credentials,
            registry,
            tracker,
            unavailable,
            selector,
            rate_limiter: RateLimiter::new(config.rate_limit.clone()),
            retrier: Retrier::new(config.retry.clone()),
            timeouts: TimeoutController::new(config.timeout.clone()),
        }
    }

    /// 按配置构建：目录来自配置或内置，Key 来自环境变量
    pub fn from_config(config: &RouterConfig) -> Result<Self, ClientFactoryError> {
        let catalog = ProviderCatalog::from_config(config);
        let credentials = CredentialStore::from_env(&catalog);
        let client = HttpClientFactory::from_config(config).build()?;
        let registry = AdapterRegistry::for_catalog(&catalog, &client);

        tracing::info!(
            providers = catalog.len(),
            configured = credentials.configured_count(),
            "调度器已初始化"
        );
        Ok(Self::new(catalog, credentials, registry, config))
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    /// 发送对话，使用所选 Provider 的默认模型
    pub async fn send(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        user_id: &str,
    ) -> Result<ChatReply, DispatchError> {
        self.send_with_model(messages, system_prompt, user_id, None)
            .await
    }

    /// 发送对话，所选 Provider 支持 `model` 时使用之
    pub async fn send_with_model(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        user_id: &str,
        model: Option<&str>,
    ) -> Result<ChatReply, DispatchError> {
        let token = CancellationToken::new();
        self.send_cancellable(messages, system_prompt, user_id, model, &token)
            .await
    }

    /// 可取消的发送
    ///
    /// 令牌在尝试之间或尝试过程中被取消时返回 [`DispatchError::Cancelled`]
    pub async fn send_cancellable(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        user_id: &str,
        model: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ChatReply, DispatchError> {
        if let Err(retry_after) = self.rate_limiter.check(user_id) {
            tracing::warn!(
                user = user_id,
                retry_after_ms = retry_after.as_millis() as u64,
                "用户请求超过限流窗口"
            );
            return Err(DispatchError::RateLimitedLocally { retry_after });
        }

        let messages = with_system_prompt(messages, system_prompt);
        let mut tried: HashSet<ProviderId> = HashSet::new();

        for _ in 0..self.catalog.len() {
            if cancel.is_cancelled() {
                return Err(DispatchError::Cancelled);
            }

            let Some(provider_id) = self.selector.pick_next(&tried) else {
                break;
            };
            tried.insert(provider_id.clone());

            let (Some(provider), Some(rotator), Some(adapter)) = (
                self.catalog.get(&provider_id),
                self.credentials.get(&provider_id),
                self.registry.get(&provider_id),
            ) else {
                tracing::warn!(provider = %provider_id, "Provider 缺少 Key 或适配器，跳过");
                continue;
            };

            let Some(resolved) = provider.resolve_model(model) else {
                tracing::warn!(provider = %provider_id, "Provider 未配置模型，跳过");
                continue;
            };

            match self
                .run_provider_turn(provider, rotator, adapter.as_ref(), resolved, &messages, cancel)
                .await?
            {
                TurnOutcome::Success(reply) => return Ok(reply),
                TurnOutcome::NextProvider => continue,
            }
        }

        tracing::error!(tried = tried.len(), "所有 Provider 均已耗尽");
        Err(DispatchError::AllProvidersExhausted)
    }

    /// 在一个 Provider 上依次尝试它的 Key
    async fn run_provider_turn(
        &self,
        provider: &Provider,
        rotator: &KeyRotator,
        adapter: &dyn ChatAdapter,
        model: &str,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, DispatchError> {
        let mut keys_tried: HashSet<ApiKey> = HashSet::new();

        for _ in 0..rotator.len() {
            let Some(key) = rotator.next() else {
                self.unavailable.mark(&provider.id);
                return Ok(TurnOutcome::NextProvider);
            };
            if !keys_tried.insert(key.clone()) {
                break;
            }

            let request = AdapterRequest {
                provider,
                key: &key,
                messages,
                model,
            };
            let outcome = self
                .timeouts
                .execute_with_cancel(self.attempt_with_retry(adapter, request), cancel)
                .await
                .map_err(|_| DispatchError::Cancelled)?;

            match outcome {
                Ok(response) => {
                    rotator.mark_success(&key);
                    self.tracker
                        .record(&provider.id, true, response.latency.as_secs_f64());
                    tracing::info!(
                        provider = %provider.id,
                        key = %key,
                        model,
                        latency_ms = response.latency.as_millis() as u64,
                        "请求成功"
                    );
                    return Ok(TurnOutcome::Success(ChatReply {
                        content: response.content,
                        provider: provider.id.clone(),
                        model: model.to_string(),
                        latency: response.latency,
                    }));
                }
                Err(RetryError {
                    attempts,
                    last_error: error,
                }) => {
                    rotator.mark_failed(&key);
                    self.tracker.record(&provider.id, false, 0.0);
                    tracing::warn!(
                        provider = %provider.id,
                        key = %key,
                        kind = %error.kind,
                        "Key 请求失败: {}",
                        error.message
                    );

                    if !rotator.has_usable_key() {
                        self.unavailable.mark(&provider.id);
                        return Ok(TurnOutcome::NextProvider);
                    }
                    if error.kind.abandons_provider() {
                        return Ok(TurnOutcome::NextProvider);
                    }

                    // 瞬时错误重试耗尽后，换 Key 前继续按退避序列等待
                    if error.kind.is_retryable() && keys_tried.len() < rotator.len() {
                        let delay = self.retrier.backoff_delay(attempts.saturating_sub(1));
                        tracing::debug!(
                            provider = %provider.id,
                            delay_ms = delay.as_millis() as u64,
                            "换 Key 前退避"
                        );
                        self.timeouts
                            .execute_with_cancel(tokio::time::sleep(delay), cancel)
                            .await
                            .map_err(|_| DispatchError::Cancelled)?;
                    }
                }
            }
        }

        Ok(TurnOutcome::NextProvider)
    }

    /// 同一个 Key 上的有限次重试，每次尝试都受超时约束
    async fn attempt_with_retry(
        &self,
        adapter: &dyn ChatAdapter,
        request: AdapterRequest<'_>,
    ) -> Result<AdapterResponse, RetryError> {
        let timeouts = &self.timeouts;
        self.retrier
            .execute(|attempt| async move {
                tracing::debug!(
                    provider = %request.provider.id,
                    key = %request.key,
                    adapter = adapter.name(),
                    attempt,
                    "发送请求"
                );
                match timeouts.execute_with_timeout(adapter.execute(request)).await {
                    Ok(result) => result,
                    Err(e) => Err(BackendError::new(ErrorKind::Timeout, e.to_string())),
                }
            })
            .await
    }

    /// 所有 Provider 的状态（声明顺序）
    pub fn provider_statuses(&self) -> Vec<ProviderStatus> {
        self.catalog
            .iter()
            .map(|provider| {
                let record = self.tracker.snapshot(&provider.id);
                let (keys, usable_keys) = self
                    .credentials
                    .get(&provider.id)
                    .map(|r| (r.len(), r.usable_count()))
                    .unwrap_or((0, 0));
                ProviderStatus {
                    id: provider.id.clone(),
                    priority: provider.priority,
                    keys,
                    usable_keys,
                    available: keys > 0 && !self.unavailable.contains(&provider.id),
                    success_rate: record.success_rate(),
                    avg_latency: record.avg_latency(),
                    total_attempts: record.total,
                    score: self.selector.score(&provider.id),
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("providers", &self.catalog.len())
            .field("configured", &self.credentials.configured_count())
            .field("registry", &self.registry)
            .field("unavailable", &self.unavailable.snapshot())
            .finish()
    }
}

/// 非空的系统提示放在最前面
fn with_system_prompt(messages: &[ChatMessage], system_prompt: Option<&str>) -> Vec<ChatMessage> {
    let mut all = Vec::with_capacity(messages.len() + 1);
    if let Some(prompt) = system_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        all.push(ChatMessage::system(prompt));
    }
    all.extend_from_slice(messages);
    all
}
