//! 多 Provider AI 请求路由
//!
//! 调用方只需"发送一段对话，拿回文本"，内部处理：
//! - 每个 Provider 多个 Key 的轮换与失效排除
//! - 按优先级与实时性能选择 Provider
//! - 不同厂商协议的适配
//! - 同 Key 重试、换 Key、换 Provider 的故障转移
//! - 按用户的出站限流
//! - 批量翻译

pub mod backends;
pub mod catalog;
pub mod config;
pub mod credential;
pub mod dispatcher;
pub mod logger;
pub mod models;
pub mod proxy;
pub mod resilience;
pub mod router;
pub mod telemetry;
pub mod translator;

pub use backends::{AdapterRegistry, BackendError, ChatAdapter, ErrorKind};
pub use catalog::ProviderCatalog;
pub use config::{ConfigError, RouterConfig};
pub use credential::{ApiKey, CredentialStore, KeyRotator};
pub use dispatcher::{ChatReply, DispatchError, Dispatcher, ProviderStatus};
pub use models::{ChatMessage, ProtocolFamily, Provider, ProviderId, Role};
pub use resilience::CancellationToken;
pub use router::{ProviderSelector, ScoringConfig};
pub use telemetry::{PerformanceRecord, PerformanceTracker};
pub use translator::BatchTranslator;
