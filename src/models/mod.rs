//! 数据模型
//!
//! 聊天消息与 Provider 配置

pub mod chat;
pub mod provider;

pub use chat::{ChatMessage, Role};
pub use provider::{AdvisoryLimits, ProtocolFamily, Provider, ProviderId};
