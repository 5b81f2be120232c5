//! 出站 HTTP 客户端模块
//!
//! 统一创建带超时与代理配置的 `reqwest::Client`

mod client_factory;

pub use client_factory::{ClientFactoryError, HttpClientFactory, ProxyProtocol, USER_AGENT};
