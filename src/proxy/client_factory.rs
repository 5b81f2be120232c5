//! HTTP 客户端工厂
//!
//! 所有适配器共享同一个 `reqwest::Client`，这里统一配置超时与出站代理。
//! 只支持 http / https 代理。

use crate::config::RouterConfig;
use crate::resilience::TimeoutConfig;
use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;

/// 默认 User-Agent
pub const USER_AGENT: &str = concat!("ai-router/", env!("CARGO_PKG_VERSION"));

/// 代理协议类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyProtocol {
    Http,
    Https,
}

impl ProxyProtocol {
    /// 从 URL 的 scheme 解析代理协议（大小写不敏感）
    pub fn from_url(url: &str) -> Option<Self> {
        let lower = url.trim().to_lowercase();
        if lower.starts_with("http://") {
            Some(ProxyProtocol::Http)
        } else if lower.starts_with("https://") {
            Some(ProxyProtocol::Https)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
        }
    }
}

/// 客户端构建错误
#[derive(Debug, Error)]
pub enum ClientFactoryError {
    #[error("无效的代理 URL: {0}")]
    InvalidProxyUrl(String),

    #[error("不支持的代理协议: {0}")]
    UnsupportedProtocol(String),

    #[error("客户端构建错误: {0}")]
    Build(#[from] reqwest::Error),
}

/// HTTP 客户端工厂
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    proxy_url: Option<String>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self::from_timeouts(&TimeoutConfig::default())
    }
}

impl HttpClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_timeouts(timeouts: &TimeoutConfig) -> Self {
        Self {
            proxy_url: None,
            connect_timeout: timeouts.connect_timeout(),
            request_timeout: timeouts.request_timeout(),
        }
    }

    /// 使用配置中的超时与代理
    pub fn from_config(config: &RouterConfig) -> Self {
        Self::from_timeouts(&config.timeout).with_proxy(config.proxy_url.clone())
    }

    /// 设置出站代理，空字符串视为未设置
    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy_url.as_deref()
    }

    /// 校验代理 URL 并返回协议类型
    pub fn parse_proxy_url(url: &str) -> Result<ProxyProtocol, ClientFactoryError> {
        if url.trim().is_empty() {
            return Err(ClientFactoryError::InvalidProxyUrl(
                "代理 URL 不能为空".to_string(),
            ));
        }
        let protocol = ProxyProtocol::from_url(url)
            .ok_or_else(|| ClientFactoryError::UnsupportedProtocol(url.to_string()))?;
        url::Url::parse(url.trim())
            .map_err(|e| ClientFactoryError::InvalidProxyUrl(format!("{url}: {e}")))?;
        Ok(protocol)
    }

    /// 创建 HTTP 客户端
    pub fn build(&self) -> Result<Client, ClientFactoryError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(url) = self.proxy_url.as_deref() {
            let protocol = Self::parse_proxy_url(url)?;
            tracing::info!(protocol = protocol.as_str(), "使用出站代理");
            builder = builder.proxy(Proxy::all(url.trim())?);
        }

        Ok(builder.build()?)
    }
}
