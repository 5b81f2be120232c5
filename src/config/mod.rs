//! 配置管理模块
//!
//! 路由器的全部可调参数，支持 YAML 文件加载，所有字段均有默认值

use crate::models::Provider;
use crate::resilience::{RateLimitConfig, RetryConfig, TimeoutConfig};
use crate::router::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "AI_ROUTER_CONFIG";

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析配置文件失败: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("配置无效: {0}")]
    Invalid(String),
}

/// 路由器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub retry: RetryConfig,
    pub timeout: TimeoutConfig,
    pub rate_limit: RateLimitConfig,
    pub scoring: ScoringConfig,
    /// 出站代理（http/https）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// 覆盖内置 Provider 目录
    #[serde(skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<Provider>>,
}

impl RouterConfig {
    /// 加载配置
    ///
    /// 优先使用显式路径，其次 `AI_ROUTER_CONFIG`，都没有则返回默认配置
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 从 YAML 文件读取
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// 从 YAML 字符串解析
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts 必须大于 0".into()));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.window_secs 必须大于 0".into(),
            ));
        }

        if let Some(providers) = &self.providers {
            let mut seen = HashSet::new();
            for provider in providers {
                if !seen.insert(provider.id.clone()) {
                    return Err(ConfigError::Invalid(format!(
                        "Provider id 重复: {}",
                        provider.id
                    )));
                }
                if provider.models.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "Provider {} 未配置模型",
                        provider.id
                    )));
                }
                url::Url::parse(&provider.base_url).map_err(|e| {
                    ConfigError::Invalid(format!(
                        "Provider {} 的 base_url 无效: {}",
                        provider.id, e
                    ))
                })?;
            }
        }

        Ok(())
    }
}
