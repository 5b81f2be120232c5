//! 路由模块
//!
//! 根据优先级、成功率与延迟为每个请求选择 Provider

mod selector;

pub use selector::{ProviderSelector, ScoringConfig};

#[cfg(test)]
mod tests;
