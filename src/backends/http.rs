//! 适配器共用的 HTTP 调用与响应解析

use super::traits::BackendError;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::Instant;

/// 发送请求并把 2xx 响应体解析为 `T`
///
/// 非 2xx 按状态码归类；2xx 但无法解析归为 `MalformedResponse`。
/// 返回的耗时包含读取完整响应体。
pub(crate) async fn send_json<T>(builder: RequestBuilder) -> Result<(T, Duration), BackendError>
where
    T: DeserializeOwned,
{
    let started = Instant::now();
    let response = builder.send().await.map_err(BackendError::from_reqwest)?;
    let status = response.status();
    let body = response.text().await.map_err(BackendError::from_reqwest)?;
    let latency = started.elapsed();

    if !status.is_success() {
        return Err(BackendError::from_status(status.as_u16(), &body));
    }

    let parsed = serde_json::from_str(&body)
        .map_err(|e| BackendError::malformed(format!("响应体解析失败: {e}")))?;
    Ok((parsed, latency))
}

/// 非空文本检查：全空白视为格式错误
pub(crate) fn non_empty(text: String, provider: &str) -> Result<String, BackendError> {
    if text.trim().is_empty() {
        Err(BackendError::malformed(format!("{provider} 返回了空内容")))
    } else {
        Ok(text)
    }
}
