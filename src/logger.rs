//! 日志管理模块
//!
//! tracing 订阅器初始化与敏感信息脱敏

use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::EnvFilter;

/// 初始化全局 tracing 订阅器
///
/// `RUST_LOG` 优先于传入的默认级别；重复初始化时静默忽略
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ai_router={default_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 掩码显示凭证：保留首尾各 4 个字符
///
/// 长度不超过 8 的凭证完全隐藏
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}****{tail}")
}

static SANITIZE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // Bearer token
        (r"Bearer\s+[A-Za-z0-9._-]+", "Bearer ***"),
        // URL 查询参数中的 key（Gemini）
        (r"([?&])key=[A-Za-z0-9._-]+", "${1}key=***"),
        // API key 各种格式
        (
            r#"api[_-]?key["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
            "api_key: ***",
        ),
        // 通用 token
        (r#"token["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#, "token: ***"),
        // authorization header
        (
            r#"[Aa]uthorization["']?\s*[:=]\s*["']?[A-Za-z0-9._\s-]+"#,
            "authorization: ***",
        ),
        // 常见厂商 key 前缀
        (r"\b(sk|csk|gsk)-[A-Za-z0-9_-]{8,}", "$1-***"),
        (r"\bAIza[A-Za-z0-9_-]{20,}", "AIza***"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// 日志脱敏
pub fn sanitize_log_message(message: &str) -> String {
    let mut sanitized = message.to_string();
    for (re, replacement) in SANITIZE_PATTERNS.iter() {
        sanitized = re.replace_all(&sanitized, *replacement).to_string();
    }
    sanitized
}

/// 脱敏并截断厂商错误响应体，避免把整页 HTML 写进日志
pub fn sanitize_error_body(body: &str, max_chars: usize) -> String {
    let sanitized = sanitize_log_message(body.trim());
    if sanitized.chars().count() <= max_chars {
        return sanitized;
    }
    let truncated: String = sanitized.chars().take(max_chars).collect();
    format!("{truncated}…")
}
