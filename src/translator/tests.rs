//! 批量翻译测试
//!
//! 通过脚本化适配器驱动真实的调度器

use super::*;
use crate::backends::mock::ScriptedAdapter;
use crate::backends::{AdapterRegistry, AdapterRequest, BackendError, ErrorKind};
use crate::catalog::ProviderCatalog;
use crate::config::RouterConfig;
use crate::credential::CredentialStore;
use crate::models::{ProtocolFamily, Provider, ProviderId};
use crate::resilience::RateLimitConfig;
use proptest::prelude::*;

fn is_batch(req: &AdapterRequest<'_>) -> bool {
    req.messages
        .first()
        .is_some_and(|m| m.content.contains("numbered items"))
}

fn translator_with(adapter: &Arc<ScriptedAdapter>) -> BatchTranslator {
    let catalog = ProviderCatalog::new(vec![Provider::new(
        "mock",
        ProtocolFamily::OpenaiCompatible,
        "http://mock.test/v1",
        &["m"],
        1,
    )]);
    let credentials = CredentialStore::new().with_keys("mock", &["k1"]);
    let mut registry = AdapterRegistry::new();
    registry.register(ProviderId::new("mock"), adapter.clone());
    let config = RouterConfig {
        rate_limit: RateLimitConfig::new(60, 0),
        ..RouterConfig::default()
    };
    BatchTranslator::new(Arc::new(Dispatcher::new(
        catalog,
        credentials,
        registry,
        &config,
    )))
}

/// 单条请求返回 `T:<原文>`
fn single_reply(req: &AdapterRequest<'_>) -> String {
    let text = req
        .messages
        .last()
        .map(|m| m.content.as_str())
        .unwrap_or_default();
    format!("T:{text}")
}

#[tokio::test]
async fn test_missing_item_gets_exactly_one_follow_up() {
    let adapter = Arc::new(ScriptedAdapter::new(|req| {
        if is_batch(req) {
            Ok("1. الف\n3. ج".to_string())
        } else {
            Ok(single_reply(req))
        }
    }));
    let translator = translator_with(&adapter);

    let out = translator.translate_all(&["A", "B", "C"], "fa", "u").await;
    assert_eq!(out, vec!["الف", "T:B", "ج"]);

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].last_message, "1. A\n2. B\n3. C");
    assert_eq!(calls[1].last_message, "B");
}

#[tokio::test]
async fn test_batch_failure_falls_back_to_individual() {
    let adapter = Arc::new(ScriptedAdapter::new(|req| {
        if is_batch(req) {
            Err(BackendError::malformed("bad batch"))
        } else {
            Ok(single_reply(req))
        }
    }));
    let translator = translator_with(&adapter);

    let out = translator.translate_all(&["x", "y"], "de", "u").await;
    assert_eq!(out, vec!["T:x", "T:y"]);
    assert_eq!(adapter.call_count(), 3);
}

#[tokio::test]
async fn test_total_failure_returns_sources() {
    let adapter = Arc::new(ScriptedAdapter::new(|_| {
        Err(BackendError::with_status(ErrorKind::Auth, "denied", 401))
    }));
    let translator = translator_with(&adapter);

    let out = translator.translate_all(&["one", "two"], "ru", "u").await;
    assert_eq!(out, vec!["one", "two"]);
    assert_eq!(translator.translate_one("solo", "ru", "u").await, "solo");
}

#[tokio::test]
async fn test_empty_and_blank_inputs_skip_network() {
    let adapter = Arc::new(ScriptedAdapter::new(|req| Ok(single_reply(req))));
    let translator = translator_with(&adapter);

    let empty: Vec<String> = Vec::new();
    assert!(translator.translate_all(&empty, "fa", "u").await.is_empty());
    let out = translator.translate_all(&["", "  "], "fa", "u").await;
    assert_eq!(out, vec!["", "  "]);
    assert_eq!(adapter.call_count(), 0);

    // 只有一条需要翻译时直接走单条路径
    let out = translator.translate_all(&["", "hello"], "fa", "u").await;
    assert_eq!(out, vec!["", "T:hello"]);
    assert_eq!(adapter.call_count(), 1);
}

#[tokio::test]
async fn test_blank_items_keep_batch_numbering() {
    let adapter = Arc::new(ScriptedAdapter::new(|req| {
        if is_batch(req) {
            Ok("1. first\n2. second".to_string())
        } else {
            Ok(single_reply(req))
        }
    }));
    let translator = translator_with(&adapter);

    let out = translator.translate_all(&["a", "", "b"], "en", "u").await;
    assert_eq!(out, vec!["first", "", "second"]);
    assert_eq!(adapter.call_count(), 1);
}

#[tokio::test]
async fn test_numbered_lines_inside_source_keep_their_slot() {
    // 模型逐字大写回显整个列表
    let adapter = Arc::new(ScriptedAdapter::new(|req| {
        Ok(req
            .messages
            .last()
            .map(|m| m.content.to_uppercase())
            .unwrap_or_default())
    }));
    let translator = translator_with(&adapter);

    let out = translator
        .translate_all(&["Top stories:\n2. markets fall", "weather"], "en", "u")
        .await;
    assert_eq!(out, vec!["TOP STORIES:\n2. MARKETS FALL", "WEATHER"]);
    assert_eq!(adapter.call_count(), 1);
    assert_eq!(adapter.calls()[0].last_message.lines().count(), 2);
}

fn arb_texts() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(
        prop_oneof![Just(String::new()), "[a-z ]{1,12}", "[0-9]\\. [a-z]{1,6}"],
        0..8,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// 输出长度恒等于输入长度；补译的条目来自单条路径
    #[test]
    fn prop_output_length_matches_input(texts in arb_texts(), reply in "[0-9a-z.\\n ]{0,60}") {
        let batch_reply = reply.clone();
        let adapter = Arc::new(ScriptedAdapter::new(move |req| {
            if is_batch(req) {
                Ok(batch_reply.clone())
            } else {
                Ok(single_reply(req))
            }
        }));
        let translator = translator_with(&adapter);

        let out = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
            .block_on(translator.translate_all(&texts, "fa", "u"));

        prop_assert_eq!(out.len(), texts.len());
        for (source, result) in texts.iter().zip(&out) {
            if source.trim().is_empty() {
                prop_assert_eq!(result, source);
            } else {
                prop_assert!(!result.trim().is_empty());
            }
        }
    }
}
