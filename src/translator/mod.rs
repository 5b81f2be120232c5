//! 批量翻译
//!
//! 把 N 段文本放进一个编号列表，一次请求翻译完成，再按编号拆回。
//! 条目内的换行在列表中以 `⏎` 表示，拆回后还原。
//! 模型漏掉的条目逐条补译；补译仍失败的条目回退为原文。
//!
//! ```text
//! translator/
//! ├── prompt.rs     # 提示词与语言名称
//! └── parser.rs     # 编号列表解析
//! ```

mod parser;
mod prompt;

pub use parser::parse_numbered_list;
pub use prompt::{
    batch_system_prompt, batch_user_message, flatten_line_breaks, language_name,
    restore_line_breaks, single_system_prompt, LINE_BREAK_MARKER,
};

use crate::dispatcher::Dispatcher;
use crate::models::ChatMessage;
use std::sync::Arc;

/// 批量翻译器
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    dispatcher: Arc<Dispatcher>,
}

impl BatchTranslator {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// 翻译全部文本
    ///
    /// 返回值长度始终等于输入长度，每一项是译文或原文，从不返回错误。
    /// 空白文本原样返回，不参与请求。
    pub async fn translate_all<S: AsRef<str>>(
        &self,
        texts: &[S],
        target_language: &str,
        user_id: &str,
    ) -> Vec<String> {
        let mut results: Vec<Option<String>> = texts
            .iter()
            .map(|t| {
                let text = t.as_ref();
                text.trim().is_empty().then(|| text.to_string())
            })
            .collect();

        // 需要翻译的条目在原数组中的位置
        let pending: Vec<usize> = (0..texts.len()).filter(|i| results[*i].is_none()).collect();
        if pending.is_empty() {
            return collect(results, texts);
        }

        let batched = pending.len() > 1;
        if batched {
            let batch: Vec<&str> = pending.iter().map(|i| texts[*i].as_ref()).collect();
            let parsed = self.translate_batch(&batch, target_language, user_id).await;
            for (slot, translated) in pending.iter().zip(parsed) {
                results[*slot] = translated;
            }
        }

        let missing: Vec<usize> = pending
            .into_iter()
            .filter(|i| results[*i].is_none())
            .collect();
        if batched && !missing.is_empty() {
            tracing::info!(
                missing = missing.len(),
                total = texts.len(),
                "批量翻译有缺失条目，逐条补译"
            );
        }
        for index in missing {
            let text = texts[index].as_ref();
            results[index] = Some(self.translate_one(text, target_language, user_id).await);
        }

        collect(results, texts)
    }

    /// 翻译单条文本，失败时返回原文
    pub async fn translate_one(&self, text: &str, target_language: &str, user_id: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let system = single_system_prompt(target_language);
        let messages = [ChatMessage::user(text)];
        match self.dispatcher.send(&messages, Some(&system), user_id).await {
            Ok(reply) => {
                let translated = reply.content.trim();
                if translated.is_empty() {
                    text.to_string()
                } else {
                    translated.to_string()
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "单条翻译失败，返回原文");
                text.to_string()
            }
        }
    }

    /// 一次请求翻译多条，返回按编号解析的结果
    async fn translate_batch(
        &self,
        texts: &[&str],
        target_language: &str,
        user_id: &str,
    ) -> Vec<Option<String>> {
        let system = batch_system_prompt(target_language, texts.len());
        let messages = [ChatMessage::user(batch_user_message(texts))];

        match self.dispatcher.send(&messages, Some(&system), user_id).await {
            Ok(reply) => {
                let parsed: Vec<Option<String>> = parse_numbered_list(&reply.content, texts.len())
                    .into_iter()
                    .map(|item| {
                        item.map(|text| restore_line_breaks(&text))
                            .filter(|text| !text.trim().is_empty())
                    })
                    .collect();
                tracing::debug!(
                    provider = %reply.provider,
                    parsed = parsed.iter().filter(|p| p.is_some()).count(),
                    expected = texts.len(),
                    "批量翻译完成"
                );
                parsed
            }
            Err(e) => {
                tracing::warn!(error = %e, items = texts.len(), "批量翻译失败，改为逐条翻译");
                vec![None; texts.len()]
            }
        }
    }
}

fn collect<S: AsRef<str>>(results: Vec<Option<String>>, texts: &[S]) -> Vec<String> {
    results
        .into_iter()
        .zip(texts)
        .map(|(result, source)| result.unwrap_or_else(|| source.as_ref().to_string()))
        .collect()
}

#[cfg(test)]
mod tests;
