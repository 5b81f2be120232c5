//! 翻译提示词与语言名称

/// 批量列表中代替换行的标记，每个条目因此只占一行
pub const LINE_BREAK_MARKER: char = '⏎';

/// 常用语言代码对应的英文名称，未知代码原样返回
pub fn language_name(code: &str) -> &str {
    match code.trim().to_ascii_lowercase().as_str() {
        "fa" => "Persian",
        "en" => "English",
        "ru" => "Russian",
        "ar" => "Arabic",
        "tr" => "Turkish",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "zh" => "Chinese",
        _ => code,
    }
}

/// 批量翻译的系统提示
pub fn batch_system_prompt(target_language: &str, count: usize) -> String {
    format!(
        "You are a professional translator. Translate each of the {count} numbered items \
         into {language}. Reply with only a numbered list that uses the same numbers, \
         in the form `1. translation`, one entry per item. The symbol {marker} marks a \
         line break inside an item; keep it in the same place. Do not add explanations.",
        marker = LINE_BREAK_MARKER,
        language = language_name(target_language),
    )
}

/// 批量翻译的用户消息：`1. text` 形式的编号列表
///
/// 条目内的换行替换为 [`LINE_BREAK_MARKER`]，原文中形似编号的行不会被当成新条目
pub fn batch_user_message<S: AsRef<str>>(texts: &[S]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, flatten_line_breaks(text.as_ref())))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 把多行文本压成一行
pub fn flatten_line_breaks(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(&format!(" {LINE_BREAK_MARKER} "))
}

/// 还原 [`flatten_line_breaks`] 插入的换行
pub fn restore_line_breaks(text: &str) -> String {
    text.split(LINE_BREAK_MARKER)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 单条翻译的系统提示
pub fn single_system_prompt(target_language: &str) -> String {
    format!(
        "You are a professional translator. Translate the user's text into {}. \
         Reply with only the translation.",
        language_name(target_language)
    )
}
