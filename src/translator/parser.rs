//! 编号列表解析
//!
//! 宽松地从模型输出中提取 `1. xxx` 形式的条目：
//! - 分隔符可以是 `.` `)` `-` `:` 以及全角 `．`
//! - 容忍 markdown 加粗，如 `**1.**`
//! - 不以编号开头的行拼接到上一个条目
//! - 超出范围的编号被忽略，重复编号以第一次出现为准

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBERED_LINE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\*\*)?\s*(\d+)\s*(?:\*\*)?\s*[.)\-:．](?:\*\*)?\s*(.*)$").ok()
});

/// 解析编号列表，返回长度为 `count` 的结果，缺失的条目为 `None`
pub fn parse_numbered_list(text: &str, count: usize) -> Vec<Option<String>> {
    let mut items: Vec<Option<String>> = vec![None; count];
    let Some(numbered_line) = NUMBERED_LINE.as_ref() else {
        return items;
    };
    let mut current: Option<usize> = None;

    for line in text.lines() {
        if let Some(caps) = numbered_line.captures(line) {
            current = caps[1]
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=count).contains(n))
                .map(|n| n - 1)
                .filter(|index| items[*index].is_none());

            if let Some(index) = current {
                items[index] = Some(caps[2].trim().to_string());
            }
            continue;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(index) = current else {
            continue;
        };
        if let Some(item) = items[index].as_mut() {
            if !item.is_empty() {
                item.push('\n');
            }
            item.push_str(line);
        }
    }

    items
        .into_iter()
        .map(|item| item.filter(|s| !s.trim().is_empty()))
        .collect()
}
