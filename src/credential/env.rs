//! 从环境变量加载凭证
//!
//! 支持 `<PROVIDER>_API_KEY`、`<PROVIDER>_API_KEY_2` …… 任意数量的后缀

use super::ApiKey;
use crate::models::ProviderId;

/// 从进程环境变量加载指定 Provider 的全部 Key
pub fn load_keys_from_env(provider: &ProviderId) -> Vec<ApiKey> {
    load_keys_from_vars(provider, std::env::vars())
}

/// 从给定的变量集合中提取 Key
///
/// 按后缀数字排序（无后缀视为 1），忽略空值并去重
pub fn load_keys_from_vars<I>(provider: &ProviderId, vars: I) -> Vec<ApiKey>
where
    I: IntoIterator<Item = (String, String)>,
{
    let base = format!("{}_API_KEY", provider.env_prefix());

    let mut found: Vec<(u32, String, String)> = vars
        .into_iter()
        .filter_map(|(name, value)| {
            let order = key_order(&base, &name)?;
            let value = value.trim().to_string();
            (!value.is_empty()).then_some((order, name, value))
        })
        .collect();
    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut keys: Vec<ApiKey> = Vec::with_capacity(found.len());
    for (_, _, value) in found {
        let key = ApiKey::new(value);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

fn key_order(base: &str, name: &str) -> Option<u32> {
    let rest = name.strip_prefix(base)?;
    if rest.is_empty() {
        return Some(1);
    }
    let digits = rest.strip_prefix('_')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn exposed(keys: &[ApiKey]) -> Vec<&str> {
        keys.iter().map(ApiKey::expose).collect()
    }

    #[test]
    fn test_collects_suffixed_keys_in_order() {
        let keys = load_keys_from_vars(
            &ProviderId::new("gemini"),
            vars(&[
                ("GEMINI_API_KEY_10", "k10"),
                ("GEMINI_API_KEY_2", "k2"),
                ("GEMINI_API_KEY", "k1"),
                ("GEMINI_API_KEY_3", "k3"),
            ]),
        );
        assert_eq!(exposed(&keys), vec!["k1", "k2", "k3", "k10"]);
    }

    #[test]
    fn test_ignores_other_variables() {
        let keys = load_keys_from_vars(
            &ProviderId::new("groq"),
            vars(&[
                ("GROQ_API_KEY", "g1"),
                ("GROQ_API_KEY_BACKUP", "nope"),
                ("GROQ_API_KEYS", "nope"),
                ("GROQ_API_KEY_", "nope"),
                ("OTHER_GROQ_API_KEY", "nope"),
                ("GEMINI_API_KEY", "nope"),
            ]),
        );
        assert_eq!(exposed(&keys), vec!["g1"]);
    }

    #[test]
    fn test_skips_blank_and_duplicate_values() {
        let keys = load_keys_from_vars(
            &ProviderId::new("open-router"),
            vars(&[
                ("OPEN_ROUTER_API_KEY", " or1 "),
                ("OPEN_ROUTER_API_KEY_2", ""),
                ("OPEN_ROUTER_API_KEY_3", "or1"),
                ("OPEN_ROUTER_API_KEY_4", "or4"),
            ]),
        );
        assert_eq!(exposed(&keys), vec!["or1", "or4"]);
    }

    #[test]
    fn test_no_keys_is_empty() {
        let keys = load_keys_from_vars(&ProviderId::new("cohere"), vars(&[]));
        assert!(keys.is_empty());
    }
}
