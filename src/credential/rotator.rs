//! 凭证轮换器
//!
//! 单个 Provider 的 API Key 轮询、失败排除与自愈重置

use crate::logger::mask_secret;
use crate::models::ProviderId;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// API Key
///
/// 不透明凭证；`Debug` / `Display` 只输出掩码
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    /// 原始凭证，仅用于构造请求
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        mask_secret(&self.0)
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked())
    }
}

/// 单个 Key 的使用情况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUsage {
    pub usage_count: u64,
    pub last_used: Option<DateTime<Utc>>,
    pub excluded: bool,
}

struct KeySlot {
    key: ApiKey,
    usage_count: AtomicU64,
    last_used: Mutex<Option<DateTime<Utc>>>,
}

/// 凭证轮换器
///
/// 游标为原子变量，排除集合使用短临界区保护，从不跨 `.await` 持有。
/// 并发调用 `next()` 时不保证严格轮询公平，但只要存在 Key 就一定返回候选。
pub struct KeyRotator {
    provider: ProviderId,
    slots: Vec<KeySlot>,
    cursor: AtomicUsize,
    excluded: RwLock<HashSet<usize>>,
}

impl KeyRotator {
    /// 创建轮换器，重复的 Key 只保留第一个
    pub fn new(provider: ProviderId, keys: Vec<ApiKey>) -> Self {
        let mut seen = HashSet::new();
        let slots = keys
            .into_iter()
            .filter(|k| seen.insert(k.clone()))
            .map(|key| KeySlot {
                key,
                usage_count: AtomicU64::new(0),
                last_used: Mutex::new(None),
            })
            .collect();

        Self {
            provider,
            slots,
            cursor: AtomicUsize::new(0),
            excluded: RwLock::new(HashSet::new()),
        }
    }

    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 当前未被排除的 Key 数量
    pub fn usable_count(&self) -> usize {
        self.slots.len().saturating_sub(self.excluded.read().len())
    }

    pub fn has_usable_key(&self) -> bool {
        self.usable_count() > 0
    }

    /// 获取下一个可用 Key
    ///
    /// 从游标位置开始跳过被排除的 Key；全部被排除时先清空排除集合再扫描一次。
    /// 仅当没有配置任何 Key 时返回 `None`。
    pub fn next(&self) -> Option<ApiKey> {
        if self.slots.is_empty() {
            return None;
        }

        if let Some(key) = self.scan() {
            return Some(key);
        }

        tracing::info!(
            provider = %self.provider,
            keys = self.slots.len(),
            "所有 Key 均已被排除，重置排除集合"
        );
        self.reset();

        // 重置与扫描之间其他调用方可能再次排除全部 Key，此时直接返回游标处的 Key
        self.scan().or_else(|| {
            let index = self.advance_from(self.cursor.load(Ordering::Relaxed) % self.slots.len());
            Some(self.slots[index].key.clone())
        })
    }

    /// 标记 Key 失败：加入排除集合，直到下一次全量重置
    pub fn mark_failed(&self, key: &ApiKey) {
        let Some(index) = self.index_of(key) else {
            return;
        };
        let inserted = self.excluded.write().insert(index);
        if inserted {
            tracing::warn!(
                provider = %self.provider,
                key = %key,
                usable = self.usable_count(),
                "Key 已被排除"
            );
        }
    }

    /// 标记 Key 成功：移出排除集合，累计使用次数并记录时间
    pub fn mark_success(&self, key: &ApiKey) {
        let Some(index) = self.index_of(key) else {
            return;
        };
        self.excluded.write().remove(&index);
        let slot = &self.slots[index];
        slot.usage_count.fetch_add(1, Ordering::Relaxed);
        *slot.last_used.lock() = Some(Utc::now());
    }

    /// 清空排除集合（幂等）
    pub fn reset(&self) {
        self.excluded.write().clear();
    }

    /// 查询 Key 的使用情况
    pub fn usage(&self, key: &ApiKey) -> Option<KeyUsage> {
        let index = self.index_of(key)?;
        let slot = &self.slots[index];
        Some(KeyUsage {
            usage_count: slot.usage_count.load(Ordering::Relaxed),
            last_used: *slot.last_used.lock(),
            excluded: self.excluded.read().contains(&index),
        })
    }

    fn scan(&self) -> Option<ApiKey> {
        let len = self.slots.len();
        let start = self.cursor.load(Ordering::Relaxed) % len;
        let index = {
            let excluded = self.excluded.read();
            (0..len)
                .map(|offset| (start + offset) % len)
                .find(|index| !excluded.contains(index))?
        };
        self.advance_from(index);
        Some(self.slots[index].key.clone())
    }

    fn advance_from(&self, index: usize) -> usize {
        self.cursor
            .store((index + 1) % self.slots.len(), Ordering::Relaxed);
        index
    }

    fn index_of(&self, key: &ApiKey) -> Option<usize> {
        self.slots.iter().position(|slot| &slot.key == key)
    }
}

impl std::fmt::Debug for KeyRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRotator")
            .field("provider", &self.provider)
            .field("keys", &self.slots.len())
            .field("usable", &self.usable_count())
            .finish()
    }
}
