//! Response cache: strict LRU bounded by entry count, memory budget and TTL.

use lru::LruCache;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
    pub max_memory_bytes: usize,
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 500,
            max_memory_bytes: 5 * 1024 * 1024,
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
    pub fn with_max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }
    pub fn with_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = bytes;
        self
    }
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: usize,
    pub total_bytes: usize,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry {
    data: Value,
    expires_at: Instant,
    footprint_bytes: usize,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

struct Inner {
    // LRU order: head is least recently used.
    entries: LruCache<String, CacheEntry>,
    total_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl Inner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.pop(key)?;
        self.total_bytes -= entry.footprint_bytes;
        Some(entry)
    }
}

/// Estimated memory cost of a cached value.
///
/// Scalars cost a fixed 8 bytes, strings 2 bytes per character and structured
/// values 2 bytes per byte of their JSON serialization.
pub fn estimate_footprint(value: &Value) -> usize {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => 8,
        Value::String(s) => s.chars().count() * 2,
        Value::Array(_) | Value::Object(_) => value.to_string().len() * 2,
    }
}

/// In-memory response cache shared by all facade calls.
///
/// Never fails: absence is `None`, and inserts that cannot fit are skipped.
pub struct ResponseCache {
    config: CacheConfig,
    inner: Mutex<Inner>,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                total_bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.entries.get(key) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(entry) if !entry.is_expired(now) => {
                inner.hits += 1;
                return Some(entry.data.clone());
            }
            Some(_) => {}
        }
        inner.remove(key);
        inner.misses += 1;
        inner.expirations += 1;
        debug!(key, "cache entry expired");
        None
    }

    /// Inserts `value`, evicting least-recently-used entries until it fits.
    ///
    /// `ttl` overrides the configured default for this entry only.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let footprint = estimate_footprint(&value) + key.len();
        let expires_at = Instant::now() + ttl.unwrap_or(self.config.default_ttl);

        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.remove(key);

        if self.config.max_entries == 0 || footprint > self.config.max_memory_bytes {
            debug!(
                key,
                footprint,
                budget = self.config.max_memory_bytes,
                "value does not fit cache budget, skipping"
            );
            return;
        }

        while inner.entries.len() >= self.config.max_entries
            || inner.total_bytes + footprint > self.config.max_memory_bytes
        {
            match inner.entries.pop_lru() {
                Some((evicted, entry)) => {
                    inner.total_bytes -= entry.footprint_bytes;
                    inner.evictions += 1;
                    debug!(key = evicted.as_str(), "evicted least recently used entry");
                }
                None => break,
            }
        }

        inner.entries.put(
            key.to_string(),
            CacheEntry {
                data: value,
                expires_at,
                footprint_bytes: footprint,
            },
        );
        inner.total_bytes += footprint;
    }

    /// Live-entry check. Does not touch recency or hit/miss counters.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;
        let expired = match inner.entries.peek(key) {
            None => return false,
            Some(entry) => entry.is_expired(now),
        };
        if expired {
            inner.remove(key);
            inner.expirations += 1;
        }
        !expired
    }

    /// Removes `key`; returns whether a live entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut guard = self.lock();
        match guard.remove(key) {
            Some(entry) => !entry.is_expired(now),
            None => false,
        }
    }

    pub fn clear(&self) {
        let mut guard = self.lock();
        guard.entries.clear();
        guard.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let guard = self.lock();
        CacheStats {
            hits: guard.hits,
            misses: guard.misses,
            entry_count: guard.entries.len(),
            total_bytes: guard.total_bytes,
            evictions: guard.evictions,
            expirations: guard.expirations,
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn small_cache(max_entries: usize) -> ResponseCache {
        ResponseCache::new(
            CacheConfig::new()
                .with_max_entries(max_entries)
                .with_ttl(Duration::from_secs(60)),
        )
    }

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_entries, 500);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_footprint_estimates() {
        assert_eq!(estimate_footprint(&json!(42)), 8);
        assert_eq!(estimate_footprint(&json!(true)), 8);
        assert_eq!(estimate_footprint(&json!("abcd")), 8);
        assert_eq!(estimate_footprint(&json!({"a": 1})), 14);
        assert!(estimate_footprint(&json!("<svg/>")) < estimate_footprint(&json!("<svg></svg>")));
    }

    #[test]
    fn test_get_set_has_delete() {
        let cache = small_cache(10);
        assert_eq!(cache.get("k"), None);
        cache.set("k", json!({"name": "home"}), None);
        assert!(cache.has("k"));
        assert_eq!(cache.get("k"), Some(json!({"name": "home"})));
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert!(!cache.has("k"));
    }

    #[test]
    fn test_repeated_reads_are_idempotent() {
        let cache = small_cache(10);
        cache.set("icons/home", json!({"svg": "<svg/>"}), None);
        let first = cache.get("icons/home");
        let after_first = cache.stats();
        let second = cache.get("icons/home");
        let after_second = cache.stats();

        assert_eq!(first, second);
        assert_eq!(after_first.hits, 1);
        assert_eq!(after_second.hits, 2);
        assert_eq!(after_second.misses, 0);
        assert_eq!(after_first.entry_count, after_second.entry_count);
        assert_eq!(after_first.total_bytes, after_second.total_bytes);
    }

    #[test]
    fn test_has_does_not_count() {
        let cache = small_cache(10);
        cache.set("a", json!(1), None);
        assert!(cache.has("a"));
        assert!(!cache.has("b"));
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_lru_read_protects_entry() {
        let cache = small_cache(3);
        cache.set("A", json!("a"), None);
        cache.set("B", json!("b"), None);
        cache.set("C", json!("c"), None);

        assert!(cache.get("A").is_some());
        cache.set("D", json!("d"), None);

        assert!(cache.has("A"));
        assert!(!cache.has("B"));
        assert!(cache.has("C"));
        assert!(cache.has("D"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_reinsert_refreshes_without_duplicating() {
        let cache = small_cache(3);
        cache.set("A", json!("a"), None);
        cache.set("A", json!("aa"), None);
        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_bytes, estimate_footprint(&json!("aa")) + 1);
        assert_eq!(cache.get("A"), Some(json!("aa")));
    }

    #[test]
    fn test_bounds_hold_for_any_insert_sequence() {
        let budget = 400;
        let cache = ResponseCache::new(
            CacheConfig::new()
                .with_max_entries(7)
                .with_max_memory_bytes(budget),
        );
        for i in 0..200 {
            let payload = "x".repeat(i % 37);
            cache.set(&format!("key-{}", i), json!(payload), None);
            let stats = cache.stats();
            assert!(stats.entry_count <= 7, "entry bound violated at {}", i);
            assert!(stats.total_bytes <= budget, "memory bound violated at {}", i);
        }
    }

    #[test]
    fn test_oversized_value_is_not_stored() {
        let cache = ResponseCache::new(CacheConfig::new().with_max_memory_bytes(16));
        cache.set("small", json!(1), None);
        cache.set("small", json!("this string is far too long"), None);
        assert!(!cache.has("small"));
        assert_eq!(cache.stats().total_bytes, 0);
    }

    #[test]
    fn test_memory_budget_evicts_in_lru_order() {
        // each entry: 1 byte key + 20 bytes for a 10-char string
        let cache = ResponseCache::new(CacheConfig::new().with_max_memory_bytes(63));
        cache.set("a", json!("0123456789"), None);
        cache.set("b", json!("0123456789"), None);
        cache.set("c", json!("0123456789"), None);
        assert_eq!(cache.len(), 3);
        cache.set("d", json!("0123456789"), None);
        assert!(!cache.has("a"));
        assert!(cache.has("d"));
        assert_eq!(cache.stats().total_bytes, 63);
    }

    #[test]
    fn test_clear() {
        let cache = small_cache(10);
        cache.set("a", json!(1), None);
        cache.set("b", json!(2), None);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().total_bytes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_counts_miss() {
        let cache = small_cache(10);
        cache.set("icons/home", json!({"name": "home"}), Some(Duration::from_millis(1000)));
        assert_eq!(cache.get("icons/home"), Some(json!({"name": "home"})));

        tokio::time::advance(Duration::from_millis(1001)).await;

        let misses_before = cache.stats().misses;
        assert_eq!(cache.get("icons/home"), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, misses_before + 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.total_bytes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_valid_until_deadline() {
        let cache = small_cache(10);
        cache.set("k", json!(1), Some(Duration::from_millis(1000)));
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(cache.has("k"));
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!cache.has("k"));
        assert!(!cache.delete("k"));
    }
}
