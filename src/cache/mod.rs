//! 响应缓存模块：带 TTL 与内存预算的 LRU 缓存，减少重复 API 调用。
//!
//! # Response Caching Module
//!
//! In-memory cache for icon and metadata responses.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | Strict LRU store bounded by entry count, memory budget and TTL |
//! | [`CacheConfig`] | Limits and default TTL |
//! | [`CacheStats`] | Hit/miss counters and current occupancy |
//! | [`CacheKey`] | Canonical key built from endpoint path and sorted query parameters |
//!
//! ## Example
//!
//! ```rust
//! use svg_api::cache::{CacheConfig, CacheKey, ResponseCache};
//! use std::time::Duration;
//!
//! let cache = ResponseCache::new(
//!     CacheConfig::new()
//!         .with_max_entries(100)
//!         .with_ttl(Duration::from_secs(60)),
//! );
//! let key = CacheKey::new("/icons/home", [("source", "lucide")]);
//! cache.set(key.as_str(), serde_json::json!({"name": "home"}), None);
//! assert!(cache.get(key.as_str()).is_some());
//! ```
//!
//! Eviction is strict least-recently-used: reads refresh recency, and inserts
//! evict from the cold end until both the entry limit and the memory budget
//! hold. Expired entries are dropped lazily when read.

mod key;
mod manager;

pub use key::CacheKey;
pub use manager::{estimate_footprint, CacheConfig, CacheStats, ResponseCache};
