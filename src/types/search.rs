//! Search request options and response types.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const MAX_SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub source: Option<String>,
    pub category: Option<String>,
    /// Clamped to 1..=100; defaults to 20.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub source: String,
    #[serde(default)]
    pub category: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub matches: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({:.2})", self.source, self.name, self.score)
    }
}

/// Pagination and timing for a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchMeta {
    pub request_id: Option<String>,
    pub timestamp: Option<String>,
    pub query: Option<String>,
    pub total: Option<u64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub has_more: Option<bool>,
    pub search_time_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub meta: SearchMeta,
}

impl SearchResponse {
    pub fn len(&self) -> usize {
        self.results.len()
    }
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit_is_clamped() {
        assert_eq!(SearchOptions::new().effective_limit(), 20);
        assert_eq!(SearchOptions::new().limit(0).effective_limit(), 1);
        assert_eq!(SearchOptions::new().limit(500).effective_limit(), 100);
    }

    #[test]
    fn test_search_meta_tolerates_missing_fields() {
        let meta: SearchMeta =
            serde_json::from_value(serde_json::json!({"total": 3, "extra": true})).unwrap();
        assert_eq!(meta.total, Some(3));
        assert_eq!(meta.query, None);
    }
}
