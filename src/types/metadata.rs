//! Source and category listings, response metadata.

use super::icon::License;
use serde::{Deserialize, Serialize};

/// An icon library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "unknown_version")]
    pub version: String,
    pub icon_count: u64,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub default_variant: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

fn unknown_version() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub icon_count: u64,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Filters for `GET /random`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RandomOptions {
    pub source: Option<String>,
    pub category: Option<String>,
}

impl RandomOptions {
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
}

/// `meta` of ordinary responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseMeta {
    pub request_id: Option<String>,
    pub timestamp: Option<String>,
    pub cached: Option<bool>,
    pub cache_age: Option<u64>,
}

/// `meta` of `/icons/batch` responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchMeta {
    pub request_id: Option<String>,
    pub requested: u32,
    pub successful: u32,
    pub failed: u32,
}
