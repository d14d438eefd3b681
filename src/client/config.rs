//! Client configuration: defaults, environment overrides and YAML files.

use crate::batch::BatchConfig;
use crate::cache::CacheConfig;
use crate::resilience::RetryConfig;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.svg-api.org/v1";
pub const DEFAULT_SOURCE: &str = "heroicons";
/// Upper bound the server accepts for one `/icons/batch` call.
pub const REMOTE_BATCH_LIMIT: usize = 50;

/// Immutable settings captured when the client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub user_agent: String,
    pub proxy_url: Option<String>,
    /// Source used when a request does not name one.
    pub default_source: String,
    /// Per-attempt timeout lives in `retry.timeout`.
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            user_agent: format!("svg-api-rust/{}", env!("CARGO_PKG_VERSION")),
            proxy_url: None,
            default_source: DEFAULT_SOURCE.to_string(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

/// On-disk shape. Every field is optional and overrides the default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    api_key: Option<String>,
    user_agent: Option<String>,
    proxy_url: Option<String>,
    default_source: Option<String>,
    timeout_secs: Option<f64>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    retry_max_delay_ms: Option<u64>,
    retry_jitter: Option<bool>,
    cache: Option<CacheSection>,
    batch: Option<BatchSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CacheSection {
    enabled: Option<bool>,
    max_entries: Option<usize>,
    max_memory_bytes: Option<usize>,
    ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BatchSection {
    enabled: Option<bool>,
    max_batch_size: Option<usize>,
    max_wait_ms: Option<u64>,
    dedup: Option<bool>,
}

impl ClientConfig {
    /// Parses a YAML document such as:
    ///
    /// ```yaml
    /// base_url: https://api.svg-api.org/v1
    /// timeout_secs: 10
    /// max_retries: 2
    /// cache:
    ///   max_entries: 200
    ///   ttl_secs: 60
    /// batch:
    ///   max_wait_ms: 20
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::configuration(format!("invalid config: {}", e)))?;
        let config = Self::default().merge(file)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    fn merge(mut self, file: ConfigFile) -> Result<Self> {
        if let Some(v) = file.base_url {
            self.base_url = v;
        }
        if file.api_key.is_some() {
            self.api_key = file.api_key;
        }
        if let Some(v) = file.user_agent {
            self.user_agent = v;
        }
        if file.proxy_url.is_some() {
            self.proxy_url = file.proxy_url;
        }
        if let Some(v) = file.default_source {
            self.default_source = v;
        }
        if let Some(secs) = file.timeout_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(Error::configuration("timeout_secs must be positive"));
            }
            self.retry.timeout = Duration::from_secs_f64(secs);
        }
        if let Some(v) = file.max_retries {
            self.retry.max_retries = v;
        }
        if let Some(ms) = file.retry_base_delay_ms {
            self.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.retry_max_delay_ms {
            self.retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(v) = file.retry_jitter {
            self.retry.jitter = v;
        }
        if let Some(cache) = file.cache {
            if let Some(v) = cache.enabled {
                self.cache.enabled = v;
            }
            if let Some(v) = cache.max_entries {
                self.cache.max_entries = v;
            }
            if let Some(v) = cache.max_memory_bytes {
                self.cache.max_memory_bytes = v;
            }
            if let Some(v) = cache.ttl_secs {
                self.cache.default_ttl = Duration::from_secs(v);
            }
        }
        if let Some(batch) = file.batch {
            if let Some(v) = batch.enabled {
                self.batch.enabled = v;
            }
            if let Some(v) = batch.max_batch_size {
                self.batch.max_batch_size = v;
            }
            if let Some(v) = batch.max_wait_ms {
                self.batch.max_wait_time = Duration::from_millis(v);
            }
            if let Some(v) = batch.dedup {
                self.batch.dedup = v;
            }
        }
        Ok(self)
    }

    /// Applies `SVG_API_*` environment variables on top of the current values.
    ///
    /// - `SVG_API_BASE_URL`
    /// - `SVG_API_KEY`
    /// - `SVG_API_TIMEOUT_SECS`
    /// - `SVG_API_MAX_RETRIES`
    /// - `SVG_API_PROXY_URL`
    pub fn apply_env(mut self) -> Self {
        if let Ok(v) = std::env::var("SVG_API_BASE_URL") {
            if !v.trim().is_empty() {
                self.base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("SVG_API_KEY") {
            if !v.trim().is_empty() {
                self.api_key = Some(v.trim().to_string());
            }
        }
        if let Some(secs) = std::env::var("SVG_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            self.retry.timeout = Duration::from_secs(secs);
        }
        if let Some(n) = std::env::var("SVG_API_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            self.retry.max_retries = n;
        }
        if let Ok(v) = std::env::var("SVG_API_PROXY_URL") {
            if !v.trim().is_empty() {
                self.proxy_url = Some(v.trim().to_string());
            }
        }
        self
    }

    /// Rejects settings the client cannot honor.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::configuration(format!("invalid base_url '{}': {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.retry.timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than zero"));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(Error::configuration(
                "retry base delay must not exceed the max delay",
            ));
        }
        if self.batch.max_batch_size == 0 || self.batch.max_batch_size > REMOTE_BATCH_LIMIT {
            return Err(Error::configuration(format!(
                "max_batch_size must be between 1 and {}",
                REMOTE_BATCH_LIMIT
            )));
        }
        if self.default_source.trim().is_empty() {
            return Err(Error::configuration("default_source must not be empty"));
        }
        Ok(())
    }
}
