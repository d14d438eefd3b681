use crate::batch::BatchConfig;
use crate::cache::CacheConfig;
use crate::client::config::ClientConfig;
use crate::client::core::SvgApiClient;
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`SvgApiClient`].
///
/// Keep this surface area small and predictable.
pub struct SvgApiClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl SvgApiClientBuilder {
    /// Builder seeded with defaults only.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
        }
    }

    /// Builder seeded with defaults plus `SVG_API_*` environment overrides.
    pub fn from_env() -> Self {
        Self::new().with_config(ClientConfig::default().apply_env())
    }

    /// Builder seeded from a YAML config file.
    pub async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = ClientConfig::from_yaml_file(path).await?;
        Ok(Self::new().with_config(config))
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn default_source(mut self, source: impl Into<String>) -> Self {
        self.config.default_source = source.into();
        self
    }

    /// Deadline for each attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.retry.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.retry.max_retries = n;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.config.retry.base_delay = delay;
        self
    }

    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.config.retry.max_delay = delay;
        self
    }

    /// Disable jitter for reproducible backoff (tests, benchmarks).
    pub fn retry_jitter(mut self, enable: bool) -> Self {
        self.config.retry.jitter = enable;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    pub fn batch(mut self, batch: BatchConfig) -> Self {
        self.config.batch = batch;
        self
    }

    /// Use a custom transport instead of the HTTP one.
    ///
    /// Primarily for testing with scripted responses.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<SvgApiClient> {
        self.config.validate()?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };
        Ok(SvgApiClient::from_parts(self.config, transport))
    }
}

impl Default for SvgApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
