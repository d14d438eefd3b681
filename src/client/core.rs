use crate::batch::RequestBatcher;
use crate::cache::{CacheStats, ResponseCache};
use crate::resilience::RetryExecutor;
use crate::transport::{ApiRequest, Transport};
use crate::types::{
    Category, Icon, IconOptions, IconRequest, RandomOptions, SearchMeta, SearchOptions,
    SearchResponse, SearchResult, Source,
};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::batching::{fetch_chunked, IconBatchExecutor};
use super::builder::SvgApiClientBuilder;
use super::config::ClientConfig;
use super::endpoint;
use super::execution::{decode, execute, Payload};
use super::validation;

/// Icon API client.
///
/// Cheap to clone; clones share the cache, the batcher and the transport.
#[derive(Clone)]
pub struct SvgApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    retry: RetryExecutor,
    cache: ResponseCache,
    batcher: Option<RequestBatcher<IconBatchExecutor>>,
}

impl SvgApiClient {
    /// Client with default settings plus `SVG_API_*` environment overrides.
    pub fn new() -> Result<Self> {
        SvgApiClientBuilder::from_env().build()
    }

    pub fn builder() -> SvgApiClientBuilder {
        SvgApiClientBuilder::new()
    }

    pub(crate) fn from_parts(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let retry = RetryExecutor::new(config.retry.clone());
        let cache = ResponseCache::new(config.cache.clone());
        let batcher = config.batch.enabled.then(|| {
            RequestBatcher::new(
                IconBatchExecutor::new(transport.clone(), retry.clone()),
                config.batch.clone(),
            )
        });
        info!(
            base_url = %config.base_url,
            cache_enabled = config.cache.enabled,
            batch_enabled = config.batch.enabled,
            max_retries = config.retry.max_retries,
            "svg api client ready"
        );
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                retry,
                cache,
                batcher,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn cache_enabled(&self) -> bool {
        self.inner.config.cache.enabled
    }

    async fn call(&self, endpoint: &str, request: ApiRequest) -> Result<Payload> {
        execute(&self.inner.transport, &self.inner.retry, endpoint, request).await
    }

    /// Cache lookup, then a retried call on miss; the result is stored on success.
    async fn call_cached(&self, endpoint: &str, request: ApiRequest) -> Result<Value> {
        let key = endpoint::cache_key(&request);
        if self.cache_enabled() {
            if let Some(value) = self.inner.cache.get(key.as_str()) {
                debug!(endpoint, key = %key, "cache hit");
                return Ok(value);
            }
        }
        let value = self.call(endpoint, request).await?.into_value();
        if self.cache_enabled() {
            self.inner.cache.set(key.as_str(), value.clone(), None);
        }
        Ok(value)
    }

    fn prepare_icon(&self, name: &str, options: &IconOptions) -> Result<IconRequest> {
        let request = IconRequest::with_options(name, options)
            .normalized(&self.inner.config.default_source);
        validation::validate_icon_request(&request)?;
        Ok(request)
    }

    /// Fetches one icon. Cached.
    pub async fn get_icon(&self, name: &str, options: &IconOptions) -> Result<Icon> {
        let request = self.prepare_icon(name, options)?;
        let value = self.call_cached("icons.get", endpoint::icon(&request)).await?;
        decode(value, "icons.get")
    }

    /// Fetches the raw SVG document of one icon. Cached separately from [`get_icon`](Self::get_icon).
    pub async fn get_icon_svg(&self, name: &str, options: &IconOptions) -> Result<String> {
        let request = self.prepare_icon(name, options)?;
        let value = self
            .call_cached("icons.svg", endpoint::icon_svg(&request))
            .await?;
        match value {
            Value::String(svg) => Ok(svg),
            // server ignored `format=svg` and sent the icon object
            other => {
                let icon: Icon = decode(other, "icons.svg")?;
                Ok(icon.svg)
            }
        }
    }

    /// Writes the icon's SVG to `path`, creating parent directories, and
    /// returns the absolute path written.
    pub async fn download_icon(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        options: &IconOptions,
    ) -> Result<PathBuf> {
        let svg = self.get_icon_svg(name, options).await?;
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(e, Some(parent)))?;
        }
        tokio::fs::write(&path, svg.as_bytes())
            .await
            .map_err(|e| Error::io(e, Some(path.as_path())))?;
        debug!(icon = name, path = %path.display(), "icon downloaded");
        Ok(path)
    }

    /// Fetches many icons. One result per request, in request order.
    ///
    /// Invalid requests fail in place without a network call. Cached icons are
    /// served from the cache. The rest go through the request batcher when
    /// batching is enabled, otherwise through sequential chunked batch calls.
    pub async fn get_icons(&self, requests: Vec<IconRequest>) -> Vec<Result<Icon>> {
        let mut slots: Vec<Option<Result<Icon>>> = Vec::with_capacity(requests.len());
        let mut to_fetch: Vec<(usize, IconRequest, String)> = Vec::new();

        for (i, request) in requests.into_iter().enumerate() {
            let request = request.normalized(&self.inner.config.default_source);
            if let Err(err) = validation::validate_icon_request(&request) {
                slots.push(Some(Err(err)));
                continue;
            }
            let key = endpoint::cache_key(&endpoint::icon(&request)).as_str().to_string();
            if self.cache_enabled() {
                if let Some(value) = self.inner.cache.get(&key) {
                    if let Ok(icon) = decode::<Icon>(value, "icons.get") {
                        slots.push(Some(Ok(icon)));
                        continue;
                    }
                }
            }
            slots.push(None);
            to_fetch.push((i, request, key));
        }

        if !to_fetch.is_empty() {
            let batch: Vec<IconRequest> = to_fetch.iter().map(|(_, r, _)| r.clone()).collect();
            let fetched = match &self.inner.batcher {
                Some(batcher) => batcher.enqueue_many(batch).await,
                None => fetch_chunked(&self.inner.transport, &self.inner.retry, &batch).await,
            };
            for ((i, _, key), result) in to_fetch.into_iter().zip(fetched) {
                match &result {
                    Ok(icon) if self.cache_enabled() => {
                        if let Ok(value) = serde_json::to_value(icon) {
                            self.inner.cache.set(&key, value, None);
                        }
                    }
                    _ => {}
                }
                slots[i] = Some(result);
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.unwrap_or_else(|| {
                    Err(Error::unknown(
                        None,
                        format!("no result for request at position {}", i),
                        ErrorContext::new().with_source("icons.batch"),
                    ))
                })
            })
            .collect()
    }

    /// Full-text search. Never cached.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        validation::validate_query(query)?;
        let (data, meta) = self
            .call("search", endpoint::search(query, options))
            .await?
            .into_json("search")?;
        let results: Vec<SearchResult> = decode(data, "search")?;
        let meta: SearchMeta = match meta {
            Some(meta) => decode(meta, "search")?,
            None => SearchMeta::default(),
        };
        Ok(SearchResponse { results, meta })
    }

    /// Lists icon sources. Cached.
    pub async fn sources(&self) -> Result<Vec<Source>> {
        let value = self.call_cached("sources", endpoint::sources()).await?;
        decode(value, "sources")
    }

    /// Lists categories, optionally limited to one source. Cached.
    pub async fn categories(&self, source: Option<&str>) -> Result<Vec<Category>> {
        let value = self
            .call_cached("categories", endpoint::categories(source))
            .await?;
        decode(value, "categories")
    }

    /// A random icon. Never cached.
    pub async fn random(&self, options: &RandomOptions) -> Result<Icon> {
        let (data, _) = self
            .call("random", endpoint::random(options))
            .await?
            .into_json("random")?;
        decode(data, "random")
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Requests queued in the batcher and not yet dispatched.
    pub fn batch_pending_count(&self) -> usize {
        self.inner
            .batcher
            .as_ref()
            .map(|b| b.pending_count())
            .unwrap_or(0)
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Dispatches queued batch requests now and waits until they settle.
    pub async fn flush_batch(&self) {
        if let Some(batcher) = &self.inner.batcher {
            batcher.flush().await;
        }
    }

    /// Rejects every queued batch request with a cancellation error.
    pub fn cancel_pending(&self) {
        if let Some(batcher) = &self.inner.batcher {
            batcher.cancel_all();
        }
    }
}

impl std::fmt::Debug for SvgApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("cache_enabled", &self.inner.config.cache.enabled)
            .field("batch_enabled", &self.inner.config.batch.enabled)
            .finish()
    }
}
