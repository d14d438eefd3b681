use super::{ApiRequest, ApiResponse, Method, Transport};
use crate::client::config::ClientConfig;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use keyring::Entry;
use reqwest::header::HeaderMap;
use reqwest::Proxy;
use std::env;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;
use url::Url;
use uuid::Uuid;

const KEYRING_SERVICE: &str = "svg-api";

/// reqwest-backed [`Transport`].
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    user_agent: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api_key = config.api_key.clone().or_else(Self::get_api_key);

        let mut builder = reqwest::Client::builder()
            .timeout(config.retry.timeout)
            .pool_max_idle_per_host(
                env::var("SVG_API_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .http2_adaptive_window(true);

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration(format!("invalid proxy url '{}': {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::configuration(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            user_agent: config.user_agent.clone(),
            timeout: config.retry.timeout,
        })
    }

    /// Looks the key up in the OS keyring, then in `SVG_API_KEY`.
    fn get_api_key() -> Option<String> {
        if let Ok(entry) = Entry::new(KEYRING_SERVICE, "default") {
            if let Ok(key) = entry.get_password() {
                return Some(key);
            }
        }
        env::var("SVG_API_KEY").ok().filter(|k| !k.trim().is_empty())
    }

    fn build_url(&self, request: &ApiRequest) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, request.path);
        let mut url = Url::parse(&raw).map_err(|e| {
            Error::configuration(format!("invalid request url '{}': {}", raw, e))
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }
        Ok(url)
    }

    fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
        for name in names {
            if let Some(v) = headers.get(*name) {
                if let Ok(s) = v.to_str() {
                    let s = s.trim();
                    if !s.is_empty() {
                        return Some(s.to_string());
                    }
                }
            }
        }
        None
    }

    /// `Retry-After: <seconds>`, else `X-RateLimit-Reset` as epoch seconds or a
    /// delta in seconds.
    fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
        if let Some(raw) = Self::header_first(headers, &["retry-after"]) {
            if let Ok(secs) = raw.parse::<u64>() {
                return Some(secs.saturating_mul(1000));
            }
        }
        let raw = Self::header_first(headers, &["x-ratelimit-reset"])?;
        let value: u64 = raw.parse().ok()?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        if value > 1_000_000_000 {
            Some(value.saturating_sub(now).saturating_mul(1000))
        } else {
            Some(value.saturating_mul(1000))
        }
    }

    fn map_send_error(&self, e: reqwest::Error, path: &str) -> Error {
        if e.is_timeout() {
            return Error::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
                context: ErrorContext::new().with_source("http_transport"),
            };
        }
        Error::network(
            format!("{} failed: {}", path, e),
            ErrorContext::new().with_source("http_transport"),
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.build_url(&request)?;
        let client_request_id = Uuid::new_v4().to_string();

        let mut req = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req = req
            .header("accept", request.accept.mime())
            .header("user-agent", &self.user_agent)
            .header("x-client-request-id", &client_request_id);

        let started = std::time::Instant::now();
        let response = req
            .send()
            .await
            .map_err(|e| self.map_send_error(e, &request.path))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e, &request.path))?;

        debug!(
            method = request.method.as_str(),
            endpoint = %request.path,
            http_status = status,
            duration_ms = started.elapsed().as_millis() as u64,
            client_request_id = %client_request_id,
            "http call completed"
        );

        Ok(ApiResponse {
            status,
            content_type: Self::header_first(&headers, &["content-type"]),
            body,
            request_id: Self::header_first(&headers, &["x-request-id"]),
            retry_after_ms: Self::retry_after_ms(&headers),
        })
    }
}
