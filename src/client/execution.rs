//! 请求执行逻辑：经由重试执行器发送请求，并解包成功响应。
//!
//! Request execution: one logical call through the retry executor, then
//! decoding of the success body.

use crate::resilience::RetryExecutor;
use crate::transport::{ApiRequest, ApiResponse, Transport};
use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::error_classification::classify_response;

/// Decoded success body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Payload {
    /// JSON with the `{ data, meta }` envelope removed.
    Json { data: Value, meta: Option<Value> },
    /// Raw asset such as `image/svg+xml`.
    Raw(String),
}

impl Payload {
    /// Value form used for caching. Raw bodies become a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Payload::Json { data, .. } => data,
            Payload::Raw(text) => Value::String(text),
        }
    }

    pub fn into_json(self, endpoint: &str) -> Result<(Value, Option<Value>)> {
        match self {
            Payload::Json { data, meta } => Ok((data, meta)),
            Payload::Raw(_) => Err(Error::decode(
                "expected a JSON response",
                ErrorContext::new().with_source(endpoint.to_string()),
            )),
        }
    }
}

/// Turns one HTTP response into a payload or a classified error.
pub(crate) fn into_payload(response: ApiResponse, endpoint: &str) -> Result<Payload> {
    if !response.is_success() {
        return Err(classify_response(&response, endpoint));
    }
    if !response.is_json() {
        return Ok(Payload::Raw(response.text()));
    }
    let json: Value = serde_json::from_slice(&response.body).map_err(|e| {
        let mut context = ErrorContext::new()
            .with_status_code(response.status)
            .with_source(endpoint.to_string());
        if let Some(id) = &response.request_id {
            context = context.with_request_id(id.clone());
        }
        Error::decode(format!("invalid JSON body: {}", e), context)
    })?;
    match json {
        Value::Object(mut obj) if obj.contains_key("data") => {
            let data = obj.remove("data").unwrap_or(Value::Null);
            let meta = obj.remove("meta");
            Ok(Payload::Json { data, meta })
        }
        other => Ok(Payload::Json {
            data: other,
            meta: None,
        }),
    }
}

/// Sends `request` under the retry policy and decodes the final response.
pub(crate) async fn execute(
    transport: &Arc<dyn Transport>,
    retry: &RetryExecutor,
    endpoint: &str,
    request: ApiRequest,
) -> Result<Payload> {
    let started = std::time::Instant::now();
    let (result, stats) = retry
        .run_with_stats(endpoint, || {
            let request = request.clone();
            async move {
                let response = transport.send(request).await?;
                into_payload(response, endpoint)
            }
        })
        .await;

    if let Err(err) = &result {
        info!(
            endpoint,
            http_status = err.status_code().unwrap_or(0),
            error_code = err.code().code(),
            request_id = err.context().request_id.as_deref().unwrap_or(""),
            attempts = stats.attempts,
            duration_ms = started.elapsed().as_millis() as u64,
            "request failed"
        );
    }
    result
}

/// Deserializes a payload value, tagging failures with the endpoint.
pub(crate) fn decode<T: DeserializeOwned>(value: Value, endpoint: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::decode(
            format!("unexpected response shape: {}", e),
            ErrorContext::new().with_source(endpoint.to_string()),
        )
    })
}
