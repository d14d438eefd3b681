//! `/icons/batch` calls: the batcher's executor and the sequential chunked path.

use crate::batch::BatchExecutor;
use crate::error_code::ErrorCode;
use crate::resilience::RetryExecutor;
use crate::transport::Transport;
use crate::types::{BatchEntry, BatchMeta, Icon, IconRequest};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::config::REMOTE_BATCH_LIMIT;
use super::endpoint;
use super::execution::{decode, execute};

const OPERATION: &str = "icons.batch";

/// Sends one `/icons/batch` call and maps each position to a result.
///
/// A response with fewer entries than requests yields a shorter vector; the
/// caller decides how to fail the missing positions.
pub(crate) async fn fetch_batch(
    transport: &Arc<dyn Transport>,
    retry: &RetryExecutor,
    requests: &[IconRequest],
) -> Result<Vec<Result<Icon>>> {
    let payload = execute(transport, retry, OPERATION, endpoint::batch(requests)).await?;
    let (data, meta) = payload.into_json(OPERATION)?;
    let entries: Vec<BatchEntry> = decode(data, OPERATION)?;

    if let Some(meta) = meta.and_then(|m| serde_json::from_value::<BatchMeta>(m).ok()) {
        debug!(
            requested = meta.requested,
            successful = meta.successful,
            failed = meta.failed,
            "batch response"
        );
    }
    if entries.len() != requests.len() {
        warn!(
            expected = requests.len(),
            received = entries.len(),
            "batch response size mismatch"
        );
    }

    Ok(entries.into_iter().map(entry_result).collect())
}

fn entry_result(entry: BatchEntry) -> Result<Icon> {
    match entry {
        BatchEntry::Icon(icon) => Ok(icon),
        BatchEntry::Failed {
            name,
            source,
            error,
        } => {
            let kind = ErrorCode::from_server_code(&error.code).unwrap_or(ErrorCode::Unknown);
            let mut context = ErrorContext::new()
                .with_error_code(error.code.clone())
                .with_source(OPERATION);
            if name.is_some() || source.is_some() {
                context = context.with_details(serde_json::json!({
                    "name": name,
                    "source": source,
                }));
            }
            Err(Error::from_code(kind, None, error.message, context))
        }
    }
}

pub(crate) fn missing_result(request: &IconRequest, position: usize) -> Error {
    Error::unknown(
        None,
        format!(
            "no result for icon '{}' at position {}",
            request.name, position
        ),
        ErrorContext::new().with_source(OPERATION),
    )
}

/// Fetches `requests` in chunks of at most [`REMOTE_BATCH_LIMIT`], one chunk at
/// a time. A failed chunk fails every slot in it.
pub(crate) async fn fetch_chunked(
    transport: &Arc<dyn Transport>,
    retry: &RetryExecutor,
    requests: &[IconRequest],
) -> Vec<Result<Icon>> {
    let mut out = Vec::with_capacity(requests.len());
    for chunk in requests.chunks(REMOTE_BATCH_LIMIT) {
        match fetch_batch(transport, retry, chunk).await {
            Ok(results) => {
                let mut results = results.into_iter();
                for (i, request) in chunk.iter().enumerate() {
                    out.push(
                        results
                            .next()
                            .unwrap_or_else(|| Err(missing_result(request, i))),
                    );
                }
            }
            Err(err) => out.extend(chunk.iter().map(|_| Err(err.clone()))),
        }
    }
    out
}

/// [`BatchExecutor`] used by the client's request batcher.
pub struct IconBatchExecutor {
    transport: Arc<dyn Transport>,
    retry: RetryExecutor,
}

impl IconBatchExecutor {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryExecutor) -> Self {
        Self { transport, retry }
    }
}

#[async_trait]
impl BatchExecutor for IconBatchExecutor {
    type Request = IconRequest;
    type Output = Icon;

    async fn execute(&self, requests: Vec<IconRequest>) -> Result<Vec<Result<Icon>>> {
        fetch_batch(&self.transport, &self.retry, &requests).await
    }
}
