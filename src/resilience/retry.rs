//! Retry executor: per-attempt timeout, error-class-aware retry, exponential
//! backoff with ±25% jitter.

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Fraction of the computed delay used as the jitter half-width.
const JITTER_RATIO: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt. Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Deadline for a single attempt.
    pub timeout: Duration,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }
    pub fn with_base_delay(mut self, d: Duration) -> Self {
        self.base_delay = d;
        self
    }
    pub fn with_max_delay(mut self, d: Duration) -> Self {
        self.max_delay = d;
        self
    }
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// What happened across the attempts of one logical call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryStats {
    pub attempts: u32,
    /// Backoff slept before each retry, in order.
    pub delays: Vec<Duration>,
}

impl RetryStats {
    pub fn retry_count(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Runs an async operation under the retry policy.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Un-jittered delay before retry `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay.as_millis() as u64;
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let cap = self.config.max_delay.as_millis() as u64;
        Duration::from_millis(base.saturating_mul(factor).min(cap))
    }

    /// Applies jitter to the nominal delay. `sample` is uniform in `[0, 1)`.
    fn jittered(&self, nominal: Duration, sample: f64) -> Duration {
        if !self.config.jitter {
            return nominal;
        }
        let ms = nominal.as_millis() as f64;
        let offset = ms * JITTER_RATIO * (2.0 * sample - 1.0);
        Duration::from_millis((ms + offset).max(0.0).round() as u64)
    }

    /// Delay to sleep before retry `attempt` after `err`.
    pub fn backoff_delay(&self, attempt: u32, err: &Error) -> Duration {
        if let Some(hint) = err.retry_after_ms() {
            return Duration::from_millis(hint).min(self.config.max_delay);
        }
        self.jittered(self.nominal_delay(attempt), fastrand::f64())
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_with_stats(operation, f).await.0
    }

    /// Like [`run`](Self::run), also reporting attempts and backoff delays.
    pub async fn run_with_stats<T, F, Fut>(
        &self,
        operation: &str,
        mut f: F,
    ) -> (Result<T>, RetryStats)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut stats = RetryStats::default();
        let mut attempt: u32 = 0;
        loop {
            stats.attempts += 1;
            let outcome = match tokio::time::timeout(self.config.timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(Error::timeout(self.config.timeout)),
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempts = stats.attempts, "succeeded after retry");
                    }
                    return (Ok(value), stats);
                }
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= self.config.max_retries {
                if err.is_retryable() {
                    warn!(
                        operation,
                        attempts = stats.attempts,
                        error_code = err.code().code(),
                        "retries exhausted"
                    );
                }
                return (Err(err), stats);
            }

            let delay = self.backoff_delay(attempt, &err);
            debug!(
                operation,
                attempt,
                error_code = err.code().code(),
                delay_ms = delay.as_millis() as u64,
                "retrying after failure"
            );
            stats.delays.push(delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
