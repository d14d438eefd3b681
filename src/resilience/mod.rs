//! 弹性模块：带超时、错误分类与指数退避抖动的重试执行器。
//!
//! # Resilience Module
//!
//! Every network call made by the client runs through [`RetryExecutor`]:
//!
//! - each attempt is bounded by `RetryConfig::timeout`;
//! - failures are classified with [`Error::is_retryable`](crate::Error::is_retryable)
//!   (429, 5xx, network and timeout failures retry; validation, not-found and
//!   other 4xx failures do not);
//! - retry `n` waits `base_delay * 2^n`, capped at `max_delay` and jittered by ±25%,
//!   unless the server supplied a retry-after hint.
//!
//! ```rust
//! use svg_api::resilience::{RetryConfig, RetryExecutor};
//! use std::time::Duration;
//!
//! # async fn demo() -> svg_api::Result<()> {
//! let retry = RetryExecutor::new(
//!     RetryConfig::new()
//!         .with_max_retries(3)
//!         .with_base_delay(Duration::from_millis(250)),
//! );
//! let value = retry.run("ping", || async { Ok::<_, svg_api::Error>(42) }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

pub mod retry;

pub use retry::{RetryConfig, RetryExecutor, RetryStats};
