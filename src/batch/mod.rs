//! 请求批处理模块：合并并发请求、去重，并在大小或时间阈值触发时统一派发。
//!
//! # Request Batching Module
//!
//! Coalesces concurrent icon requests into batch calls.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`RequestBatcher`] | Queue, dedup and dispatch scheduling |
//! | [`BatchConfig`] | Size trigger, wait trigger and dedup switch |
//! | [`BatchExecutor`] | Injected operation that sends one dispatch |
//! | [`BatchRequest`] | Dedup key of a batched request |
//!
//! ## Example
//!
//! ```rust
//! use svg_api::batch::{executor_fn, BatchConfig, BatchRequest, RequestBatcher};
//!
//! #[derive(Clone)]
//! struct Lookup(String);
//!
//! impl BatchRequest for Lookup {
//!     fn dedup_key(&self) -> String {
//!         self.0.clone()
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let batcher = RequestBatcher::new(
//!     executor_fn(|requests: Vec<Lookup>| async move {
//!         Ok::<_, svg_api::Error>(
//!             requests
//!                 .into_iter()
//!                 .map(|r| Ok::<_, svg_api::Error>(r.0.len()))
//!                 .collect::<Vec<_>>(),
//!         )
//!     }),
//!     BatchConfig::default(),
//! );
//! let len = batcher.enqueue(Lookup("home".into())).await.unwrap();
//! assert_eq!(len, 4);
//! # }
//! ```
//!
//! ## Scheduling
//!
//! - A full pending set (`max_batch_size`) dispatches immediately.
//! - Otherwise the first request of a window arms one timer of `max_wait_time`.
//! - Only one dispatch is in flight. Requests that arrive meanwhile wait for it
//!   to settle and are then dispatched or handed to a new timer.
//! - With dedup on, a request matching a pending or in-flight key shares that
//!   request's outcome.

mod batcher;
mod collector;
mod executor;

#[cfg(test)]
mod tests;

pub use batcher::RequestBatcher;
pub use collector::BatchConfig;
pub use executor::{executor_fn, BatchExecutor, BatchRequest, FnExecutor};
