//! Icon API client.
//!
//! Developer-friendly goal: keep the public surface small and predictable.
//! Implementation details are split into submodules under `src/client/`.

mod batching;
pub mod builder;
pub mod config;
pub mod core;
mod endpoint;
mod error_classification;
mod execution;
pub mod validation;

pub use batching::IconBatchExecutor;
pub use builder::SvgApiClientBuilder;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_SOURCE, REMOTE_BATCH_LIMIT};
pub use core::SvgApiClient;
