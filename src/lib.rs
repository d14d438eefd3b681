//! # svg-api
//!
//! SVG 图标 API 的 Rust 客户端：带缓存、请求合并去重与重试的请求执行核心。
//!
//! Rust client for the SVG icon API, built around a request execution core
//! that keeps traffic low and failures predictable.
//!
//! ## Overview
//!
//! Every facade call flows through the same path:
//!
//! 1. parameters are validated and normalized before anything leaves the process;
//! 2. cache-eligible calls (single icons, source and category listings) consult
//!    the [`cache::ResponseCache`];
//! 3. multi-icon fetches are coalesced by the [`batch::RequestBatcher`], which
//!    also folds concurrent identical requests into one;
//! 4. every network call runs under the [`resilience::RetryExecutor`] with a
//!    per-attempt timeout and jittered exponential backoff;
//! 5. failures surface as a typed [`Error`] with a stable [`ErrorCode`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use svg_api::{IconOptions, IconRequest, SvgApiClient};
//!
//! #[tokio::main]
//! async fn main() -> svg_api::Result<()> {
//!     let client = SvgApiClient::builder()
//!         .api_key("your-api-key")
//!         .build()?;
//!
//!     let icon = client
//!         .get_icon("home", &IconOptions::new().source("lucide").size(32))
//!         .await?;
//!     println!("{} ({} bytes)", icon, icon.svg.len());
//!
//!     let icons = client
//!         .get_icons(vec![IconRequest::new("star"), IconRequest::new("heart")])
//!         .await;
//!     for result in icons {
//!         match result {
//!             Ok(icon) => println!("{}", icon),
//!             Err(e) => eprintln!("{} ({})", e, e.code()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`SvgApiClient`] facade, builder, configuration and validation |
//! | [`cache`] | LRU response cache with TTL and memory budget |
//! | [`batch`] | Request batching and deduplication |
//! | [`resilience`] | Retry executor |
//! | [`transport`] | Transport trait and the reqwest implementation |
//! | [`types`] | Icon, search and metadata types |

pub mod batch;
pub mod cache;
pub mod client;
pub mod error_code;
pub mod resilience;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{ClientConfig, SvgApiClient, SvgApiClientBuilder};
pub use error_code::ErrorCode;
pub use types::{
    Category, Icon, IconOptions, IconRequest, RandomOptions, SearchOptions, SearchResponse,
    SearchResult, Source,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
