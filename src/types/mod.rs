//! 类型模块：图标、搜索结果与元数据的强类型表示。
//!
//! # Types Module
//!
//! Typed payloads of the icon API.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Icon`] | Icon with SVG markup, tags and license |
//! | [`IconOptions`] | Source, size, color and stroke for one icon |
//! | [`IconRequest`] | One entry of a multi-icon fetch (dedup key lives here) |
//! | [`SearchResponse`] | Ranked [`SearchResult`]s plus [`SearchMeta`] |
//! | [`Source`] / [`Category`] | Metadata listings |
//!
//! ```rust
//! use svg_api::types::{IconOptions, IconRequest};
//!
//! let options = IconOptions::new().source("lucide").size(32).color("#3b82f6");
//! let request = IconRequest::with_options("arrow-right", &options);
//! assert_eq!(request.size, Some(32));
//! ```

pub mod icon;
pub mod metadata;
pub mod search;

pub use icon::{BatchEntry, BatchItemError, Icon, IconOptions, IconRequest, License};
pub use metadata::{BatchMeta, Category, RandomOptions, ResponseMeta, Source};
pub use search::{SearchMeta, SearchOptions, SearchResponse, SearchResult};
