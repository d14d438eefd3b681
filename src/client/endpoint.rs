//! Endpoint paths and request shapes.

use crate::cache::CacheKey;
use crate::transport::{Accept, ApiRequest};
use crate::types::{IconRequest, RandomOptions, SearchOptions};
use serde_json::json;

pub(crate) const ICONS_BATCH: &str = "/icons/batch";
pub(crate) const SEARCH: &str = "/search";
pub(crate) const SOURCES: &str = "/sources";
pub(crate) const CATEGORIES: &str = "/categories";
pub(crate) const RANDOM: &str = "/random";

fn icon_path(name: &str) -> String {
    format!("/icons/{}", name)
}

/// `GET /icons/{name}` for an already normalized request.
pub(crate) fn icon(request: &IconRequest) -> ApiRequest {
    ApiRequest::get(icon_path(&request.name))
        .with_optional_query("source", request.source.as_deref())
        .with_optional_query("size", request.size)
        .with_optional_query("color", request.color.as_deref())
        .with_optional_query("stroke", request.stroke)
}

/// Same as [`icon`] but asks for the raw SVG document.
pub(crate) fn icon_svg(request: &IconRequest) -> ApiRequest {
    icon(request).with_query("format", "svg").with_accept(Accept::Svg)
}

pub(crate) fn batch(requests: &[IconRequest]) -> ApiRequest {
    ApiRequest::post(ICONS_BATCH, json!({ "icons": requests }))
}

pub(crate) fn search(query: &str, options: &SearchOptions) -> ApiRequest {
    ApiRequest::get(SEARCH)
        .with_query("q", query.trim())
        .with_optional_query("source", options.source.as_deref())
        .with_optional_query("category", options.category.as_deref())
        .with_query("limit", options.effective_limit())
        .with_query("offset", options.offset.unwrap_or(0))
}

pub(crate) fn sources() -> ApiRequest {
    ApiRequest::get(SOURCES)
}

pub(crate) fn categories(source: Option<&str>) -> ApiRequest {
    ApiRequest::get(CATEGORIES).with_optional_query("source", source)
}

pub(crate) fn random(options: &RandomOptions) -> ApiRequest {
    ApiRequest::get(RANDOM)
        .with_optional_query("source", options.source.as_deref())
        .with_optional_query("category", options.category.as_deref())
}

pub(crate) fn cache_key(request: &ApiRequest) -> CacheKey {
    CacheKey::new(&request.path, request.query.iter().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_request_shape() {
        let req = IconRequest::new("home")
            .source("lucide")
            .size(32)
            .stroke(1.5);
        let api = icon(&req);
        assert_eq!(api.path, "/icons/home");
        assert_eq!(
            cache_key(&api).as_str(),
            "/icons/home?size=32&source=lucide&stroke=1.5"
        );
        let svg = icon_svg(&req);
        assert_eq!(svg.accept, Accept::Svg);
        assert_ne!(cache_key(&svg), cache_key(&api));
    }

    #[test]
    fn test_search_clamps_limit() {
        let api = search(" home ", &SearchOptions::new().limit(1000));
        assert!(api.query.contains(&("q".to_string(), "home".to_string())));
        assert!(api.query.contains(&("limit".to_string(), "100".to_string())));
        assert!(api.query.contains(&("offset".to_string(), "0".to_string())));
    }

    #[test]
    fn test_batch_body() {
        let api = batch(&[IconRequest::new("a"), IconRequest::new("b").source("lucide")]);
        assert_eq!(
            api.body.unwrap(),
            json!({"icons": [{"name": "a"}, {"name": "b", "source": "lucide"}]})
        );
    }
}
