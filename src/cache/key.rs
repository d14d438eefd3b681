//! Cache key generation.

use std::collections::BTreeMap;
use std::fmt;

/// Canonical request identity: endpoint path plus its query parameters sorted by name.
///
/// ```rust
/// use svg_api::cache::CacheKey;
///
/// let a = CacheKey::new("/icons/home", [("size", "24"), ("source", "lucide")]);
/// let b = CacheKey::new("/icons/home", [("source", "lucide"), ("size", "24")]);
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "/icons/home?size=24&source=lucide");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new<I, K, V>(path: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let sorted: BTreeMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if sorted.is_empty() {
            return Self(path.to_string());
        }
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &sorted {
            query.append_pair(k, v);
        }
        Self(format!("{}?{}", path, query.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}
