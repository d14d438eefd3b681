//! Icon payloads and icon request shapes.

use crate::batch::BatchRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One icon with its SVG markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub name: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub svg: String,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.name)
    }
}

/// Rendering options for a single icon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconOptions {
    /// Falls back to the client's default source.
    pub source: Option<String>,
    /// Pixels, 8 to 512.
    pub size: Option<u32>,
    /// `#rrggbb` or a lower-case color name.
    pub color: Option<String>,
    /// Stroke width, 0.5 to 3.
    pub stroke: Option<f64>,
}

impl IconOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
    pub fn stroke(mut self, stroke: f64) -> Self {
        self.stroke = Some(stroke);
        self
    }
}

/// One entry of a multi-icon fetch; also the body item of `POST /icons/batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<f64>,
}

impl IconRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            size: None,
            color: None,
            stroke: None,
        }
    }

    pub fn with_options(name: impl Into<String>, options: &IconOptions) -> Self {
        Self {
            name: name.into(),
            source: options.source.clone(),
            size: options.size,
            color: options.color.clone(),
            stroke: options.stroke,
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
    pub fn stroke(mut self, stroke: f64) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn options(&self) -> IconOptions {
        IconOptions {
            source: self.source.clone(),
            size: self.size,
            color: self.color.clone(),
            stroke: self.stroke,
        }
    }

    /// Same request with `source` filled in, `color` trimmed and lower-cased
    /// and `stroke` rounded to two decimals.
    pub(crate) fn normalized(mut self, default_source: &str) -> Self {
        self.name = self.name.trim().to_string();
        if self.source.as_deref().map_or(true, |s| s.trim().is_empty()) {
            self.source = Some(default_source.to_string());
        }
        self.color = self.color.map(|c| c.trim().to_ascii_lowercase());
        self.stroke = self.stroke.map(|s| (s * 100.0).round() / 100.0);
        self
    }
}

impl BatchRequest for IconRequest {
    /// `name|source|size|color|stroke` with stroke fixed to two decimals, so
    /// `1.5` and `1.500001` collapse to one request.
    fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.name,
            self.source.as_deref().unwrap_or(""),
            self.size.map(|s| s.to_string()).unwrap_or_default(),
            self.color
                .as_deref()
                .map(|c| c.trim().to_ascii_lowercase())
                .unwrap_or_default(),
            self.stroke.map(|s| format!("{:.2}", s)).unwrap_or_default(),
        )
    }
}

/// Failure entry inside a batch response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchItemError {
    pub code: String,
    pub message: String,
}

/// One position of the `/icons/batch` `data` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Failed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        source: Option<String>,
        error: BatchItemError,
    },
    Icon(Icon),
}
