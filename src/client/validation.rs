//! 参数校验：在任何网络调用之前拒绝非法的尺寸、描边、颜色与名称。
//!
//! Client-side parameter validation.

use crate::types::{IconOptions, IconRequest};
use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_SIZE: u32 = 8;
pub const MAX_SIZE: u32 = 512;
pub const MIN_STROKE: f64 = 0.5;
pub const MAX_STROKE: f64 = 3.0;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());
static NAMED_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]+$").unwrap());
static ICON_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

fn invalid(code: &str, field: &str, message: impl Into<String>) -> Error {
    Error::invalid_parameter(
        message,
        ErrorContext::new()
            .with_error_code(code)
            .with_details(serde_json::json!({ "field": field }))
            .with_source("validation"),
    )
}

pub fn validate_name(name: &str) -> Result<()> {
    if !ICON_NAME.is_match(name.trim()) {
        return Err(invalid(
            "INVALID_NAME",
            "name",
            format!("Invalid icon name '{}'", name),
        ));
    }
    Ok(())
}

pub fn validate_size(size: u32) -> Result<()> {
    if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
        return Err(invalid(
            "INVALID_SIZE",
            "size",
            format!("Size must be between {} and {}", MIN_SIZE, MAX_SIZE),
        ));
    }
    Ok(())
}

pub fn validate_stroke(stroke: f64) -> Result<()> {
    if !stroke.is_finite() || !(MIN_STROKE..=MAX_STROKE).contains(&stroke) {
        return Err(invalid(
            "INVALID_STROKE",
            "stroke",
            format!("Stroke must be between {} and {}", MIN_STROKE, MAX_STROKE),
        ));
    }
    Ok(())
}

/// `#rrggbb` (either case) or a lower-case color name such as `red`.
pub fn validate_color(color: &str) -> Result<()> {
    let color = color.trim();
    if HEX_COLOR.is_match(color) || NAMED_COLOR.is_match(color) {
        return Ok(());
    }
    Err(invalid(
        "INVALID_COLOR",
        "color",
        "Invalid color format",
    ))
}

pub fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(invalid("INVALID_QUERY", "q", "Search query must not be empty"));
    }
    Ok(())
}

pub fn validate_icon_options(options: &IconOptions) -> Result<()> {
    if let Some(size) = options.size {
        validate_size(size)?;
    }
    if let Some(stroke) = options.stroke {
        validate_stroke(stroke)?;
    }
    if let Some(color) = &options.color {
        validate_color(color)?;
    }
    Ok(())
}

pub fn validate_icon_request(request: &IconRequest) -> Result<()> {
    validate_name(&request.name)?;
    validate_icon_options(&request.options())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(err: Error) -> Option<String> {
        err.context().error_code.clone()
    }

    #[test]
    fn test_size_bounds() {
        assert!(validate_size(8).is_ok());
        assert!(validate_size(512).is_ok());
        assert_eq!(code_of(validate_size(7).unwrap_err()).as_deref(), Some("INVALID_SIZE"));
        assert!(validate_size(513).is_err());
    }

    #[test]
    fn test_stroke_bounds() {
        assert!(validate_stroke(0.5).is_ok());
        assert!(validate_stroke(3.0).is_ok());
        assert!(validate_stroke(0.49).is_err());
        assert!(validate_stroke(f64::NAN).is_err());
    }

    #[test]
    fn test_colors() {
        assert!(validate_color("#ff00AA").is_ok());
        assert!(validate_color("red").is_ok());
        assert!(validate_color("Red").is_err());
        assert!(validate_color("#fff").is_err());
        let err = validate_color("rgb(0,0,0)").unwrap_err();
        assert_eq!(err.code().code(), "INVALID_PARAMETER");
        assert_eq!(code_of(err).as_deref(), Some("INVALID_COLOR"));
    }

    #[test]
    fn test_names_and_queries() {
        assert!(validate_name("arrow-right").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_query("  ").is_err());
        assert!(validate_query("home").is_ok());
    }
}
