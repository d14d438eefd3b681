//! 错误分类：把非 2xx 响应映射为带稳定错误码的 [`Error`]。
//!
//! Error classification for non-2xx responses.
//!
//! Structured bodies look like
//! `{ "error": { "code", "message", "details"? }, "meta": { "request_id", "timestamp" } }`.
//! The server code decides the kind when it is known; HTTP 429 and 5xx always
//! classify as rate-limited / server errors so they stay retryable. Bodies that
//! are not JSON, or JSON without an `error` object, become [`Error::Unknown`]
//! carrying the raw status and text.

use crate::error_code::ErrorCode;
use crate::transport::ApiResponse;
use crate::{Error, ErrorContext};
use serde_json::Value;

/// Longest raw body excerpt kept in an error message.
const MAX_RAW_MESSAGE: usize = 200;

struct ServerError {
    code: Option<String>,
    message: Option<String>,
    details: Option<Value>,
    request_id: Option<String>,
}

fn parse_error_body(body: &str) -> Option<ServerError> {
    let json: Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    let (code, message, details) = match error {
        Value::Object(obj) => (
            obj.get("code").and_then(|v| v.as_str()).map(str::to_string),
            obj.get("message").and_then(|v| v.as_str()).map(str::to_string),
            obj.get("details").filter(|d| !d.is_null()).cloned(),
        ),
        Value::String(message) => (None, Some(message.clone()), None),
        _ => return None,
    };
    let request_id = json
        .get("meta")
        .and_then(|m| m.get("request_id"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Some(ServerError {
        code,
        message,
        details,
        request_id,
    })
}

fn status_kind(status: u16) -> Option<ErrorCode> {
    match status {
        429 => Some(ErrorCode::RateLimited),
        500..=599 => Some(ErrorCode::ServerError),
        _ => None,
    }
}

fn raw_excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_RAW_MESSAGE {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_RAW_MESSAGE).collect();
    format!("{}...", cut)
}

/// `details.retry_after` in seconds.
fn details_retry_after_ms(details: Option<&Value>) -> Option<u64> {
    let secs = details?.get("retry_after")?;
    if let Some(n) = secs.as_u64() {
        return Some(n.saturating_mul(1000));
    }
    secs.as_f64()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| (s * 1000.0).round() as u64)
}

/// Builds the error for a response whose status is outside 2xx.
pub(crate) fn classify_response(response: &ApiResponse, endpoint: &str) -> Error {
    let status = response.status;
    let text = response.text();
    let mut context = ErrorContext::new()
        .with_status_code(status)
        .with_source(endpoint.to_string());

    let Some(parsed) = parse_error_body(&text) else {
        if let Some(id) = &response.request_id {
            context = context.with_request_id(id.clone());
        }
        let message = if text.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            raw_excerpt(&text)
        };
        return Error::unknown(Some(status), message, context)
            .with_retry_after(response.retry_after_ms);
    };

    if let Some(id) = response.request_id.clone().or(parsed.request_id) {
        context = context.with_request_id(id);
    }
    if let Some(code) = &parsed.code {
        context = context.with_error_code(code.clone());
    }
    let hint = details_retry_after_ms(parsed.details.as_ref()).or(response.retry_after_ms);
    if let Some(details) = parsed.details {
        context = context.with_details(details);
    }

    let kind = status_kind(status)
        .or_else(|| parsed.code.as_deref().and_then(ErrorCode::from_server_code))
        .unwrap_or_else(|| ErrorCode::from_http_status(status));
    let message = parsed
        .message
        .unwrap_or_else(|| format!("HTTP {}", status));

    Error::from_code(kind, Some(status), message, context).with_retry_after(hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_not_found() {
        let resp = ApiResponse::json(
            404,
            &json!({
                "error": {"code": "ICON_NOT_FOUND", "message": "Icon 'nope' not found"},
                "meta": {"request_id": "req_abc", "timestamp": "2024-01-01T00:00:00Z"}
            }),
        );
        let err = classify_response(&resp, "icons.get");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.message(), "Icon 'nope' not found");
        assert_eq!(err.context().request_id.as_deref(), Some("req_abc"));
        assert_eq!(err.context().error_code.as_deref(), Some("ICON_NOT_FOUND"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_header_request_id_wins() {
        let resp = ApiResponse::json(
            400,
            &json!({"error": {"code": "INVALID_SIZE", "message": "bad"}, "meta": {"request_id": "body"}}),
        )
        .with_request_id("header");
        let err = classify_response(&resp, "icons.get");
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert_eq!(err.context().request_id.as_deref(), Some("header"));
    }

    #[test]
    fn test_rate_limit_hint_from_details() {
        let resp = ApiResponse::json(
            429,
            &json!({"error": {"code": "RATE_LIMITED", "message": "slow down", "details": {"retry_after": 7}}}),
        )
        .with_retry_after_ms(1000);
        let err = classify_response(&resp, "search");
        assert_eq!(err.code(), ErrorCode::RateLimited);
        assert_eq!(err.retry_after_ms(), Some(7000));
    }

    #[test]
    fn test_rate_limit_hint_from_header() {
        let resp = ApiResponse::json(429, &json!({"error": {"message": "slow down"}}))
            .with_retry_after_ms(2000);
        let err = classify_response(&resp, "search");
        assert_eq!(err.retry_after_ms(), Some(2000));
    }

    #[test]
    fn test_5xx_stays_retryable_whatever_the_code() {
        let resp = ApiResponse::json(
            503,
            &json!({"error": {"code": "ICON_NOT_FOUND", "message": "index warming up"}}),
        );
        let err = classify_response(&resp, "icons.get");
        assert_eq!(err.code(), ErrorCode::ServerError);
        assert_eq!(err.status_code(), Some(503));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_non_json_body_is_unknown_with_raw_text() {
        let resp = ApiResponse::new(502, "<html>Bad Gateway</html>").with_content_type("text/html");
        let err = classify_response(&resp, "icons.get");
        assert_eq!(err.code(), ErrorCode::Unknown);
        assert_eq!(err.status_code(), Some(502));
        assert!(err.message().contains("Bad Gateway"));
        assert!(err.is_retryable());

        let resp = ApiResponse::new(418, "");
        let err = classify_response(&resp, "icons.get");
        assert_eq!(err.message(), "HTTP 418");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unknown_server_code_falls_back_to_status() {
        let resp = ApiResponse::json(
            401,
            &json!({"error": {"code": "KEY_REVOKED", "message": "revoked"}}),
        );
        let err = classify_response(&resp, "sources");
        assert_eq!(err.code(), ErrorCode::Authentication);
        assert_eq!(err.context().error_code.as_deref(), Some("KEY_REVOKED"));
    }

    #[test]
    fn test_long_raw_body_is_truncated() {
        let body = "x".repeat(1000);
        let err = classify_response(&ApiResponse::new(500, body), "search");
        assert!(err.message().len() < 220);
        assert!(err.message().ends_with("..."));
    }
}
