use crate::error_code::ErrorCode;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorContext {
    /// HTTP status of the response that produced the error, if any.
    pub status_code: Option<u16>,
    /// Server-provided error code (e.g. `"ICON_NOT_FOUND"`).
    pub error_code: Option<String>,
    /// Server request id (`X-Request-Id` or `meta.request_id`).
    pub request_id: Option<String>,
    /// Structured `error.details` payload, or client-side validation details.
    pub details: Option<serde_json::Value>,
    /// Component that raised the error (e.g. `"retry_executor"`, `"validation"`).
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the SVG API client.
///
/// Every variant is cheap to clone so that one batch failure can be delivered to
/// every caller folded into that batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Not found: {message}{}", format_context(.context))]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    #[error("Invalid parameter: {message}{}", format_context(.context))]
    InvalidParameter {
        message: String,
        context: ErrorContext,
    },

    #[error("Authentication failed: {message}{}", format_context(.context))]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Rate limited: {message}{}", format_context(.context))]
    RateLimited {
        message: String,
        retry_after_ms: Option<u64>,
        context: ErrorContext,
    },

    #[error("Server error: HTTP {status}: {message}{}", format_context(.context))]
    Server {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}{}", format_context(.context))]
    Network {
        message: String,
        context: ErrorContext,
    },

    #[error("Request timed out after {timeout_ms}ms{}", format_context(.context))]
    Timeout {
        timeout_ms: u64,
        context: ErrorContext,
    },

    #[error("Request cancelled: {message}")]
    Cancelled {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Decode error: {message}{}", format_context(.context))]
    Decode {
        message: String,
        context: ErrorContext,
    },

    #[error("Unknown error: {message}{}", format_context(.context))]
    Unknown {
        status: Option<u16>,
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref code) = ctx.error_code {
        parts.push(format!("code: {}", code));
    }
    if let Some(ref id) = ctx.request_id {
        parts.push(format!("request_id: {}", id));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn not_found(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::NotFound {
            message: msg.into(),
            context,
        }
    }

    pub fn invalid_parameter(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidParameter {
            message: msg.into(),
            context,
        }
    }

    pub fn network(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Network {
            message: msg.into(),
            context,
        }
    }

    pub fn timeout(timeout: std::time::Duration) -> Self {
        Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
            context: ErrorContext::new().with_source("retry_executor"),
        }
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Error::Cancelled {
            message: msg.into(),
            context: ErrorContext::new().with_source("request_batcher"),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn decode(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Decode {
            message: msg.into(),
            context,
        }
    }

    pub fn unknown(status: Option<u16>, msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Unknown {
            status,
            message: msg.into(),
            context,
        }
    }

    /// Builds the variant matching `code`.
    ///
    /// Used by the response classifier so that kinds are decided in one place.
    pub fn from_code(
        code: ErrorCode,
        status: Option<u16>,
        msg: impl Into<String>,
        context: ErrorContext,
    ) -> Self {
        let message = msg.into();
        match code {
            ErrorCode::NotFound => Error::NotFound { message, context },
            ErrorCode::InvalidParameter => Error::InvalidParameter { message, context },
            ErrorCode::Authentication => Error::Authentication { message, context },
            ErrorCode::RateLimited => Error::RateLimited {
                message,
                retry_after_ms: None,
                context,
            },
            ErrorCode::ServerError => Error::Server {
                status: status.unwrap_or(500),
                message,
                context,
            },
            ErrorCode::NetworkError => Error::Network { message, context },
            ErrorCode::Timeout => Error::Timeout {
                timeout_ms: 0,
                context,
            },
            ErrorCode::Cancelled => Error::Cancelled { message, context },
            ErrorCode::Configuration => Error::Configuration { message, context },
            ErrorCode::DecodeError => Error::Decode { message, context },
            ErrorCode::Unknown => Error::Unknown {
                status,
                message,
                context,
            },
        }
    }

    /// Stable code for branching.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::NotFound { .. } => ErrorCode::NotFound,
            Error::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            Error::Authentication { .. } => ErrorCode::Authentication,
            Error::RateLimited { .. } => ErrorCode::RateLimited,
            Error::Server { .. } => ErrorCode::ServerError,
            Error::Network { .. } => ErrorCode::NetworkError,
            Error::Timeout { .. } => ErrorCode::Timeout,
            Error::Cancelled { .. } => ErrorCode::Cancelled,
            Error::Configuration { .. } => ErrorCode::Configuration,
            Error::Decode { .. } => ErrorCode::DecodeError,
            Error::Unknown { .. } => ErrorCode::Unknown,
        }
    }

    /// Whether the retry executor may try again.
    ///
    /// 429 and 5xx are retryable regardless of how the body was classified.
    pub fn is_retryable(&self) -> bool {
        if self.code().retryable() {
            return true;
        }
        if !matches!(self, Error::Unknown { .. }) {
            return false;
        }
        self.status_code()
            .map(|status| status == 429 || (500..=599).contains(&status))
            .unwrap_or(false)
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Server { status, .. } => Some(*status),
            Error::Unknown { status, .. } => status.or(self.context().status_code),
            _ => self.context().status_code,
        }
    }

    /// Server-suggested wait before retrying, for rate-limit failures.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Error::RateLimited { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// Human-readable message without context decoration.
    pub fn message(&self) -> String {
        match self {
            Error::NotFound { message, .. }
            | Error::InvalidParameter { message, .. }
            | Error::Authentication { message, .. }
            | Error::RateLimited { message, .. }
            | Error::Server { message, .. }
            | Error::Network { message, .. }
            | Error::Cancelled { message, .. }
            | Error::Configuration { message, .. }
            | Error::Decode { message, .. }
            | Error::Unknown { message, .. } => message.clone(),
            Error::Timeout { timeout_ms, .. } => format!("timed out after {}ms", timeout_ms),
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Error::NotFound { context, .. }
            | Error::InvalidParameter { context, .. }
            | Error::Authentication { context, .. }
            | Error::RateLimited { context, .. }
            | Error::Server { context, .. }
            | Error::Network { context, .. }
            | Error::Timeout { context, .. }
            | Error::Cancelled { context, .. }
            | Error::Configuration { context, .. }
            | Error::Decode { context, .. }
            | Error::Unknown { context, .. } => context,
        }
    }

    pub(crate) fn with_retry_after(self, hint: Option<u64>) -> Self {
        match self {
            Error::RateLimited {
                message,
                retry_after_ms,
                context,
            } => Error::RateLimited {
                message,
                retry_after_ms: hint.or(retry_after_ms),
                context,
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::decode(e.to_string(), ErrorContext::new().with_source("serde_json"))
    }
}

impl Error {
    /// Local filesystem failure, tagged `IO_ERROR` with the I/O kind and path.
    pub(crate) fn io(e: std::io::Error, path: Option<&std::path::Path>) -> Self {
        let mut details = serde_json::json!({ "kind": format!("{:?}", e.kind()) });
        let message = match path {
            Some(path) => {
                details["path"] = serde_json::Value::String(path.display().to_string());
                format!("I/O error at {}: {}", path.display(), e)
            }
            None => format!("I/O error: {}", e),
        };
        Error::unknown(
            None,
            message,
            ErrorContext::new()
                .with_error_code("IO_ERROR")
                .with_details(details)
                .with_source("io"),
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io(e, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_tagged() {
        let e: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(e.code(), ErrorCode::Unknown);
        assert!(!e.is_retryable());
        assert!(e.message().starts_with("I/O error"));
        assert_eq!(e.context().error_code.as_deref(), Some("IO_ERROR"));
        assert_eq!(e.context().details.as_ref().unwrap()["kind"], "PermissionDenied");
    }

    #[test]
    fn test_unknown_with_retryable_status() {
        let e = Error::unknown(Some(503), "Service Unavailable", ErrorContext::new());
        assert!(e.is_retryable());
        let e = Error::unknown(Some(418), "teapot", ErrorContext::new());
        assert!(!e.is_retryable());
        let e = Error::unknown(None, "???", ErrorContext::new());
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_terminal_kinds_with_retryable_status_stay_terminal() {
        let e = Error::not_found(
            "gone",
            ErrorContext::new().with_status_code(503),
        );
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_display_includes_context() {
        let e = Error::not_found(
            "Icon 'nope' not found",
            ErrorContext::new()
                .with_error_code("ICON_NOT_FOUND")
                .with_request_id("req_1"),
        );
        let s = e.to_string();
        assert!(s.contains("ICON_NOT_FOUND"));
        assert!(s.contains("req_1"));
        assert_eq!(e.code().code(), "NOT_FOUND");
    }

    #[test]
    fn test_with_retry_after_only_touches_rate_limited() {
        let e = Error::from_code(ErrorCode::RateLimited, Some(429), "slow", ErrorContext::new())
            .with_retry_after(Some(2000));
        assert_eq!(e.retry_after_ms(), Some(2000));
        let e = Error::network("reset", ErrorContext::new()).with_retry_after(Some(2000));
        assert_eq!(e.retry_after_ms(), None);
    }
}
