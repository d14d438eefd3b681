//! 标准错误码：定义客户端可分支处理的稳定错误码及其重试语义。
//!
//! Stable error codes for the SVG API client.
//!
//! Every [`Error`](crate::Error) maps to exactly one [`ErrorCode`]. Application code
//! branches on the code instead of matching message text.
//!
//! | Code                | Retryable | Typical source                          |
//! |---------------------|-----------|-----------------------------------------|
//! | `NOT_FOUND`         | no        | HTTP 404, `ICON_NOT_FOUND`              |
//! | `INVALID_PARAMETER` | no        | HTTP 400, client-side validation        |
//! | `AUTHENTICATION`    | no        | HTTP 401 / 403                          |
//! | `RATE_LIMITED`      | yes       | HTTP 429                                |
//! | `SERVER_ERROR`      | yes       | HTTP 5xx                                |
//! | `NETWORK_ERROR`     | yes       | connection reset, DNS, TLS              |
//! | `TIMEOUT`           | yes       | per-attempt timeout elapsed             |
//! | `CANCELLED`         | no        | `RequestBatcher::cancel_all`            |
//! | `CONFIGURATION`     | no        | invalid builder / config file           |
//! | `DECODE_ERROR`      | no        | malformed success body                  |
//! | `UNKNOWN`           | status    | unparseable error body                  |
//!
//! ## Example
//!
//! ```rust
//! use svg_api::error_code::ErrorCode;
//!
//! let code = ErrorCode::from_http_status(429);
//! assert_eq!(code.code(), "RATE_LIMITED");
//! assert!(code.retryable());
//! ```

use std::fmt;

/// Stable, caller-visible failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Missing icon, source or category.
    NotFound,
    /// Request parameters rejected (client-side or by the server).
    InvalidParameter,
    /// Missing or rejected API key.
    Authentication,
    /// Too many requests.
    RateLimited,
    /// Server-side failure (5xx).
    ServerError,
    /// Transport-level failure before a response arrived.
    NetworkError,
    /// A single attempt exceeded its deadline.
    Timeout,
    /// Cancelled by the caller.
    Cancelled,
    /// Client misconfiguration.
    Configuration,
    /// A successful response could not be decoded.
    DecodeError,
    /// Could not be classified.
    Unknown,
}

impl ErrorCode {
    /// Returns the canonical code string (e.g. `"NOT_FOUND"`).
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::Authentication => "AUTHENTICATION",
            Self::RateLimited => "RATE_LIMITED",
            Self::ServerError => "SERVER_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Configuration => "CONFIGURATION",
            Self::DecodeError => "DECODE_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns whether this kind is retried by default.
    ///
    /// `Unknown` reports `false` here; an `Unknown` error carrying a 429/5xx status is
    /// still retried, see [`Error::is_retryable`](crate::Error::is_retryable).
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError | Self::NetworkError | Self::Timeout
        )
    }

    /// Maps an HTTP status code to the most likely kind.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::InvalidParameter,
            401 | 403 => Self::Authentication,
            404 => Self::NotFound,
            408 => Self::Timeout,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Maps a server error code from the `{ error: { code } }` body.
    ///
    /// Returns `None` for codes this client does not know, so the caller can fall
    /// back to the HTTP status.
    pub fn from_server_code(server_code: &str) -> Option<Self> {
        let code = match server_code {
            "NOT_FOUND" | "ICON_NOT_FOUND" | "SOURCE_NOT_FOUND" | "CATEGORY_NOT_FOUND" => {
                Self::NotFound
            }
            "INVALID_PARAMETER" | "INVALID_SIZE" | "INVALID_STROKE" | "INVALID_COLOR"
            | "INVALID_NAME" | "INVALID_QUERY" | "BATCH_LIMIT_EXCEEDED" => Self::InvalidParameter,
            "UNAUTHORIZED" | "INVALID_API_KEY" | "FORBIDDEN" => Self::Authentication,
            "RATE_LIMITED" | "QUOTA_EXCEEDED" => Self::RateLimited,
            "INTERNAL_ERROR" | "SERVER_ERROR" | "SERVICE_UNAVAILABLE" => Self::ServerError,
            "TIMEOUT" => Self::Timeout,
            _ => return None,
        };
        Some(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
