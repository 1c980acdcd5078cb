//! API client error types.

use thiserror::Error;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur talking to the dashboard backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status code.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// Backend answered `ok: false` — a soft failure the UI surfaces as a
    /// notification, never an exception.
    #[error("request rejected: {reason}")]
    Rejected {
        /// Backend-supplied reason, or a generic placeholder.
        reason: String,
    },

    /// Response body failed to deserialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Soft rejections and malformed bodies are not retryable; transient
    /// transport failures and server errors are.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Rejected { .. } | Self::Json(_) => false,
        }
    }

    /// Error category string for logging.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) => "network",
            Self::Status { .. } => "status",
            Self::Rejected { .. } => "rejected",
            Self::Json(_) => "parse",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_is_not_retryable() {
        let err = ApiError::Rejected {
            reason: "thread not found".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.category(), "rejected");
        assert_eq!(err.to_string(), "request rejected: thread not found");
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = ApiError::Status {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(err.is_retryable());

        let err = ApiError::Status {
            status: 404,
            message: "missing".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn rate_limit_is_retryable() {
        let err = ApiError::Status {
            status: 429,
            message: "slow down".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn json_error_category() {
        let json_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err = ApiError::Json(json_err);
        assert_eq!(err.category(), "parse");
        assert!(!err.is_retryable());
    }
}
