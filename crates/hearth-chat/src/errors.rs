//! Stream consumer error types.

use thiserror::Error;

/// Result type alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors that can occur while driving a chat turn.
///
/// Cancellation is modelled as a variant rather than an exception so callers
/// can tell a user-initiated abort (silent) from a genuine failure (toast)
/// without inspecting transport internals.
#[derive(Debug, Error)]
pub enum StreamError {
    /// HTTP transport failed (connect, reset, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend refused the stream request.
    #[error("stream request failed ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// No bytes arrived for the configured idle window mid-stream.
    #[error("stream idle for {idle_ms}ms, giving up")]
    IdleTimeout {
        /// The idle bound that expired.
        idle_ms: u64,
    },

    /// The turn was cancelled by the caller.
    #[error("turn cancelled")]
    Cancelled,
}

impl StreamError {
    /// Whether this is a user-initiated abort (reported silently).
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Error category string for logging.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) => "network",
            Self::Status { .. } => "status",
            Self::IdleTimeout { .. } => "idle_timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
