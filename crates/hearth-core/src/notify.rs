//! User-facing notification surface.
//!
//! Everything the protocol consumers want to tell the user — device
//! transitions, connection edges, soft API failures — goes through the
//! [`Notify`] trait as a [`Notice`]. The trait is the seam between the
//! state machines and whatever renders toasts: the CLI prints to stderr,
//! tests record, and headless embedders can route to `tracing` only.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Notice
// ─────────────────────────────────────────────────────────────────────────────

/// Visual weight of a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information.
    Info,
    /// Positive outcome (device back online, reconnected).
    Success,
    /// Degraded but recoverable (device offline, disconnected).
    Warning,
    /// Failed operation.
    Error,
}

/// One toast-style notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// Visual weight.
    pub severity: Severity,
    /// Short headline.
    pub title: String,
    /// Supporting detail.
    pub body: String,
}

impl Notice {
    /// Build an info notice.
    #[must_use]
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Build a success notice.
    #[must_use]
    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Build a warning notice.
    #[must_use]
    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Build an error notice.
    #[must_use]
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            body: body.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notify
// ─────────────────────────────────────────────────────────────────────────────

/// Sink for user-facing notifications.
///
/// Implementors must be `Send + Sync`; notices arrive from async tasks.
/// Dispatch must not block.
pub trait Notify: Send + Sync {
    /// Deliver one notice.
    fn notify(&self, notice: Notice);
}

/// Notifier that routes notices to `tracing` at a level matching severity.
///
/// The default sink for headless use.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notify for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Info | Severity::Success => {
                tracing::info!(title = %notice.title, "{}", notice.body);
            }
            Severity::Warning => {
                tracing::warn!(title = %notice.title, "{}", notice.body);
            }
            Severity::Error => {
                tracing::error!(title = %notice.title, "{}", notice.body);
            }
        }
    }
}

/// Notifier that records notices in memory.
///
/// Used by tests to assert on exactly which notices fired, and usable as a
/// buffering sink for embedders that poll.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return all recorded notices.
    #[must_use]
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }

    /// Copy of the recorded notices without draining.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Number of notices recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.lock().is_empty()
    }
}

impl Notify for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
