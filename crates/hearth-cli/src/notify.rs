//! Terminal notification sink.

use hearth_core::notify::{Notice, Notify, Severity};

/// Prints notices to stderr, one line each, so they interleave cleanly with
/// streamed chat output on stdout.
pub struct StderrNotifier;

impl Notify for StderrNotifier {
    fn notify(&self, notice: Notice) {
        let tag = match notice.severity {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        eprintln!("[{tag}] {}: {}", notice.title, notice.body);
    }
}
