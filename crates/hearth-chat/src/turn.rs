//! Turn accumulation state machine.
//!
//! Folds the events of one assistant turn into a running buffer plus the
//! enrichment the persisted message will carry. The rules it enforces:
//!
//! - `delta` appends; `content` replaces wholesale (whichever arrives)
//! - `metadata` wholesale-replaces the live metadata; the last one seen is
//!   retained for persistence even after `done` clears the live copy
//! - a non-empty post-hoc `tools` list beats `metadata.tools`
//! - `done` marks logical completion but does not stop the fold — the
//!   physical stream end does

use hearth_core::events::{StreamingMetadata, TurnEvent, TurnMetrics};
use hearth_core::message::TurnEnrichment;

/// Accumulated state of one in-flight assistant turn.
#[derive(Clone, Debug, Default)]
pub struct TurnState {
    /// The running text buffer rendered live.
    pub buffer: String,
    /// Live metadata for badge rendering; cleared when `done` arrives.
    pub metadata: Option<StreamingMetadata>,
    /// Last metadata seen, retained past `done` for persistence.
    last_metadata: Option<StreamingMetadata>,
    /// Authoritative post-hoc tool list, when the backend reported one.
    reported_tools: Option<Vec<String>>,
    /// Run-level measurements.
    metrics: Option<TurnMetrics>,
    /// Whether logical completion was signalled.
    pub done: bool,
    /// Stream-fatal error text, when one arrived.
    pub error: Option<String>,
}

impl TurnState {
    /// Fresh state for a new turn.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the state.
    ///
    /// Returns `true` when the visible buffer changed and should re-render.
    pub fn apply(&mut self, event: TurnEvent) -> bool {
        match event {
            TurnEvent::Error(message) => {
                self.error = Some(message);
                false
            }
            TurnEvent::Metadata(meta) => {
                self.metadata = Some(meta.clone());
                self.last_metadata = Some(meta);
                false
            }
            TurnEvent::Delta(fragment) => {
                self.buffer.push_str(&fragment);
                true
            }
            TurnEvent::Metrics(metrics) => {
                self.metrics = Some(metrics);
                false
            }
            TurnEvent::Tools(tools) => {
                self.reported_tools = Some(tools);
                false
            }
            TurnEvent::Content(snapshot) => {
                self.buffer = snapshot;
                true
            }
            TurnEvent::Done => {
                self.done = true;
                self.metadata = None;
                false
            }
        }
    }

    /// Compute the enrichment for the persisted message.
    ///
    /// Tool-list precedence: a non-empty reported list is authoritative over
    /// the pre-dispatch plan in metadata. The model comes from metrics when
    /// measured, else from metadata.
    #[must_use]
    pub fn enrichment(&self) -> TurnEnrichment {
        let meta = self.last_metadata.clone().unwrap_or_default();
        let metrics = self.metrics.clone().unwrap_or_default();

        let tools_used = match &self.reported_tools {
            Some(tools) if !tools.is_empty() => tools.clone(),
            _ => meta.tools,
        };

        TurnEnrichment {
            tools_used,
            latency_ms: metrics.duration_ms,
            model: metrics.model.or(meta.model),
            complexity: meta.complexity,
            routing: meta.routing,
            tool_source: meta.tool_source,
            available_models: meta.models,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
