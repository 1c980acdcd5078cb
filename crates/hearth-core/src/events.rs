//! Event types for the chat smart-stream protocol.
//!
//! [`TurnEvent`] is the in-memory union of everything one `data:` line of the
//! stream can carry. The wire format is *key presence* on a flat JSON object
//! rather than a type tag, so decoding lives with the stream consumer
//! (`hearth-chat`); a single line may decode to several events.
//!
//! `TurnEvent` values are transient: they drive live rendering and the turn
//! state machine, and are never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::message::{Complexity, Routing};

// ─────────────────────────────────────────────────────────────────────────────
// TurnEvent
// ─────────────────────────────────────────────────────────────────────────────

/// One decoded event from the chat stream.
///
/// Variant order matches the documented dispatch order, which is also the
/// order events from a combined-key line are applied:
/// error → metadata → delta → metrics → tools → content → done.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnEvent {
    /// Fatal-for-this-turn error. Stops stream processing; partial content
    /// already rendered stays visible.
    Error(String),

    /// Routing/telemetry info. Wholesale-replaces any previously stored
    /// streaming metadata.
    Metadata(StreamingMetadata),

    /// Incremental text fragment, appended to the running buffer.
    Delta(String),

    /// Run-level measurements, applied to the final persisted message.
    Metrics(TurnMetrics),

    /// Authoritative post-hoc tool list. When non-empty it takes precedence
    /// over `metadata.tools` for the persisted message.
    Tools(Vec<String>),

    /// Full-content replacement snapshot. Replaces the running buffer
    /// wholesale.
    Content(String),

    /// Logical end of generation. Not the same as byte-stream exhaustion;
    /// reading continues until the transport reports end-of-stream.
    Done,
}

// ─────────────────────────────────────────────────────────────────────────────
// StreamingMetadata
// ─────────────────────────────────────────────────────────────────────────────

/// Routing/telemetry info resolved before generation begins or updated
/// mid-stream.
///
/// Ephemeral: set when a `metadata` key arrives, cleared when the stream
/// reports done or terminates. The last value seen before stream end is what
/// the persisted assistant message inherits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingMetadata {
    /// Model selected for this turn.
    pub model: Option<String>,
    /// Complexity class resolved by the router.
    pub complexity: Option<Complexity>,
    /// Execution path.
    pub routing: Option<Routing>,
    /// Tools planned for this turn (pre-dispatch; superseded by a later
    /// `tools` event when one arrives).
    pub tools: Vec<String>,
    /// Which tool registry will serve the calls.
    pub tool_source: Option<String>,
    /// Number of history messages included in the prompt.
    pub history_length: Option<u32>,
    /// Display name → model ID map of models available for this turn.
    pub models: BTreeMap<String, String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// TurnMetrics
// ─────────────────────────────────────────────────────────────────────────────

/// Run-level measurements emitted near the end of a stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnMetrics {
    /// End-to-end duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Model that actually served the turn.
    pub model: Option<String>,
    /// Route taken (`"direct"` / `"orchestrator"` or a backend-specific tag).
    pub route: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_parses_camel_case_wire_format() {
        let json = r#"{
            "model": "gpt-test",
            "complexity": "complex",
            "routing": "orchestrator",
            "tools": ["ha_control", "memory"],
            "toolSource": "local",
            "historyLength": 12,
            "models": {"Fast": "gpt-fast", "Smart": "gpt-smart"}
        }"#;
        let meta: StreamingMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.model.as_deref(), Some("gpt-test"));
        assert_eq!(meta.complexity, Some(Complexity::Complex));
        assert_eq!(meta.routing, Some(Routing::Orchestrator));
        assert_eq!(meta.tools, vec!["ha_control", "memory"]);
        assert_eq!(meta.tool_source.as_deref(), Some("local"));
        assert_eq!(meta.history_length, Some(12));
        assert_eq!(meta.models.len(), 2);
    }

    #[test]
    fn metadata_tolerates_missing_fields() {
        let meta: StreamingMetadata = serde_json::from_str("{}").unwrap();
        assert!(meta.model.is_none());
        assert!(meta.tools.is_empty());
        assert!(meta.models.is_empty());
    }

    #[test]
    fn metrics_parse_duration() {
        let json = r#"{"durationMs": 2300, "model": "gpt-test", "route": "direct"}"#;
        let metrics: TurnMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.duration_ms, Some(2300));
        assert_eq!(metrics.route.as_deref(), Some("direct"));
    }
}
