//! Decoding data lines into [`TurnEvent`]s.
//!
//! The wire format is key presence on a flat JSON object, not a type tag,
//! and a single line may combine several keys (metrics together with a
//! completion flag is common). Every recognized key on a line produces its
//! own event; the dispatch order is fixed and matches the application
//! precedence the turn state machine relies on:
//!
//! error → metadata → delta → metrics → tools → content → done
//!
//! A line that fails JSON parsing is logged and skipped — malformed
//! individual lines are tolerated; only stream-level failures abort a turn.

use hearth_core::events::{StreamingMetadata, TurnEvent, TurnMetrics};
use hearth_core::text::truncate_str;
use serde_json::Value;
use tracing::warn;

/// Decode one data line into zero or more events.
#[must_use]
pub fn decode_data_line(line: &str) -> Vec<TurnEvent> {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!(
                error = %e,
                line_preview = truncate_str(line, 100),
                "skipping malformed stream line"
            );
            return Vec::new();
        }
    };

    let mut events = Vec::new();

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        events.push(TurnEvent::Error(error.to_string()));
    }

    if let Some(metadata) = value.get("metadata") {
        match serde_json::from_value::<StreamingMetadata>(metadata.clone()) {
            Ok(meta) => events.push(TurnEvent::Metadata(meta)),
            Err(e) => warn!(error = %e, "skipping undecodable metadata object"),
        }
    }

    if let Some(delta) = value.get("delta").and_then(Value::as_str) {
        events.push(TurnEvent::Delta(delta.to_string()));
    }

    if let Some(metrics) = value.get("metrics") {
        match serde_json::from_value::<TurnMetrics>(metrics.clone()) {
            Ok(metrics) => events.push(TurnEvent::Metrics(metrics)),
            Err(e) => warn!(error = %e, "skipping undecodable metrics object"),
        }
    }

    if let Some(tools) = value.get("tools").and_then(Value::as_array) {
        let names: Vec<String> = tools
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        events.push(TurnEvent::Tools(names));
    }

    if let Some(content) = value.get("content").and_then(Value::as_str) {
        events.push(TurnEvent::Content(content.to_string()));
    }

    if value.get("done").is_some_and(is_truthy) {
        events.push(TurnEvent::Done);
    }

    events
}

/// JavaScript-style truthiness for the `done` flag.
///
/// Backends emit `true`, `1`, or `"done"` interchangeably.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn delta_line() {
        let events = decode_data_line(r#"{"delta": "Hel"}"#);
        assert_eq!(events, vec![TurnEvent::Delta("Hel".into())]);
    }

    #[test]
    fn content_line() {
        let events = decode_data_line(r#"{"content": "full text"}"#);
        assert_eq!(events, vec![TurnEvent::Content("full text".into())]);
    }

    #[test]
    fn error_line() {
        let events = decode_data_line(r#"{"error": "agent unavailable"}"#);
        assert_eq!(events, vec![TurnEvent::Error("agent unavailable".into())]);
    }

    #[test]
    fn done_accepts_truthy_variants() {
        assert_eq!(decode_data_line(r#"{"done": true}"#), vec![TurnEvent::Done]);
        assert_eq!(decode_data_line(r#"{"done": 1}"#), vec![TurnEvent::Done]);
        assert_eq!(
            decode_data_line(r#"{"done": "done"}"#),
            vec![TurnEvent::Done]
        );
        assert!(decode_data_line(r#"{"done": false}"#).is_empty());
        assert!(decode_data_line(r#"{"done": null}"#).is_empty());
        assert!(decode_data_line(r#"{"done": 0}"#).is_empty());
    }

    #[test]
    fn combined_keys_decode_in_dispatch_order() {
        let events = decode_data_line(
            r#"{"done": true, "metrics": {"durationMs": 1500}, "tools": ["ha_control"]}"#,
        );
        assert_eq!(events.len(), 3);
        assert_matches!(events[0], TurnEvent::Metrics(_));
        assert_matches!(events[1], TurnEvent::Tools(_));
        assert_matches!(events[2], TurnEvent::Done);
    }

    #[test]
    fn error_always_dispatches_first() {
        let events = decode_data_line(r#"{"delta": "x", "error": "boom"}"#);
        assert_matches!(events[0], TurnEvent::Error(_));
        assert_matches!(events[1], TurnEvent::Delta(_));
    }

    #[test]
    fn malformed_line_yields_nothing() {
        assert!(decode_data_line("{not json}").is_empty());
        assert!(decode_data_line("").is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let events = decode_data_line(r#"{"delta": "x", "debug": {"foo": 1}}"#);
        assert_eq!(events, vec![TurnEvent::Delta("x".into())]);
    }

    #[test]
    fn metadata_line_parses() {
        let events =
            decode_data_line(r#"{"metadata": {"model": "gpt-test", "tools": ["a", "b"]}}"#);
        assert_matches!(&events[0], TurnEvent::Metadata(meta) => {
            assert_eq!(meta.model.as_deref(), Some("gpt-test"));
            assert_eq!(meta.tools, vec!["a", "b"]);
        });
    }

    #[test]
    fn undecodable_metadata_is_skipped_but_line_survives() {
        // metadata is a number, not an object — the delta still decodes
        let events = decode_data_line(r#"{"metadata": 7, "delta": "x"}"#);
        assert_eq!(events, vec![TurnEvent::Delta("x".into())]);
    }

    #[test]
    fn tools_with_non_string_entries_keeps_strings() {
        let events = decode_data_line(r#"{"tools": ["a", 3, "b"]}"#);
        assert_eq!(
            events,
            vec![TurnEvent::Tools(vec!["a".into(), "b".into()])]
        );
    }
}
