//! Message types for the hearth conversation model.
//!
//! A [`Message`] is one turn in a thread. User messages are created as
//! optimistic stubs (temp ID, local timestamp) and mirrored to the backend;
//! assistant messages accumulate during streaming and are persisted once the
//! stream ends, at which point the server-assigned ID and timestamp are
//! merged with the locally accumulated [`TurnEnrichment`].
//!
//! All wire field names are camelCase to match the backend JSON format.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MessageId;

// ─────────────────────────────────────────────────────────────────────────────
// Role and routing vocabulary
// ─────────────────────────────────────────────────────────────────────────────

/// Which side of the conversation a message belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sent by the person using the dashboard.
    User,
    /// Generated by the agent.
    Assistant,
}

/// Request complexity class resolved by the agent router.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Single-step request.
    Simple,
    /// Multi-step but single-agent request.
    Moderate,
    /// Orchestrated multi-agent request.
    Complex,
}

/// Which execution path served a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Routing {
    /// Answered by a single model call.
    Direct,
    /// Dispatched through the orchestrator.
    Orchestrator,
}

// ─────────────────────────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────────────────────────

/// One turn in a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned on persistence; a `temp_` stub before that.
    pub id: MessageId,
    /// Message author.
    pub role: Role,
    /// Text content. Mutable buffer while streaming, immutable once persisted.
    pub content: String,
    /// Creation time, assigned at persistence.
    pub timestamp: DateTime<Utc>,
    /// Tool names actually invoked during this turn (assistant only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
    /// End-to-end turn latency in milliseconds (assistant only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Model identifier actually used (assistant only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Complexity class the router resolved (assistant only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    /// Execution path taken (assistant only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<Routing>,
    /// Which tool registry served the calls (assistant only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_source: Option<String>,
    /// Display name → model ID map of models available for this turn.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub available_models: BTreeMap<String, String>,
}

impl Message {
    /// Create an optimistic user-message stub for immediate rendering.
    ///
    /// Carries a `temp_` ID and a local timestamp, both of which the
    /// persistence response replaces.
    #[must_use]
    pub fn user_stub(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::temp(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            tools_used: Vec::new(),
            latency_ms: None,
            model: None,
            complexity: None,
            routing: None,
            tool_source: None,
            available_models: BTreeMap::new(),
        }
    }

    /// Create a synthetic assistant message that is never persisted.
    ///
    /// Used to surface stream-fatal errors in the conversation view.
    #[must_use]
    pub fn synthetic_assistant(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::temp(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            tools_used: Vec::new(),
            latency_ms: None,
            model: None,
            complexity: None,
            routing: None,
            tool_source: None,
            available_models: BTreeMap::new(),
        }
    }

    /// Attach post-turn enrichment to an assistant message.
    pub fn apply_enrichment(&mut self, enrichment: TurnEnrichment) {
        self.tools_used = enrichment.tools_used;
        self.latency_ms = enrichment.latency_ms;
        self.model = enrichment.model;
        self.complexity = enrichment.complexity;
        self.routing = enrichment.routing;
        self.tool_source = enrichment.tool_source;
        self.available_models = enrichment.available_models;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Enrichment
// ─────────────────────────────────────────────────────────────────────────────

/// Fields accumulated client-side during streaming and merged into the
/// persisted assistant message once the stream ends.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnEnrichment {
    /// Ordered list of tool names invoked.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
    /// Turn latency in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Model identifier actually used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Complexity class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    /// Execution path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<Routing>,
    /// Tool registry provenance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_source: Option<String>,
    /// Models available for this turn.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub available_models: BTreeMap<String, String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_stub_has_temp_id() {
        let msg = Message::user_stub("turn on the lights");
        assert!(msg.id.is_temp());
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "turn on the lights");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn enrichment_fields_are_camel_case() {
        let mut msg = Message::synthetic_assistant("hi");
        msg.apply_enrichment(TurnEnrichment {
            tools_used: vec!["ha_control".into()],
            latency_ms: Some(1250),
            model: Some("gpt-test".into()),
            complexity: Some(Complexity::Moderate),
            routing: Some(Routing::Direct),
            tool_source: Some("local".into()),
            available_models: BTreeMap::new(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["toolsUsed"][0], "ha_control");
        assert_eq!(json["latencyMs"], 1250);
        assert_eq!(json["complexity"], "moderate");
        assert_eq!(json["routing"], "direct");
        assert_eq!(json["toolSource"], "local");
    }

    #[test]
    fn empty_enrichment_fields_are_omitted() {
        let msg = Message::user_stub("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("toolsUsed").is_none());
        assert!(json.get("latencyMs").is_none());
        assert!(json.get("availableModels").is_none());
    }

    #[test]
    fn message_deserializes_without_enrichment() {
        let json = r#"{
            "id": "m1",
            "role": "assistant",
            "content": "done",
            "timestamp": "2026-08-06T12:00:00Z"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content, "done");
        assert!(msg.tools_used.is_empty());
        assert!(msg.latency_ms.is_none());
    }
}
