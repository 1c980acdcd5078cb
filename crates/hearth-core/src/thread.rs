//! Thread types for the hearth conversation model.
//!
//! A [`Thread`] is a conversation container. Messages are not embedded in the
//! thread record on the wire; they are lazily loaded per thread and cached by
//! the session store, keyed by thread ID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ThreadId;

/// A conversation container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Thread ID.
    pub id: ThreadId,
    /// Display title.
    pub title: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Free-form organization tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Folder the thread is filed under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Whether the thread is pinned.
    #[serde(default)]
    pub pinned: bool,
    /// Whether the thread is archived.
    #[serde(default)]
    pub archived: bool,
    /// Tools the agent may use in this thread.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_tools: Vec<String>,
    /// Preferred model for this thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Agent persona/style selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_style: Option<String>,
}

impl Thread {
    /// Create a local thread record with a fresh ID.
    ///
    /// Used for optimistic creation; rolled back if the backend rejects it.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ThreadId::new(),
            title: title.into(),
            created_at: Utc::now(),
            tags: Vec::new(),
            folder: None,
            pinned: false,
            archived: false,
            enabled_tools: Vec::new(),
            model: None,
            agent_style: None,
        }
    }
}

/// Partial update for `PATCH /api/chat/threads/:id`.
///
/// Only fields that are `Some` are serialized, so a patch touches exactly the
/// fields the caller set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPatch {
    /// Replace the title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replace the tag list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Move to a folder (`Some(None)` clears it).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<Option<String>>,
    /// Pin or unpin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    /// Archive or unarchive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    /// Replace the enabled tool list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_tools: Option<Vec<String>>,
    /// Change the preferred model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Change the agent style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_style: Option<String>,
}

impl ThreadPatch {
    /// Whether the patch carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.tags.is_none()
            && self.folder.is_none()
            && self.pinned.is_none()
            && self.archived.is_none()
            && self.enabled_tools.is_none()
            && self.model.is_none()
            && self.agent_style.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
