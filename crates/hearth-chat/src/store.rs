//! Per-thread session store.
//!
//! Owns the two pieces of shared mutable state the chat surface needs, as an
//! explicit context object rather than module-level caches:
//!
//! - the **message cache**, keyed by thread ID, written by at most one
//!   in-flight operation per key and read freely for rendering;
//! - the **in-flight registry** of cancellation tokens, enforcing the
//!   supersede rule: starting any new turn or load for a thread cancels and
//!   replaces whatever was already running for that same thread ID, so two
//!   writers never race on one cache entry.
//!
//! All mutation happens between await points on the single driving task, so
//! the maps need no further coordination.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt as _;
use hearth_api::{ApiClient, ApiError, NewMessage};
use hearth_core::events::TurnEvent;
use hearth_core::ids::{MessageId, ThreadId};
use hearth_core::message::{Message, Role};
use hearth_core::notify::{Notice, Notify};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{TurnRequest, TurnSource};
use crate::turn::TurnState;

// ─────────────────────────────────────────────────────────────────────────────
// Persistence seam
// ─────────────────────────────────────────────────────────────────────────────

/// Message persistence operations the session store depends on.
///
/// Production delegates to [`ApiClient`]; tests record calls.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Load a thread's messages.
    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>, ApiError>;

    /// Persist one message, returning the server-assigned record.
    async fn append_message(
        &self,
        thread_id: &ThreadId,
        message: &NewMessage,
    ) -> Result<Message, ApiError>;
}

#[async_trait]
impl MessageStore for ApiClient {
    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>, ApiError> {
        Self::list_messages(self, thread_id).await
    }

    async fn append_message(
        &self,
        thread_id: &ThreadId,
        message: &NewMessage,
    ) -> Result<Message, ApiError> {
        Self::append_message(self, thread_id, message).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inputs and outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// Input for one user turn.
#[derive(Clone, Debug, Default)]
pub struct TurnInput {
    /// The user's text.
    pub text: String,
    /// Attached images as data URLs.
    pub images: Vec<String>,
    /// Requested model; the thread/backend default applies when absent.
    pub model: Option<String>,
    /// Tools the agent may use.
    pub enabled_tools: Vec<String>,
}

impl TurnInput {
    /// A plain text input.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// How a driven turn ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Stream exhausted normally; the assistant message was persisted and
    /// appended to the thread.
    Completed(Message),
    /// The backend emitted a stream-fatal `error`. The error text was
    /// appended as a synthetic (never persisted) assistant message; partial
    /// content already rendered stays visible.
    Failed(Message),
    /// Transport-level failure (connect, reset, idle timeout). Surfaced as a
    /// notice only; nothing is appended or persisted.
    TransportFailed {
        /// Human-readable failure description.
        error: String,
    },
    /// Cancelled by the user or superseded. Partial content is discarded and
    /// no persistence call is made.
    Cancelled,
}

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The user's own message could not be persisted (the turn never ran).
    #[error("{0}")]
    Api(#[from] ApiError),
    /// Regeneration requested but the thread has no user message.
    #[error("no user message to regenerate from")]
    NoUserMessage,
    /// Edit requested at an index that is not an editable user message.
    #[error("message index {index} is not an editable user message")]
    InvalidEdit {
        /// The offending index.
        index: usize,
    },
    /// A newer operation for the same thread superseded this one.
    #[error("superseded by a newer operation for this thread")]
    Superseded,
    /// The operation requires the thread's messages to be loaded first.
    #[error("thread messages are not loaded")]
    NotLoaded,
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionStore
// ─────────────────────────────────────────────────────────────────────────────

/// Thread-keyed conversation state and turn driver.
pub struct SessionStore {
    source: Arc<dyn TurnSource>,
    store: Arc<dyn MessageStore>,
    notifier: Arc<dyn Notify>,
    cache: DashMap<ThreadId, Vec<Message>>,
    inflight: DashMap<ThreadId, CancellationToken>,
}

impl SessionStore {
    /// Create a store over a turn source and a persistence backend.
    #[must_use]
    pub fn new(
        source: Arc<dyn TurnSource>,
        store: Arc<dyn MessageStore>,
        notifier: Arc<dyn Notify>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            cache: DashMap::new(),
            inflight: DashMap::new(),
        }
    }

    /// Cached messages for a thread, if loaded.
    #[must_use]
    pub fn messages(&self, thread_id: &ThreadId) -> Option<Vec<Message>> {
        self.cache.get(thread_id).map(|entry| entry.clone())
    }

    /// Drop a thread's cache entry. The next read goes back to the backend.
    pub fn invalidate(&self, thread_id: &ThreadId) {
        let _ = self.cache.remove(thread_id);
    }

    /// Cancel whatever is in flight for a thread.
    pub fn cancel(&self, thread_id: &ThreadId) {
        if let Some(token) = self.inflight.get(thread_id) {
            token.cancel();
        }
    }

    /// Load a thread's messages into the cache.
    ///
    /// Deduplicated per thread ID: a load already in flight for the same
    /// thread is cancelled before this one starts, and a load that gets
    /// superseded mid-request never writes the cache.
    pub async fn load_messages(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Vec<Message>, SessionError> {
        let token = self.supersede(thread_id);

        let loaded = tokio::select! {
            () = token.cancelled() => return Err(SessionError::Superseded),
            result = self.store.list_messages(thread_id) => result?,
        };
        if token.is_cancelled() {
            return Err(SessionError::Superseded);
        }

        debug!(thread_id = %thread_id, count = loaded.len(), "loaded thread messages");
        let _ = self.cache.insert(thread_id.clone(), loaded.clone());
        Ok(loaded)
    }

    /// Send a user turn: optimistic stub → persist the user message → stream
    /// the assistant answer → persist and append it.
    ///
    /// `on_update` fires with the full running buffer whenever its visible
    /// content changed.
    pub async fn send<F>(
        &self,
        thread_id: &ThreadId,
        input: TurnInput,
        mut on_update: F,
    ) -> Result<TurnOutcome, SessionError>
    where
        F: FnMut(&str),
    {
        let token = self.supersede(thread_id);

        // Optimistic stub, swapped for the persisted record
        let stub = Message::user_stub(input.text.clone());
        let stub_id = stub.id.clone();
        self.cache.entry(thread_id.clone()).or_default().push(stub);

        match self
            .store
            .append_message(thread_id, &NewMessage::user(input.text.clone()))
            .await
        {
            Ok(persisted) => self.replace_message(thread_id, &stub_id, persisted),
            Err(e) => {
                self.remove_message(thread_id, &stub_id);
                self.notifier
                    .notify(Notice::error("Message not sent", e.to_string()));
                return Err(e.into());
            }
        }

        if token.is_cancelled() {
            return Ok(TurnOutcome::Cancelled);
        }

        let request = TurnRequest {
            input_as_text: input.text,
            images: input.images,
            model: input.model,
            enabled_tools: input.enabled_tools,
            thread_id: thread_id.clone(),
        };
        let outcome = self.drive_turn(thread_id, &request, token, &mut on_update).await;
        if let TurnOutcome::Completed(message) = &outcome {
            self.cache
                .entry(thread_id.clone())
                .or_default()
                .push(message.clone());
        }
        Ok(outcome)
    }

    /// Re-run the last user input and overwrite the previous answer in place.
    ///
    /// Removes nothing from the thread — the last assistant message is
    /// replaced once the new one completes.
    pub async fn regenerate<F>(
        &self,
        thread_id: &ThreadId,
        mut on_update: F,
    ) -> Result<TurnOutcome, SessionError>
    where
        F: FnMut(&str),
    {
        let input_text = {
            let entry = self.cache.get(thread_id).ok_or(SessionError::NotLoaded)?;
            entry
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
                .ok_or(SessionError::NoUserMessage)?
        };

        let token = self.supersede(thread_id);
        let request = TurnRequest::text(thread_id.clone(), input_text);
        let outcome = self.drive_turn(thread_id, &request, token, &mut on_update).await;

        if let TurnOutcome::Completed(message) = &outcome {
            let mut entry = self.cache.entry(thread_id.clone()).or_default();
            if let Some(slot) = entry.iter_mut().rev().find(|m| m.role == Role::Assistant) {
                *slot = message.clone();
            } else {
                entry.push(message.clone());
            }
        }
        Ok(outcome)
    }

    /// Edit the user message at `index`, discard everything after it, and
    /// re-run the turn with the edited text.
    pub async fn edit_and_rerun<F>(
        &self,
        thread_id: &ThreadId,
        index: usize,
        new_text: impl Into<String>,
        mut on_update: F,
    ) -> Result<TurnOutcome, SessionError>
    where
        F: FnMut(&str),
    {
        let new_text = new_text.into();
        {
            let mut entry = self.cache.get_mut(thread_id).ok_or(SessionError::NotLoaded)?;
            let message = entry
                .get_mut(index)
                .ok_or(SessionError::InvalidEdit { index })?;
            if message.role != Role::User {
                return Err(SessionError::InvalidEdit { index });
            }
            message.content = new_text.clone();
            // Everything after the edited message is discarded before the re-run
            entry.truncate(index + 1);
        }

        let token = self.supersede(thread_id);
        let request = TurnRequest::text(thread_id.clone(), new_text);
        let outcome = self.drive_turn(thread_id, &request, token, &mut on_update).await;

        if let TurnOutcome::Completed(message) = &outcome {
            self.cache
                .entry(thread_id.clone())
                .or_default()
                .push(message.clone());
        }
        Ok(outcome)
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// Replace any in-flight token for a thread with a fresh one, cancelling
    /// the old. At most one writer per cache key survives.
    fn supersede(&self, thread_id: &ThreadId) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.inflight.insert(thread_id.clone(), token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Consume a turn's event stream and settle the outcome.
    async fn drive_turn<F>(
        &self,
        thread_id: &ThreadId,
        request: &TurnRequest,
        token: CancellationToken,
        on_update: &mut F,
    ) -> TurnOutcome
    where
        F: FnMut(&str),
    {
        let mut stream = match self.source.open(request, token.clone()).await {
            Ok(stream) => stream,
            Err(e) if e.is_cancellation() => return TurnOutcome::Cancelled,
            Err(e) => {
                self.notifier
                    .notify(Notice::error("Chat stream failed", e.to_string()));
                return TurnOutcome::TransportFailed {
                    error: e.to_string(),
                };
            }
        };

        let mut state = TurnState::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    let fatal = matches!(event, TurnEvent::Error(_));
                    if state.apply(event) {
                        on_update(&state.buffer);
                    }
                    if fatal {
                        // stop processing; content already rendered stays
                        break;
                    }
                }
                Err(e) if e.is_cancellation() => return TurnOutcome::Cancelled,
                Err(e) => {
                    warn!(category = e.category(), "turn stream failed: {e}");
                    self.notifier
                        .notify(Notice::error("Chat stream failed", e.to_string()));
                    return TurnOutcome::TransportFailed {
                        error: e.to_string(),
                    };
                }
            }
        }
        drop(stream);

        if token.is_cancelled() {
            // A cancel that raced stream end still discards the partial turn
            return TurnOutcome::Cancelled;
        }

        if let Some(error) = state.error.clone() {
            let mut entry = self.cache.entry(thread_id.clone()).or_default();
            if !state.buffer.is_empty() {
                entry.push(Message::synthetic_assistant(state.buffer.clone()));
            }
            let synthetic = Message::synthetic_assistant(error);
            entry.push(synthetic.clone());
            drop(entry);
            return TurnOutcome::Failed(synthetic);
        }

        // Byte stream exhausted: one persistence call with the final content
        let enrichment = state.enrichment();
        let new_message = NewMessage::assistant(state.buffer.clone(), enrichment.clone());
        match self.store.append_message(thread_id, &new_message).await {
            Ok(persisted) => TurnOutcome::Completed(persisted),
            Err(e) => {
                warn!(category = e.category(), "assistant persistence failed: {e}");
                self.notifier
                    .notify(Notice::error("Failed to save reply", e.to_string()));
                // Keep the finished turn visible locally under a temp ID
                let mut local = Message::synthetic_assistant(state.buffer.clone());
                local.apply_enrichment(enrichment);
                TurnOutcome::Completed(local)
            }
        }
    }

    fn replace_message(&self, thread_id: &ThreadId, id: &MessageId, replacement: Message) {
        if let Some(mut entry) = self.cache.get_mut(thread_id) {
            if let Some(slot) = entry.iter_mut().find(|m| &m.id == id) {
                *slot = replacement;
            }
        }
    }

    fn remove_message(&self, thread_id: &ThreadId, id: &MessageId) {
        if let Some(mut entry) = self.cache.get_mut(thread_id) {
            entry.retain(|m| &m.id != id);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
