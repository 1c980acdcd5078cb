//! The backend HTTP client.
//!
//! One [`reqwest::Client`] shared across all calls. Paths are joined onto
//! the configured base URL; bodies and responses follow the wire formats in
//! the crate docs. Response handling is uniform: non-2xx → [`ApiError::Status`],
//! `ok: false` → [`ApiError::Rejected`], then the payload deserializes from
//! the same envelope object.

use hearth_core::device::{DeviceSnapshot, SystemHealth};
use hearth_core::ids::ThreadId;
use hearth_core::message::{Message, Role, TurnEnrichment};
use hearth_core::text::truncate_str;
use hearth_core::thread::{Thread, ThreadPatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{ApiError, ApiResult};

/// Typed client for the dashboard backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL with default transport settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from_parts(reqwest::Client::new(), base_url)
    }

    /// Create a client from a preconfigured [`reqwest::Client`].
    ///
    /// Use this to apply request timeouts or proxy settings.
    #[must_use]
    pub fn from_parts(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            let _ = base_url.pop();
        }
        Self { http, base_url }
    }

    /// The configured base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying HTTP client, shared with the streaming consumers.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ── Threads ──────────────────────────────────────────────────────────

    /// `GET /api/chat/threads` — list all threads.
    pub async fn list_threads(&self) -> ApiResult<Vec<Thread>> {
        let resp = self.http.get(self.url("/api/chat/threads")).send().await?;
        let payload: ThreadsPayload = decode_envelope(resp).await?;
        Ok(payload.threads)
    }

    /// `POST /api/chat/threads` — create a thread.
    ///
    /// Callers that inserted an optimistic local thread roll it back when
    /// this returns an error.
    pub async fn create_thread(&self, title: &str) -> ApiResult<Thread> {
        let resp = self
            .http
            .post(self.url("/api/chat/threads"))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;
        let payload: ThreadPayload = decode_envelope(resp).await?;
        Ok(payload.thread)
    }

    /// `PATCH /api/chat/threads/:id` — update thread fields.
    pub async fn update_thread(&self, id: &ThreadId, patch: &ThreadPatch) -> ApiResult<()> {
        let resp = self
            .http
            .patch(self.url(&format!("/api/chat/threads/{id}")))
            .json(patch)
            .send()
            .await?;
        let _: Value = decode_envelope(resp).await?;
        Ok(())
    }

    /// `DELETE /api/chat/threads/:id` — delete a thread.
    pub async fn delete_thread(&self, id: &ThreadId) -> ApiResult<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/chat/threads/{id}")))
            .send()
            .await?;
        let _: Value = decode_envelope(resp).await?;
        Ok(())
    }

    /// `POST /api/chat/threads/:id/suggest-title` — ask the backend for a
    /// title based on the conversation so far.
    pub async fn suggest_title(&self, id: &ThreadId) -> ApiResult<String> {
        let resp = self
            .http
            .post(self.url(&format!("/api/chat/threads/{id}/suggest-title")))
            .send()
            .await?;
        let payload: TitlePayload = decode_envelope(resp).await?;
        Ok(payload.title)
    }

    /// `POST /api/chat/threads/:id/share` — create a public share link.
    pub async fn share_thread(&self, id: &ThreadId) -> ApiResult<String> {
        let resp = self
            .http
            .post(self.url(&format!("/api/chat/threads/{id}/share")))
            .send()
            .await?;
        let payload: SharePayload = decode_envelope(resp).await?;
        Ok(payload.url)
    }

    // ── Messages ─────────────────────────────────────────────────────────

    /// `GET /api/chat/messages?thread_id=` — load a thread's messages.
    pub async fn list_messages(&self, thread_id: &ThreadId) -> ApiResult<Vec<Message>> {
        let resp = self
            .http
            .get(self.url("/api/chat/messages"))
            .query(&[("thread_id", thread_id.as_str())])
            .send()
            .await?;
        let payload: MessagesPayload = decode_envelope(resp).await?;
        Ok(payload.messages)
    }

    /// `POST /api/chat/messages?thread_id=` — persist one message.
    ///
    /// Returns the persisted message carrying the server-assigned ID and
    /// timestamp.
    pub async fn append_message(
        &self,
        thread_id: &ThreadId,
        message: &NewMessage,
    ) -> ApiResult<Message> {
        debug!(thread_id = %thread_id, role = ?message.role, "persisting message");
        let resp = self
            .http
            .post(self.url("/api/chat/messages"))
            .query(&[("thread_id", thread_id.as_str())])
            .json(message)
            .send()
            .await?;
        let payload: MessagePayload = decode_envelope(resp).await?;
        Ok(payload.message)
    }

    // ── Devices and system ───────────────────────────────────────────────

    /// `GET /api/devices` — point-in-time device snapshot.
    pub async fn list_devices(&self) -> ApiResult<DeviceSnapshot> {
        let resp = self.http.get(self.url("/api/devices")).send().await?;
        decode_envelope(resp).await
    }

    /// `GET /api/system` — point-in-time system health.
    pub async fn system_health(&self) -> ApiResult<SystemHealth> {
        let resp = self.http.get(self.url("/api/system")).send().await?;
        decode_envelope(resp).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

/// Body of the message persistence call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewMessage {
    /// Message author.
    pub role: Role,
    /// Final text content.
    pub content: String,
    /// Post-turn enrichment, flattened into the body (assistant turns).
    #[serde(flatten)]
    pub enrichment: TurnEnrichment,
}

impl NewMessage {
    /// A plain user message with no enrichment.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            enrichment: TurnEnrichment::default(),
        }
    }

    /// An assistant message with its accumulated enrichment.
    #[must_use]
    pub fn assistant(content: impl Into<String>, enrichment: TurnEnrichment) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            enrichment,
        }
    }
}

#[derive(Deserialize)]
struct ThreadsPayload {
    #[serde(default)]
    threads: Vec<Thread>,
}

#[derive(Deserialize)]
struct ThreadPayload {
    thread: Thread,
}

#[derive(Deserialize)]
struct MessagesPayload {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct MessagePayload {
    message: Message,
}

#[derive(Deserialize)]
struct TitlePayload {
    title: String,
}

#[derive(Deserialize)]
struct SharePayload {
    url: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope handling
// ─────────────────────────────────────────────────────────────────────────────

/// Decode a `{ ok, ...payload }` response.
///
/// Non-2xx statuses become [`ApiError::Status`]; `ok: false` becomes
/// [`ApiError::Rejected`] with the backend's `error` text when present.
/// On `ok: true` the payload type deserializes from the same object.
async fn decode_envelope<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> ApiResult<T> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: truncate_str(&message, 200),
        });
    }

    let value: Value = resp.json().await?;
    if value.get("ok").and_then(Value::as_bool) != Some(true) {
        let reason = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request rejected")
            .to_string();
        return Err(ApiError::Rejected { reason });
    }

    Ok(serde_json::from_value(value)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
