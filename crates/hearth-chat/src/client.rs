//! The smart-stream HTTP client.
//!
//! One POST per turn; the response body is read incrementally so partial
//! output renders as it arrives. The [`TurnSource`] trait is the seam between
//! the session store and the transport: production uses
//! [`ChatStreamClient`], tests script event sequences directly.
//!
//! Cancellation is cooperative: the token is checked before the request and
//! at every read. An optional idle timeout bounds the quiet time between
//! reads — the original protocol leaves a mid-stream TCP drop hanging
//! forever, so the bound is configurable and reported as a stream error,
//! never as a cancellation.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use futures::StreamExt as _;
use hearth_core::events::TurnEvent;
use hearth_core::ids::ThreadId;
use hearth_core::text::truncate_str;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::decode::decode_data_line;
use crate::errors::{StreamError, StreamResult};
use crate::sse::parse_sse_lines;

/// Default idle bound between stream reads, in milliseconds.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 120_000;

/// Boxed stream of decoded [`TurnEvent`]s for one turn.
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<TurnEvent, StreamError>> + Send>>;

/// Request payload for `POST /api/agent/smart-stream`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnRequest {
    /// The user's input text.
    pub input_as_text: String,
    /// Attached images as data URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Requested model; the backend picks when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Tools the agent may use for this turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_tools: Vec<String>,
    /// Thread the turn belongs to, for history continuity.
    pub thread_id: ThreadId,
}

impl TurnRequest {
    /// A plain text turn for a thread.
    #[must_use]
    pub fn text(thread_id: ThreadId, input: impl Into<String>) -> Self {
        Self {
            input_as_text: input.into(),
            images: Vec::new(),
            model: None,
            enabled_tools: Vec::new(),
            thread_id,
        }
    }
}

/// Source of turn event streams.
///
/// Implementors must be `Send + Sync`. The returned stream yields decoded
/// events until the underlying transport is exhausted; a cancellation
/// surfaces as [`StreamError::Cancelled`], not as silence.
#[async_trait]
pub trait TurnSource: Send + Sync {
    /// Start one turn and return its event stream.
    async fn open(
        &self,
        request: &TurnRequest,
        cancel: CancellationToken,
    ) -> StreamResult<TurnStream>;
}

/// Production [`TurnSource`] speaking to the dashboard backend.
#[derive(Clone, Debug)]
pub struct ChatStreamClient {
    http: reqwest::Client,
    base_url: String,
    idle_timeout_ms: u64,
}

impl ChatStreamClient {
    /// Create a client with the default idle timeout.
    ///
    /// Note the underlying HTTP client carries no overall request timeout:
    /// a healthy turn can legitimately stream for minutes. Staleness is
    /// bounded per-read by the idle timeout instead.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from_parts(reqwest::Client::new(), base_url, DEFAULT_IDLE_TIMEOUT_MS)
    }

    /// Create a client from a preconfigured [`reqwest::Client`].
    ///
    /// `idle_timeout_ms` of `0` disables the idle bound.
    #[must_use]
    pub fn from_parts(
        http: reqwest::Client,
        base_url: impl Into<String>,
        idle_timeout_ms: u64,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            let _ = base_url.pop();
        }
        Self {
            http,
            base_url,
            idle_timeout_ms,
        }
    }
}

#[async_trait]
impl TurnSource for ChatStreamClient {
    async fn open(
        &self,
        request: &TurnRequest,
        cancel: CancellationToken,
    ) -> StreamResult<TurnStream> {
        if cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }

        debug!(thread_id = %request.thread_id, "opening smart-stream turn");
        let send = self
            .http
            .post(format!("{}/api/agent/smart-stream", self.base_url))
            .json(request)
            .send();

        let resp = tokio::select! {
            () = cancel.cancelled() => return Err(StreamError::Cancelled),
            resp = send => resp?,
        };

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StreamError::Status {
                status: status.as_u16(),
                message: truncate_str(&message, 200),
            });
        }

        let idle_ms = self.idle_timeout_ms;
        let idle = (idle_ms > 0).then(|| Duration::from_millis(idle_ms));
        let byte_stream = resp.bytes_stream();

        let events = async_stream::stream! {
            let lines = parse_sse_lines(byte_stream);
            futures::pin_mut!(lines);

            'turn: loop {
                let step = if let Some(idle) = idle {
                    tokio::select! {
                        () = cancel.cancelled() => ReadStep::Cancelled,
                        timed = tokio::time::timeout(idle, lines.next()) => match timed {
                            Ok(item) => ReadStep::Line(item),
                            Err(_) => ReadStep::TimedOut,
                        },
                    }
                } else {
                    tokio::select! {
                        () = cancel.cancelled() => ReadStep::Cancelled,
                        item = lines.next() => ReadStep::Line(item),
                    }
                };

                match step {
                    ReadStep::Cancelled => {
                        yield Err(StreamError::Cancelled);
                        break 'turn;
                    }
                    ReadStep::TimedOut => {
                        yield Err(StreamError::IdleTimeout { idle_ms });
                        break 'turn;
                    }
                    ReadStep::Line(Some(Ok(line))) => {
                        // Line order is processing order; one line may decode
                        // to several events
                        for event in decode_data_line(&line) {
                            yield Ok(event);
                        }
                    }
                    ReadStep::Line(Some(Err(e))) => {
                        yield Err(e);
                        break 'turn;
                    }
                    ReadStep::Line(None) => break 'turn,
                }
            }
        };

        Ok(Box::pin(events))
    }
}

/// Outcome of one suspension point in the read loop.
enum ReadStep {
    /// The line parser produced an item, or ended (`None`).
    Line(Option<Result<String, StreamError>>),
    /// The cancellation token fired first.
    Cancelled,
    /// The idle window elapsed with no bytes.
    TimedOut,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_response(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_owned(), "text/event-stream")
    }

    async fn collect(stream: TurnStream) -> Vec<Result<TurnEvent, StreamError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn streams_decoded_events_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agent/smart-stream"))
            .and(body_partial_json(
                serde_json::json!({ "input_as_text": "hi", "thread_id": "t1" }),
            ))
            .respond_with(sse_response(concat!(
                "data: {\"metadata\": {\"model\": \"gpt-test\"}}\n\n",
                "data: {\"delta\": \"Hel\"}\n\n",
                "data: {\"delta\": \"lo\"}\n\n",
                "data: {\"done\": true}\n\n",
            )))
            .mount(&server)
            .await;

        let client = ChatStreamClient::new(server.uri());
        let stream = client
            .open(&TurnRequest::text("t1".into(), "hi"), CancellationToken::new())
            .await
            .unwrap();

        let events: Vec<TurnEvent> = collect(stream)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(events.len(), 4);
        assert_matches!(events[0], TurnEvent::Metadata(_));
        assert_eq!(events[1], TurnEvent::Delta("Hel".into()));
        assert_eq!(events[2], TurnEvent::Delta("lo".into()));
        assert_eq!(events[3], TurnEvent::Done);
    }

    #[tokio::test]
    async fn malformed_line_is_skipped_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agent/smart-stream"))
            .respond_with(sse_response(concat!(
                "data: {\"delta\": \"a\"}\n\n",
                "data: {not json}\n\n",
                "data: {\"delta\": \"b\"}\n\n",
            )))
            .mount(&server)
            .await;

        let client = ChatStreamClient::new(server.uri());
        let stream = client
            .open(&TurnRequest::text("t1".into(), "x"), CancellationToken::new())
            .await
            .unwrap();

        let events: Vec<TurnEvent> = collect(stream)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            events,
            vec![TurnEvent::Delta("a".into()), TurnEvent::Delta("b".into())]
        );
    }

    #[tokio::test]
    async fn events_after_done_are_still_read() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agent/smart-stream"))
            .respond_with(sse_response(concat!(
                "data: {\"done\": true}\n\n",
                "data: {\"metrics\": {\"durationMs\": 900}}\n\n",
            )))
            .mount(&server)
            .await;

        let client = ChatStreamClient::new(server.uri());
        let stream = client
            .open(&TurnRequest::text("t1".into(), "x"), CancellationToken::new())
            .await
            .unwrap();

        let events: Vec<TurnEvent> = collect(stream)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(events.len(), 2);
        assert_matches!(events[0], TurnEvent::Done);
        assert_matches!(events[1], TurnEvent::Metrics(_));
    }

    #[tokio::test]
    async fn pre_cancelled_token_never_sends() {
        let server = MockServer::start().await;
        // no mock mounted: a request would 404 and fail differently
        let client = ChatStreamClient::new(server.uri());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .open(&TurnRequest::text("t1".into(), "x"), cancel)
            .await
            .err()
            .unwrap();
        assert_matches!(err, StreamError::Cancelled);
    }

    #[tokio::test]
    async fn non_success_status_is_stream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agent/smart-stream"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = ChatStreamClient::new(server.uri());
        let err = client
            .open(&TurnRequest::text("t1".into(), "x"), CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert_matches!(err, StreamError::Status { status: 503, .. });
    }

    #[test]
    fn request_omits_empty_optionals() {
        let request = TurnRequest::text("t1".into(), "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "input_as_text": "hello", "thread_id": "t1" })
        );
    }
}
