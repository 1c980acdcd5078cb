//! Reconnecting event-source subscription.
//!
//! The browser `EventSource` the dashboard relied on reconnects on its own;
//! this is its server-side analog: a GET that, on any transport error or
//! server close, sleeps a jittered exponential backoff and connects again,
//! forever, until cancelled. Raw transport errors are never surfaced to the
//! consumer — only the connection *edges* are:
//!
//! - [`ChannelEvent::Open`] fires once per established connection
//! - [`ChannelEvent::Closed`] fires once per transition into the
//!   disconnected state, no matter how many retry attempts follow
//!
//! Everything else is [`ChannelEvent::Message`] carrying the SSE event name
//! and data payload.

use eventsource_stream::Eventsource;
use futures::Stream;
use futures::StreamExt as _;
use hearth_core::retry::ReconnectConfig;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Configuration for one push-channel subscription.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Absolute URL of the stream endpoint.
    pub url: String,
    /// Backoff parameters for reconnection.
    pub reconnect: ReconnectConfig,
}

/// One item from a push channel.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    /// A connection was established.
    Open,
    /// The connection was lost (emitted once per edge, not per retry).
    Closed,
    /// A server event arrived.
    Message {
        /// SSE event name (`"message"` when the server sent none).
        event: String,
        /// Raw data payload.
        data: String,
    },
}

/// Subscribe to a push channel with endless reconnection.
///
/// The returned stream ends only when `cancel` fires; transport failures
/// turn into edge events plus a backoff sleep.
pub fn subscribe(
    http: reqwest::Client,
    config: ChannelConfig,
    cancel: CancellationToken,
) -> impl Stream<Item = ChannelEvent> + Send {
    async_stream::stream! {
        let mut attempt: u32 = 0;
        // None until the first connect resolves either way; used to emit
        // exactly one Closed per disconnected period
        let mut connected: Option<bool> = None;

        'channel: loop {
            if cancel.is_cancelled() {
                break 'channel;
            }

            let request = http
                .get(&config.url)
                .header(reqwest::header::ACCEPT, "text/event-stream")
                .send();
            let resp = tokio::select! {
                () = cancel.cancelled() => break 'channel,
                resp = request => resp,
            };

            match resp.and_then(reqwest::Response::error_for_status) {
                Ok(resp) => {
                    attempt = 0;
                    connected = Some(true);
                    yield ChannelEvent::Open;

                    let events = resp.bytes_stream().eventsource();
                    futures::pin_mut!(events);
                    loop {
                        let item = tokio::select! {
                            () = cancel.cancelled() => break 'channel,
                            item = events.next() => item,
                        };
                        match item {
                            Some(Ok(event)) => {
                                yield ChannelEvent::Message {
                                    event: event.event,
                                    data: event.data,
                                };
                            }
                            Some(Err(e)) => {
                                debug!(url = %config.url, "push channel read error: {e}");
                                break;
                            }
                            None => break, // server closed the stream
                        }
                    }

                    connected = Some(false);
                    yield ChannelEvent::Closed;
                }
                Err(e) => {
                    debug!(url = %config.url, "push channel connect failed: {e}");
                    if connected != Some(false) {
                        connected = Some(false);
                        yield ChannelEvent::Closed;
                    }
                }
            }

            let delay = config.reconnect.delay_for_attempt(attempt);
            attempt = attempt.saturating_add(1);
            tokio::select! {
                () = cancel.cancelled() => break 'channel,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
