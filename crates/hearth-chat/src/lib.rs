//! # hearth-chat
//!
//! Consumer for the chat smart-stream protocol and owner of per-thread
//! conversation state.
//!
//! The backend's `POST /api/agent/smart-stream` endpoint answers with a byte
//! stream framed as newline-separated lines; only lines prefixed `data: `
//! carry payload, and each payload is a flat JSON object whose *key presence*
//! determines meaning. This crate:
//!
//! - reassembles lines from arbitrary chunk boundaries ([`sse`])
//! - decodes each line into [`TurnEvent`]s in a fixed dispatch order
//!   ([`decode`])
//! - folds events into a running turn ([`turn`]): deltas append, content
//!   snapshots replace, the post-hoc tool list wins over the planned one
//! - drives whole turns with cooperative cancellation and an idle timeout
//!   ([`client`])
//! - owns the per-thread message cache and the one-writer-per-thread
//!   in-flight registry ([`store`])
//!
//! [`TurnEvent`]: hearth_core::events::TurnEvent

#![deny(unsafe_code)]

pub mod client;
pub mod decode;
pub mod errors;
pub mod sse;
pub mod store;
pub mod turn;

pub use client::{ChatStreamClient, TurnRequest, TurnStream};
pub use errors::{StreamError, StreamResult};
pub use store::{MessageStore, SessionError, SessionStore, TurnInput, TurnOutcome};
pub use turn::TurnState;
