//! # hearth-core
//!
//! Foundation types and utilities for the hearth smart-home dashboard client.
//!
//! This crate provides the shared vocabulary that all other hearth crates
//! depend on:
//!
//! - **Branded IDs**: `ThreadId`, `MessageId`, `DeviceId` as newtypes for type safety
//! - **Conversation model**: `Message`, `Thread`, and the post-turn enrichment fields
//! - **Stream events**: `TurnEvent` union for the chat smart-stream protocol
//! - **Devices**: `Device` snapshots with the canonical online predicate
//! - **Notifications**: the `Notify` trait and `Notice` toast surface
//! - **Backoff**: reconnect delay math shared by the push channels

#![deny(unsafe_code)]

pub mod device;
pub mod events;
pub mod ids;
pub mod logging;
pub mod message;
pub mod notify;
pub mod retry;
pub mod text;
pub mod thread;

pub use device::{Device, DeviceKind, DeviceSnapshot, SystemHealth};
pub use events::{StreamingMetadata, TurnEvent, TurnMetrics};
pub use ids::{DeviceId, MessageId, ThreadId};
pub use message::{Complexity, Message, Role, Routing, TurnEnrichment};
pub use notify::{Notice, Notify, Severity};
pub use thread::{Thread, ThreadPatch};
