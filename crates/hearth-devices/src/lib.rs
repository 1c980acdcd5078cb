//! # hearth-devices
//!
//! Consumers for the dashboard backend's push channels.
//!
//! The backend emits full snapshots on a server-defined cadence:
//! `/api/devices/stream` carries the complete device list (named event
//! `devices`), `/api/system/stream` carries health flags (named event
//! `system`). This crate turns those snapshots into *exactly-once*
//! user-facing notifications:
//!
//! - [`reconcile`]: pure value-based device diffing — a notice fires when a
//!   device's online predicate flips, never per snapshot, never on the first
//!   snapshot of a session
//! - [`health`]: the same reconciler pattern over the `ha_ok`/`db_ok` flags
//! - [`channel`]: a reconnecting event-source subscription with
//!   browser-`EventSource`-style endless retry and one-per-edge
//!   connected/disconnected events
//! - [`watch`]: the wiring — snapshots through the reconcilers into the
//!   [`Notify`] sink and a `tokio::sync::watch` publication
//!
//! [`Notify`]: hearth_core::notify::Notify

#![deny(unsafe_code)]

pub mod channel;
pub mod health;
pub mod reconcile;
pub mod watch;

pub use channel::{ChannelConfig, ChannelEvent, subscribe};
pub use health::{HealthEvent, HealthFlag, HealthReconciler};
pub use reconcile::{DeviceReconciler, ReconcileOutcome, Transition};
pub use watch::{DeviceWatcher, HealthWatcher};
