//! # hearth-api
//!
//! Typed HTTP client for the hearth dashboard backend.
//!
//! Covers the CRUD surface the dashboard consumes:
//!
//! - Threads: list, create, patch, delete, suggest-title, share
//! - Messages: list per thread, append (persistence)
//! - Devices: point-in-time snapshot
//! - System: point-in-time health
//!
//! Every endpoint responds with a `{ "ok": bool, ...payload }` envelope.
//! `ok: false` is a *soft* failure ([`ApiError::Rejected`]): the caller
//! surfaces it as a notification and rolls back optimistic state — it is
//! never treated as fatal and never retried automatically.

#![deny(unsafe_code)]

mod client;
mod errors;

pub use client::{ApiClient, NewMessage};
pub use errors::{ApiError, ApiResult};
