//! Branded ID newtypes for type safety.
//!
//! Every entity in the hearth system has a distinct ID type implemented as a
//! newtype wrapper around `String`. This prevents accidentally passing a
//! device ID where a thread ID is expected.
//!
//! Client-generated IDs are UUID v7 (time-ordered) via [`uuid::Uuid::now_v7`].
//! Message IDs have one extra wrinkle: before the backend has persisted a
//! message, the client addresses it by a `temp_<millis>` stub ID which the
//! server-assigned ID replaces on persistence.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a new UUID v7 string (time-ordered).
fn new_v7() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v7())
            }

            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a conversation thread.
    ThreadId
}

branded_id! {
    /// Unique identifier for a message within a thread.
    ///
    /// Server-assigned on persistence; see [`MessageId::temp`] for the
    /// optimistic client-side stub used before persistence completes.
    MessageId
}

branded_id! {
    /// Unique identifier for a Home Assistant device entity.
    DeviceId
}

impl MessageId {
    /// Prefix carried by optimistic stub IDs.
    pub const TEMP_PREFIX: &'static str = "temp_";

    /// Create an optimistic stub ID (`temp_<millis>`).
    ///
    /// Used for messages rendered before the backend has assigned a real ID.
    #[must_use]
    pub fn temp() -> Self {
        Self(format!(
            "{}{}",
            Self::TEMP_PREFIX,
            chrono::Utc::now().timestamp_millis()
        ))
    }

    /// Whether this ID is an optimistic stub awaiting persistence.
    #[must_use]
    pub fn is_temp(&self) -> bool {
        self.0.starts_with(Self::TEMP_PREFIX)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
