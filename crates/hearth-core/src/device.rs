//! Device and system-health snapshot types.
//!
//! A [`Device`] is a Home Assistant entity snapshot. Snapshots are never
//! mutated in place: every poll/push tick replaces the whole list. The one
//! per-field comparison the client ever performs is the online predicate,
//! and the canonical form of that predicate is [`Device::is_online`]:
//! `online != Some(false)` — absent, null, and `true` all count as online.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::DeviceId;

// ─────────────────────────────────────────────────────────────────────────────
// Device
// ─────────────────────────────────────────────────────────────────────────────

/// Home Assistant domain of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// `light.*` entities.
    Light,
    /// `switch.*` entities.
    Switch,
    /// `climate.*` entities.
    Climate,
    /// `cover.*` entities.
    Cover,
    /// `media_player.*` entities.
    MediaPlayer,
    /// `sensor.*` entities.
    Sensor,
    /// `scene.*` entities.
    Scene,
    /// `script.*` entities.
    Script,
    /// Any domain the dashboard has no dedicated handling for.
    #[serde(other)]
    Other,
}

/// A Home Assistant entity snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Entity ID (e.g. `light.kitchen`).
    pub id: DeviceId,
    /// Friendly name.
    pub name: String,
    /// Entity domain.
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    /// Optional location tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// Domain-specific state string (`on`, `off`, `heat`, `playing`, ...).
    pub state: String,
    /// Connectivity flag. Absent means online; see [`Device::is_online`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    /// Domain-specific attribute bag (brightness, color, position, volume, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
}

impl Device {
    /// The canonical online predicate: online unless explicitly `false`.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online != Some(false)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Push-channel payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Payload of the `devices` push-channel event: a full device-list snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Server-side emission time (unix millis).
    pub ts: i64,
    /// The complete device list; replaces the prior list on every tick.
    #[serde(default)]
    pub items: Vec<Device>,
}

/// Payload of the `system` push-channel event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    /// Server-side emission time (unix millis).
    pub ts: i64,
    /// Backend uptime in seconds.
    pub uptime_s: u64,
    /// Whether the Home Assistant bridge is reachable.
    pub ha_ok: bool,
    /// Home Assistant round-trip latency in milliseconds.
    #[serde(default)]
    pub ha_latency_ms: Option<u64>,
    /// Whether the backing database is reachable.
    pub db_ok: bool,
    /// Database round-trip latency in milliseconds.
    #[serde(default)]
    pub db_latency_ms: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
