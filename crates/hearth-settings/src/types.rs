//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON
//! settings file format. Each type implements [`Default`] with production
//! default values, and `#[serde(default)]` so partial JSON files work —
//! missing fields keep their defaults through deserialization.

use hearth_core::retry::ReconnectConfig;
use serde::{Deserialize, Serialize};

/// Root settings type for the hearth client.
///
/// Loaded from `~/.hearth/settings.json` with defaults applied for missing
/// fields. `HEARTH_*` environment variables override specific values.
///
/// # JSON Format
///
/// ```json
/// {
///   "api": { "baseUrl": "http://192.168.1.10:8096" },
///   "stream": { "idleTimeoutMs": 60000 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HearthSettings {
    /// Backend endpoint settings.
    pub api: ApiSettings,
    /// Chat smart-stream settings.
    pub stream: StreamSettings,
    /// Device/system push-channel settings.
    pub devices: DeviceSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Backend endpoint settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL of the dashboard backend.
    pub base_url: String,
    /// Per-request timeout for CRUD calls in ms (streaming requests are
    /// exempt; they use the stream idle timeout instead).
    pub request_timeout_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8096".into(),
            request_timeout_ms: 15_000,
        }
    }
}

/// Chat smart-stream settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamSettings {
    /// Maximum quiet time between stream reads in ms before the turn is
    /// treated as failed. `0` disables the bound.
    pub idle_timeout_ms: u64,
    /// Model requested when the thread does not pin one.
    pub default_model: Option<String>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 120_000,
            default_model: None,
        }
    }
}

/// Device/system push-channel settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceSettings {
    /// Reconnect backoff for the push channels.
    pub reconnect: ReconnectConfig,
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum log level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
