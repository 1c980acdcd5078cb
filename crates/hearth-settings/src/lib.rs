//! # hearth-settings
//!
//! Layered configuration for the hearth client.
//!
//! Loading flow:
//! 1. Start with compiled [`HearthSettings::default()`]
//! 2. If `~/.hearth/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `HEARTH_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)
//!
//! Invalid environment values are logged and ignored rather than failing
//! startup.

#![deny(unsafe_code)]

mod errors;
mod loader;
mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
};
pub use types::{
    ApiSettings, DeviceSettings, HearthSettings, LoggingSettings, StreamSettings,
};
