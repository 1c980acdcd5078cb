//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`HearthSettings::default()`]
//! 2. If `~/.hearth/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::HearthSettings;

/// Resolve the path to the settings file (`~/.hearth/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".hearth").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<HearthSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<HearthSettings> {
    let defaults = serde_json::to_value(HearthSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: HearthSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules; invalid values are logged and
/// ignored (falling back to file/default).
pub fn apply_env_overrides(settings: &mut HearthSettings) {
    if let Some(v) = read_env_string("HEARTH_BASE_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = read_env_u64("HEARTH_REQUEST_TIMEOUT_MS", 100, 600_000) {
        settings.api.request_timeout_ms = v;
    }
    if let Some(v) = read_env_string("HEARTH_MODEL") {
        settings.stream.default_model = Some(v);
    }
    // 0 is legal here: it disables the idle bound
    if let Some(v) = read_env_u64("HEARTH_STREAM_IDLE_TIMEOUT_MS", 0, 3_600_000) {
        settings.stream.idle_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("HEARTH_RECONNECT_BASE_MS", 100, 300_000) {
        settings.devices.reconnect.base_delay_ms = v;
    }
    if let Some(v) = read_env_u64("HEARTH_RECONNECT_MAX_MS", 100, 600_000) {
        settings.devices.reconnect.max_delay_ms = v;
    }
    if let Some(v) = read_env_string("HEARTH_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.api.base_url, "http://127.0.0.1:8096");
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"api": {{"baseUrl": "http://ha.local:8096"}}, "logging": {{"level": "debug"}}}}"#
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.api.base_url, "http://ha.local:8096");
        // untouched siblings keep their defaults
        assert_eq!(settings.api.request_timeout_ms, 15_000);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_settings_from_path(&path).is_err());
    }

    // ── deep_merge ───────────────────────────────────────────────────────

    #[test]
    fn merge_nested_objects() {
        let target = serde_json::json!({"a": {"x": 1, "y": 2}, "b": 3});
        let source = serde_json::json!({"a": {"y": 20}});
        let merged = deep_merge(target, source);
        assert_eq!(merged, serde_json::json!({"a": {"x": 1, "y": 20}, "b": 3}));
    }

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let target = serde_json::json!({"tags": ["a", "b"]});
        let source = serde_json::json!({"tags": ["c"]});
        assert_eq!(deep_merge(target, source), serde_json::json!({"tags": ["c"]}));
    }

    #[test]
    fn merge_skips_nulls() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"a": null});
        assert_eq!(deep_merge(target, source), serde_json::json!({"a": 1}));
    }

    // ── parsing ──────────────────────────────────────────────────────────

    #[test]
    fn u64_range_enforced() {
        assert_eq!(parse_u64_range("500", 100, 1000), Some(500));
        assert_eq!(parse_u64_range("99", 100, 1000), None);
        assert_eq!(parse_u64_range("1001", 100, 1000), None);
        assert_eq!(parse_u64_range("abc", 100, 1000), None);
    }
}
