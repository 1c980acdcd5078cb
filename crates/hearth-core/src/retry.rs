//! Reconnect backoff configuration and delay calculation.
//!
//! The push channels (`/api/devices/stream`, `/api/system/stream`) retry
//! forever on transport error, the way a browser `EventSource` does. This
//! module holds the portable building blocks for that loop:
//!
//! - [`ReconnectConfig`]: backoff parameters (base, cap, jitter)
//! - [`backoff_delay_ms`]: deterministic exponential backoff
//! - [`jittered`]: randomized jitter applied by the caller

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// Backoff parameters for push-channel reconnection.
///
/// There is deliberately no attempt cap: the channel keeps retrying until
/// cancelled, matching browser-native `EventSource` semantics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectConfig {
    /// Base delay for exponential backoff in ms.
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in ms.
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 applied symmetrically (±).
    pub jitter_factor: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl ReconnectConfig {
    /// Compute the jittered delay for a zero-based attempt index.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = backoff_delay_ms(attempt, self.base_delay_ms, self.max_delay_ms);
        Duration::from_millis(jittered(base, self.jitter_factor))
    }
}

/// Deterministic exponential backoff: `min(max_delay, base * 2^attempt)`.
#[must_use]
pub fn backoff_delay_ms(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    exponential.min(max_delay_ms)
}

/// Apply symmetric random jitter to a delay.
///
/// A factor of 0.2 means the result varies by ±20% from `delay_ms`.
/// Factors outside 0.0–1.0 are clamped.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn jittered(delay_ms: u64, jitter_factor: f64) -> u64 {
    let factor = jitter_factor.clamp(0.0, 1.0);
    if factor == 0.0 || delay_ms == 0 {
        return delay_ms;
    }
    // Uniform in [-factor, +factor]
    let offset = (rand::random::<f64>() * 2.0 - 1.0) * factor;
    let scaled = delay_ms as f64 * (1.0 + offset);
    scaled.max(0.0) as u64
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay_ms(0, 1_000, 30_000), 1_000);
        assert_eq!(backoff_delay_ms(1, 1_000, 30_000), 2_000);
        assert_eq!(backoff_delay_ms(2, 1_000, 30_000), 4_000);
        assert_eq!(backoff_delay_ms(3, 1_000, 30_000), 8_000);
    }

    #[test]
    fn backoff_caps_at_max() {
        assert_eq!(backoff_delay_ms(10, 1_000, 30_000), 30_000);
        assert_eq!(backoff_delay_ms(63, 1_000, 30_000), 30_000);
    }

    #[test]
    fn backoff_survives_large_attempt_numbers() {
        // The shift is clamped, never overflows
        assert_eq!(backoff_delay_ms(u32::MAX, 1_000, 30_000), 30_000);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        for _ in 0..100 {
            let delay = jittered(10_000, 0.2);
            assert!((8_000..=12_000).contains(&delay), "delay {delay} out of range");
        }
    }

    #[test]
    fn zero_jitter_is_identity() {
        assert_eq!(jittered(5_000, 0.0), 5_000);
    }

    #[test]
    fn config_default_values() {
        let config = ReconnectConfig::default();
        assert_eq!(config.base_delay_ms, 1_000);
        assert_eq!(config.max_delay_ms, 30_000);
        assert!((config.jitter_factor - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn config_partial_json_fills_defaults() {
        let config: ReconnectConfig = serde_json::from_str(r#"{"baseDelayMs": 500}"#).unwrap();
        assert_eq!(config.base_delay_ms, 500);
        assert_eq!(config.max_delay_ms, DEFAULT_MAX_DELAY_MS);
    }
}
