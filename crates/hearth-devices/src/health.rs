//! System health reconciliation.
//!
//! Same pattern as the device reconciler, different payload shape: the
//! system stream carries `ha_ok`/`db_ok` booleans instead of a device list.
//! The first report notifies only on already-bad flags ("currently down");
//! afterwards only edges notify, per flag, exactly once per edge.

use hearth_core::device::SystemHealth;

/// Which subsystem a health event concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthFlag {
    /// The Home Assistant bridge.
    HomeAssistant,
    /// The backing database.
    Database,
}

impl HealthFlag {
    /// Human-readable subsystem name for notices.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::HomeAssistant => "Home Assistant",
            Self::Database => "Database",
        }
    }
}

/// One notified health condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthEvent {
    /// First report of the session found the flag already bad.
    AlreadyDown(HealthFlag),
    /// The flag flipped ok → bad.
    WentDown(HealthFlag),
    /// The flag flipped bad → ok.
    Recovered(HealthFlag),
}

/// Stateful health-flag comparer.
#[derive(Debug, Default)]
pub struct HealthReconciler {
    prev: Option<(bool, bool)>,
}

impl HealthReconciler {
    /// A reconciler that has seen nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one health report and return the events to notify.
    pub fn observe(&mut self, health: &SystemHealth) -> Vec<HealthEvent> {
        let mut events = Vec::new();

        match self.prev {
            None => {
                if !health.ha_ok {
                    events.push(HealthEvent::AlreadyDown(HealthFlag::HomeAssistant));
                }
                if !health.db_ok {
                    events.push(HealthEvent::AlreadyDown(HealthFlag::Database));
                }
            }
            Some((prev_ha, prev_db)) => {
                events.extend(edge(prev_ha, health.ha_ok, HealthFlag::HomeAssistant));
                events.extend(edge(prev_db, health.db_ok, HealthFlag::Database));
            }
        }

        self.prev = Some((health.ha_ok, health.db_ok));
        events
    }
}

fn edge(was_ok: bool, is_ok: bool, flag: HealthFlag) -> Option<HealthEvent> {
    match (was_ok, is_ok) {
        (true, false) => Some(HealthEvent::WentDown(flag)),
        (false, true) => Some(HealthEvent::Recovered(flag)),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
