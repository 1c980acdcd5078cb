//! Device snapshot reconciliation.
//!
//! Pure and synchronous: the reconciler keeps the previous snapshot's
//! `id → online` map and compares it value-wise against each new snapshot.
//! The rules:
//!
//! - The first snapshot of a session produces **no transitions** — there is
//!   nothing to compare against. Devices already offline in it are returned
//!   separately as `initial_offline` so the caller can surface a "currently
//!   offline" notice, never a "became offline" one.
//! - Only devices present in **both** snapshots are compared. Newly appeared
//!   and disappeared devices produce nothing.
//! - The online predicate is [`Device::is_online`] (`online != Some(false)`);
//!   absent-vs-absent is not a flip.
//! - Feeding an identical snapshot again produces zero transitions, whatever
//!   its `ts`.

use std::collections::HashMap;

use hearth_core::device::Device;
use hearth_core::ids::DeviceId;

/// One detected online-predicate flip.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// The predicate flipped true → false.
    WentOffline(Device),
    /// The predicate flipped false → true.
    CameOnline(Device),
}

impl Transition {
    /// The device the transition concerns.
    #[must_use]
    pub fn device(&self) -> &Device {
        match self {
            Self::WentOffline(device) | Self::CameOnline(device) => device,
        }
    }
}

/// Result of observing one snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcileOutcome {
    /// Predicate flips since the previous snapshot (empty on the first).
    pub transitions: Vec<Transition>,
    /// Devices already offline in the first snapshot (empty afterwards).
    pub initial_offline: Vec<Device>,
}

/// Stateful snapshot comparer.
#[derive(Debug, Default)]
pub struct DeviceReconciler {
    prev: Option<HashMap<DeviceId, bool>>,
}

impl DeviceReconciler {
    /// A reconciler that has seen nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any snapshot has been observed.
    #[must_use]
    pub fn primed(&self) -> bool {
        self.prev.is_some()
    }

    /// Observe a full snapshot and report what changed.
    ///
    /// The caller replaces its device list with the snapshot regardless of
    /// the outcome; the reconciler retains the snapshot as "previous" for
    /// the next comparison.
    pub fn observe(&mut self, items: &[Device]) -> ReconcileOutcome {
        let next: HashMap<DeviceId, bool> = items
            .iter()
            .map(|device| (device.id.clone(), device.is_online()))
            .collect();

        let outcome = match &self.prev {
            None => ReconcileOutcome {
                transitions: Vec::new(),
                initial_offline: items
                    .iter()
                    .filter(|device| !device.is_online())
                    .cloned()
                    .collect(),
            },
            Some(prev) => {
                let mut transitions = Vec::new();
                for device in items {
                    // only devices present in both snapshots are compared
                    let Some(&was_online) = prev.get(&device.id) else {
                        continue;
                    };
                    let is_online = device.is_online();
                    if was_online && !is_online {
                        transitions.push(Transition::WentOffline(device.clone()));
                    } else if !was_online && is_online {
                        transitions.push(Transition::CameOnline(device.clone()));
                    }
                }
                ReconcileOutcome {
                    transitions,
                    initial_offline: Vec::new(),
                }
            }
        };

        self.prev = Some(next);
        outcome
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
