//! Racer lifecycle: keeps the clock map in step with the supplied racer list.
//!
//! An empty list means "solo": a single implicit clock keyed `ClockKey::Solo`.
//! As soon as racers are supplied the solo clock is dropped and one clock per
//! racer is kept. Reconciliation is idempotent and never touches the state of
//! a key that survives the update.

use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;

use crate::clock::{ClockKey, RacerState};
use crate::config::MAX_TRACKED_RACERS;
use crate::passages::PassageLog;
use crate::racer::{Racer, RacerId};

/// The tracked set as seen at the lifecycle boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedSet {
    Named(Vec<RacerId>),
    UnnamedSolo,
}

impl TrackedSet {
    pub fn from_racers(racers: &[Racer]) -> Self {
        if racers.is_empty() {
            TrackedSet::UnnamedSolo
        } else {
            TrackedSet::Named(racers.iter().map(|r| r.id.clone()).collect())
        }
    }

    /// Clock keys of the set, in racer order.
    pub fn keys(&self) -> Vec<ClockKey> {
        match self {
            TrackedSet::UnnamedSolo => vec![ClockKey::Solo],
            TrackedSet::Named(ids) => ids.iter().cloned().map(ClockKey::Racer).collect(),
        }
    }

    pub fn is_solo(&self) -> bool {
        matches!(self, TrackedSet::UnnamedSolo)
    }
}

/// What one reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<ClockKey>,
    pub removed: Vec<ClockKey>,
    /// Passages discarded together with removed clocks.
    pub purged_passages: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Bring `states` in line with `tracked`.
///
/// Missing keys get a fresh idle clock; keys no longer tracked are dropped
/// together with their passage log, so removing a racer and re-adding the
/// same id starts from an empty log.
pub fn reconcile(
    tracked: &TrackedSet,
    states: &mut BTreeMap<ClockKey, RacerState>,
    passages: &mut PassageLog,
) -> ReconcileReport {
    let wanted: BTreeSet<ClockKey> = tracked.keys().into_iter().collect();
    if wanted.len() > MAX_TRACKED_RACERS {
        warn!(
            "Tracking {} racers, above the supported maximum of {}",
            wanted.len(),
            MAX_TRACKED_RACERS
        );
    }

    let mut report = ReconcileReport::default();

    let stale: Vec<ClockKey> = states
        .keys()
        .filter(|key| !wanted.contains(*key))
        .cloned()
        .collect();
    for key in stale {
        states.remove(&key);
        report.removed.push(key);
    }
    // Logs can outlive their state (e.g. restored races), so sweep them too.
    let stale_logs: Vec<ClockKey> = passages
        .keys()
        .filter(|key| !wanted.contains(*key))
        .cloned()
        .collect();
    for key in stale_logs {
        report.purged_passages += passages.purge(&key);
    }

    for key in wanted {
        if !states.contains_key(&key) {
            states.insert(key.clone(), RacerState::default());
            report.added.push(key);
        }
    }

    report
}
