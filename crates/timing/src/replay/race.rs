use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::chronometer::Chronometer;
use crate::clock::ClockKey;
use crate::passages::PassageLog;
use crate::racer::{RaceMode, Racer, RacerId, RelayStudent, TeamRoster};

/// The race currently loaded for replay.
///
/// Replacing it (or mutating its passages) recomputes the transport's end
/// and clamps the cursor.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct ReplayRace {
    pub name: String,
    /// Empty for a solo race.
    pub racers: Vec<Racer>,
    pub passages: PassageLog,
    pub rosters: BTreeMap<RacerId, TeamRoster>,
    pub mode: RaceMode,
}

impl ReplayRace {
    /// Replay what the clock engine just recorded.
    pub fn from_chronometer(name: impl Into<String>, chrono: &Chronometer) -> Self {
        Self {
            name: name.into(),
            racers: chrono.racers().to_vec(),
            passages: chrono.passages().clone(),
            rosters: chrono.rosters().clone(),
            mode: chrono.mode(),
        }
    }

    /// Keys in display order: the racers as supplied, or the solo clock.
    pub fn keys(&self) -> Vec<ClockKey> {
        if self.racers.is_empty() {
            vec![ClockKey::Solo]
        } else {
            self.racers
                .iter()
                .map(|r| ClockKey::Racer(r.id.clone()))
                .collect()
        }
    }

    pub fn max_total_ms(&self) -> u64 {
        self.passages.max_total_ms()
    }

    /// The roster member at `index` in `key`'s relay group, if any.
    pub fn runner(&self, key: &ClockKey, index: usize) -> Option<&RelayStudent> {
        key.racer_id()
            .and_then(|id| self.rosters.get(id))
            .and_then(|roster| roster.student(index))
    }

    /// Relay team size for `key`; 1 for solo and roster-less racers.
    pub fn team_size(&self, key: &ClockKey) -> usize {
        key.racer_id()
            .and_then(|id| self.rosters.get(id))
            .map_or(1, TeamRoster::team_size)
    }
}
