//! The persisted race schema and its conversions to and from the engine.
//!
//! Passages are stored as absolute wall-clock timestamps (epoch + total) and
//! turned back into relative totals and laps on load, so laps are always
//! re-derived rather than trusted from storage.

use std::collections::BTreeMap;
use std::fmt;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use timing::chronometer::Chronometer;
use timing::clock::{ClockKey, RacerStatus};
use timing::config::{FALLBACK_COLOR, SOLO_COLOR, SOLO_DISPLAY_NAME};
use timing::passages::PassageLog;
use timing::racer::{random_hex_id, RaceMode, Racer, RacerId, TeamRoster};
use timing::replay::ReplayRace;

use crate::store_error::StoreError;

/// Version of the `StoredRace` layout. Bump on any field change.
pub const RACE_SCHEMA_VERSION: u32 = 1;

/// Name given to races saved with a blank name.
pub const UNTITLED_RACE_NAME: &str = "Untitled race";

// =============================================================================
// Identifiers
// =============================================================================

#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub struct RaceId(String);

impl RaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 32 random lowercase hex digits.
    pub fn generate() -> Self {
        Self(random_hex_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Usable as a file stem: non-empty ASCII alphanumerics, `-` and `_`.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for RaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Engine -> store
// =============================================================================

/// Everything the engine hands over on save, captured at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceDraft {
    pub name: String,
    pub created_at_ms: u64,
    /// Empty for a solo race.
    pub racers: Vec<Racer>,
    pub passages: PassageLog,
    pub epoch_ms: Option<u64>,
    pub status_at_save: RacerStatus,
    pub mode: RaceMode,
    pub rosters: BTreeMap<RacerId, TeamRoster>,
}

impl RaceDraft {
    /// Snapshot the clock engine. Later mutation of the engine does not
    /// reach the draft.
    pub fn from_chronometer(
        name: impl Into<String>,
        chrono: &Chronometer,
        created_at_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            created_at_ms,
            racers: chrono.racers().to_vec(),
            passages: chrono.passages().clone(),
            epoch_ms: chrono.epoch_ms(),
            status_at_save: chrono.status(),
            mode: chrono.mode(),
            rosters: chrono.rosters().clone(),
        }
    }
}

// =============================================================================
// Durable record
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct StoredRacer {
    /// `Solo` for the virtual racer of a solo race.
    pub key: ClockKey,
    pub name: String,
    pub color: String,
    pub display_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct StoredPassage {
    pub key: ClockKey,
    pub tour_num: u32,
    /// Wall-clock ms of the passage, or the race total when the race never
    /// had an epoch.
    pub timestamp_ms: u64,
    pub student_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct StoredRace {
    pub id: RaceId,
    pub name: String,
    pub created_at_ms: u64,
    pub epoch_ms: Option<u64>,
    pub status_at_save: RacerStatus,
    pub mode: RaceMode,
    pub racers: Vec<StoredRacer>,
    pub rosters: Vec<(RacerId, TeamRoster)>,
    pub passages: Vec<StoredPassage>,
}

impl StoredRace {
    pub fn from_draft(id: RaceId, draft: &RaceDraft) -> Self {
        let name = match draft.name.trim() {
            "" => UNTITLED_RACE_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };

        let racers = if draft.racers.is_empty() {
            vec![StoredRacer {
                key: ClockKey::Solo,
                name: SOLO_DISPLAY_NAME.to_string(),
                color: SOLO_COLOR.to_string(),
                display_order: 0,
            }]
        } else {
            draft
                .racers
                .iter()
                .enumerate()
                .map(|(i, r)| StoredRacer {
                    key: ClockKey::Racer(r.id.clone()),
                    name: r.name.clone(),
                    color: r.color.clone(),
                    display_order: i as u32,
                })
                .collect()
        };

        let passages = draft
            .passages
            .iter()
            .flat_map(|(key, log)| {
                log.iter().map(move |p| StoredPassage {
                    key: key.clone(),
                    tour_num: p.tour_num,
                    timestamp_ms: draft.epoch_ms.map_or(p.total_ms, |e| e + p.total_ms),
                    student_index: p.student_index,
                })
            })
            .collect();

        Self {
            id,
            name,
            created_at_ms: draft.created_at_ms,
            epoch_ms: draft.epoch_ms,
            status_at_save: draft.status_at_save,
            mode: draft.mode,
            racers,
            rosters: draft
                .rosters
                .iter()
                .map(|(id, roster)| (id.clone(), roster.clone()))
                .collect(),
            passages,
        }
    }

    pub fn summary(&self) -> RaceSummary {
        RaceSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at_ms: self.created_at_ms,
            status_at_save: self.status_at_save,
            mode: self.mode,
            racer_count: self
                .racers
                .iter()
                .filter(|r| r.key != ClockKey::Solo)
                .count(),
        }
    }

    /// Rebuild the in-memory race: relative totals, laps re-derived from
    /// consecutive totals, logs sorted by `tour_num`.
    pub fn to_loaded(&self) -> LoadedRace {
        let mut stored: Vec<&StoredRacer> = self.racers.iter().collect();
        stored.sort_by_key(|r| r.display_order);
        let racers = stored
            .into_iter()
            .filter_map(|r| {
                let id = r.key.racer_id()?.clone();
                let color = if r.color.is_empty() {
                    FALLBACK_COLOR.to_string()
                } else {
                    r.color.clone()
                };
                Some(Racer::with_id(id, r.name.clone(), color))
            })
            .collect();

        let epoch = self.epoch_ms.unwrap_or(0);
        let passages = PassageLog::rebuild_from_totals(self.passages.iter().map(|p| {
            (
                p.key.clone(),
                p.tour_num,
                p.timestamp_ms.saturating_sub(epoch),
                p.student_index,
            )
        }));

        LoadedRace {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at_ms: self.created_at_ms,
            racers,
            passages,
            epoch_ms: self.epoch_ms,
            status_at_save: self.status_at_save,
            mode: self.mode,
            rosters: self.rosters.iter().cloned().collect(),
        }
    }

    /// Human-readable export.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

// =============================================================================
// Store -> engine
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRace {
    pub id: RaceId,
    pub name: String,
    pub created_at_ms: u64,
    /// Empty for a solo race.
    pub racers: Vec<Racer>,
    pub passages: PassageLog,
    pub epoch_ms: Option<u64>,
    pub status_at_save: RacerStatus,
    pub mode: RaceMode,
    pub rosters: BTreeMap<RacerId, TeamRoster>,
}

impl LoadedRace {
    pub fn into_replay(self) -> ReplayRace {
        ReplayRace {
            name: self.name,
            racers: self.racers,
            passages: self.passages,
            rosters: self.rosters,
            mode: self.mode,
        }
    }
}

/// One line of the race list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceSummary {
    pub id: RaceId,
    pub name: String,
    pub created_at_ms: u64,
    pub status_at_save: RacerStatus,
    pub mode: RaceMode,
    pub racer_count: usize,
}

/// Newest first; equal creation times fall back to id order.
pub fn sort_by_recency(summaries: &mut [RaceSummary]) {
    summaries.sort_by(|a, b| {
        b.created_at_ms
            .cmp(&a.created_at_ms)
            .then_with(|| a.id.cmp(&b.id))
    });
}
