//! Per-racer clock state machine.
//!
//! Each tracked key owns one `RacerState`. While running its elapsed time is
//! `elapsed_before_pause + (now - start_time)`; while idle or paused it is
//! frozen. All times are whole milliseconds on the engine's monotonic clock.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::racer::RacerId;

/// Key of one tracked clock: a named racer, or the implicit solo racer used
/// when no racer list is supplied.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum ClockKey {
    Solo,
    Racer(RacerId),
}

impl ClockKey {
    pub fn racer(id: impl Into<RacerId>) -> Self {
        ClockKey::Racer(id.into())
    }

    pub fn racer_id(&self) -> Option<&RacerId> {
        match self {
            ClockKey::Solo => None,
            ClockKey::Racer(id) => Some(id),
        }
    }
}

impl From<RacerId> for ClockKey {
    fn from(id: RacerId) -> Self {
        ClockKey::Racer(id)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum RacerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

/// One frame's view of time: the monotonic engine clock and the wall clock.
///
/// Every command and tick within a frame uses the same sample, so all running
/// racers advance in lockstep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockSample {
    /// Monotonic milliseconds since the engine clock started.
    pub now_ms: u64,
    /// Unix epoch milliseconds; only used to anchor persisted timestamps.
    pub wall_ms: u64,
}

impl ClockSample {
    pub fn new(now_ms: u64, wall_ms: u64) -> Self {
        Self { now_ms, wall_ms }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RacerState {
    /// Displayed elapsed time; recomputed on tick while running.
    pub elapsed_ms: u64,
    pub status: RacerStatus,
    /// Accumulated time as of the last transition into `Running`.
    pub elapsed_before_pause: u64,
    /// Engine time at which the current running interval began.
    pub start_time: u64,
}

impl RacerState {
    pub fn is_running(&self) -> bool {
        self.status == RacerStatus::Running
    }

    /// Elapsed time as it would read at `now_ms`, without mutating.
    pub fn elapsed_at(&self, now_ms: u64) -> u64 {
        if self.is_running() {
            self.elapsed_before_pause + now_ms.saturating_sub(self.start_time)
        } else {
            self.elapsed_ms
        }
    }

    /// Recompute `elapsed_ms` from the monotonic clock. No-op unless running.
    pub fn refresh(&mut self, now_ms: u64) {
        if self.is_running() {
            self.elapsed_ms = self.elapsed_at(now_ms);
        }
    }

    /// Transition into `Running`. Returns `false` if already running.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.is_running() {
            return false;
        }
        self.elapsed_before_pause = self.elapsed_ms;
        self.start_time = now_ms;
        self.status = RacerStatus::Running;
        true
    }

    /// Freeze the clock at `now_ms` and transition into `Paused`.
    /// Returns `false` if the racer was not running.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if !self.is_running() {
            return false;
        }
        self.refresh(now_ms);
        self.elapsed_before_pause = self.elapsed_ms;
        self.status = RacerStatus::Paused;
        true
    }
}

/// Largest elapsed time across `states`; the single global timer display.
pub fn aggregate_elapsed<'a>(states: impl IntoIterator<Item = &'a RacerState>) -> u64 {
    states.into_iter().map(|s| s.elapsed_ms).max().unwrap_or(0)
}

/// Running if any state runs, else Paused if any is paused, else Idle.
pub fn aggregate_status<'a>(states: impl IntoIterator<Item = &'a RacerState>) -> RacerStatus {
    let mut any_paused = false;
    for state in states {
        match state.status {
            RacerStatus::Running => return RacerStatus::Running,
            RacerStatus::Paused => any_paused = true,
            RacerStatus::Idle => {}
        }
    }
    if any_paused {
        RacerStatus::Paused
    } else {
        RacerStatus::Idle
    }
}
