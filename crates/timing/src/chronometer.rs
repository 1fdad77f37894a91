//! The clock engine: one clock per tracked racer under a shared frame loop.
//!
//! `Chronometer` owns the clock map, the passage logs, relay rosters and the
//! global epoch. Commands take a `ClockSample` so every mutation within one
//! frame reads the same "now". Aggregate status and elapsed time are computed
//! on demand from the clock map, never cached.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::clock::{aggregate_elapsed, aggregate_status, ClockKey, ClockSample, RacerState, RacerStatus};
use crate::frame_task::FrameTask;
use crate::lifecycle::{reconcile, ReconcileReport, TrackedSet};
use crate::passages::{Passage, PassageLog};
use crate::racer::{RaceMode, Racer, RacerId, TeamRoster};

#[derive(Resource, Debug, Clone)]
pub struct Chronometer {
    racers: Vec<Racer>,
    tracked: TrackedSet,
    states: BTreeMap<ClockKey, RacerState>,
    passages: PassageLog,
    rosters: BTreeMap<RacerId, TeamRoster>,
    mode: RaceMode,
    /// Wall-clock ms corresponding to elapsed zero. Set on first start,
    /// cleared on reset; persistence only.
    epoch_ms: Option<u64>,
    ticker: FrameTask,
}

impl Default for Chronometer {
    fn default() -> Self {
        Self::new(RaceMode::Individual)
    }
}

impl Chronometer {
    /// A solo chronometer (no racers supplied yet).
    pub fn new(mode: RaceMode) -> Self {
        let mut chrono = Self {
            racers: Vec::new(),
            tracked: TrackedSet::UnnamedSolo,
            states: BTreeMap::new(),
            passages: PassageLog::default(),
            rosters: BTreeMap::new(),
            mode,
            epoch_ms: None,
            ticker: FrameTask::default(),
        };
        reconcile(&chrono.tracked, &mut chrono.states, &mut chrono.passages);
        chrono
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Replace the tracked racer list and reconcile the clock map.
    pub fn set_racers(&mut self, racers: Vec<Racer>) -> ReconcileReport {
        self.tracked = TrackedSet::from_racers(&racers);
        self.racers = racers;
        let report = reconcile(&self.tracked, &mut self.states, &mut self.passages);
        let tracked = &self.tracked;
        self.rosters.retain(|id, _| match tracked {
            TrackedSet::Named(ids) => ids.contains(id),
            TrackedSet::UnnamedSolo => false,
        });
        if !report.is_noop() {
            info!(
                "Racers reconciled: {} added, {} removed, {} passages purged",
                report.added.len(),
                report.removed.len(),
                report.purged_passages
            );
        }
        if !self.any_running() {
            self.ticker.cancel();
        }
        report
    }

    pub fn set_roster(&mut self, id: RacerId, roster: TeamRoster) {
        self.rosters.insert(id, roster);
    }

    pub fn set_mode(&mut self, mode: RaceMode) {
        self.mode = mode;
    }

    /// Fetch the clock for `key`, creating an idle one for unknown keys.
    fn ensure_state(&mut self, key: &ClockKey) -> &mut RacerState {
        self.states.entry(key.clone()).or_default()
    }

    fn any_running(&self) -> bool {
        self.states.values().any(RacerState::is_running)
    }

    fn team_size(&self, key: &ClockKey) -> Option<usize> {
        match self.mode {
            RaceMode::Individual => None,
            RaceMode::Relay => Some(
                key.racer_id()
                    .and_then(|id| self.rosters.get(id))
                    .map_or(1, TeamRoster::team_size),
            ),
        }
    }

    fn anchor_epoch(&mut self, sample: ClockSample, elapsed_ms: u64) {
        if self.epoch_ms.is_none() {
            self.epoch_ms = Some(sample.wall_ms.saturating_sub(elapsed_ms));
        }
    }

    // -------------------------------------------------------------------------
    // Global commands
    // -------------------------------------------------------------------------

    /// Start every tracked clock that is not already running.
    pub fn start_all(&mut self, sample: ClockSample) {
        let keys = self.tracked.keys();
        let mut epoch_elapsed = 0;
        for key in &keys {
            epoch_elapsed = epoch_elapsed.max(self.ensure_state(key).elapsed_ms);
        }
        self.anchor_epoch(sample, epoch_elapsed);

        let mut started = 0;
        for key in &keys {
            if self.ensure_state(key).start(sample.now_ms) {
                started += 1;
            }
        }
        self.ticker.schedule();
        info!("Race started: {} of {} clocks started", started, keys.len());
    }

    /// Pause every running clock and halt the frame loop.
    pub fn stop_all(&mut self, sample: ClockSample) {
        let mut stopped = 0;
        for state in self.states.values_mut() {
            if state.pause(sample.now_ms) {
                stopped += 1;
            }
        }
        self.ticker.cancel();
        info!("Race stopped: {} clocks paused", stopped);
    }

    /// Full race reset: halts the loop, clears the epoch and every passage
    /// log, and brings every tracked clock back to idle zero.
    pub fn reset_all(&mut self) {
        self.ticker.cancel();
        self.epoch_ms = None;
        self.states = self
            .tracked
            .keys()
            .into_iter()
            .map(|key| (key, RacerState::default()))
            .collect();
        self.passages.clear();
        info!("Race reset");
    }

    // -------------------------------------------------------------------------
    // Per-racer commands
    // -------------------------------------------------------------------------

    /// Start one clock. Returns `false` if it was already running.
    pub fn start_racer(&mut self, key: &ClockKey, sample: ClockSample) -> bool {
        let elapsed = self.ensure_state(key).elapsed_ms;
        if self.states[key].is_running() {
            debug!("start ignored: {:?} is already running", key);
            return false;
        }
        self.anchor_epoch(sample, elapsed);
        self.ensure_state(key).start(sample.now_ms);
        self.ticker.schedule();
        true
    }

    /// Record a final passage at the current time, then pause the clock.
    ///
    /// Returns the final passage, or `None` if the clock was not running.
    /// The frame loop halts once no clock remains running.
    pub fn stop_racer(&mut self, key: &ClockKey, sample: ClockSample) -> Option<Passage> {
        let passage = self.record_passage(key, sample)?;
        self.ensure_state(key).pause(sample.now_ms);
        if !self.any_running() {
            self.ticker.cancel();
        }
        Some(passage)
    }

    /// Append a passage for a running clock. Silently ignored otherwise.
    pub fn record_passage(&mut self, key: &ClockKey, sample: ClockSample) -> Option<Passage> {
        let state = self.ensure_state(key);
        if !state.is_running() {
            debug!("passage ignored: {:?} is not running", key);
            return None;
        }
        state.refresh(sample.now_ms);
        let total_ms = state.elapsed_ms;
        let team_size = self.team_size(key);
        Some(self.passages.record(key, total_ms, team_size))
    }

    // -------------------------------------------------------------------------
    // Frame loop
    // -------------------------------------------------------------------------

    /// One frame of the shared loop: refresh every running clock from the
    /// same `now_ms`. Deschedules itself once nothing runs.
    ///
    /// Returns whether the loop is still scheduled afterwards.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if !self.ticker.is_active() {
            return false;
        }
        let mut any_running = false;
        for state in self.states.values_mut() {
            if state.is_running() {
                state.refresh(now_ms);
                any_running = true;
            }
        }
        self.ticker.mark_frame();
        if !any_running {
            self.ticker.cancel();
        }
        any_running
    }

    /// Deschedule the frame loop without touching any clock.
    pub fn teardown(&mut self) {
        self.ticker.cancel();
    }

    // -------------------------------------------------------------------------
    // Read side
    // -------------------------------------------------------------------------

    /// Global timer display: the largest elapsed time of any clock.
    pub fn elapsed_ms(&self) -> u64 {
        aggregate_elapsed(self.states.values())
    }

    /// Running > Paused > Idle across every clock.
    pub fn status(&self) -> RacerStatus {
        aggregate_status(self.states.values())
    }

    pub fn state(&self, key: &ClockKey) -> Option<&RacerState> {
        self.states.get(key)
    }

    pub fn states(&self) -> &BTreeMap<ClockKey, RacerState> {
        &self.states
    }

    pub fn passages(&self) -> &PassageLog {
        &self.passages
    }

    pub fn epoch_ms(&self) -> Option<u64> {
        self.epoch_ms
    }

    pub fn racers(&self) -> &[Racer] {
        &self.racers
    }

    pub fn tracked(&self) -> &TrackedSet {
        &self.tracked
    }

    pub fn rosters(&self) -> &BTreeMap<RacerId, TeamRoster> {
        &self.rosters
    }

    pub fn mode(&self) -> RaceMode {
        self.mode
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_active()
    }

    pub fn ticker(&self) -> &FrameTask {
        &self.ticker
    }

    /// Read-only copy of everything the rendering layer shows.
    pub fn snapshot(&self) -> ChronoSnapshot {
        ChronoSnapshot {
            elapsed_ms: self.elapsed_ms(),
            status: self.status(),
            states: self.states.clone(),
            passages: self.passages.clone(),
            best_laps: self
                .passages
                .keys()
                .filter_map(|key| Some((key.clone(), self.passages.best_lap_ms(key)?)))
                .collect(),
            epoch_ms: self.epoch_ms,
        }
    }
}

/// Point-in-time copy of the clock engine for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ChronoSnapshot {
    pub elapsed_ms: u64,
    pub status: RacerStatus,
    pub states: BTreeMap<ClockKey, RacerState>,
    pub passages: PassageLog,
    /// Fastest lap per clock that has at least one passage.
    pub best_laps: BTreeMap<ClockKey, u64>,
    pub epoch_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::racer::RelayStudent;

    fn at(now_ms: u64) -> ClockSample {
        ClockSample::new(now_ms, 1_700_000_000_000 + now_ms)
    }

    fn racer(id: &str) -> Racer {
        Racer::with_id(RacerId::new(id), id, "#3b82f6")
    }

    fn two_racers() -> Chronometer {
        let mut chrono = Chronometer::default();
        chrono.set_racers(vec![racer("a"), racer("b")]);
        chrono
    }

    #[test]
    fn test_starts_idle_with_solo_clock() {
        let chrono = Chronometer::default();
        assert_eq!(chrono.status(), RacerStatus::Idle);
        assert_eq!(chrono.elapsed_ms(), 0);
        assert!(chrono.state(&ClockKey::Solo).is_some());
        assert!(!chrono.is_ticking());
        assert_eq!(chrono.epoch_ms(), None);
    }

    #[test]
    fn test_solo_end_to_end() {
        let mut chrono = Chronometer::default();
        chrono.start_all(at(1_000));
        assert_eq!(chrono.status(), RacerStatus::Running);
        assert_eq!(chrono.epoch_ms(), Some(1_700_000_001_000));

        chrono.tick(6_000);
        let p = chrono.record_passage(&ClockKey::Solo, at(6_000)).unwrap();
        assert_eq!(p.lap_ms, 5_000);
        assert_eq!(p.total_ms, 5_000);

        chrono.stop_all(at(7_000));
        assert_eq!(chrono.status(), RacerStatus::Paused);
        assert_eq!(chrono.elapsed_ms(), 6_000);
        assert!(!chrono.is_ticking());
        chrono.tick(20_000);
        assert_eq!(chrono.elapsed_ms(), 6_000, "frozen while paused");

        chrono.reset_all();
        assert_eq!(chrono.status(), RacerStatus::Idle);
        assert_eq!(chrono.elapsed_ms(), 0);
        assert!(chrono.passages().is_empty());
        assert_eq!(chrono.epoch_ms(), None);
    }

    #[test]
    fn test_resume_is_continuous() {
        let mut chrono = Chronometer::default();
        chrono.start_all(at(0));
        chrono.tick(2_500);
        chrono.stop_all(at(3_000));
        let before = chrono.elapsed_ms();
        chrono.start_all(at(60_000));
        chrono.tick(60_000);
        assert_eq!(chrono.elapsed_ms(), before);
        chrono.tick(61_000);
        assert_eq!(chrono.elapsed_ms(), before + 1_000);
    }

    #[test]
    fn test_start_all_skips_running_clocks() {
        let mut chrono = two_racers();
        let a = ClockKey::racer("a");
        chrono.start_racer(&a, at(0));
        chrono.start_all(at(4_000));
        chrono.tick(5_000);
        assert_eq!(chrono.state(&a).unwrap().elapsed_ms, 5_000);
        assert_eq!(chrono.state(&ClockKey::racer("b")).unwrap().elapsed_ms, 1_000);
    }

    #[test]
    fn test_start_all_is_idempotent_on_the_loop() {
        let mut chrono = Chronometer::default();
        chrono.start_all(at(0));
        let token = chrono.ticker().token();
        chrono.start_all(at(10));
        assert_eq!(chrono.ticker().token(), token);
        assert_eq!(chrono.ticker().runs(), 1);
    }

    #[test]
    fn test_record_requires_running() {
        let mut chrono = Chronometer::default();
        assert!(chrono.record_passage(&ClockKey::Solo, at(100)).is_none());
        chrono.start_all(at(0));
        chrono.stop_all(at(100));
        assert!(chrono.record_passage(&ClockKey::Solo, at(200)).is_none());
        assert_eq!(chrono.passages().count(&ClockKey::Solo), 0);
    }

    #[test]
    fn test_per_racer_start_stop_is_scoped() {
        let mut chrono = two_racers();
        let a = ClockKey::racer("a");
        let b = ClockKey::racer("b");
        chrono.start_all(at(0));
        let final_a = chrono.stop_racer(&a, at(3_000)).unwrap();
        assert_eq!(final_a.total_ms, 3_000);
        assert_eq!(chrono.state(&a).unwrap().status, RacerStatus::Paused);
        assert_eq!(chrono.state(&b).unwrap().status, RacerStatus::Running);
        assert!(chrono.is_ticking(), "b still runs");

        chrono.stop_racer(&b, at(4_000));
        assert!(!chrono.is_ticking(), "last running clock halts the loop");
        assert_eq!(chrono.status(), RacerStatus::Paused);
        assert_eq!(chrono.elapsed_ms(), 4_000);
    }

    #[test]
    fn test_stop_racer_when_not_running_records_nothing() {
        let mut chrono = two_racers();
        let a = ClockKey::racer("a");
        assert!(chrono.stop_racer(&a, at(1_000)).is_none());
        assert_eq!(chrono.passages().count(&a), 0);
        assert_eq!(chrono.state(&a).unwrap().status, RacerStatus::Idle);
    }

    #[test]
    fn test_start_racer_sets_epoch_once() {
        let mut chrono = two_racers();
        chrono.start_racer(&ClockKey::racer("a"), at(500));
        let epoch = chrono.epoch_ms();
        chrono.start_racer(&ClockKey::racer("b"), at(9_000));
        assert_eq!(chrono.epoch_ms(), epoch);
        assert!(!chrono.start_racer(&ClockKey::racer("b"), at(9_500)));
    }

    #[test]
    fn test_unknown_key_is_created_lazily() {
        let mut chrono = two_racers();
        let ghost = ClockKey::racer("ghost");
        assert!(chrono.start_racer(&ghost, at(0)));
        assert_eq!(chrono.state(&ghost).unwrap().status, RacerStatus::Running);
        // Reconciliation drops it again.
        chrono.set_racers(vec![racer("a"), racer("b")]);
        assert!(chrono.state(&ghost).is_none());
        assert!(!chrono.is_ticking());
    }

    #[test]
    fn test_tick_self_terminates() {
        let mut chrono = Chronometer::default();
        chrono.start_all(at(0));
        assert!(chrono.tick(16));
        // Pause behind the loop's back; the next frame deschedules it.
        chrono
            .states
            .get_mut(&ClockKey::Solo)
            .unwrap()
            .pause(32);
        assert!(!chrono.tick(48));
        assert!(!chrono.is_ticking());
    }

    #[test]
    fn test_lockstep_ticks() {
        let mut chrono = two_racers();
        chrono.start_all(at(1_000));
        chrono.tick(4_321);
        let a = chrono.state(&ClockKey::racer("a")).unwrap().elapsed_ms;
        let b = chrono.state(&ClockKey::racer("b")).unwrap().elapsed_ms;
        assert_eq!(a, b);
        assert_eq!(a, 3_321);
    }

    #[test]
    fn test_reset_clears_all_logs() {
        let mut chrono = two_racers();
        chrono.start_all(at(0));
        chrono.record_passage(&ClockKey::racer("a"), at(1_000));
        chrono.record_passage(&ClockKey::racer("b"), at(1_200));
        chrono.reset_all();
        assert!(chrono.passages().is_empty());
        assert!(chrono
            .states()
            .values()
            .all(|s| *s == RacerState::default()));
        assert_eq!(chrono.states().len(), 2);
    }

    #[test]
    fn test_relay_rotation() {
        let mut chrono = Chronometer::new(RaceMode::Relay);
        chrono.set_racers(vec![racer("g1")]);
        chrono.set_roster(
            RacerId::new("g1"),
            TeamRoster::new(vec![
                RelayStudent::new("Alice", 0),
                RelayStudent::new("Bob", 1),
                RelayStudent::new("Claire", 2),
            ]),
        );
        let g1 = ClockKey::racer("g1");
        chrono.start_all(at(0));
        let indices: Vec<_> = (1..=5)
            .map(|i| {
                chrono
                    .record_passage(&g1, at(i * 15_000))
                    .unwrap()
                    .student_index
                    .unwrap()
            })
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_relay_without_roster_uses_team_of_one() {
        let mut chrono = Chronometer::new(RaceMode::Relay);
        chrono.start_all(at(0));
        chrono.record_passage(&ClockKey::Solo, at(1_000));
        let p = chrono.record_passage(&ClockKey::Solo, at(2_000)).unwrap();
        assert_eq!(p.student_index, Some(0));
    }

    #[test]
    fn test_rosters_follow_racer_removal() {
        let mut chrono = Chronometer::new(RaceMode::Relay);
        chrono.set_racers(vec![racer("g1"), racer("g2")]);
        chrono.set_roster(RacerId::new("g2"), TeamRoster::default());
        chrono.set_racers(vec![racer("g1")]);
        assert!(chrono.rosters().is_empty());
    }

    #[test]
    fn test_snapshot_matches_live_values() {
        let mut chrono = Chronometer::default();
        chrono.start_all(at(0));
        chrono.tick(1_000);
        let snap = chrono.snapshot();
        assert_eq!(snap.elapsed_ms, 1_000);
        assert_eq!(snap.status, RacerStatus::Running);
        assert_eq!(snap.epoch_ms, chrono.epoch_ms());
        assert!(snap.best_laps.is_empty());
    }

    #[test]
    fn test_snapshot_reports_best_lap() {
        let mut chrono = Chronometer::default();
        chrono.start_all(at(0));
        for t in [30_000, 52_000, 80_000] {
            chrono.record_passage(&ClockKey::Solo, at(t));
        }
        let snap = chrono.snapshot();
        assert_eq!(snap.best_laps.get(&ClockKey::Solo), Some(&22_000));
        assert_eq!(snap.best_laps.len(), 1);
    }

    #[test]
    fn test_teardown_deschedules() {
        let mut chrono = Chronometer::default();
        chrono.start_all(at(0));
        chrono.teardown();
        assert!(!chrono.is_ticking());
        assert!(!chrono.tick(500));
    }
}
