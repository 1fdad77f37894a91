//! # TestRace: headless integration test harness for the timing engines
//!
//! Wraps `bevy::app::App` + `TimingPlugin` with a hand-driven `FrameClock`,
//! so tests decide exactly how much time passes between frames.

use bevy::app::App;
use bevy::prelude::*;

use crate::chrono_commands::ChronoCommand;
use crate::chronometer::Chronometer;
use crate::clock::{ClockKey, RacerStatus};
use crate::config::TimingConfig;
use crate::frame_clock::{FrameClock, ManualFrameClock};
use crate::passages::Passage;
use crate::racer::{RaceMode, Racer, TeamRoster};
use crate::replay::{ReplayCommand, ReplayStandings, ReplayTransport};
use crate::TimingPlugin;

/// Wall-clock value of the harness's first frame (2023-11-14T22:13:20Z).
pub const TEST_WALL_EPOCH_MS: u64 = 1_700_000_000_000;

pub struct TestRace {
    app: App,
}

impl Default for TestRace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRace {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// A solo race in individual mode, time at zero.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);

        // Insert the marker BEFORE TimingPlugin so the Time<Real> sync is skipped.
        app.insert_resource(ManualFrameClock);
        app.add_plugins(TimingPlugin);
        app.world_mut()
            .resource_mut::<FrameClock>()
            .set(0, TEST_WALL_EPOCH_MS);

        app.update();
        Self { app }
    }

    /// Supply the racer list.
    pub fn with_racers(mut self, racers: Vec<Racer>) -> Self {
        self.send(ChronoCommand::SetRacers(racers));
        self
    }

    pub fn with_mode(mut self, mode: RaceMode) -> Self {
        self.app.world_mut().resource_mut::<TimingConfig>().mode = mode;
        self.frame();
        self
    }

    pub fn with_roster(mut self, racer: &Racer, roster: TeamRoster) -> Self {
        self.send(ChronoCommand::SetRoster(racer.id.clone(), roster));
        self
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Run one frame without moving time.
    pub fn frame(&mut self) {
        self.app.update();
    }

    /// Move the frame clock forward by `ms`, then run one frame.
    pub fn advance_ms(&mut self, ms: u64) {
        self.app.world_mut().resource_mut::<FrameClock>().advance(ms);
        self.app.update();
    }

    /// Advance in `frames` equal steps totalling `ms`.
    pub fn advance_frames(&mut self, frames: u64, ms: u64) {
        let step = ms / frames.max(1);
        for _ in 0..frames {
            self.advance_ms(step);
        }
    }

    /// Queue a clock command and run one frame to apply it.
    pub fn send(&mut self, command: ChronoCommand) {
        self.app.world_mut().send_event(command);
        self.app.update();
    }

    /// Queue a replay command and run one frame to apply it.
    pub fn replay(&mut self, command: ReplayCommand) {
        self.app.world_mut().send_event(command);
        self.app.update();
    }

    /// Simulate the app shutting down.
    pub fn exit(&mut self) {
        self.app.world_mut().send_event(AppExit::Success);
        self.app.update();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn chrono(&self) -> &Chronometer {
        self.resource::<Chronometer>()
    }

    pub fn transport(&self) -> &ReplayTransport {
        self.resource::<ReplayTransport>()
    }

    pub fn standings(&self) -> &ReplayStandings {
        self.resource::<ReplayStandings>()
    }

    pub fn passages(&self, key: &ClockKey) -> &[Passage] {
        self.chrono().passages().passages(key)
    }

    pub fn elapsed_of(&self, key: &ClockKey) -> u64 {
        self.chrono().state(key).map_or(0, |s| s.elapsed_ms)
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_status(&self, expected: RacerStatus) {
        let actual = self.chrono().status();
        assert_eq!(actual, expected, "aggregate status: expected {expected:?}, got {actual:?}");
    }

    pub fn assert_elapsed(&self, expected: u64) {
        let actual = self.chrono().elapsed_ms();
        assert_eq!(actual, expected, "aggregate elapsed: expected {expected}, got {actual}");
    }

    /// Frames the clock engine's loop ran since it was last scheduled.
    pub fn assert_tick_frames(&self, expected: u64) {
        let actual = self.chrono().ticker().frames();
        assert_eq!(actual, expected, "chronometer loop frames: expected {expected}, got {actual}");
    }

    pub fn assert_passage_count(&self, key: &ClockKey, expected: usize) {
        let actual = self.passages(key).len();
        assert_eq!(actual, expected, "passages for {key:?}: expected {expected}, got {actual}");
    }
}
