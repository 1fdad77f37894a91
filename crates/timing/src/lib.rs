use bevy::prelude::*;

pub mod chrono_commands;
pub mod chronometer;
pub mod clock;
pub mod config;
pub mod frame_clock;
pub mod frame_task;
pub mod lifecycle;
pub mod passages;
pub mod racer;
pub mod replay;
pub mod timing_sets;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub mod test_harness;

pub use chrono_commands::{ChronoCommand, ChronometerPlugin, PassageRecorded};
pub use chronometer::{ChronoSnapshot, Chronometer};
pub use clock::{ClockKey, ClockSample, RacerState, RacerStatus};
pub use config::TimingConfig;
pub use frame_clock::{FrameClock, FrameClockPlugin, ManualFrameClock};
pub use frame_task::{FrameTask, TaskToken};
pub use lifecycle::{ReconcileReport, TrackedSet};
pub use passages::{Passage, PassageLog};
pub use racer::{RaceMode, Racer, RacerError, RacerId, RelayStudent, TeamRoster};
pub use replay::{ReplayCommand, ReplayPlugin, ReplayRace, ReplayStandings, ReplayTransport};
pub use timing_sets::TimingSet;

/// Deschedule both frame loops when the app is shutting down.
pub fn teardown_on_exit(
    mut exit: EventReader<AppExit>,
    mut chrono: ResMut<Chronometer>,
    mut transport: ResMut<ReplayTransport>,
) {
    if exit.read().next().is_some() {
        chrono.teardown();
        transport.teardown();
        info!("Timing loops torn down");
    }
}

pub struct TimingPlugin;

impl Plugin for TimingPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                TimingSet::Clock,
                TimingSet::Commands,
                TimingSet::Tick,
                TimingSet::Replay,
                TimingSet::Report,
            )
                .chain(),
        );

        app.add_plugins((FrameClockPlugin, ChronometerPlugin, ReplayPlugin));

        app.add_systems(Last, teardown_on_exit);
    }
}
