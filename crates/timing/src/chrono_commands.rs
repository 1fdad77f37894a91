//! Imperative commands from the rendering layer, delivered as Bevy events and
//! applied to the `Chronometer` once per frame.

use bevy::prelude::*;

use crate::chronometer::Chronometer;
use crate::clock::ClockKey;
use crate::config::TimingConfig;
use crate::frame_clock::FrameClock;
use crate::passages::Passage;
use crate::racer::{Racer, RacerId, TeamRoster};
use crate::timing_sets::TimingSet;

#[derive(Event, Debug, Clone, PartialEq)]
pub enum ChronoCommand {
    StartAll,
    StopAll,
    ResetAll,
    StartRacer(ClockKey),
    StopRacer(ClockKey),
    RecordPassage(ClockKey),
    /// The externally supplied racer list changed.
    SetRacers(Vec<Racer>),
    SetRoster(RacerId, TeamRoster),
}

/// Emitted for every passage appended, including the implicit final passage
/// of `StopRacer`.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PassageRecorded {
    pub key: ClockKey,
    pub passage: Passage,
}

/// Applies queued commands in arrival order, all at the frame's time sample.
pub fn apply_chrono_commands(
    mut commands: EventReader<ChronoCommand>,
    clock: Res<FrameClock>,
    mut chrono: ResMut<Chronometer>,
    mut recorded: EventWriter<PassageRecorded>,
) {
    let sample = clock.sample();
    for command in commands.read() {
        match command {
            ChronoCommand::StartAll => chrono.start_all(sample),
            ChronoCommand::StopAll => chrono.stop_all(sample),
            ChronoCommand::ResetAll => chrono.reset_all(),
            ChronoCommand::StartRacer(key) => {
                chrono.start_racer(key, sample);
            }
            ChronoCommand::StopRacer(key) => {
                if let Some(passage) = chrono.stop_racer(key, sample) {
                    recorded.send(PassageRecorded {
                        key: key.clone(),
                        passage,
                    });
                }
            }
            ChronoCommand::RecordPassage(key) => {
                if let Some(passage) = chrono.record_passage(key, sample) {
                    recorded.send(PassageRecorded {
                        key: key.clone(),
                        passage,
                    });
                }
            }
            ChronoCommand::SetRacers(racers) => {
                chrono.set_racers(racers.clone());
            }
            ChronoCommand::SetRoster(id, roster) => chrono.set_roster(id.clone(), roster.clone()),
        }
    }
}

/// Run condition: the clock engine's frame loop is scheduled.
pub fn chronometer_ticking(chrono: Res<Chronometer>) -> bool {
    chrono.is_ticking()
}

/// The shared frame loop. Gated on `chronometer_ticking`, so it stops being
/// called as soon as the last running clock pauses.
pub fn tick_chronometer(clock: Res<FrameClock>, mut chrono: ResMut<Chronometer>) {
    chrono.tick(clock.now_ms());
}

/// Keeps the engine's race mode in step with `TimingConfig`.
pub fn sync_race_mode(config: Res<TimingConfig>, mut chrono: ResMut<Chronometer>) {
    if config.is_changed() && chrono.mode() != config.mode {
        info!("Race mode set to {:?}", config.mode);
        chrono.set_mode(config.mode);
    }
}

pub struct ChronometerPlugin;

impl Plugin for ChronometerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TimingConfig>()
            .init_resource::<Chronometer>()
            .add_event::<ChronoCommand>()
            .add_event::<PassageRecorded>()
            .add_systems(
                Update,
                (sync_race_mode, apply_chrono_commands)
                    .chain()
                    .in_set(TimingSet::Commands),
            )
            .add_systems(
                Update,
                tick_chronometer
                    .run_if(chronometer_ticking)
                    .in_set(TimingSet::Tick),
            );
    }
}
