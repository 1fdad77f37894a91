//! Bevy plugin that registers the replay resources and systems.

use bevy::prelude::*;

use super::race::ReplayRace;
use super::standings::ReplayStandings;
use super::transport::ReplayTransport;
use crate::config::TimingConfig;
use crate::frame_clock::FrameClock;
use crate::timing_sets::TimingSet;

/// Transport commands from the rendering layer.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum ReplayCommand {
    Play,
    Pause,
    Toggle,
    Seek(f64),
    Reset,
    SetSpeed(f64),
    /// Load a race for replay. The cursor is rewound.
    Load(ReplayRace),
}

pub fn apply_replay_commands(
    mut commands: EventReader<ReplayCommand>,
    mut transport: ResMut<ReplayTransport>,
    mut race: ResMut<ReplayRace>,
) {
    for command in commands.read() {
        match command {
            ReplayCommand::Play => transport.play(),
            ReplayCommand::Pause => transport.pause(),
            ReplayCommand::Toggle => transport.toggle(),
            ReplayCommand::Seek(ms) => transport.seek(*ms),
            ReplayCommand::Reset => transport.reset(),
            ReplayCommand::SetSpeed(speed) => {
                transport.set_speed(*speed);
            }
            ReplayCommand::Load(loaded) => {
                info!(
                    "Replay loaded: {:?}, {} racers, {} ms",
                    loaded.name,
                    loaded.racers.len(),
                    loaded.max_total_ms()
                );
                *race = loaded.clone();
                transport.reset();
            }
        }
    }
}

/// Keeps the transport's end in step with the loaded race. Runs after
/// commands so a `Load` in the same frame is seen.
pub fn sync_replay_bounds(race: Res<ReplayRace>, mut transport: ResMut<ReplayTransport>) {
    if race.is_changed() {
        let max = race.max_total_ms();
        if transport.max_total_ms() != max {
            transport.set_max_total_ms(max);
        }
    }
}

/// Applies `TimingConfig::replay_speed` when that field moves. Edits to the
/// rest of the config leave a speed chosen with `SetSpeed` alone.
pub fn sync_replay_speed(
    config: Res<TimingConfig>,
    mut applied: Local<Option<f64>>,
    mut transport: ResMut<ReplayTransport>,
) {
    if !config.is_changed() || *applied == Some(config.replay_speed) {
        return;
    }
    *applied = Some(config.replay_speed);
    if transport.speed() != config.replay_speed {
        transport.set_speed(config.replay_speed);
    }
}

/// Run condition: the replay frame loop is scheduled.
pub fn replay_playing(transport: Res<ReplayTransport>) -> bool {
    transport.is_ticking()
}

pub fn tick_replay(clock: Res<FrameClock>, mut transport: ResMut<ReplayTransport>) {
    transport.tick(clock.now_ms());
}

pub fn update_standings(
    race: Res<ReplayRace>,
    transport: Res<ReplayTransport>,
    mut standings: ResMut<ReplayStandings>,
) {
    if race.is_changed() || transport.is_changed() {
        *standings = ReplayStandings::at_cursor(&race, &transport);
    }
}

/// Plugin providing replay playback, independent of the chronometer.
///
/// Systems run in `TimingSet::Replay` in this order:
/// `sync_replay_speed` → `apply_replay_commands` → `sync_replay_bounds` →
/// `tick_replay` (only while playing) → `update_standings`.
pub struct ReplayPlugin;

impl Plugin for ReplayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TimingConfig>()
            .init_resource::<ReplayRace>()
            .init_resource::<ReplayTransport>()
            .init_resource::<ReplayStandings>()
            .add_event::<ReplayCommand>()
            .add_systems(
                Update,
                (
                    sync_replay_speed,
                    apply_replay_commands,
                    sync_replay_bounds,
                    tick_replay.run_if(replay_playing),
                    update_standings,
                )
                    .chain()
                    .in_set(TimingSet::Replay),
            );
    }
}
