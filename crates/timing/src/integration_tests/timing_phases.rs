use crate::chrono_commands::ChronoCommand;
use crate::clock::{ClockKey, RacerStatus};
use crate::config::TimingConfig;
use crate::racer::RaceMode;
use crate::replay::{ReplayRace, ReplayStandings, ReplayTransport};
use crate::test_harness::TestRace;
use crate::Chronometer;

/// If the `TimingSet` chain were misconfigured Bevy would panic on the first
/// update, before any assertion runs.
#[test]
fn test_timing_plugin_boots_headless() {
    let mut race = TestRace::new();
    race.advance_frames(10, 160);

    race.assert_status(RacerStatus::Idle);
    race.assert_elapsed(0);
    assert!(!race.chrono().is_ticking());
    let _ = race.resource::<ReplayTransport>();
    let _ = race.resource::<ReplayRace>();
    let _ = race.resource::<ReplayStandings>();
}

#[test]
fn test_default_race_is_solo() {
    let race = TestRace::new();
    assert!(race.chrono().tracked().is_solo());
    assert_eq!(
        race.chrono().states().keys().cloned().collect::<Vec<_>>(),
        vec![ClockKey::Solo]
    );
}

#[test]
fn test_mode_follows_config() {
    let mut race = TestRace::new().with_mode(RaceMode::Relay);
    assert_eq!(race.chrono().mode(), RaceMode::Relay);

    race.world_mut().resource_mut::<TimingConfig>().mode = RaceMode::Individual;
    race.frame();
    assert_eq!(race.resource::<Chronometer>().mode(), RaceMode::Individual);
}

#[test]
fn test_commands_in_one_frame_share_the_sample() {
    let mut race = TestRace::new();
    race.send(ChronoCommand::StartAll);
    race.advance_ms(1_234);

    race.world_mut().send_event(ChronoCommand::RecordPassage(ClockKey::Solo));
    race.world_mut().send_event(ChronoCommand::RecordPassage(ClockKey::Solo));
    race.frame();

    let passages = race.passages(&ClockKey::Solo);
    assert_eq!(passages.len(), 2);
    assert_eq!(passages[0].total_ms, 1_234);
    assert_eq!(passages[1].total_ms, 1_234);
    assert_eq!(passages[1].lap_ms, 0);
}

#[test]
fn test_loop_runs_once_per_frame_until_stopped() {
    let mut race = TestRace::new();
    race.send(ChronoCommand::StartAll);
    // The start frame already ticks once.
    race.assert_tick_frames(1);
    race.advance_frames(4, 64);
    race.assert_tick_frames(5);

    race.send(ChronoCommand::StopAll);
    race.advance_frames(3, 48);
    race.assert_tick_frames(5);
    assert!(!race.chrono().is_ticking());

    race.send(ChronoCommand::StartAll);
    race.assert_tick_frames(1);
}

#[test]
fn test_exit_deschedules_both_loops() {
    use crate::replay::ReplayCommand;

    let mut race = TestRace::new();
    race.send(ChronoCommand::StartAll);
    race.advance_ms(1_000);
    race.send(ChronoCommand::RecordPassage(ClockKey::Solo));
    let recorded = ReplayRace::from_chronometer("Exit", race.chrono());
    race.replay(ReplayCommand::Load(recorded));
    race.replay(ReplayCommand::Play);
    assert!(race.chrono().is_ticking());
    assert!(race.transport().is_ticking());

    race.exit();
    assert!(!race.chrono().is_ticking());
    assert!(!race.transport().is_ticking());

    // The clock state itself is untouched; only the loop is gone.
    let elapsed = race.elapsed_of(&ClockKey::Solo);
    race.advance_ms(5_000);
    assert_eq!(race.elapsed_of(&ClockKey::Solo), elapsed);
}
