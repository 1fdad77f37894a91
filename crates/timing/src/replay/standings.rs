//! Race standings at the replay cursor, recomputed whenever the cursor or
//! the loaded race changes.

use bevy::prelude::*;

use super::position::{current_runner_index_at_time, position_at_time};
use super::race::ReplayRace;
use super::transport::ReplayTransport;
use crate::clock::ClockKey;
use crate::racer::RaceMode;

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub key: ClockKey,
    /// Laps completed, possibly fractional.
    pub position: f64,
    pub has_started: bool,
    /// Relay mode only: roster index of the student running now.
    pub runner_index: Option<usize>,
    /// Name of that student, when the group has a roster.
    pub runner_name: Option<String>,
    /// 1-based; ties keep racer order.
    pub rank: usize,
}

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct ReplayStandings {
    pub at_ms: f64,
    /// Cursor as a fraction of the race, 0 to 1.
    pub progress: f64,
    /// Sorted by rank.
    pub entries: Vec<Standing>,
}

impl ReplayStandings {
    pub fn compute(race: &ReplayRace, current_ms: f64) -> Self {
        let mut entries: Vec<Standing> = race
            .keys()
            .into_iter()
            .map(|key| {
                let passages = race.passages.passages(&key);
                let pos = position_at_time(passages, current_ms);
                let runner_index = (race.mode == RaceMode::Relay).then(|| {
                    current_runner_index_at_time(passages, current_ms, race.team_size(&key))
                });
                let runner_name = runner_index
                    .and_then(|i| race.runner(&key, i))
                    .map(|student| student.name.clone());
                Standing {
                    key,
                    position: pos.position,
                    has_started: pos.has_started,
                    runner_index,
                    runner_name,
                    rank: 0,
                }
            })
            .collect();

        // Stable sort keeps racer order among equal positions.
        entries.sort_by(|a, b| b.position.total_cmp(&a.position));
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }

        let max = race.max_total_ms();
        let progress = if max == 0 {
            0.0
        } else {
            (current_ms / max as f64).clamp(0.0, 1.0)
        };
        Self {
            at_ms: current_ms,
            progress,
            entries,
        }
    }

    /// Standings at the transport's cursor.
    pub fn at_cursor(race: &ReplayRace, transport: &ReplayTransport) -> Self {
        Self {
            progress: transport.progress(),
            ..Self::compute(race, transport.current_ms())
        }
    }

    pub fn get(&self, key: &ClockKey) -> Option<&Standing> {
        self.entries.iter().find(|s| &s.key == key)
    }

    pub fn leader(&self) -> Option<&Standing> {
        self.entries.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passages::PassageLog;
    use crate::racer::{Racer, RacerId, RelayStudent, TeamRoster};

    fn key(id: &str) -> ClockKey {
        ClockKey::Racer(RacerId::new(id))
    }

    fn race(mode: RaceMode) -> ReplayRace {
        let racers = ["a", "b", "c"]
            .iter()
            .map(|id| Racer::with_id(RacerId::new(*id), *id, "#22c55e"))
            .collect();
        let passages = PassageLog::rebuild_from_totals([
            (key("a"), 1, 30_000, Some(0)),
            (key("a"), 2, 60_000, Some(1)),
            (key("b"), 1, 20_000, Some(0)),
            (key("b"), 2, 50_000, Some(1)),
        ]);
        ReplayRace {
            name: "Heat".into(),
            racers,
            passages,
            rosters: Default::default(),
            mode,
        }
    }

    #[test]
    fn test_ranks_by_position() {
        let standings = ReplayStandings::compute(&race(RaceMode::Individual), 40_000.0);
        let order: Vec<_> = standings.entries.iter().map(|s| s.key.clone()).collect();
        assert_eq!(order, vec![key("b"), key("a"), key("c")]);
        assert_eq!(standings.get(&key("b")).map(|s| s.rank), Some(1));
        let c = standings.get(&key("c")).cloned();
        assert_eq!(c.map(|s| (s.has_started, s.rank)), Some((false, 3)));
    }

    #[test]
    fn test_ties_keep_racer_order() {
        let standings = ReplayStandings::compute(&race(RaceMode::Individual), 0.0);
        let order: Vec<_> = standings.entries.iter().map(|s| s.key.clone()).collect();
        assert_eq!(order, vec![key("a"), key("b"), key("c")]);
        assert!(standings.entries.iter().all(|s| s.position == 0.0));
    }

    #[test]
    fn test_relay_runner_index() {
        let mut race = race(RaceMode::Relay);
        race.rosters.insert(
            RacerId::new("a"),
            TeamRoster::new(vec![RelayStudent::new("Ada", 0), RelayStudent::new("Bo", 1)]),
        );
        let standings = ReplayStandings::compute(&race, 35_000.0);
        let a = standings.get(&key("a")).cloned();
        assert_eq!(a.as_ref().and_then(|s| s.runner_index), Some(1));
        assert_eq!(a.and_then(|s| s.runner_name).as_deref(), Some("Bo"));
        // No roster: team of one, nobody to name.
        let b = standings.get(&key("b")).cloned();
        assert_eq!(b.as_ref().and_then(|s| s.runner_index), Some(0));
        assert_eq!(b.and_then(|s| s.runner_name), None);

        race.mode = RaceMode::Individual;
        let individual = ReplayStandings::compute(&race, 35_000.0);
        assert!(individual.entries.iter().all(|s| s.runner_index.is_none()));
    }

    #[test]
    fn test_solo_race_has_single_entry() {
        let solo = ReplayRace {
            passages: PassageLog::rebuild_from_totals([(ClockKey::Solo, 1, 10_000, None)]),
            ..Default::default()
        };
        let standings = ReplayStandings::compute(&solo, 5_000.0);
        assert_eq!(standings.entries.len(), 1);
        assert_eq!(standings.leader().map(|s| s.position), Some(0.5));
        assert_eq!(standings.progress, 0.5);
    }

    #[test]
    fn test_progress_follows_transport() {
        let race = race(RaceMode::Individual);
        let mut transport = ReplayTransport::new(race.max_total_ms());
        transport.seek(15_000.0);
        let standings = ReplayStandings::at_cursor(&race, &transport);
        assert_eq!(standings.at_ms, 15_000.0);
        assert_eq!(standings.progress, 0.25);
        assert_eq!(standings.progress, transport.progress());
    }
}
