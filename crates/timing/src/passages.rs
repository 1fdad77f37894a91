//! Passage recording: the append-only lap log of every tracked clock.

use std::collections::BTreeMap;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::clock::ClockKey;

/// One recorded lap/checkpoint event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Passage {
    /// 1-based lap index within the racer's log.
    pub tour_num: u32,
    /// Time since the previous passage (or since zero for the first one).
    pub lap_ms: u64,
    /// Cumulative elapsed time when the passage was recorded.
    pub total_ms: u64,
    /// Relay mode only: the roster index this passage credits.
    pub student_index: Option<u32>,
}

/// Passage logs keyed by clock. Each log is ordered by occurrence and its
/// `total_ms` values never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct PassageLog {
    logs: BTreeMap<ClockKey, Vec<Passage>>,
}

impl PassageLog {
    /// Append a passage for `key` at cumulative time `total_ms`.
    ///
    /// `team_size` is `Some` in relay mode; the student index then cycles
    /// `0, 1, .., team_size - 1, 0, ..` by passage count alone. A zero team
    /// size is treated as one.
    pub fn record(&mut self, key: &ClockKey, total_ms: u64, team_size: Option<usize>) -> Passage {
        let log = self.logs.entry(key.clone()).or_default();
        let passage_index = log.len();
        let last_total = log.last().map(|p| p.total_ms).unwrap_or(0);
        let passage = Passage {
            tour_num: passage_index as u32 + 1,
            lap_ms: total_ms.saturating_sub(last_total),
            total_ms,
            student_index: team_size.map(|size| (passage_index % size.max(1)) as u32),
        };
        log.push(passage);
        passage
    }

    pub fn passages(&self, key: &ClockKey) -> &[Passage] {
        self.logs.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, key: &ClockKey) -> usize {
        self.logs.get(key).map_or(0, Vec::len)
    }

    pub fn last(&self, key: &ClockKey) -> Option<&Passage> {
        self.logs.get(key).and_then(|log| log.last())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClockKey, &[Passage])> {
        self.logs.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ClockKey> {
        self.logs.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.values().all(Vec::is_empty)
    }

    /// Total number of passages across all clocks.
    pub fn len(&self) -> usize {
        self.logs.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.logs.clear();
    }

    /// Drop the log of one clock. Returns the number of passages discarded.
    pub fn purge(&mut self, key: &ClockKey) -> usize {
        self.logs.remove(key).map_or(0, |log| log.len())
    }

    /// Largest `total_ms` across every log; the length of a replay.
    pub fn max_total_ms(&self) -> u64 {
        self.logs
            .values()
            .flat_map(|log| log.iter().map(|p| p.total_ms))
            .max()
            .unwrap_or(0)
    }

    pub fn best_lap_ms(&self, key: &ClockKey) -> Option<u64> {
        self.passages(key).iter().map(|p| p.lap_ms).min()
    }

    /// Rebuild logs from absolute cumulative times.
    ///
    /// Entries are `(key, tour_num, total_ms, student_index)` in any order.
    /// Each log is sorted by `tour_num` and laps are re-derived from
    /// consecutive totals, so storage only needs to keep absolute times.
    pub fn rebuild_from_totals(
        entries: impl IntoIterator<Item = (ClockKey, u32, u64, Option<u32>)>,
    ) -> Self {
        let mut logs: BTreeMap<ClockKey, Vec<Passage>> = BTreeMap::new();
        for (key, tour_num, total_ms, student_index) in entries {
            logs.entry(key).or_default().push(Passage {
                tour_num,
                lap_ms: 0,
                total_ms,
                student_index,
            });
        }
        for log in logs.values_mut() {
            log.sort_by_key(|p| (p.tour_num, p.total_ms));
            let mut last_total = 0;
            for passage in log.iter_mut() {
                passage.lap_ms = passage.total_ms.saturating_sub(last_total);
                last_total = passage.total_ms;
            }
        }
        Self { logs }
    }
}
