//! Time-to-position interpolation for replaying a recorded race.
//!
//! Positions are measured in laps completed. Every racer leaves the line at
//! t = 0, reaches position 1 at its first passage, and between two passages
//! moves linearly from one lap count to the next.

use crate::passages::Passage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayPosition {
    /// Laps completed, possibly fractional.
    pub position: f64,
    pub has_started: bool,
}

impl ReplayPosition {
    pub const NOT_STARTED: Self = Self {
        position: 0.0,
        has_started: false,
    };

    fn started(position: f64) -> Self {
        Self {
            position,
            has_started: true,
        }
    }
}

/// Interpolated position at `current_ms` for passages sorted by `tour_num`.
pub fn position_at_time(passages: &[Passage], current_ms: f64) -> ReplayPosition {
    let (Some(first), Some(last)) = (passages.first(), passages.last()) else {
        return ReplayPosition::NOT_STARTED;
    };
    if current_ms < 0.0 {
        return ReplayPosition::NOT_STARTED;
    }

    let first_total = first.total_ms as f64;
    if current_ms < first_total {
        let fraction = if first_total <= 0.0 {
            1.0
        } else {
            (current_ms / first_total).min(1.0)
        };
        return ReplayPosition::started(fraction);
    }

    if current_ms >= last.total_ms as f64 {
        return ReplayPosition::started(f64::from(last.tour_num));
    }

    for pair in passages.windows(2) {
        let (t1, t2) = (pair[0].total_ms as f64, pair[1].total_ms as f64);
        if t1 <= current_ms && current_ms <= t2 {
            let fraction = if t2 == t1 {
                1.0
            } else {
                (current_ms - t1) / (t2 - t1)
            };
            return ReplayPosition::started(f64::from(pair[0].tour_num) + fraction);
        }
    }

    // Only reachable when the input is not sorted.
    ReplayPosition::NOT_STARTED
}

/// Relay mode: roster index of the student running at `current_ms`.
///
/// The runner after a passage credited to student `s` is `(s + 1) % team_size`.
/// Before the first passage, and for empty input or an empty team, it is 0.
pub fn current_runner_index_at_time(
    passages: &[Passage],
    current_ms: f64,
    team_size: usize,
) -> usize {
    let Some(first) = passages.first() else {
        return 0;
    };
    if team_size < 1 || current_ms < first.total_ms as f64 {
        return 0;
    }
    passages
        .iter()
        .rev()
        .find(|p| p.total_ms as f64 <= current_ms)
        .map(|p| (p.student_index.unwrap_or(0) as usize + 1) % team_size)
        .unwrap_or(0)
}
