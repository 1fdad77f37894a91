use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::racer::RaceMode;

/// Display name given to the implicit solo racer when a race is persisted.
pub const SOLO_DISPLAY_NAME: &str = "Race";
/// Colour given to the implicit solo racer when a race is persisted.
pub const SOLO_COLOR: &str = "#64748b";
/// Colour used when a stored racer carries no colour.
pub const FALLBACK_COLOR: &str = "#94a3b8";

/// Racer colour palette, reused cyclically beyond six racers.
pub const COLOR_PALETTE: [&str; 6] = [
    "#ef4444", "#3b82f6", "#eab308", "#f97316", "#8b5cf6", "#22c55e",
];
/// Human names for `COLOR_PALETTE`, index for index.
pub const COLOR_NAMES: [&str; 6] = ["Red", "Blue", "Yellow", "Orange", "Violet", "Green"];
/// Name returned for colours outside the palette.
pub const UNKNOWN_COLOR_NAME: &str = "Colour";

/// A race tracks "a few dozen" racers at most. Beyond this the engine keeps
/// working but logs a warning on every reconciliation.
pub const MAX_TRACKED_RACERS: usize = 64;

/// Replay playback speed bounds (multiples of real time).
pub const MIN_REPLAY_SPEED: f64 = 0.25;
pub const MAX_REPLAY_SPEED: f64 = 32.0;
pub const DEFAULT_REPLAY_SPEED: f64 = 1.0;

/// Runtime settings shared by the clock engine and the replay engine.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Individual racers or relay groups with rotating students.
    pub mode: RaceMode,
    /// Speed multiplier applied to replay playback when it is (re)configured.
    pub replay_speed: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            mode: RaceMode::Individual,
            replay_speed: DEFAULT_REPLAY_SPEED,
        }
    }
}

/// Clamp a requested replay speed into the supported range.
///
/// Returns `None` for NaN, infinite, zero or negative requests.
pub fn clamp_replay_speed(speed: f64) -> Option<f64> {
    if !speed.is_finite() || speed <= 0.0 {
        return None;
    }
    Some(speed.clamp(MIN_REPLAY_SPEED, MAX_REPLAY_SPEED))
}
