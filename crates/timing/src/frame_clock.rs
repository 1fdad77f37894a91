//! FrameClock – one monotonic + wall-clock sample per frame.

use bevy::prelude::*;

use crate::clock::ClockSample;
use crate::timing_sets::TimingSet;

/// The time sample every timing system reads during the current frame.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameClock {
    sample: ClockSample,
}

impl FrameClock {
    pub fn sample(&self) -> ClockSample {
        self.sample
    }

    pub fn now_ms(&self) -> u64 {
        self.sample.now_ms
    }

    /// Set the sample explicitly. Only meaningful with `ManualFrameClock`,
    /// otherwise the next frame overwrites it.
    pub fn set(&mut self, now_ms: u64, wall_ms: u64) {
        self.sample = ClockSample::new(now_ms, wall_ms);
    }

    /// Move both clocks forward by `ms`.
    pub fn advance(&mut self, ms: u64) {
        self.sample.now_ms += ms;
        self.sample.wall_ms += ms;
    }
}

/// Marker resource: `FrameClock` is driven by hand (tests, scripted playback)
/// and the automatic sync from `Time<Real>` is skipped.
#[derive(Resource, Default)]
pub struct ManualFrameClock;

/// Unix epoch milliseconds, or 0 if the system clock is before 1970.
pub fn wall_now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Samples `Time<Real>` (monotonic) and the system clock once per frame.
pub fn sync_frame_clock(time: Res<Time<Real>>, mut clock: ResMut<FrameClock>) {
    clock.sample = ClockSample::new(time.elapsed().as_millis() as u64, wall_now_ms());
}

pub struct FrameClockPlugin;

impl Plugin for FrameClockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameClock>().add_systems(
            Update,
            sync_frame_clock
                .run_if(not(resource_exists::<ManualFrameClock>))
                .in_set(TimingSet::Clock),
        );
    }
}
