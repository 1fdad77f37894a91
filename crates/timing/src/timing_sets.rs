//! Per-frame ordering of the timing engines via `SystemSet` phases.
//!
//! ```text
//! Clock  →  Commands  →  Tick  →  Replay  →  Report
//! ```
//!
//! * **Clock** – Sample the monotonic and wall clocks once into `FrameClock`.
//!   Every later phase reads this single sample, so all racers advance in
//!   lockstep within a frame.
//! * **Commands** – Apply queued `ChronoCommand`s (start/stop/reset, per-racer
//!   start/stop, passages, racer list updates).
//! * **Tick** – The clock engine's frame loop; runs only while its
//!   `FrameTask` is scheduled.
//! * **Replay** – Replay transport commands, its own frame loop and the
//!   standings snapshot.
//! * **Report** – Storage bridges and anything else that only reads engine
//!   state after it settled for the frame.

use bevy::prelude::*;

/// Ordered phases for the timing systems in the `Update` schedule.
///
/// Configured as a chain by `TimingPlugin`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimingSet {
    Clock,
    Commands,
    Tick,
    Replay,
    Report,
}
