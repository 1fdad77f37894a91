//! Replay of a recorded race: time-to-position interpolation, a play/pause/
//! seek transport with its own frame loop, and per-frame standings.

pub mod plugin;
pub mod position;
pub mod race;
pub mod standings;
pub mod transport;

pub use plugin::{ReplayCommand, ReplayPlugin};
pub use position::{current_runner_index_at_time, position_at_time, ReplayPosition};
pub use race::ReplayRace;
pub use standings::{ReplayStandings, Standing};
pub use transport::ReplayTransport;
