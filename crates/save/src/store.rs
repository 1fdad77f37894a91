//! The storage contract the engine saves completed races through.

use crate::race_record::{LoadedRace, RaceDraft, RaceId, RaceSummary};
use crate::store_error::StoreError;

/// A durable race store.
///
/// Calls may block on I/O; the Bevy side only ever invokes them from the IO
/// task pool, never from a frame system.
pub trait RaceStore: Send + Sync + 'static {
    /// Persist `draft` under a fresh id.
    fn save(&self, draft: &RaceDraft) -> Result<RaceId, StoreError>;

    /// `Ok(None)` when no race has this id.
    fn load(&self, id: &RaceId) -> Result<Option<LoadedRace>, StoreError>;

    /// All races, newest first.
    fn list(&self) -> Result<Vec<RaceSummary>, StoreError>;

    /// Deleting a missing race succeeds.
    fn delete(&self, id: &RaceId) -> Result<(), StoreError>;
}
