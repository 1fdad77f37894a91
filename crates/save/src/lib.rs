//! Race persistence: the durable race schema, its file codec, the
//! `RaceStore` contract with in-memory and on-disk implementations, and the
//! Bevy bridge that runs store operations off the frame loop.

mod atomic_write;
pub mod file_header;
pub mod file_store;
pub mod memory_store;
pub mod race_codec;
pub mod race_record;
pub mod store;
pub mod store_error;
pub mod store_plugin;


pub use file_store::{FileRaceStore, StoreConfig};
pub use memory_store::MemoryRaceStore;
pub use race_record::{LoadedRace, RaceDraft, RaceId, RaceSummary, StoredRace};
pub use store::RaceStore;
pub use store_error::StoreError;
pub use store_plugin::{
    ActiveRaceStore, DeleteRaceEvent, ListRacesEvent, LoadRaceEvent, RaceLibrary,
    RaceStoreOutcome, SavePlugin, SaveRaceEvent, StoreOp,
};
