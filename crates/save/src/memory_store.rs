//! In-process race store. Nothing survives the process; used for tests and
//! for shells without a writable disk.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::race_record::{sort_by_recency, LoadedRace, RaceDraft, RaceId, RaceSummary, StoredRace};
use crate::store::RaceStore;
use crate::store_error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryRaceStore {
    races: RwLock<BTreeMap<RaceId, StoredRace>>,
}

impl MemoryRaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.races.read().map_or(0, |races| races.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RaceStore for MemoryRaceStore {
    fn save(&self, draft: &RaceDraft) -> Result<RaceId, StoreError> {
        let id = RaceId::generate();
        let stored = StoredRace::from_draft(id.clone(), draft);
        self.races
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(id.clone(), stored);
        Ok(id)
    }

    fn load(&self, id: &RaceId) -> Result<Option<LoadedRace>, StoreError> {
        let races = self.races.read().map_err(|_| StoreError::Poisoned)?;
        Ok(races.get(id).map(StoredRace::to_loaded))
    }

    fn list(&self) -> Result<Vec<RaceSummary>, StoreError> {
        let races = self.races.read().map_err(|_| StoreError::Poisoned)?;
        let mut summaries: Vec<RaceSummary> = races.values().map(StoredRace::summary).collect();
        sort_by_recency(&mut summaries);
        Ok(summaries)
    }

    fn delete(&self, id: &RaceId) -> Result<(), StoreError> {
        self.races
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .remove(id);
        Ok(())
    }
}
