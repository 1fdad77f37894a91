//! On-disk race store: one `{id}.race` file per race under a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bevy::prelude::*;

use crate::atomic_write::{atomic_write, remove_if_exists};
use crate::race_codec::{decode_race, encode_race};
use crate::race_record::{sort_by_recency, LoadedRace, RaceDraft, RaceId, RaceSummary, StoredRace};
use crate::store::RaceStore;
use crate::store_error::StoreError;

/// File extension for race files.
pub const RACE_EXTENSION: &str = "race";

/// Default directory for race files, relative to the working directory.
pub const DEFAULT_RACE_DIR: &str = "races";

/// Where `SavePlugin` keeps its files when no store was supplied.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_RACE_DIR),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileRaceStore {
    dir: PathBuf,
}

impl FileRaceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `None` for ids that cannot name a file in `dir`.
    fn path_for(&self, id: &RaceId) -> Option<PathBuf> {
        id.is_valid()
            .then(|| self.dir.join(format!("{id}.{RACE_EXTENSION}")))
    }

    fn read_race(path: &Path) -> Result<Option<StoredRace>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => decode_race(&bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl RaceStore for FileRaceStore {
    fn save(&self, draft: &RaceDraft) -> Result<RaceId, StoreError> {
        let id = RaceId::generate();
        let path = self
            .path_for(&id)
            .ok_or_else(|| StoreError::Encode(format!("unusable race id {id}")))?;
        let stored = StoredRace::from_draft(id.clone(), draft);
        atomic_write(&path, &encode_race(&stored))?;
        Ok(id)
    }

    fn load(&self, id: &RaceId) -> Result<Option<LoadedRace>, StoreError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        Ok(Self::read_race(&path)?.map(|stored| stored.to_loaded()))
    }

    fn list(&self) -> Result<Vec<RaceSummary>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RACE_EXTENSION) {
                continue;
            }
            match Self::read_race(&path) {
                Ok(Some(stored)) => summaries.push(stored.summary()),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable race file {}: {}", path.display(), e),
            }
        }
        sort_by_recency(&mut summaries);
        Ok(summaries)
    }

    fn delete(&self, id: &RaceId) -> Result<(), StoreError> {
        if let Some(path) = self.path_for(id) {
            remove_if_exists(&path)?;
        }
        Ok(())
    }
}
