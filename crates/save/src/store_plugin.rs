use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};

use timing::chronometer::Chronometer;
use timing::frame_clock::FrameClock;
use timing::replay::ReplayCommand;
use timing::timing_sets::TimingSet;

use crate::file_store::{FileRaceStore, StoreConfig};
use crate::race_record::{LoadedRace, RaceDraft, RaceId, RaceSummary};
use crate::store::RaceStore;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// The store every request goes to. Insert one before `SavePlugin` to
/// replace the default on-disk store.
#[derive(Resource, Clone)]
pub struct ActiveRaceStore(pub Arc<dyn RaceStore>);

impl ActiveRaceStore {
    pub fn new(store: impl RaceStore) -> Self {
        Self(Arc::new(store))
    }
}

/// Store operations in flight on the IO task pool.
#[derive(Resource, Default)]
pub struct PendingStoreTasks {
    tasks: Vec<Task<RaceStoreOutcome>>,
}

impl PendingStoreTasks {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// The most recent race list, for the load screen.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct RaceLibrary {
    pub races: Vec<RaceSummary>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Save the chronometer's current race. The snapshot is taken in the frame
/// the event is read.
#[derive(Event, Debug, Clone)]
pub struct SaveRaceEvent {
    pub name: String,
}

/// Load a stored race into the replay engine.
#[derive(Event, Debug, Clone)]
pub struct LoadRaceEvent {
    pub id: RaceId,
}

#[derive(Event, Debug, Clone, Default)]
pub struct ListRacesEvent;

#[derive(Event, Debug, Clone)]
pub struct DeleteRaceEvent {
    pub id: RaceId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Save,
    Load,
    List,
    Delete,
}

/// Result of one store operation, sent once it completes.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum RaceStoreOutcome {
    Saved { id: RaceId, name: String },
    Loaded(Box<LoadedRace>),
    NotFound { id: RaceId },
    Listed(Vec<RaceSummary>),
    Deleted { id: RaceId },
    /// The store rejected the operation. Engine state is untouched.
    Failed { op: StoreOp, error: String },
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn failed(op: StoreOp, error: impl std::fmt::Display) -> RaceStoreOutcome {
    RaceStoreOutcome::Failed {
        op,
        error: error.to_string(),
    }
}

/// Turn request events into IO tasks.
#[allow(clippy::too_many_arguments)]
pub fn spawn_store_tasks(
    mut saves: EventReader<SaveRaceEvent>,
    mut loads: EventReader<LoadRaceEvent>,
    mut lists: EventReader<ListRacesEvent>,
    mut deletes: EventReader<DeleteRaceEvent>,
    store: Res<ActiveRaceStore>,
    chrono: Res<Chronometer>,
    clock: Res<FrameClock>,
    mut pending: ResMut<PendingStoreTasks>,
) {
    let pool = IoTaskPool::get();

    for event in saves.read() {
        let draft = RaceDraft::from_chronometer(&event.name, &chrono, clock.sample().wall_ms);
        let store = Arc::clone(&store.0);
        pending.tasks.push(pool.spawn(async move {
            match store.save(&draft) {
                Ok(id) => RaceStoreOutcome::Saved {
                    id,
                    name: draft.name,
                },
                Err(e) => failed(StoreOp::Save, e),
            }
        }));
    }

    for event in loads.read() {
        let id = event.id.clone();
        let store = Arc::clone(&store.0);
        pending.tasks.push(pool.spawn(async move {
            match store.load(&id) {
                Ok(Some(race)) => RaceStoreOutcome::Loaded(Box::new(race)),
                Ok(None) => RaceStoreOutcome::NotFound { id },
                Err(e) => failed(StoreOp::Load, e),
            }
        }));
    }

    if lists.read().next().is_some() {
        // One listing per frame is enough however many were requested.
        lists.read().for_each(drop);
        let store = Arc::clone(&store.0);
        pending.tasks.push(pool.spawn(async move {
            match store.list() {
                Ok(races) => RaceStoreOutcome::Listed(races),
                Err(e) => failed(StoreOp::List, e),
            }
        }));
    }

    for event in deletes.read() {
        let id = event.id.clone();
        let store = Arc::clone(&store.0);
        pending.tasks.push(pool.spawn(async move {
            match store.delete(&id) {
                Ok(()) => RaceStoreOutcome::Deleted { id },
                Err(e) => failed(StoreOp::Delete, e),
            }
        }));
    }
}

/// Poll in-flight tasks and publish finished outcomes. A loaded race goes
/// to the replay engine; nothing else touches engine state.
pub fn collect_store_outcomes(
    mut pending: ResMut<PendingStoreTasks>,
    mut outcomes: EventWriter<RaceStoreOutcome>,
    mut replay: EventWriter<ReplayCommand>,
    mut library: ResMut<RaceLibrary>,
) {
    if pending.tasks.is_empty() {
        return;
    }
    let mut finished = Vec::new();
    pending.tasks.retain_mut(|task| {
        match block_on(futures_lite::future::poll_once(task)) {
            Some(outcome) => {
                finished.push(outcome);
                false
            }
            None => true,
        }
    });

    for outcome in finished {
        match &outcome {
            RaceStoreOutcome::Saved { id, name } => info!("Race {:?} saved as {}", name, id),
            RaceStoreOutcome::Loaded(race) => {
                info!("Race {} loaded", race.id);
                replay.send(ReplayCommand::Load(race.as_ref().clone().into_replay()));
            }
            RaceStoreOutcome::NotFound { id } => info!("Race {} not found", id),
            RaceStoreOutcome::Listed(races) => {
                library.races = races.clone();
            }
            RaceStoreOutcome::Deleted { id } => info!("Race {} deleted", id),
            RaceStoreOutcome::Failed { op, error } => warn!("Race store {:?} failed: {}", op, error),
        }
        outcomes.send(outcome);
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Bridges the timing engines to a `RaceStore`.
///
/// Requests are read in `TimingSet::Report`, after the chronometer settled
/// for the frame, and run on the IO task pool so storage never blocks a
/// tick. Requires `TimingPlugin`.
pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StoreConfig>();
        if !app.world().contains_resource::<ActiveRaceStore>() {
            let dir = app.world().resource::<StoreConfig>().dir.clone();
            info!("Race store at {}", dir.display());
            app.insert_resource(ActiveRaceStore::new(FileRaceStore::new(dir)));
        }

        app.init_resource::<PendingStoreTasks>()
            .init_resource::<RaceLibrary>()
            .add_event::<SaveRaceEvent>()
            .add_event::<LoadRaceEvent>()
            .add_event::<ListRacesEvent>()
            .add_event::<DeleteRaceEvent>()
            .add_event::<RaceStoreOutcome>()
            .add_systems(
                Update,
                (spawn_store_tasks, collect_store_outcomes)
                    .chain()
                    .in_set(TimingSet::Report),
            );
    }
}
