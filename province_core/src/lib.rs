//! Deterministic province state core.
//!
//! Holds fixed-size hot state for every province in a dense array, maps stable
//! 16-bit ids to slots, tracks which slots changed for presentation, and
//! produces reproducible checksums for desync detection.
//!
//! The store is single-writer: mutate during the simulation step, then run the
//! schedule from [`build_sync_schedule`] to publish changes and capture a
//! checksum before anything else reads.

pub mod cold_data;
pub mod config;
pub mod hashing;
pub mod index;
pub mod metrics;
pub mod scenario;
mod state;
mod store;
pub mod sync;
pub mod validator;

use std::sync::Arc;

use bevy_ecs::prelude::*;

pub use cold_data::{ColdDataCache, HistoryEntry, ProvinceColdData};
pub use config::{
    load_store_config_from_env, StoreConfig, StoreConfigHandle, StoreConfigMetadata,
};
pub use index::ProvinceIndex;
pub use metrics::{memory_usage, memory_usage_for_world, MemoryUsage, StoreMetrics};
pub use scenario::{apply_scenario, LoadSummary, ProvinceSeed, ScenarioDefinition};
pub use state::{
    verify_state_layout, ProvinceId, ProvinceState, SlotIndex, MAX_PROVINCE_CAPACITY,
    PROVINCE_STATE_BYTES, RESERVED_PROVINCE_ID,
};
pub use store::{ProvinceStore, StoreError};
pub use sync::{PeerId, PresentationFrame, SimulationTick, SyncState, SyncStatus};
pub use validator::{
    compare, compute_checksum, full_checksum, ownership_checksum, terrain_checksum,
    ChecksumComparison, ChecksumFields, IntegrityViolation, StateChecksum,
};

/// Construct a [`World`] holding the store, the cold cache and the sync
/// resources. This world is the simulation context; nothing here is global.
pub fn build_province_world(config: Arc<StoreConfig>) -> Result<World, StoreError> {
    let store = ProvinceStore::new(config.capacity)?;

    let mut world = World::new();
    world.insert_resource(store);
    world.insert_resource(ColdDataCache::new());
    world.insert_resource(StoreConfigHandle::new(config));
    world.insert_resource(StoreConfigMetadata::default());
    world.insert_resource(SimulationTick::default());
    world.insert_resource(PresentationFrame::default());
    world.insert_resource(SyncState::default());
    Ok(world)
}

/// Schedule run once per completed tick: tick increment → presentation
/// publish → checksum capture.
pub fn build_sync_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            sync::advance_tick,
            sync::publish_dirty_provinces,
            sync::capture_checksum,
        )
            .chain(),
    );
    schedule
}

/// Execute the sync phase for one completed tick.
pub fn run_sync(world: &mut World, schedule: &mut Schedule) {
    schedule.run(world);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_holds_every_context_resource() {
        let config = Arc::new(StoreConfig {
            capacity: 32,
            ..StoreConfig::default()
        });
        let mut world = build_province_world(config).unwrap();
        assert_eq!(world.resource::<ProvinceStore>().capacity(), 32);
        assert_eq!(world.resource::<StoreConfigHandle>().get().capacity, 32);
        assert!(world.resource::<StoreConfigMetadata>().path().is_none());
        assert!(world.contains_resource::<ColdDataCache>());
        assert!(world.contains_resource::<SyncState>());

        let mut schedule = build_sync_schedule();
        run_sync(&mut world, &mut schedule);
        assert_eq!(*world.resource::<SimulationTick>(), SimulationTick(1));
        assert!(world.resource::<SyncState>().latest().is_some());
    }
}
