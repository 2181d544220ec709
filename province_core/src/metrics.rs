use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::{cold_data::ColdDataCache, store::ProvinceStore, sync::SimulationTick};

/// Memory footprint report for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub total_bytes: usize,
    pub hot_bytes: usize,
    pub cold_bytes: usize,
}

pub fn memory_usage(store: &ProvinceStore, cold: &ColdDataCache) -> MemoryUsage {
    let hot_bytes = store.hot_bytes();
    let cold_bytes = cold.estimated_bytes();
    MemoryUsage {
        total_bytes: hot_bytes + store.index_bytes() + cold_bytes,
        hot_bytes,
        cold_bytes,
    }
}

/// Report for a world built by [`crate::build_province_world`]. Missing
/// resources count as empty.
pub fn memory_usage_for_world(world: &World) -> MemoryUsage {
    let Some(store) = world.get_resource::<ProvinceStore>() else {
        return MemoryUsage::default();
    };
    match world.get_resource::<ColdDataCache>() {
        Some(cold) => memory_usage(store, cold),
        None => memory_usage(store, &ColdDataCache::default()),
    }
}

#[derive(Resource, Default, Debug, Clone, Serialize)]
pub struct StoreMetrics {
    pub tick: u64,
    pub province_count: u32,
    pub capacity: u32,
    pub state_version: u64,
    pub cold_entries: usize,
    pub memory: MemoryUsage,
}

pub fn collect_store_metrics(
    tick: Res<SimulationTick>,
    store: Res<ProvinceStore>,
    cold: Res<ColdDataCache>,
    mut metrics: ResMut<StoreMetrics>,
) {
    metrics.tick = tick.0;
    metrics.province_count = store.len();
    metrics.capacity = store.capacity();
    metrics.state_version = store.state_version();
    metrics.cold_entries = cold.len();
    metrics.memory = memory_usage(&store, &cold);
}
