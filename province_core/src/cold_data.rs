use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::state::ProvinceId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub tick: u64,
    pub owner: ProvinceId,
    pub note: String,
}

/// Per-province data too large or too rarely read for the hot array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceColdData {
    pub name: String,
    pub buildings: Vec<u16>,
    pub history: Vec<HistoryEntry>,
}

impl ProvinceColdData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, tick: u64, owner: ProvinceId, note: impl Into<String>) {
        self.history.push(HistoryEntry {
            tick,
            owner,
            note: note.into(),
        });
    }

    pub fn estimated_bytes(&self) -> usize {
        bincode::serialized_size(self)
            .map(|size| size as usize)
            .unwrap_or(0)
    }
}

/// Sparse side table of [`ProvinceColdData`] keyed by province id.
///
/// Entries are created on first access and only dropped by [`Self::clear`].
/// Not bound to the store: ids here need not be registered.
#[derive(Resource, Debug, Clone, Default)]
pub struct ColdDataCache {
    entries: HashMap<ProvinceId, ProvinceColdData>,
}

impl ColdDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `id`, materializing a default one if absent.
    pub fn get_or_create(&mut self, id: ProvinceId) -> &mut ProvinceColdData {
        self.entries.entry(id).or_default()
    }

    pub fn get(&self, id: ProvinceId) -> Option<&ProvinceColdData> {
        self.entries.get(&id)
    }

    pub fn set(&mut self, id: ProvinceId, data: ProvinceColdData) {
        self.entries.insert(id, data);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn estimated_bytes(&self) -> usize {
        self.entries
            .values()
            .map(|data| std::mem::size_of::<ProvinceId>() + data.estimated_bytes())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_materializes_default() {
        let mut cache = ColdDataCache::new();
        assert!(cache.get(12).is_none());

        let data = cache.get_or_create(12);
        assert_eq!(*data, ProvinceColdData::default());
        data.name = "Uppland".to_string();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_or_create(12).name, "Uppland");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn set_overwrites() {
        let mut cache = ColdDataCache::new();
        cache.set(3, ProvinceColdData::named("Old"));
        cache.set(3, ProvinceColdData::named("New"));
        assert_eq!(cache.get(3).map(|data| data.name.as_str()), Some("New"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_drops_all_entries() {
        let mut cache = ColdDataCache::new();
        cache.get_or_create(1);
        cache.get_or_create(2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.estimated_bytes(), 0);
    }

    #[test]
    fn estimated_bytes_grow_with_payload() {
        let mut cache = ColdDataCache::new();
        cache.set(1, ProvinceColdData::named("A"));
        let small = cache.estimated_bytes();

        let entry = cache.get_or_create(1);
        entry.buildings.extend([1, 2, 3]);
        entry.record(40, 7, "annexed");
        assert!(cache.estimated_bytes() > small);
    }
}
