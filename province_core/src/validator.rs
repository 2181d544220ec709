//! Reproducible summaries of [`ProvinceStore`] contents and structural checks.
//!
//! Everything here is a pure function of the store. Hashes walk provinces in
//! slot order `0..len()`, which is the only order guaranteed identical across
//! peers that registered the same provinces in the same sequence; hash-map
//! iteration order never reaches a hash.
//!
//! FNV-1a detects accidental divergence. It offers no tamper resistance.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    hashing::StateHasher,
    state::{verify_state_layout, ProvinceId, ProvinceState, SlotIndex, RESERVED_PROVINCE_ID},
    store::ProvinceStore,
};

/// Snapshot of every checksum for one store at one point in time.
///
/// `computed_at_ms` is wall-clock metadata and never takes part in comparison.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StateChecksum {
    pub main_hash: u32,
    pub ownership_hash: u32,
    pub terrain_hash: u32,
    pub entity_count: u32,
    pub computed_at_ms: u64,
}

impl StateChecksum {
    pub fn matches(&self, other: &StateChecksum) -> bool {
        compare(self, other).equal
    }
}

bitflags! {
    /// Which parts of two checksums disagree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ChecksumFields: u8 {
        const MAIN = 1 << 0;
        const OWNERSHIP = 1 << 1;
        const TERRAIN = 1 << 2;
        const COUNT = 1 << 3;
    }
}

impl ChecksumFields {
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecksumComparison {
    pub equal: bool,
    pub differing: ChecksumFields,
}

impl ChecksumComparison {
    pub fn differing_fields(&self) -> Vec<&'static str> {
        self.differing.names()
    }

    /// Ownership diverged while terrain agrees: a command was applied
    /// inconsistently rather than a map being loaded differently.
    pub fn is_command_divergence(&self) -> bool {
        self.differing.contains(ChecksumFields::OWNERSHIP)
            && !self.differing.contains(ChecksumFields::TERRAIN)
    }

    /// Terrain diverged, which points at load-time corruption.
    pub fn is_load_divergence(&self) -> bool {
        self.differing.contains(ChecksumFields::TERRAIN)
    }
}

/// A single structural problem found in a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error("province state layout is {actual} bytes, expected 8")]
    StateLayout { actual: usize },
    #[error("count {count} exceeds capacity {capacity}")]
    CountExceedsCapacity { count: u32, capacity: u32 },
    #[error("index holds {index_len} ids but count is {count}")]
    IndexSizeMismatch { index_len: usize, count: u32 },
    #[error("index holds {slots} reverse slots but count is {count}")]
    ReverseSizeMismatch { slots: usize, count: u32 },
    #[error("province {id} maps to slot {slot}, outside [0, {count})")]
    SlotOutOfRange {
        id: ProvinceId,
        slot: SlotIndex,
        count: u32,
    },
    #[error("slot {slot} names province {id}, which maps to {mapped:?}")]
    ReverseMismatch {
        slot: SlotIndex,
        id: ProvinceId,
        mapped: Option<SlotIndex>,
    },
    #[error("reserved province id 0 is mapped at slot {slot}")]
    ReservedIdentifierMapped { slot: SlotIndex },
    #[error("province {id} occupies more than one slot")]
    DuplicateIdentifier { id: ProvinceId },
}

/// Folds every field of every province, then the province count.
pub fn full_checksum(store: &ProvinceStore) -> u32 {
    let mut hasher = StateHasher::new();
    for (id, state) in slot_ordered(store) {
        hasher.fold_u16(id);
        hasher.fold_u16(state.owner_id);
        hasher.fold_u16(state.controller_id);
        hasher.fold_u16(state.terrain_type);
        hasher.fold_u16(state.extension_slot);
    }
    hasher.fold_u32(store.len());
    hasher.finish_u32()
}

/// Folds `(id, owner, controller)` only.
pub fn ownership_checksum(store: &ProvinceStore) -> u32 {
    let mut hasher = StateHasher::new();
    for (id, state) in slot_ordered(store) {
        hasher.fold_u16(id);
        hasher.fold_u16(state.owner_id);
        hasher.fold_u16(state.controller_id);
    }
    hasher.finish_u32()
}

/// Folds `(id, terrain)` only.
pub fn terrain_checksum(store: &ProvinceStore) -> u32 {
    let mut hasher = StateHasher::new();
    for (id, state) in slot_ordered(store) {
        hasher.fold_u16(id);
        hasher.fold_u16(state.terrain_type);
    }
    hasher.finish_u32()
}

pub fn compute_checksum(store: &ProvinceStore) -> StateChecksum {
    let computed_at_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0);
    StateChecksum {
        main_hash: full_checksum(store),
        ownership_hash: ownership_checksum(store),
        terrain_hash: terrain_checksum(store),
        entity_count: store.len(),
        computed_at_ms,
    }
}

pub fn compare(a: &StateChecksum, b: &StateChecksum) -> ChecksumComparison {
    let mut differing = ChecksumFields::empty();
    differing.set(ChecksumFields::MAIN, a.main_hash != b.main_hash);
    differing.set(ChecksumFields::OWNERSHIP, a.ownership_hash != b.ownership_hash);
    differing.set(ChecksumFields::TERRAIN, a.terrain_hash != b.terrain_hash);
    differing.set(ChecksumFields::COUNT, a.entity_count != b.entity_count);
    ChecksumComparison {
        equal: differing.is_empty(),
        differing,
    }
}

/// Runs every structural check and reports all violations, not just the first.
pub fn validate_structural_integrity(
    store: &ProvinceStore,
) -> Result<(), Vec<IntegrityViolation>> {
    let mut violations = Vec::new();
    let count = store.count;
    let index = &store.index;

    if let Err(actual) = verify_state_layout() {
        violations.push(IntegrityViolation::StateLayout { actual });
    }
    if count > store.capacity() {
        violations.push(IntegrityViolation::CountExceedsCapacity {
            count,
            capacity: store.capacity(),
        });
    }
    if index.len() != count as usize {
        violations.push(IntegrityViolation::IndexSizeMismatch {
            index_len: index.len(),
            count,
        });
    }
    if index.slot_count() != count as usize {
        violations.push(IntegrityViolation::ReverseSizeMismatch {
            slots: index.slot_count(),
            count,
        });
    }

    for (id, slot) in index.entries_by_slot() {
        if slot >= count {
            violations.push(IntegrityViolation::SlotOutOfRange { id, slot, count });
        }
    }

    let mut seen = HashSet::with_capacity(index.slot_count());
    for slot in 0..index.slot_count() as SlotIndex {
        let Some(id) = index.reverse_lookup(slot) else {
            continue;
        };
        if id == RESERVED_PROVINCE_ID {
            violations.push(IntegrityViolation::ReservedIdentifierMapped { slot });
            continue;
        }
        if !seen.insert(id) {
            violations.push(IntegrityViolation::DuplicateIdentifier { id });
            continue;
        }
        let mapped = index.lookup(id);
        if mapped != Some(slot) {
            violations.push(IntegrityViolation::ReverseMismatch { slot, id, mapped });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

// A slot with no reverse entry hashes as the reserved id, so a damaged index
// still changes the checksum instead of silently skipping the province.
fn slot_ordered(store: &ProvinceStore) -> impl Iterator<Item = (ProvinceId, &ProvinceState)> {
    store
        .live_states()
        .iter()
        .enumerate()
        .map(move |(slot, state)| {
            let id = store
                .index
                .reverse_lookup(slot as SlotIndex)
                .unwrap_or(RESERVED_PROVINCE_ID);
            (id, state)
        })
}
