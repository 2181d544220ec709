use std::collections::HashMap;

use ahash::RandomState;

use crate::state::{ProvinceId, SlotIndex, RESERVED_PROVINCE_ID};

// Fixed seeds avoid per-process randomness. ahash output still varies with CPU
// features and crate version, so bucket layout must never be observable. Nothing downstream may iterate `forward` directly;
// use `entries_by_slot`.
const INDEX_SEEDS: (u64, u64, u64, u64) = (
    0x5368_6164_6f77_5363,
    0x616c_6550_726f_7669,
    0x6e63_6549_6e64_6578,
    0x0000_0000_0000_0001,
);

/// Bidirectional mapping between external province ids and dense slots.
///
/// Forward lookups go through an open-addressed hash map; reverse lookups are
/// a plain array indexed by slot, which stays contiguous over `[0, len)`.
#[derive(Debug, Clone)]
pub struct ProvinceIndex {
    forward: HashMap<ProvinceId, SlotIndex, RandomState>,
    reverse: Vec<ProvinceId>,
}

impl ProvinceIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        let (k0, k1, k2, k3) = INDEX_SEEDS;
        Self {
            forward: HashMap::with_capacity_and_hasher(
                capacity,
                RandomState::with_seeds(k0, k1, k2, k3),
            ),
            reverse: Vec::with_capacity(capacity),
        }
    }

    /// Registers `id` at `slot`. Refuses the reserved id, an id that is
    /// already present, and any slot other than the next dense one.
    pub fn insert(&mut self, id: ProvinceId, slot: SlotIndex) -> bool {
        if id == RESERVED_PROVINCE_ID
            || self.forward.contains_key(&id)
            || slot as usize != self.reverse.len()
        {
            return false;
        }
        self.forward.insert(id, slot);
        self.reverse.push(id);
        true
    }

    pub fn lookup(&self, id: ProvinceId) -> Option<SlotIndex> {
        self.forward.get(&id).copied()
    }

    pub fn reverse_lookup(&self, slot: SlotIndex) -> Option<ProvinceId> {
        self.reverse.get(slot as usize).copied()
    }

    pub fn contains(&self, id: ProvinceId) -> bool {
        self.forward.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Number of slots with a reverse entry. Equal to [`Self::len`] unless the
    /// index has been corrupted.
    pub fn slot_count(&self) -> usize {
        self.reverse.len()
    }

    /// Forward entries in slot order, for diagnostics that must not depend on
    /// hash-map iteration order.
    pub fn entries_by_slot(&self) -> Vec<(ProvinceId, SlotIndex)> {
        let mut entries: Vec<_> = self.forward.iter().map(|(&id, &slot)| (id, slot)).collect();
        entries.sort_unstable_by_key(|&(id, slot)| (slot, id));
        entries
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    pub(crate) fn estimated_bytes(&self) -> usize {
        let entry = std::mem::size_of::<(ProvinceId, SlotIndex)>() + 1;
        self.forward.capacity() * entry
            + self.reverse.capacity() * std::mem::size_of::<ProvinceId>()
    }

    #[cfg(test)]
    pub(crate) fn forward_mut(&mut self) -> &mut HashMap<ProvinceId, SlotIndex, RandomState> {
        &mut self.forward
    }
}
