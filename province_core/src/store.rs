use bevy_ecs::prelude::Resource;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::{
    index::ProvinceIndex,
    state::{
        verify_state_layout, ProvinceId, ProvinceState, SlotIndex, MAX_PROVINCE_CAPACITY,
        PROVINCE_STATE_BYTES, RESERVED_PROVINCE_ID,
    },
    validator::{self, IntegrityViolation},
};

/// Error produced by store construction and registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("province id 0 is reserved")]
    ReservedIdentifier,
    #[error("province {0} is already registered")]
    DuplicateIdentifier(ProvinceId),
    #[error("capacity exceeded: requested {requested}, limit {limit}")]
    CapacityExceeded { requested: u32, limit: u32 },
    #[error("province state is {actual} bytes, expected 8")]
    LayoutViolation { actual: usize },
}

/// Owner of all hot per-province state.
///
/// The backing array is allocated once at construction and pre-filled with
/// [`ProvinceState::DEFAULT`]; registration only ever appends at slot `len()`.
/// Every mutation bumps [`Self::state_version`] and marks its slot dirty until
/// a consumer calls [`Self::clear_dirty`].
///
/// Single writer. Reads from another context must happen between ticks.
#[derive(Resource, Debug, Clone)]
pub struct ProvinceStore {
    pub(crate) states: Box<[ProvinceState]>,
    pub(crate) index: ProvinceIndex,
    pub(crate) count: u32,
    capacity: u32,
    state_version: u64,
    generation: u64,
    dirty_flags: Box<[bool]>,
    dirty_slots: Vec<SlotIndex>,
}

impl ProvinceStore {
    pub fn new(capacity: u32) -> Result<Self, StoreError> {
        verify_state_layout().map_err(|actual| StoreError::LayoutViolation { actual })?;
        if capacity > MAX_PROVINCE_CAPACITY {
            return Err(StoreError::CapacityExceeded {
                requested: capacity,
                limit: MAX_PROVINCE_CAPACITY,
            });
        }

        let slots = capacity as usize;
        info!(
            target: "province_core::store",
            capacity,
            hot_bytes = slots * PROVINCE_STATE_BYTES,
            "province_store.initialized"
        );
        Ok(Self {
            states: vec![ProvinceState::DEFAULT; slots].into_boxed_slice(),
            index: ProvinceIndex::with_capacity(slots),
            count: 0,
            capacity,
            state_version: 0,
            generation: 0,
            dirty_flags: vec![false; slots].into_boxed_slice(),
            dirty_slots: Vec::with_capacity(slots),
        })
    }

    /// Registers a province at the next dense slot and returns that slot.
    ///
    /// On error nothing is modified, so calling this defensively is safe.
    pub fn add_province(
        &mut self,
        id: ProvinceId,
        terrain_type: u16,
    ) -> Result<SlotIndex, StoreError> {
        if id == RESERVED_PROVINCE_ID {
            debug!(target: "province_core::store", "add_province.rejected=reserved_id");
            return Err(StoreError::ReservedIdentifier);
        }
        if self.count == self.capacity {
            debug!(
                target: "province_core::store",
                province = id,
                capacity = self.capacity,
                "add_province.rejected=capacity"
            );
            return Err(StoreError::CapacityExceeded {
                requested: self.count.saturating_add(1),
                limit: self.capacity,
            });
        }
        if self.index.contains(id) {
            debug!(
                target: "province_core::store",
                province = id,
                "add_province.rejected=duplicate"
            );
            return Err(StoreError::DuplicateIdentifier(id));
        }

        let slot = self.count;
        if !self.index.insert(id, slot) {
            // Only reachable if the index and count have drifted apart.
            return Err(StoreError::DuplicateIdentifier(id));
        }
        self.states[slot as usize] = ProvinceState::with_terrain(terrain_type);
        self.count += 1;
        self.mark_dirty(slot);
        self.state_version += 1;
        Ok(slot)
    }

    /// Returns the state of `id`, or [`ProvinceState::DEFAULT`] if `id` is not
    /// registered.
    ///
    /// A default result does not mean the province exists with default
    /// values. Callers that need to tell the two apart use [`Self::state`].
    pub fn get_state_or_default(&self, id: ProvinceId) -> ProvinceState {
        self.state(id).unwrap_or(ProvinceState::DEFAULT)
    }

    pub fn state(&self, id: ProvinceId) -> Option<ProvinceState> {
        self.index
            .lookup(id)
            .map(|slot| self.states[slot as usize])
    }

    pub fn state_at(&self, slot: SlotIndex) -> Option<ProvinceState> {
        if slot < self.count {
            Some(self.states[slot as usize])
        } else {
            None
        }
    }

    pub fn set_state(&mut self, id: ProvinceId, new_state: ProvinceState) -> bool {
        self.mutate(id, |state| *state = new_state)
    }

    /// Transfers ownership. Control follows the new owner; callers that want an
    /// occupation call [`Self::set_controller`] afterwards.
    pub fn set_owner(&mut self, id: ProvinceId, owner_id: u16) -> bool {
        self.mutate(id, |state| {
            state.owner_id = owner_id;
            state.controller_id = owner_id;
        })
    }

    pub fn set_controller(&mut self, id: ProvinceId, controller_id: u16) -> bool {
        self.mutate(id, |state| state.controller_id = controller_id)
    }

    pub fn set_terrain(&mut self, id: ProvinceId, terrain_type: u16) -> bool {
        self.mutate(id, |state| state.terrain_type = terrain_type)
    }

    /// Sets or clears one bit of the extension slot. Bits above 15 are rejected.
    pub fn set_flag(&mut self, id: ProvinceId, bit: u8, value: bool) -> bool {
        if bit >= 16 {
            trace!(
                target: "province_core::store",
                province = id,
                bit,
                "set_flag.rejected=bit_range"
            );
            return false;
        }
        let mask = 1u16 << bit;
        self.mutate(id, |state| {
            if value {
                state.extension_slot |= mask;
            } else {
                state.extension_slot &= !mask;
            }
        })
    }

    /// Ids whose owner is `owner_id`, in slot order. Linear scan.
    pub fn query_by_owner(&self, owner_id: u16) -> Vec<ProvinceId> {
        self.live_states()
            .iter()
            .enumerate()
            .filter(|(_, state)| state.owner_id == owner_id)
            .filter_map(|(slot, _)| self.index.reverse_lookup(slot as SlotIndex))
            .collect()
    }

    /// Ids whose controller is `controller_id`, in slot order. Linear scan.
    pub fn query_by_controller(&self, controller_id: u16) -> Vec<ProvinceId> {
        self.live_states()
            .iter()
            .enumerate()
            .filter(|(_, state)| state.controller_id == controller_id)
            .filter_map(|(slot, _)| self.index.reverse_lookup(slot as SlotIndex))
            .collect()
    }

    /// Registered provinces in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ProvinceId, ProvinceState)> + '_ {
        self.live_states()
            .iter()
            .enumerate()
            .filter_map(|(slot, state)| {
                self.index
                    .reverse_lookup(slot as SlotIndex)
                    .map(|id| (id, *state))
            })
    }

    /// Slots mutated since the last [`Self::clear_dirty`], ascending, each once.
    /// Does not clear.
    pub fn drain_dirty(&self) -> Vec<SlotIndex> {
        let mut slots = self.dirty_slots.clone();
        slots.sort_unstable();
        slots
    }

    pub fn clear_dirty(&mut self) {
        for &slot in &self.dirty_slots {
            self.dirty_flags[slot as usize] = false;
        }
        self.dirty_slots.clear();
    }

    /// Reads and clears the dirty set in one step.
    pub fn take_dirty(&mut self) -> Vec<SlotIndex> {
        let slots = self.drain_dirty();
        self.clear_dirty();
        slots
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty_slots.len()
    }

    pub fn is_dirty(&self, slot: SlotIndex) -> bool {
        self.dirty_flags
            .get(slot as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Drops every province and resets their slots to [`ProvinceState::DEFAULT`].
    ///
    /// Every previously live slot is marked dirty and pending dirty slots are
    /// kept, so the next consumer sees what was removed. The version keeps
    /// increasing and [`Self::generation`] advances.
    pub fn clear(&mut self) {
        let live = self.count;
        self.states[..live as usize].fill(ProvinceState::DEFAULT);
        self.index.clear();
        self.count = 0;
        for slot in 0..live {
            self.mark_dirty(slot);
        }
        self.state_version += 1;
        self.generation += 1;
        info!(
            target: "province_core::store",
            cleared = live,
            version = self.state_version,
            generation = self.generation,
            "province_store.cleared"
        );
    }

    pub fn validate_structural_integrity(&self) -> Result<(), Vec<IntegrityViolation>> {
        validator::validate_structural_integrity(self)
    }

    pub fn slot_of(&self, id: ProvinceId) -> Option<SlotIndex> {
        self.index.lookup(id)
    }

    pub fn id_at(&self, slot: SlotIndex) -> Option<ProvinceId> {
        if slot < self.count {
            self.index.reverse_lookup(slot)
        } else {
            None
        }
    }

    pub fn contains(&self, id: ProvinceId) -> bool {
        self.index.contains(id)
    }

    pub fn index(&self) -> &ProvinceIndex {
        &self.index
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn state_version(&self) -> u64 {
        self.state_version
    }

    /// Number of full clears so far. Slot numbers from an older generation may
    /// name different provinces now.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fixed hot footprint: backing array plus dirty tracking.
    pub fn hot_bytes(&self) -> usize {
        self.states.len() * PROVINCE_STATE_BYTES
            + self.dirty_flags.len()
            + self.dirty_slots.capacity() * std::mem::size_of::<SlotIndex>()
    }

    pub fn index_bytes(&self) -> usize {
        self.index.estimated_bytes()
    }

    pub(crate) fn live_states(&self) -> &[ProvinceState] {
        let live = (self.count as usize).min(self.states.len());
        &self.states[..live]
    }

    fn mutate(&mut self, id: ProvinceId, apply: impl FnOnce(&mut ProvinceState)) -> bool {
        let Some(slot) = self.index.lookup(id) else {
            trace!(target: "province_core::store", province = id, "mutation.rejected=unregistered");
            return false;
        };
        apply(&mut self.states[slot as usize]);
        self.mark_dirty(slot);
        self.state_version += 1;
        true
    }

    fn mark_dirty(&mut self, slot: SlotIndex) {
        let flag = &mut self.dirty_flags[slot as usize];
        if !*flag {
            *flag = true;
            self.dirty_slots.push(slot);
        }
    }
}
