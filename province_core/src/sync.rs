use bevy_ecs::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::StoreConfigHandle,
    state::{ProvinceId, ProvinceState, SlotIndex},
    store::ProvinceStore,
    validator::{self, ChecksumComparison, ChecksumFields, IntegrityViolation, StateChecksum},
};

/// Identifier of a remote simulation instance.
pub type PeerId = u32;

/// Tracks total simulation ticks elapsed.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

/// Copies of every province that changed during the last tick.
///
/// Presentation reads this instead of borrowing the store, so the store can be
/// written again as soon as the sync schedule finishes. `removed` lists dirty
/// slots that no longer hold a province. When `generation` differs from the
/// last frame seen, the store was cleared and every live province is in
/// `changed`, so earlier views should be discarded.
#[derive(Resource, Default, Debug, Clone, Serialize)]
pub struct PresentationFrame {
    pub tick: u64,
    pub state_version: u64,
    pub generation: u64,
    pub changed: Vec<(ProvinceId, ProvinceState)>,
    pub removed: Vec<SlotIndex>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    #[default]
    Synchronized,
    Desynced {
        peer: PeerId,
        tick: u64,
        fields: ChecksumFields,
        local_corruption: bool,
    },
    Resyncing {
        peer: PeerId,
    },
}

/// Latest local checksum and the desync state derived from peer reports.
///
/// Reconciliation itself happens elsewhere; this only supplies the
/// Synchronized → Desynced → Resyncing → Synchronized bookkeeping.
#[derive(Resource, Debug, Clone, Default)]
pub struct SyncState {
    latest: Option<(u64, StateChecksum)>,
    status: SyncStatus,
    local_violations: Vec<IntegrityViolation>,
    desync_count: u64,
}

impl SyncState {
    pub fn latest(&self) -> Option<&StateChecksum> {
        self.latest.as_ref().map(|(_, checksum)| checksum)
    }

    pub fn latest_tick(&self) -> Option<u64> {
        self.latest.as_ref().map(|(tick, _)| *tick)
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn is_synchronized(&self) -> bool {
        self.status == SyncStatus::Synchronized
    }

    pub fn local_violations(&self) -> &[IntegrityViolation] {
        &self.local_violations
    }

    pub fn desync_count(&self) -> u64 {
        self.desync_count
    }

    pub fn record_local(&mut self, tick: u64, checksum: StateChecksum) {
        self.latest = Some((tick, checksum));
    }

    /// Compares a peer's checksum for the latest captured tick against ours.
    ///
    /// On mismatch the local store is validated first, so a corrupted local
    /// index is reported as such instead of being blamed on the peer. Returns
    /// `None` when nothing has been captured locally yet.
    pub fn record_peer_checksum(
        &mut self,
        peer: PeerId,
        remote: &StateChecksum,
        store: &ProvinceStore,
    ) -> Option<ChecksumComparison> {
        let (tick, local) = self.latest.as_ref()?;
        let tick = *tick;
        let comparison = validator::compare(local, remote);
        if comparison.equal {
            return Some(comparison);
        }

        self.local_violations = match store.validate_structural_integrity() {
            Ok(()) => Vec::new(),
            Err(violations) => violations,
        };
        let local_corruption = !self.local_violations.is_empty();
        self.desync_count += 1;
        warn!(
            target: "province_core::sync",
            peer,
            tick,
            fields = ?comparison.differing_fields(),
            local_corruption,
            "sync.desync_detected"
        );
        if !matches!(self.status, SyncStatus::Desynced { .. }) {
            self.status = SyncStatus::Desynced {
                peer,
                tick,
                fields: comparison.differing,
                local_corruption,
            };
        }
        Some(comparison)
    }

    /// Moves a detected desync into reconciliation. No-op otherwise.
    pub fn begin_resync(&mut self) -> bool {
        let SyncStatus::Desynced { peer, .. } = self.status else {
            return false;
        };
        self.status = SyncStatus::Resyncing { peer };
        true
    }

    pub fn mark_resynchronized(&mut self) {
        if !self.is_synchronized() {
            info!(target: "province_core::sync", "sync.resynchronized");
        }
        self.status = SyncStatus::Synchronized;
        self.local_violations.clear();
    }
}

pub fn advance_tick(mut tick: ResMut<SimulationTick>) {
    tick.0 += 1;
}

/// Copies dirty provinces into the [`PresentationFrame`] and clears the dirty set.
pub fn publish_dirty_provinces(
    tick: Res<SimulationTick>,
    mut store: ResMut<ProvinceStore>,
    mut frame: ResMut<PresentationFrame>,
) {
    let slots = store.take_dirty();
    frame.tick = tick.0;
    frame.state_version = store.state_version();
    frame.generation = store.generation();
    frame.changed.clear();
    frame.removed.clear();
    for slot in slots {
        match (store.id_at(slot), store.state_at(slot)) {
            (Some(id), Some(state)) => frame.changed.push((id, state)),
            _ => frame.removed.push(slot),
        }
    }
    if !frame.changed.is_empty() || !frame.removed.is_empty() {
        debug!(
            target: "province_core::sync",
            tick = tick.0,
            changed = frame.changed.len(),
            removed = frame.removed.len(),
            generation = frame.generation,
            "presentation.frame_published"
        );
    }
}

pub fn capture_checksum(
    tick: Res<SimulationTick>,
    config: Res<StoreConfigHandle>,
    store: Res<ProvinceStore>,
    mut sync: ResMut<SyncState>,
) {
    let interval = config.0.checksum_interval_ticks;
    if interval == 0 || tick.0 % interval != 0 {
        return;
    }
    let checksum = validator::compute_checksum(&store);
    debug!(
        target: "province_core::sync",
        tick = tick.0,
        main = checksum.main_hash,
        ownership = checksum.ownership_hash,
        terrain = checksum.terrain_hash,
        count = checksum.entity_count,
        "checksum.captured"
    );
    sync.record_local(tick.0, checksum);
}
