use serde::{Deserialize, Serialize};

/// Stable external identifier for a province. `0` is reserved and never registered.
pub type ProvinceId = u16;

/// Dense index into the store's backing array.
pub type SlotIndex = u32;

/// Identifier reserved for "unowned" and never accepted as a province id.
pub const RESERVED_PROVINCE_ID: ProvinceId = 0;

/// Exact byte size every [`ProvinceState`] must occupy.
pub const PROVINCE_STATE_BYTES: usize = 8;

/// Upper bound on store capacity: the 16-bit id space minus the reserved zero.
pub const MAX_PROVINCE_CAPACITY: u32 = u16::MAX as u32;

/// Hot per-province state, read every tick.
///
/// The layout is fixed at eight bytes so that total hot memory is
/// `capacity * 8` regardless of how many provinces are registered.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProvinceState {
    pub owner_id: u16,
    pub controller_id: u16,
    pub terrain_type: u16,
    /// Game-defined payload. Never interpreted here, only preserved.
    pub extension_slot: u16,
}

const _: () = assert!(std::mem::size_of::<ProvinceState>() == PROVINCE_STATE_BYTES);

impl ProvinceState {
    /// The value every unregistered slot holds, and what reads of unknown ids return.
    pub const DEFAULT: ProvinceState = ProvinceState {
        owner_id: RESERVED_PROVINCE_ID,
        controller_id: RESERVED_PROVINCE_ID,
        terrain_type: 0,
        extension_slot: 0,
    };

    pub fn with_terrain(terrain_type: u16) -> Self {
        Self {
            terrain_type,
            ..Self::DEFAULT
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owner_id != RESERVED_PROVINCE_ID
    }

    /// True when the controller differs from the owner, e.g. during occupation.
    pub fn is_occupied(&self) -> bool {
        self.controller_id != self.owner_id
    }

    pub fn flag(&self, bit: u8) -> bool {
        bit < 16 && self.extension_slot & (1u16 << bit) != 0
    }
}

/// Runtime counterpart of the compile-time layout assertion.
///
/// Returns the observed size when it does not match [`PROVINCE_STATE_BYTES`].
pub fn verify_state_layout() -> Result<(), usize> {
    let actual = std::mem::size_of::<ProvinceState>();
    if actual == PROVINCE_STATE_BYTES {
        Ok(())
    } else {
        Err(actual)
    }
}
