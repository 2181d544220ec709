use std::hash::Hasher;

/// A deterministic FNV-1a 32-bit hasher for state checksums.
///
/// Integer writes are always folded as little-endian bytes, so the same
/// field sequence hashes identically on every platform. `DefaultHasher`
/// is randomized and the std `write_u16` default uses native byte order,
/// so neither is usable for desync detection.
#[derive(Debug, Clone, Copy)]
pub struct StateHasher {
    state: u32,
}

impl Default for StateHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHasher {
    pub const OFFSET_BASIS: u32 = 0x811c_9dc5;
    pub const PRIME: u32 = 0x0100_0193;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }

    pub fn fold_u16(&mut self, value: u16) {
        self.write(&value.to_le_bytes());
    }

    pub fn fold_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    pub fn finish_u32(&self) -> u32 {
        self.state
    }
}

impl Hasher for StateHasher {
    fn finish(&self) -> u64 {
        self.state as u64
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u32;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u16(&mut self, value: u16) {
        self.fold_u16(value);
    }

    fn write_u32(&mut self, value: u32) {
        self.fold_u32(value);
    }
}
