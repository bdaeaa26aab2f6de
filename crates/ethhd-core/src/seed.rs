//! BIP-39 seed
//!
//! The 64-byte output of mnemonic stretching and the sole input to master
//! key generation. Heap-allocated so its address is stable, locked into RAM
//! where the platform allows it, zeroized on drop.

use zeroize::Zeroize;

use crate::memory;

pub const SEED_LEN: usize = 64;

pub struct Seed {
    bytes: Box<[u8; SEED_LEN]>,
    locked: bool,
}

impl Seed {
    /// Wrap raw seed bytes (test vectors or an externally derived seed).
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        let mut boxed = Box::new([0u8; SEED_LEN]);
        // SAFETY: the box is live for the lifetime of `Seed` and unlocked in Drop.
        let locked = unsafe { memory::mlock(boxed.as_ptr(), SEED_LEN) };
        boxed.copy_from_slice(&bytes);
        let mut bytes = bytes;
        bytes.zeroize();
        Self {
            bytes: boxed,
            locked,
        }
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.bytes
    }

    /// Whether the seed pages are pinned in RAM.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.bytes.zeroize();
        if self.locked {
            // SAFETY: same pointer and length as the mlock in `from_bytes`.
            unsafe {
                memory::munlock(self.bytes.as_ptr(), SEED_LEN);
            }
        }
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed([REDACTED])")
    }
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        self.bytes[..] == other.bytes[..]
    }
}

impl Eq for Seed {}
