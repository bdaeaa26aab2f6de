//! Entropy source
//!
//! Draws wallet entropy from the operating system CSPRNG. There is no
//! fallback generator: if `OsRng` fails, generation fails.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Supported BIP39 entropy strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum EntropyStrength {
    /// 128 bits, 12 words
    #[default]
    Bits128,
    /// 160 bits, 15 words
    Bits160,
    /// 192 bits, 18 words
    Bits192,
    /// 224 bits, 21 words
    Bits224,
    /// 256 bits, 24 words
    Bits256,
}

impl EntropyStrength {
    pub fn from_bits(bits: usize) -> Result<Self> {
        match bits {
            128 => Ok(Self::Bits128),
            160 => Ok(Self::Bits160),
            192 => Ok(Self::Bits192),
            224 => Ok(Self::Bits224),
            256 => Ok(Self::Bits256),
            other => Err(Error::InvalidEntropyLength(other)),
        }
    }

    pub fn from_word_count(words: usize) -> Result<Self> {
        match words {
            12 => Ok(Self::Bits128),
            15 => Ok(Self::Bits160),
            18 => Ok(Self::Bits192),
            21 => Ok(Self::Bits224),
            24 => Ok(Self::Bits256),
            other => Err(Error::InvalidWordCount(other)),
        }
    }

    pub fn bits(self) -> usize {
        match self {
            Self::Bits128 => 128,
            Self::Bits160 => 160,
            Self::Bits192 => 192,
            Self::Bits224 => 224,
            Self::Bits256 => 256,
        }
    }

    pub fn byte_len(self) -> usize {
        self.bits() / 8
    }

    /// Checksum length in bits (ENT / 32).
    pub fn checksum_bits(self) -> usize {
        self.bits() / 32
    }

    pub fn word_count(self) -> usize {
        (self.bits() + self.checksum_bits()) / 11
    }
}

/// Raw wallet entropy, 16 to 32 bytes. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct Entropy {
    bytes: Vec<u8>,
}

impl Entropy {
    /// Generate fresh entropy from the OS secure random source.
    pub fn generate(strength: EntropyStrength) -> Result<Self> {
        let mut bytes = vec![0u8; strength.byte_len()];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::InsufficientRandomness(e.to_string()))?;
        log::debug!("generated {} bits of entropy", strength.bits());
        Ok(Self { bytes })
    }

    /// Generate fresh entropy for a bit count (128, 160, 192, 224 or 256).
    pub fn generate_bits(bits: usize) -> Result<Self> {
        Self::generate(EntropyStrength::from_bits(bits)?)
    }

    /// Wrap externally supplied entropy (test vectors, restores).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        EntropyStrength::from_bits(bytes.len() * 8)?;
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn strength(&self) -> EntropyStrength {
        // Length is validated at construction.
        match self.bytes.len() {
            16 => EntropyStrength::Bits128,
            20 => EntropyStrength::Bits160,
            24 => EntropyStrength::Bits192,
            28 => EntropyStrength::Bits224,
            _ => EntropyStrength::Bits256,
        }
    }
}

impl std::fmt::Debug for Entropy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entropy")
            .field("bits", &(self.bytes.len() * 8))
            .finish_non_exhaustive()
    }
}
