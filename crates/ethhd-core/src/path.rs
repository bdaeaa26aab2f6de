//! BIP-32 derivation paths and the BIP-44 Ethereum convention
//!
//! Text form: `m/44'/60'/0'/0/0`. Hardened segments may be written with
//! `'`, `h` or `H`; `Display` always renders `'`. Paths compare
//! structurally, so two spellings of the same path are equal once parsed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// First hardened index (2^31).
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// BIP-44 purpose field.
pub const BIP44_PURPOSE: u32 = 44;

/// SLIP-44 coin type for Ether.
pub const ETHEREUM_COIN_TYPE: u32 = 60;

/// First external address of the first Ethereum account.
pub const ETHEREUM_DEFAULT_PATH: &str = "m/44'/60'/0'/0/0";

/// One path segment: a 31-bit index plus the hardened flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildIndex {
    index: u32,
    hardened: bool,
}

impl ChildIndex {
    pub fn normal(index: u32) -> Result<Self> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> Result<Self> {
        Self::new(index, true)
    }

    pub fn new(index: u32, hardened: bool) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::InvalidPath(format!(
                "index {} does not fit in 31 bits",
                index
            )));
        }
        Ok(Self { index, hardened })
    }

    /// Decode the 32-bit wire form (hardened iff bit 31 is set).
    pub fn from_raw(raw: u32) -> Self {
        Self {
            index: raw & !HARDENED_OFFSET,
            hardened: raw & HARDENED_OFFSET != 0,
        }
    }

    /// 32-bit wire form used in HMAC input and serialization.
    pub fn to_raw(self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn is_hardened(self) -> bool {
        self.hardened
    }

    /// The next index of the same kind, `None` once the 31-bit space is exhausted.
    pub fn next(self) -> Option<Self> {
        let index = self.index.checked_add(1)?;
        Self::new(index, self.hardened).ok()
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (digits, hardened) = match s.strip_suffix(['\'', 'h', 'H']) {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPath(format!("invalid segment '{}'", s)));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidPath(format!("segment '{}' out of range", s)))?;
        Self::new(index, hardened)
    }
}

/// An ordered list of child indices below the master key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivationPath(Vec<ChildIndex>);

impl DerivationPath {
    /// The empty path `m`.
    pub fn master() -> Self {
        Self(Vec::new())
    }

    /// `m/purpose'/coin'/account'/change/index`
    pub fn bip44(coin_type: u32, account: u32, change: u32, address_index: u32) -> Result<Self> {
        Ok(Self(vec![
            ChildIndex::hardened(BIP44_PURPOSE)?,
            ChildIndex::hardened(coin_type)?,
            ChildIndex::hardened(account)?,
            ChildIndex::normal(change)?,
            ChildIndex::normal(address_index)?,
        ]))
    }

    /// `m/44'/60'/account'/0/address_index`
    pub fn ethereum(account: u32, address_index: u32) -> Result<Self> {
        Self::bip44(ETHEREUM_COIN_TYPE, account, 0, address_index)
    }

    /// `m/44'/60'/0'/0/0`
    pub fn ethereum_default() -> Self {
        Self(vec![
            ChildIndex::from_raw(BIP44_PURPOSE | HARDENED_OFFSET),
            ChildIndex::from_raw(ETHEREUM_COIN_TYPE | HARDENED_OFFSET),
            ChildIndex::from_raw(HARDENED_OFFSET),
            ChildIndex::from_raw(0),
            ChildIndex::from_raw(0),
        ])
    }

    pub fn segments(&self) -> &[ChildIndex] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_hardened(&self) -> bool {
        self.0.iter().any(|c| c.is_hardened())
    }

    pub fn child(&self, index: ChildIndex) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Path without its last segment; `None` for `m`.
    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.to_vec()))
    }
}

impl From<Vec<ChildIndex>> for DerivationPath {
    fn from(segments: Vec<ChildIndex>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut parts = s.split('/');
        match parts.next() {
            Some("m") | Some("M") => {}
            _ => {
                return Err(Error::InvalidPath(format!(
                    "'{}' must start with 'm'",
                    s
                )))
            }
        }
        let segments = parts
            .map(|part| part.trim().parse::<ChildIndex>())
            .collect::<Result<Vec<_>>>()?;
        // Depth is a u8 in the serialized form.
        if segments.len() > u8::MAX as usize {
            return Err(Error::InvalidPath(format!(
                "{} segments exceeds the maximum depth of 255",
                segments.len()
            )));
        }
        Ok(Self(segments))
    }
}

impl Serialize for DerivationPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
