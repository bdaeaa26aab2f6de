//! BIP-32 extended keys
//!
//! Master generation, child derivation (private → private, public → public),
//! path walking and the `xprv`/`xpub` Base58Check format.
//!
//! ```text
//! I = HMAC-SHA512(key = c_par, data)
//!   data = 0x00 ‖ k_par ‖ ser32(i)   hardened (i ≥ 2^31)
//!   data = serP(K_par) ‖ ser32(i)    normal
//! k_i = (I_L + k_par) mod n          K_i = I_L·G + K_par
//! c_i = I_R
//! ```
//!
//! Reference: <https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki>

use std::fmt;
use std::str::FromStr;

use bitcoin::hashes::{hash160, sha512, Hash, HashEngine, Hmac, HmacEngine};
use secp256k1::{Scalar, Secp256k1, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Error, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::path::{ChildIndex, DerivationPath};
use crate::seed::Seed;

/// HMAC key for master generation.
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Mainnet `xprv` version bytes.
pub const XPRV_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
/// Mainnet `xpub` version bytes.
pub const XPUB_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];

/// Serialized payload length before the Base58Check checksum.
const SERIALIZED_LEN: usize = 78;

/// 32-byte chain code.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ChainCode(pub [u8; 32]);

impl fmt::Debug for ChainCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChainCode([REDACTED])")
    }
}

/// First four bytes of HASH160 of a compressed public key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 4]);

impl Fingerprint {
    pub fn of(public_key: &PublicKey) -> Self {
        let hash = hash160::Hash::hash(&public_key.serialize()).to_byte_array();
        Self([hash[0], hash[1], hash[2], hash[3]])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// ============================================================================
// Extended private key
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedPrivateKey {
    private_key: PrivateKey,
    chain_code: ChainCode,
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_index: ChildIndex,
}

impl ExtendedPrivateKey {
    /// Master key from a BIP-39 seed. See [`master_key_from_seed`].
    pub fn from_seed(seed: &Seed) -> Result<Self> {
        master_key_from_seed(seed)
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    pub fn chain_code(&self) -> &ChainCode {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> Fingerprint {
        self.parent_fingerprint
    }

    pub fn child_index(&self) -> ChildIndex {
        self.child_index
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.public_key())
    }

    /// Drop the private half.
    pub fn to_extended_public_key(&self) -> ExtendedPublicKey {
        ExtendedPublicKey {
            public_key: self.public_key(),
            chain_code: self.chain_code.clone(),
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_index: self.child_index,
        }
    }

    pub fn derive_child(&self, child: ChildIndex) -> Result<Self> {
        let depth = self.depth.checked_add(1).ok_or(Error::MaxDepthExceeded)?;

        let mut engine = HmacEngine::<sha512::Hash>::new(&self.chain_code.0);
        if child.is_hardened() {
            let secret = self.private_key.to_bytes();
            engine.input(&[0u8]);
            engine.input(&secret[..]);
        } else {
            engine.input(&self.public_key().serialize());
        }
        engine.input(&child.to_raw().to_be_bytes());
        let hmac = Zeroizing::new(Hmac::from_engine(engine).to_byte_array());

        let tweak = scalar_from_il(&hmac, child)?;
        let secret_key = self
            .private_key
            .secret_key()
            .add_tweak(&tweak)
            .map_err(|_| Error::InvalidChildKey {
                index: child.to_raw(),
            })?;

        Ok(Self {
            private_key: PrivateKey::from_secret_key(secret_key),
            chain_code: chain_code_from_ir(&hmac),
            depth,
            parent_fingerprint: self.fingerprint(),
            child_index: child,
        })
    }

    /// Walk `path` from this key. Failures carry the 0-based segment position.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.segments()
            .iter()
            .enumerate()
            .try_fold(self.clone(), |key, (segment, &child)| {
                key.derive_child(child).map_err(|e| Error::PathSegment {
                    segment,
                    source: Box::new(e),
                })
            })
    }

    /// 78-byte BIP-32 serialization with the `xprv` version.
    fn serialize(&self) -> Zeroizing<[u8; SERIALIZED_LEN]> {
        let mut key_data = [0u8; 33];
        key_data[1..].copy_from_slice(&self.private_key.to_bytes()[..]);
        let out = Zeroizing::new(serialize_parts(
            XPRV_VERSION,
            self.depth,
            self.parent_fingerprint,
            self.child_index,
            &self.chain_code,
            &key_data,
        ));
        key_data.zeroize();
        out
    }

    /// Base58Check `xprv…` string.
    pub fn to_xprv(&self) -> Zeroizing<String> {
        Zeroizing::new(bitcoin::base58::encode_check(&self.serialize()[..]))
    }

    pub fn from_xprv(s: &str) -> Result<Self> {
        let data = Zeroizing::new(decode_payload(s)?);
        if data[..4] != XPRV_VERSION {
            return Err(Error::InvalidExtendedKey(format!(
                "expected xprv version, got {}",
                hex::encode(&data[..4])
            )));
        }
        if data[45] != 0 {
            return Err(Error::InvalidExtendedKey(
                "private key data must start with 0x00".into(),
            ));
        }
        let header = Header::parse(&data)?;
        let private_key = PrivateKey::from_bytes(&data[46..78])
            .map_err(|e| Error::InvalidExtendedKey(e.to_string()))?;
        Ok(Self {
            private_key,
            chain_code: header.chain_code,
            depth: header.depth,
            parent_fingerprint: header.parent_fingerprint,
            child_index: header.child_index,
        })
    }
}

impl FromStr for ExtendedPrivateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_xprv(s)
    }
}

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivateKey")
            .field("depth", &self.depth)
            .field("parent_fingerprint", &self.parent_fingerprint)
            .field("child_index", &self.child_index)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Extended public key
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    public_key: PublicKey,
    chain_code: ChainCode,
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_index: ChildIndex,
}

impl ExtendedPublicKey {
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn chain_code(&self) -> &ChainCode {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> Fingerprint {
        self.parent_fingerprint
    }

    pub fn child_index(&self) -> ChildIndex {
        self.child_index
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.public_key)
    }

    /// Public parent → public child. Hardened indices are refused.
    pub fn derive_child(&self, child: ChildIndex) -> Result<Self> {
        if child.is_hardened() {
            return Err(Error::HardenedDerivationRequiresPrivateKey);
        }
        let depth = self.depth.checked_add(1).ok_or(Error::MaxDepthExceeded)?;

        let mut engine = HmacEngine::<sha512::Hash>::new(&self.chain_code.0);
        engine.input(&self.public_key.serialize());
        engine.input(&child.to_raw().to_be_bytes());
        let hmac = Hmac::from_engine(engine).to_byte_array();

        let tweak = scalar_from_il(&hmac, child)?;
        let secp = Secp256k1::verification_only();
        let public_key = self
            .public_key
            .inner()
            .add_exp_tweak(&secp, &tweak)
            .map_err(|_| Error::InvalidChildKey {
                index: child.to_raw(),
            })?;

        Ok(Self {
            public_key: PublicKey::from_inner(public_key),
            chain_code: chain_code_from_ir(&hmac),
            depth,
            parent_fingerprint: self.fingerprint(),
            child_index: child,
        })
    }

    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.segments()
            .iter()
            .enumerate()
            .try_fold(self.clone(), |key, (segment, &child)| {
                key.derive_child(child).map_err(|e| Error::PathSegment {
                    segment,
                    source: Box::new(e),
                })
            })
    }

    fn serialize(&self) -> [u8; SERIALIZED_LEN] {
        serialize_parts(
            XPUB_VERSION,
            self.depth,
            self.parent_fingerprint,
            self.child_index,
            &self.chain_code,
            &self.public_key.serialize(),
        )
    }
}

impl fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bitcoin::base58::encode_check(&self.serialize()))
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let data = decode_payload(s)?;
        if data[..4] != XPUB_VERSION {
            return Err(Error::InvalidExtendedKey(format!(
                "expected xpub version, got {}",
                hex::encode(&data[..4])
            )));
        }
        let header = Header::parse(&data)?;
        let public_key = PublicKey::from_slice(&data[45..78])
            .map_err(|e| Error::InvalidExtendedKey(e.to_string()))?;
        Ok(Self {
            public_key,
            chain_code: header.chain_code,
            depth: header.depth,
            parent_fingerprint: header.parent_fingerprint,
            child_index: header.child_index,
        })
    }
}

// ============================================================================
// Either kind
// ============================================================================

/// A node of the key tree, with or without its private half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedKey {
    Private(ExtendedPrivateKey),
    Public(ExtendedPublicKey),
}

impl ExtendedKey {
    pub fn depth(&self) -> u8 {
        match self {
            Self::Private(k) => k.depth(),
            Self::Public(k) => k.depth(),
        }
    }

    pub fn child_index(&self) -> ChildIndex {
        match self {
            Self::Private(k) => k.child_index(),
            Self::Public(k) => k.child_index(),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Private(k) => k.public_key(),
            Self::Public(k) => *k.public_key(),
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.public_key())
    }

    pub fn is_private(&self) -> bool {
        matches!(self, Self::Private(_))
    }

    pub fn as_private(&self) -> Option<&ExtendedPrivateKey> {
        match self {
            Self::Private(k) => Some(k),
            Self::Public(_) => None,
        }
    }

    /// Neutered copy; a public key is returned unchanged.
    pub fn to_public(&self) -> ExtendedPublicKey {
        match self {
            Self::Private(k) => k.to_extended_public_key(),
            Self::Public(k) => k.clone(),
        }
    }

    pub fn derive_child(&self, child: ChildIndex) -> Result<Self> {
        match self {
            Self::Private(k) => k.derive_child(child).map(Self::Private),
            Self::Public(k) => k.derive_child(child).map(Self::Public),
        }
    }
}

impl From<ExtendedPrivateKey> for ExtendedKey {
    fn from(key: ExtendedPrivateKey) -> Self {
        Self::Private(key)
    }
}

impl From<ExtendedPublicKey> for ExtendedKey {
    fn from(key: ExtendedPublicKey) -> Self {
        Self::Public(key)
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Master extended private key: I = HMAC-SHA512("Bitcoin seed", seed).
///
/// Fails if I_L is zero or not below the curve order; such a seed has no
/// usable master key (probability below 2^-127).
pub fn master_key_from_seed(seed: &Seed) -> Result<ExtendedPrivateKey> {
    let mut engine = HmacEngine::<sha512::Hash>::new(MASTER_HMAC_KEY);
    engine.input(seed.as_bytes());
    let hmac = Zeroizing::new(Hmac::from_engine(engine).to_byte_array());

    let secret_key = SecretKey::from_slice(&hmac[..32])
        .map_err(|e| Error::InvalidPrivateKey(format!("master key: {}", e)))?;

    let master = ExtendedPrivateKey {
        private_key: PrivateKey::from_secret_key(secret_key),
        chain_code: chain_code_from_ir(&hmac),
        depth: 0,
        parent_fingerprint: Fingerprint::default(),
        child_index: ChildIndex::from_raw(0),
    };
    log::debug!("master key generated, fingerprint {}", master.fingerprint());
    Ok(master)
}

/// One derivation step. `hardened` sets bit 31 of `index`.
pub fn derive_child(parent: &ExtendedKey, index: u32, hardened: bool) -> Result<ExtendedKey> {
    parent.derive_child(ChildIndex::new(index, hardened)?)
}

/// Walk `path` from `master`.
///
/// A failure at any step aborts the walk and is reported as
/// [`Error::PathSegment`] with the 0-based position of the failing segment.
/// Indices are never silently skipped; see [`derive_child_with_retry`].
pub fn derive_by_path(master: &ExtendedKey, path: &DerivationPath) -> Result<ExtendedKey> {
    let key = match master {
        ExtendedKey::Private(k) => k.derive_path(path).map(ExtendedKey::Private),
        ExtendedKey::Public(k) => k.derive_path(path).map(ExtendedKey::Public),
    };
    match &key {
        Ok(_) => log::debug!("derived {} (depth {})", path, path.len()),
        Err(e) => log::debug!("derivation of {} failed: {}", path, e),
    }
    key
}

/// Derive `child`, moving on to the next index of the same kind each time
/// BIP-32 declares the key invalid. Returns the key and the index actually
/// used, which the caller must record.
pub fn derive_child_with_retry(
    parent: &ExtendedKey,
    child: ChildIndex,
) -> Result<(ExtendedKey, ChildIndex)> {
    retry_invalid_child(child, |c| parent.derive_child(c))
}

fn retry_invalid_child<T>(
    start: ChildIndex,
    mut derive: impl FnMut(ChildIndex) -> Result<T>,
) -> Result<(T, ChildIndex)> {
    let mut child = start;
    loop {
        match derive(child) {
            Ok(key) => return Ok((key, child)),
            Err(e) if e.is_retryable() => {
                log::warn!("child {} is invalid, trying the next index", child);
                child = child.next().ok_or(e)?;
            }
            Err(e) => return Err(e),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn scalar_from_il(hmac: &[u8; 64], child: ChildIndex) -> Result<Scalar> {
    let mut il = Zeroizing::new([0u8; 32]);
    il.copy_from_slice(&hmac[..32]);
    Scalar::from_be_bytes(*il).map_err(|_| Error::InvalidChildKey {
        index: child.to_raw(),
    })
}

fn chain_code_from_ir(hmac: &[u8; 64]) -> ChainCode {
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&hmac[32..]);
    ChainCode(chain_code)
}

fn serialize_parts(
    version: [u8; 4],
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_index: ChildIndex,
    chain_code: &ChainCode,
    key_data: &[u8; 33],
) -> [u8; SERIALIZED_LEN] {
    let mut out = [0u8; SERIALIZED_LEN];
    out[0..4].copy_from_slice(&version);
    out[4] = depth;
    out[5..9].copy_from_slice(&parent_fingerprint.0);
    out[9..13].copy_from_slice(&child_index.to_raw().to_be_bytes());
    out[13..45].copy_from_slice(&chain_code.0);
    out[45..78].copy_from_slice(key_data);
    out
}

fn decode_payload(s: &str) -> Result<Vec<u8>> {
    let data = bitcoin::base58::decode_check(s.trim())
        .map_err(|e| Error::InvalidExtendedKey(e.to_string()))?;
    if data.len() != SERIALIZED_LEN {
        return Err(Error::InvalidExtendedKey(format!(
            "expected {} bytes, got {}",
            SERIALIZED_LEN,
            data.len()
        )));
    }
    Ok(data)
}

/// Fields shared by both serialized forms, with BIP-32's consistency checks.
struct Header {
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_index: ChildIndex,
    chain_code: ChainCode,
}

impl Header {
    fn parse(data: &[u8]) -> Result<Self> {
        let depth = data[4];
        let parent_fingerprint = Fingerprint([data[5], data[6], data[7], data[8]]);
        let child_index =
            ChildIndex::from_raw(u32::from_be_bytes([data[9], data[10], data[11], data[12]]));

        if depth == 0 && parent_fingerprint != Fingerprint::default() {
            return Err(Error::InvalidExtendedKey(
                "zero depth with non-zero parent fingerprint".into(),
            ));
        }
        if depth == 0 && child_index.to_raw() != 0 {
            return Err(Error::InvalidExtendedKey(
                "zero depth with non-zero child index".into(),
            ));
        }

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);
        Ok(Self {
            depth,
            parent_fingerprint,
            child_index,
            chain_code: ChainCode(chain_code),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::bip32::{Xpriv, Xpub};
    use bitcoin::NetworkKind;

    fn vector1_master() -> ExtendedPrivateKey {
        master_from_raw_seed(&hex::decode("000102030405060708090a0b0c0d0e0f").unwrap())
    }

    /// Master key from a seed of arbitrary length (BIP-32 vectors are not 64 bytes).
    fn master_from_raw_seed(seed: &[u8]) -> ExtendedPrivateKey {
        let mut engine = HmacEngine::<sha512::Hash>::new(MASTER_HMAC_KEY);
        engine.input(seed);
        let hmac = Hmac::from_engine(engine).to_byte_array();
        ExtendedPrivateKey {
            private_key: PrivateKey::from_bytes(&hmac[..32]).unwrap(),
            chain_code: chain_code_from_ir(&hmac),
            depth: 0,
            parent_fingerprint: Fingerprint::default(),
            child_index: ChildIndex::from_raw(0),
        }
    }

    #[test]
    fn test_bip32_vector1_master() {
        let master = vector1_master();
        assert_eq!(
            master.to_xprv().as_str(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            master.to_extended_public_key().to_string(),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
        assert_eq!(master.fingerprint().to_string(), "3442193e");
    }

    #[test]
    fn test_bip32_vector1_hardened_child() {
        let child = vector1_master()
            .derive_child(ChildIndex::hardened(0).unwrap())
            .unwrap();
        assert_eq!(
            child.to_xprv().as_str(),
            "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7"
        );
        assert_eq!(
            child.to_extended_public_key().to_string(),
            "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw"
        );
        assert_eq!(child.depth(), 1);
        assert_eq!(child.parent_fingerprint().to_string(), "3442193e");
    }

    #[test]
    fn test_matches_bitcoin_bip32() {
        let seed = [0x5Cu8; 64];
        let ours = master_key_from_seed(&Seed::from_bytes(seed)).unwrap();
        let reference = Xpriv::new_master(NetworkKind::Main, &seed).unwrap();
        assert_eq!(ours.to_xprv().as_str(), reference.to_string());

        let secp = bitcoin::secp256k1::Secp256k1::new();
        for path in ["m/44'/60'/0'/0/0", "m/0/1/2'/3", "m/2147483647'/1"] {
            let ours = ours.derive_path(&path.parse().unwrap()).unwrap();
            let bpath: bitcoin::bip32::DerivationPath = path.parse().unwrap();
            let reference = reference.derive_priv(&secp, &bpath).unwrap();
            assert_eq!(ours.to_xprv().as_str(), reference.to_string(), "{}", path);
            assert_eq!(
                ours.to_extended_public_key().to_string(),
                Xpub::from_priv(&secp, &reference).to_string()
            );
        }
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let master = master_key_from_seed(&Seed::from_bytes([7u8; 64])).unwrap();
        let account = master
            .derive_path(&"m/44'/60'/0'".parse().unwrap())
            .unwrap();
        let relative: DerivationPath = "m/0/5".parse().unwrap();

        let via_private = account.derive_path(&relative).unwrap();
        let via_public = account
            .to_extended_public_key()
            .derive_path(&relative)
            .unwrap();
        assert_eq!(via_private.to_extended_public_key(), via_public);
    }

    #[test]
    fn test_hardened_from_public_fails() {
        let master = master_key_from_seed(&Seed::from_bytes([7u8; 64])).unwrap();
        let xpub = ExtendedKey::Public(master.to_extended_public_key());
        assert_eq!(
            derive_child(&xpub, 0, true).unwrap_err(),
            Error::HardenedDerivationRequiresPrivateKey
        );

        let err = derive_by_path(&xpub, &"m/0/1'".parse().unwrap()).unwrap_err();
        assert_eq!(
            err,
            Error::PathSegment {
                segment: 1,
                source: Box::new(Error::HardenedDerivationRequiresPrivateKey)
            }
        );
        assert_eq!(err.root(), &Error::HardenedDerivationRequiresPrivateKey);
    }

    #[test]
    fn test_max_depth_exceeded() {
        let master = ExtendedKey::Private(
            master_key_from_seed(&Seed::from_bytes([9u8; 64])).unwrap(),
        );
        let deepest = DerivationPath::from(vec![ChildIndex::from_raw(0); 255]);
        let key = derive_by_path(&master, &deepest).unwrap();
        assert_eq!(key.depth(), 255);

        assert_eq!(derive_child(&key, 0, false).unwrap_err(), Error::MaxDepthExceeded);
        let too_deep = deepest.child(ChildIndex::from_raw(0));
        let err = derive_by_path(&master, &too_deep).unwrap_err();
        assert!(matches!(err, Error::PathSegment { segment: 255, .. }));
        assert_eq!(err.root(), &Error::MaxDepthExceeded);
    }

    #[test]
    fn test_empty_path_returns_master() {
        let master = ExtendedKey::Private(
            master_key_from_seed(&Seed::from_bytes([3u8; 64])).unwrap(),
        );
        assert_eq!(
            derive_by_path(&master, &DerivationPath::master()).unwrap(),
            master
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let path: DerivationPath = "m/44'/60'/0'/0/3".parse().unwrap();
        let a = master_key_from_seed(&Seed::from_bytes([1u8; 64]))
            .unwrap()
            .derive_path(&path)
            .unwrap();
        let b = master_key_from_seed(&Seed::from_bytes([1u8; 64]))
            .unwrap()
            .derive_path(&path)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.child_index().to_raw(), 3);
    }

    #[test]
    fn test_il_at_curve_order_is_invalid_child() {
        let mut hmac = [0u8; 64];
        hmac[..32].copy_from_slice(&[
            0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFF, 0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C,
            0xD0, 0x36, 0x41, 0x41,
        ]);
        let child = ChildIndex::normal(9).unwrap();
        assert_eq!(
            scalar_from_il(&hmac, child).unwrap_err(),
            Error::InvalidChildKey { index: 9 }
        );
    }

    #[test]
    fn test_retry_moves_to_next_index() {
        let start = ChildIndex::hardened(4).unwrap();
        let (value, used) = retry_invalid_child(start, |c| {
            if c.index() < 6 {
                Err(Error::InvalidChildKey { index: c.to_raw() })
            } else {
                Ok(c.index())
            }
        })
        .unwrap();
        assert_eq!(value, 6);
        assert_eq!(used, ChildIndex::hardened(6).unwrap());
    }

    #[test]
    fn test_retry_does_not_swallow_other_errors() {
        let result: Result<((), ChildIndex)> =
            retry_invalid_child(ChildIndex::normal(0).unwrap(), |_| {
                Err(Error::MaxDepthExceeded)
            });
        assert_eq!(result.unwrap_err(), Error::MaxDepthExceeded);
    }

    #[test]
    fn test_retry_with_valid_child_keeps_index() {
        let master = ExtendedKey::Private(
            master_key_from_seed(&Seed::from_bytes([2u8; 64])).unwrap(),
        );
        let child = ChildIndex::normal(11).unwrap();
        let (key, used) = derive_child_with_retry(&master, child).unwrap();
        assert_eq!(used, child);
        assert_eq!(key, master.derive_child(child).unwrap());
    }

    #[test]
    fn test_xprv_xpub_parse_roundtrip() {
        let key = master_key_from_seed(&Seed::from_bytes([4u8; 64]))
            .unwrap()
            .derive_path(&"m/44'/60'/0'".parse().unwrap())
            .unwrap();
        let xprv = key.to_xprv();
        assert_eq!(ExtendedPrivateKey::from_xprv(&xprv).unwrap(), key);

        let xpub = key.to_extended_public_key();
        assert_eq!(xpub.to_string().parse::<ExtendedPublicKey>().unwrap(), xpub);

        // Kind mismatch.
        assert!(xpub.to_string().parse::<ExtendedPrivateKey>().is_err());
        assert!(ExtendedPrivateKey::from_xprv(&xpub.to_string()).is_err());
    }

    #[test]
    fn test_rejects_corrupt_extended_keys() {
        let xpub = vector1_master().to_extended_public_key().to_string();
        let mut corrupted = xpub.clone().into_bytes();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == b'8' { b'9' } else { b'8' };
        let corrupted = String::from_utf8(corrupted).unwrap();
        assert!(matches!(
            corrupted.parse::<ExtendedPublicKey>(),
            Err(Error::InvalidExtendedKey(_))
        ));
        assert!("xpub".parse::<ExtendedPublicKey>().is_err());
        assert!("".parse::<ExtendedPublicKey>().is_err());
    }

    #[test]
    fn test_rejects_zero_depth_with_parent() {
        let mut payload = vector1_master().to_extended_public_key().serialize();
        payload[5] = 1;
        let s = bitcoin::base58::encode_check(&payload);
        assert!(matches!(
            s.parse::<ExtendedPublicKey>(),
            Err(Error::InvalidExtendedKey(_))
        ));
    }

    #[test]
    fn test_private_debug_redacted() {
        let rendered = format!("{:?}", vector1_master());
        assert!(!rendered.contains("xprv"));
        assert!(rendered.contains("depth"));
    }
}
