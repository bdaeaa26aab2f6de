//! Key material: secp256k1 keys, Ethereum addresses and signatures
//!
//! - address = Keccak-256(x ‖ y)[12..] of the uncompressed public key
//! - checksummed text form per EIP-55
//! - ECDSA with RFC 6979 nonces (libsecp256k1), low-S, with recovery id
//!
//! Signing a raw 32-byte hash ([`sign`]) and signing a human message
//! ([`sign_personal_message`]) are separate entry points so a transaction
//! hash can never be signed under the message prefix or vice versa.

use std::fmt;
use std::str::FromStr;

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

pub const PRIVATE_KEY_LEN: usize = 32;
pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;
pub const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;
pub const ADDRESS_LEN: usize = 20;
pub const SIGNATURE_LEN: usize = 65;

const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Keccak-256 (the pre-standard SHA-3 variant Ethereum uses).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// EIP-191 version 0x45 hash: Keccak-256("\x19Ethereum Signed Message:\n" ‖ len ‖ message).
pub fn hash_personal_message(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

// ============================================================================
// Private key
// ============================================================================

/// A secp256k1 private scalar. Erased on drop; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| Error::InvalidPrivateKey(e.to_string()))
    }

    /// Parse 64 hex characters, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = Zeroizing::new(
            hex::decode(s).map_err(|e| Error::InvalidPrivateKey(e.to_string()))?,
        );
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_secret_key(secret_key: SecretKey) -> Self {
        Self(secret_key)
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.0
    }

    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_LEN]> {
        Zeroizing::new(self.0.secret_bytes())
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(*self.to_bytes())))
    }

    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::signing_only();
        PublicKey(self.0.public_key(&secp))
    }

    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign a 32-byte hash. See [`sign`].
    pub fn sign(&self, message_hash: &[u8]) -> Result<Signature> {
        sign(self, message_hash)
    }

    /// Sign a message under the Ethereum personal-message prefix.
    pub fn sign_personal_message(&self, message: &[u8]) -> Signature {
        sign_personal_message(self, message)
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.0.non_secure_erase();
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

// ============================================================================
// Public key
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(secp256k1::PublicKey);

impl PublicKey {
    /// Parse a 33-byte compressed or 65-byte uncompressed SEC1 encoding.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        secp256k1::PublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| Error::InvalidPublicKey(e.to_string()))
    }

    pub(crate) fn from_inner(inner: secp256k1::PublicKey) -> Self {
        Self(inner)
    }

    pub(crate) fn inner(&self) -> &secp256k1::PublicKey {
        &self.0
    }

    pub fn serialize(&self) -> [u8; COMPRESSED_PUBLIC_KEY_LEN] {
        self.0.serialize()
    }

    pub fn serialize_uncompressed(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_LEN] {
        self.0.serialize_uncompressed()
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl fmt::Display for PublicKey {
    /// `0x`-prefixed compressed encoding.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.serialize()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| Error::InvalidPublicKey(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Address
// ============================================================================

/// A 20-byte Ethereum account address. Displays in EIP-55 checksummed form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let uncompressed = public_key.serialize_uncompressed();
        // Drop the 0x04 SEC1 tag; hash x ‖ y.
        let hash = keccak256(&uncompressed[1..]);
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// `0x` + 40 lowercase hex digits.
    pub fn to_lowercase_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(2 + lower.len());
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Accepts `0x` + 40 hex digits. Mixed case must be a valid EIP-55
    /// checksum; all-lowercase or all-uppercase input carries no checksum.
    fn from_str(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| Error::InvalidAddress(format!("missing 0x prefix: {}", s)))?;
        if digits.len() != ADDRESS_LEN * 2 {
            return Err(Error::InvalidAddress(format!(
                "expected 40 hex digits, got {}",
                digits.len()
            )));
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| Error::InvalidAddress(e.to_string()))?;
        let address = Self(bytes);

        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && address.to_checksum()[2..] != *digits {
            return Err(Error::InvalidAddress(format!(
                "EIP-55 checksum mismatch: {}",
                s
            )));
        }
        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Signature
// ============================================================================

/// A recoverable ECDSA signature over secp256k1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
    /// Always 0..=3.
    recovery_id: u8,
}

impl Signature {
    /// Assemble from components. `recovery_id` must be 0..=3.
    pub fn new(r: [u8; 32], s: [u8; 32], recovery_id: u8) -> Result<Self> {
        if recovery_id > 3 {
            return Err(Error::InvalidSignature(format!(
                "invalid recovery id {}",
                recovery_id
            )));
        }
        Ok(Self { r, s, recovery_id })
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// 0 or 1 (2/3 only if r overflowed the field order, never seen in practice).
    pub fn recovery_id(&self) -> u8 {
        self.recovery_id
    }

    /// Ethereum `v` value: 27 + recovery id.
    pub fn v(&self) -> u8 {
        27 + self.recovery_id
    }

    /// `r ‖ s ‖ v` with `v = 27 + recovery id`.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v();
        out
    }

    /// Parse `r ‖ s ‖ v`; `v` may be 0/1 or 27/28.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(Error::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            )));
        }
        let recovery_id = match bytes[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            v => {
                return Err(Error::InvalidSignature(format!(
                    "invalid recovery byte {}",
                    v
                )))
            }
        };
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, recovery_id })
    }

    /// `0x`-prefixed hex of [`Signature::to_bytes`].
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Recover the signer's public key from a 32-byte hash.
    pub fn recover(&self, message_hash: &[u8]) -> Result<PublicKey> {
        let message = Message::from_digest(digest_of(message_hash)?);
        let recovery_id = RecoveryId::from_i32(self.recovery_id as i32)
            .map_err(|e| Error::InvalidSignature(e.to_string()))?;
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);
        let signature = RecoverableSignature::from_compact(&compact, recovery_id)
            .map_err(|e| Error::InvalidSignature(e.to_string()))?;

        let secp = Secp256k1::verification_only();
        secp.recover_ecdsa(&message, &signature)
            .map(PublicKey)
            .map_err(|e| Error::InvalidSignature(e.to_string()))
    }

    pub fn recover_address(&self, message_hash: &[u8]) -> Result<Address> {
        Ok(self.recover(message_hash)?.address())
    }

    /// Recover the signer of a personal message.
    pub fn recover_personal_message(&self, message: &[u8]) -> Result<Address> {
        self.recover_address(&hash_personal_message(message))
    }
}

fn digest_of(message_hash: &[u8]) -> Result<[u8; 32]> {
    message_hash
        .try_into()
        .map_err(|_| Error::InvalidMessageHash(message_hash.len()))
}

// ============================================================================
// Operations
// ============================================================================

/// Compressed public key of a private key.
pub fn public_key_from(private_key: &PrivateKey) -> PublicKey {
    private_key.public_key()
}

pub fn address_from(public_key: &PublicKey) -> Address {
    Address::from_public_key(public_key)
}

/// EIP-55 text form of an address.
pub fn checksummed(address: &Address) -> String {
    address.to_checksum()
}

/// Sign a 32-byte hash (e.g. a transaction signing hash) with an RFC 6979
/// deterministic nonce. Fails with [`Error::InvalidMessageHash`] for any
/// other length.
pub fn sign(private_key: &PrivateKey, message_hash: &[u8]) -> Result<Signature> {
    Ok(sign_digest(private_key, digest_of(message_hash)?))
}

/// Sign an arbitrary message under the Ethereum personal-message prefix.
pub fn sign_personal_message(private_key: &PrivateKey, message: &[u8]) -> Signature {
    sign_digest(private_key, hash_personal_message(message))
}

fn sign_digest(private_key: &PrivateKey, digest: [u8; 32]) -> Signature {
    let message = Message::from_digest(digest);
    let secp = Secp256k1::signing_only();
    let signature = secp.sign_ecdsa_recoverable(&message, private_key.secret_key());
    let (recovery_id, compact) = signature.serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);
    Signature {
        r,
        s,
        // libsecp256k1 only produces ids 0..=3
        recovery_id: recovery_id.to_i32() as u8,
    }
}
