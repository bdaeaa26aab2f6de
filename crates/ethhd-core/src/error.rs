//! Error taxonomy for the derivation engine.
//!
//! Every failure is a value. Nothing here is ever downgraded to a
//! best-effort fallback; the only error with a retry policy is
//! [`Error::InvalidChildKey`] (see [`crate::xkey::derive_child_with_retry`]).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Secure randomness unavailable: {0}")]
    InsufficientRandomness(String),

    #[error("Unsupported entropy length: {0} bits (expected 128, 160, 192, 224 or 256)")]
    InvalidEntropyLength(usize),

    #[error("Invalid mnemonic word count: {0} (expected 12, 15, 18, 21 or 24)")]
    InvalidWordCount(usize),

    #[error("Word #{position} is not in the wordlist: {word}")]
    InvalidWord { position: usize, word: String },

    #[error("Mnemonic checksum mismatch")]
    InvalidChecksum,

    #[error("Wordlist unavailable: {0}")]
    WordlistUnavailable(String),

    #[error("Hardened derivation requires a private extended key")]
    HardenedDerivationRequiresPrivateKey,

    /// I_L >= n or the resulting key is zero/infinity. Retry with the next index.
    #[error("Invalid child key at index {index}")]
    InvalidChildKey { index: u32 },

    #[error("Maximum derivation depth (255) exceeded")]
    MaxDepthExceeded,

    #[error("Invalid message hash: expected 32 bytes, got {0}")]
    InvalidMessageHash(usize),

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Invalid extended key: {0}")]
    InvalidExtendedKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// A path derivation aborted at `segment` (0-based position after `m`).
    #[error("Derivation failed at path segment {segment}: {source}")]
    PathSegment {
        segment: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The originating error, looking through any [`Error::PathSegment`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::PathSegment { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether BIP32 allows retrying this failure with the next child index.
    pub fn is_retryable(&self) -> bool {
        matches!(self.root(), Error::InvalidChildKey { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
