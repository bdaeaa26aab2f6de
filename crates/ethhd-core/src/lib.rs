//! ethhd core
//!
//! Hierarchical deterministic key derivation for Ethereum.
//!
//! # Pipeline
//!
//! Entropy → Mnemonic (BIP-39) → Seed → Master key (BIP-32)
//! → `m/44'/60'/0'/0/0` (BIP-44) → Address (EIP-55) / Signature (RFC 6979)
//!
//! Every stage but entropy generation is a pure function of its inputs.
//!
//! # Disclosure
//!
//! [`Wallet::public_view`] returns only public data. Mnemonic and private
//! keys are reachable solely through [`Wallet::custody`].

pub mod entropy;
pub mod error;
pub mod keys;
pub mod memory;
pub mod mnemonic;
pub mod path;
pub mod seed;
pub mod wallet;
pub mod wordlist;
pub mod xkey;

pub use entropy::{Entropy, EntropyStrength};
pub use error::{Error, Result};
pub use keys::{
    address_from, checksummed, hash_personal_message, keccak256, public_key_from, sign,
    sign_personal_message, Address, PrivateKey, PublicKey, Signature,
};
pub use mnemonic::{entropy_to_mnemonic, mnemonic_to_entropy, mnemonic_to_seed, Mnemonic};
pub use path::{ChildIndex, DerivationPath, ETHEREUM_DEFAULT_PATH};
pub use seed::Seed;
pub use wallet::{CustodyView, Disclosure, PublicWallet, Wallet, WalletConfig};
pub use wordlist::Wordlist;
pub use xkey::{
    derive_by_path, derive_child, derive_child_with_retry, master_key_from_seed, ExtendedKey,
    ExtendedPrivateKey, ExtendedPublicKey, Fingerprint,
};
