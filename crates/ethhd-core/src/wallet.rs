//! Wallet session and disclosure views
//!
//! A [`Wallet`] owns one mnemonic and its master key for the life of a
//! session and caches derived nodes by path. What leaves the session is
//! split by type:
//!
//! - [`PublicWallet`]: address, public keys, account xpub. `Serialize`.
//! - [`CustodyView`]: mnemonic, private key, xprv. Not `Serialize`, redacted
//!   `Debug`, and only reachable through [`Wallet::custody`], which takes a
//!   [`Disclosure`] value the caller has to construct on purpose.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::entropy::EntropyStrength;
use crate::error::{Error, Result};
use crate::keys::{Address, PrivateKey, Signature};
use crate::mnemonic::Mnemonic;
use crate::path::DerivationPath;
use crate::wordlist::Wordlist;
use crate::xkey::{master_key_from_seed, ExtendedPrivateKey, ExtendedPublicKey, Fingerprint};

/// Inputs to wallet creation and restoration. No ambient state: every
/// option is carried here.
#[derive(Clone)]
pub struct WalletConfig {
    pub strength: EntropyStrength,
    pub passphrase: Zeroizing<String>,
    pub derivation_path: DerivationPath,
    pub wordlist: Wordlist,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            strength: EntropyStrength::default(),
            passphrase: Zeroizing::new(String::new()),
            derivation_path: DerivationPath::ethereum_default(),
            wordlist: Wordlist::english(),
        }
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("strength", &self.strength)
            .field("passphrase", &if self.passphrase.is_empty() { "" } else { "[REDACTED]" })
            .field("derivation_path", &self.derivation_path.to_string())
            .finish_non_exhaustive()
    }
}

/// Explicit acknowledgement that secret material is about to be exposed.
#[derive(Debug, Clone, Copy)]
pub struct Disclosure {
    _acknowledged: (),
}

impl Disclosure {
    pub fn acknowledge_secret_exposure() -> Self {
        Self { _acknowledged: () }
    }
}

/// Everything about a derived account that is safe to print or ship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicWallet {
    pub derivation_path: DerivationPath,
    /// Lowercase hex.
    pub address: String,
    pub checksum_address: Address,
    /// Compressed SEC1, `0x`-prefixed hex.
    pub public_key: String,
    /// Uncompressed SEC1, `0x`-prefixed hex.
    pub public_key_uncompressed: String,
    pub master_fingerprint: String,
    /// Deepest hardened ancestor of `derivation_path` (the master if none).
    pub account_path: DerivationPath,
    pub account_xpub: String,
}

/// Secret material for one derived key. Borrowed from the wallet session.
pub struct CustodyView<'a> {
    mnemonic: &'a Mnemonic,
    derivation_path: DerivationPath,
    key: ExtendedPrivateKey,
}

impl CustodyView<'_> {
    pub fn mnemonic(&self) -> &str {
        self.mnemonic.phrase()
    }

    pub fn derivation_path(&self) -> &DerivationPath {
        &self.derivation_path
    }

    pub fn private_key(&self) -> &PrivateKey {
        self.key.private_key()
    }

    /// `0x`-prefixed hex.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        self.key.private_key().to_hex()
    }

    pub fn xprv(&self) -> Zeroizing<String> {
        self.key.to_xprv()
    }
}

impl fmt::Debug for CustodyView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustodyView")
            .field("derivation_path", &self.derivation_path.to_string())
            .finish_non_exhaustive()
    }
}

/// One mnemonic, its master key and a cache of derived nodes.
///
/// The cache lives and dies with the wallet, so it is never shared between
/// master keys. Derived private nodes never leave the wallet except through
/// [`Wallet::custody_at`]:
///
/// ```compile_fail
/// use ethhd_core::{DerivationPath, Wallet, WalletConfig};
///
/// let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
/// let mut wallet = Wallet::restore(phrase, &WalletConfig::default()).unwrap();
/// let key = wallet.derive(&DerivationPath::ethereum_default()).unwrap();
/// println!("{}", key.private_key().to_hex().as_str());
/// ```
///
/// Public nodes are available freely:
///
/// ```
/// use ethhd_core::{DerivationPath, Wallet, WalletConfig};
///
/// let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
/// let mut wallet = Wallet::restore(phrase, &WalletConfig::default()).unwrap();
/// let xpub = wallet.derive_public(&"m/44'/60'/0'".parse().unwrap()).unwrap();
/// assert!(xpub.to_string().starts_with("xpub"));
/// ```
pub struct Wallet {
    mnemonic: Mnemonic,
    master: ExtendedPrivateKey,
    derivation_path: DerivationPath,
    cache: HashMap<DerivationPath, ExtendedPrivateKey>,
}

impl Wallet {
    /// Generate fresh entropy and build a wallet from it.
    pub fn create(config: &WalletConfig) -> Result<Self> {
        let mnemonic = Mnemonic::generate_in(&config.wordlist, config.strength)?;
        log::info!("created {}-word wallet", mnemonic.word_count());
        Self::from_mnemonic(mnemonic, config)
    }

    /// Rebuild a wallet from an existing mnemonic sentence.
    pub fn restore(phrase: &str, config: &WalletConfig) -> Result<Self> {
        let mnemonic = Mnemonic::parse_in(&config.wordlist, phrase)?;
        log::info!("restored {}-word wallet", mnemonic.word_count());
        Self::from_mnemonic(mnemonic, config)
    }

    fn from_mnemonic(mnemonic: Mnemonic, config: &WalletConfig) -> Result<Self> {
        let seed = mnemonic.to_seed(&config.passphrase);
        let master = master_key_from_seed(&seed)?;
        Ok(Self {
            mnemonic,
            master,
            derivation_path: config.derivation_path.clone(),
            cache: HashMap::new(),
        })
    }

    pub fn master_fingerprint(&self) -> Fingerprint {
        self.master.fingerprint()
    }

    /// The path this wallet was configured with.
    pub fn derivation_path(&self) -> &DerivationPath {
        &self.derivation_path
    }

    /// Public node at `path`, e.g. an account xpub for watch-only use.
    pub fn derive_public(&mut self, path: &DerivationPath) -> Result<ExtendedPublicKey> {
        Ok(self.derive(path)?.to_extended_public_key())
    }

    /// Derive (or fetch from cache) the node at `path`.
    ///
    /// Derivation starts from the deepest cached ancestor, so sibling
    /// addresses under one account share the hardened prefix work.
    fn derive(&mut self, path: &DerivationPath) -> Result<&ExtendedPrivateKey> {
        if path.is_empty() {
            return Ok(&self.master);
        }
        if !self.cache.contains_key(path) {
            let key = self.derive_uncached(path)?;
            self.cache.insert(path.clone(), key);
        }
        Ok(&self.cache[path])
    }

    fn derive_uncached(&self, path: &DerivationPath) -> Result<ExtendedPrivateKey> {
        let segments = path.segments();
        let (start, base) = (1..segments.len())
            .rev()
            .find_map(|len| {
                let prefix = DerivationPath::from(segments[..len].to_vec());
                self.cache.get(&prefix).map(|key| (len, key))
            })
            .unwrap_or((0, &self.master));

        let remainder = DerivationPath::from(segments[start..].to_vec());
        let key = base.derive_path(&remainder).map_err(|e| match e {
            Error::PathSegment { segment, source } => Error::PathSegment {
                segment: segment + start,
                source,
            },
            other => other,
        })?;
        log::debug!("derived {} from cached prefix of depth {}", path, start);
        Ok(key)
    }

    /// Number of cached derived nodes.
    pub fn cached_paths(&self) -> usize {
        self.cache.len()
    }

    /// Public view at the configured path.
    pub fn public_view(&mut self) -> Result<PublicWallet> {
        let path = self.derivation_path.clone();
        self.public_view_at(&path)
    }

    pub fn public_view_at(&mut self, path: &DerivationPath) -> Result<PublicWallet> {
        let account_path = account_path_of(path);
        let account_xpub = self.derive_public(&account_path)?.to_string();

        let public_key = self.derive(path)?.public_key();
        let address = public_key.address();
        Ok(PublicWallet {
            derivation_path: path.clone(),
            address: address.to_lowercase_hex(),
            checksum_address: address,
            public_key: public_key.to_string(),
            public_key_uncompressed: format!(
                "0x{}",
                hex::encode(public_key.serialize_uncompressed())
            ),
            master_fingerprint: self.master_fingerprint().to_string(),
            account_path,
            account_xpub,
        })
    }

    /// Checksummed address at `path`.
    pub fn address_at(&mut self, path: &DerivationPath) -> Result<Address> {
        Ok(self.derive(path)?.public_key().address())
    }

    /// Secret material at the configured path.
    pub fn custody(&mut self, disclosure: Disclosure) -> Result<CustodyView<'_>> {
        let path = self.derivation_path.clone();
        self.custody_at(&path, disclosure)
    }

    pub fn custody_at(
        &mut self,
        path: &DerivationPath,
        _disclosure: Disclosure,
    ) -> Result<CustodyView<'_>> {
        let key = self.derive(path)?.clone();
        log::warn!("secret material for {} disclosed", path);
        Ok(CustodyView {
            mnemonic: &self.mnemonic,
            derivation_path: path.clone(),
            key,
        })
    }

    /// Sign a 32-byte hash with the key at the configured path.
    pub fn sign_hash(&mut self, message_hash: &[u8]) -> Result<Signature> {
        let path = self.derivation_path.clone();
        self.derive(&path)?.private_key().sign(message_hash)
    }

    /// Sign a personal message with the key at the configured path.
    pub fn sign_personal_message(&mut self, message: &[u8]) -> Result<Signature> {
        let path = self.derivation_path.clone();
        Ok(self.derive(&path)?.private_key().sign_personal_message(message))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("master_fingerprint", &self.master_fingerprint())
            .field("derivation_path", &self.derivation_path.to_string())
            .field("cached_paths", &self.cache.len())
            .finish_non_exhaustive()
    }
}

fn account_path_of(path: &DerivationPath) -> DerivationPath {
    let segments = path.segments();
    let end = segments
        .iter()
        .rposition(|c| c.is_hardened())
        .map_or(0, |i| i + 1);
    DerivationPath::from(segments[..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn restore(phrase: &str) -> Wallet {
        Wallet::restore(phrase, &WalletConfig::default()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = WalletConfig::default();
        assert_eq!(config.strength.bits(), 128);
        assert!(config.passphrase.is_empty());
        assert_eq!(config.derivation_path.to_string(), "m/44'/60'/0'/0/0");
    }

    #[test]
    fn test_restore_reference_address() {
        let mut wallet = restore(ABANDON_ABOUT);
        let view = wallet.public_view().unwrap();
        assert_eq!(
            view.checksum_address.to_string(),
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );
        assert_eq!(view.address, "0x9858effd232b4033e47d90003d41ec34ecaeda94");
        assert_eq!(view.account_path.to_string(), "m/44'/60'/0'");
        assert!(view.account_xpub.starts_with("xpub"));
        assert_eq!(view.master_fingerprint, "73c5da0a");
    }

    #[test]
    fn test_public_view_has_no_secrets() {
        let mut wallet = restore(ABANDON_ABOUT);
        let json = serde_json::to_string(&wallet.public_view().unwrap()).unwrap();
        assert!(!json.contains("abandon"));
        assert!(!json.contains("xprv"));
        assert!(!json.contains("1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"));
    }

    #[test]
    fn test_custody_requires_disclosure() {
        let mut wallet = restore(ABANDON_ABOUT);
        let custody = wallet
            .custody(Disclosure::acknowledge_secret_exposure())
            .unwrap();
        assert_eq!(custody.mnemonic(), ABANDON_ABOUT);
        assert_eq!(
            custody.private_key_hex().as_str(),
            "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
        );
        assert!(custody.xprv().starts_with("xprv"));

        let rendered = format!("{:?}", custody);
        assert!(!rendered.contains("abandon"));
        assert!(!rendered.contains("1ab42cc4"));
    }

    #[test]
    fn test_derive_public_matches_custody() {
        let mut wallet = restore(ABANDON_ABOUT);
        let path = DerivationPath::ethereum_default();
        let xpub = wallet.derive_public(&path).unwrap();
        assert_eq!(
            xpub.public_key().address().to_string(),
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );
        assert!(!xpub.to_string().starts_with("xprv"));

        let custody = wallet
            .custody_at(&path, Disclosure::acknowledge_secret_exposure())
            .unwrap();
        assert_eq!(&custody.private_key().public_key(), xpub.public_key());
    }

    #[test]
    fn test_cache_is_consistent_with_fresh_derivation() {
        let mut wallet = restore(ABANDON_ABOUT);
        let path: DerivationPath = "m/44'/60'/0'/0/1".parse().unwrap();
        let first = wallet.derive(&path).unwrap().clone();
        assert_eq!(wallet.cached_paths(), 1);
        let second = wallet.derive(&path).unwrap().clone();
        assert_eq!(first, second);

        let direct = restore(ABANDON_ABOUT).master.derive_path(&path).unwrap();
        assert_eq!(first, direct);
    }

    #[test]
    fn test_derivation_from_cached_ancestor() {
        let mut wallet = restore(ABANDON_ABOUT);
        let account: DerivationPath = "m/44'/60'/0'".parse().unwrap();
        wallet.derive(&account).unwrap();

        let leaf: DerivationPath = "m/44'/60'/0'/0/7".parse().unwrap();
        let via_cache = wallet.derive(&leaf).unwrap().clone();
        let direct = restore(ABANDON_ABOUT).master.derive_path(&leaf).unwrap();
        assert_eq!(via_cache, direct);
        assert_eq!(wallet.cached_paths(), 2);
    }

    #[test]
    fn test_hardened_marker_variants_share_cache_entry() {
        let mut wallet = restore(ABANDON_ABOUT);
        wallet.derive(&"m/44'/60'/0'/0/0".parse().unwrap()).unwrap();
        wallet.derive(&"m/44h/60h/0h/0/0".parse().unwrap()).unwrap();
        assert_eq!(wallet.cached_paths(), 1);
    }

    #[test]
    fn test_cache_not_shared_between_wallets() {
        let mut a = restore(ABANDON_ABOUT);
        let mut b =
            restore("test test test test test test test test test test test junk");
        let path = DerivationPath::ethereum_default();
        assert_ne!(a.address_at(&path).unwrap(), b.address_at(&path).unwrap());
    }

    #[test]
    fn test_passphrase_gives_different_wallet() {
        let config = WalletConfig {
            passphrase: Zeroizing::new("TREZOR".into()),
            ..WalletConfig::default()
        };
        let mut hidden = Wallet::restore(ABANDON_ABOUT, &config).unwrap();
        let mut plain = restore(ABANDON_ABOUT);
        let path = DerivationPath::ethereum_default();
        assert_ne!(hidden.address_at(&path).unwrap(), plain.address_at(&path).unwrap());
    }

    #[test]
    fn test_create_honours_strength() {
        let config = WalletConfig {
            strength: EntropyStrength::Bits256,
            ..WalletConfig::default()
        };
        let mut wallet = Wallet::create(&config).unwrap();
        let custody = wallet
            .custody(Disclosure::acknowledge_secret_exposure())
            .unwrap();
        assert_eq!(custody.mnemonic().split(' ').count(), 24);
    }

    #[test]
    fn test_restore_rejects_bad_mnemonic() {
        let err = Wallet::restore("abandon abandon", &WalletConfig::default()).unwrap_err();
        assert_eq!(err, Error::InvalidWordCount(2));
    }

    #[test]
    fn test_sign_personal_message_recovers_wallet_address() {
        let mut wallet = restore(ABANDON_ABOUT);
        let signature = wallet.sign_personal_message(b"hello").unwrap();
        let address = wallet.public_view().unwrap().checksum_address;
        assert_eq!(signature.recover_personal_message(b"hello").unwrap(), address);

        assert_eq!(
            wallet.sign_hash(&[0u8; 20]).unwrap_err(),
            Error::InvalidMessageHash(20)
        );
    }

    #[test]
    fn test_account_path_of() {
        let cases = [
            ("m/44'/60'/0'/0/0", "m/44'/60'/0'"),
            ("m/0/1", "m"),
            ("m/1'/2", "m/1'"),
            ("m", "m"),
        ];
        for (path, account) in cases {
            assert_eq!(account_path_of(&path.parse().unwrap()).to_string(), account);
        }
    }

    #[test]
    fn test_config_debug_hides_passphrase() {
        let config = WalletConfig {
            passphrase: Zeroizing::new("correct horse".into()),
            ..WalletConfig::default()
        };
        assert!(!format!("{:?}", config).contains("horse"));
    }
}
