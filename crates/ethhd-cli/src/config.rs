//! CLI configuration, parsed from a TOML file plus environment overrides.
//!
//! Priority: command line > environment variables > config file > defaults.

use anyhow::{Context, Result};
use ethhd_core::{DerivationPath, EntropyStrength, WalletConfig, Wordlist, ETHEREUM_DEFAULT_PATH};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    /// Key generation and derivation
    #[serde(default)]
    pub wallet: WalletSection,

    /// Logging and report formatting
    #[serde(default)]
    pub output: OutputSection,
}

/// Key generation and derivation settings
#[derive(Clone, Deserialize)]
pub struct WalletSection {
    /// Entropy for new mnemonics: 128, 160, 192, 224 or 256
    #[serde(default = "default_entropy_bits")]
    pub entropy_bits: usize,

    /// BIP-32 path of the reported account
    #[serde(default = "default_derivation_path")]
    pub derivation_path: String,

    /// Alternative 2048-word list, one word per line
    #[serde(default)]
    pub wordlist_path: Option<PathBuf>,

    /// BIP-39 passphrase (empty = none)
    #[serde(default)]
    pub passphrase: String,

    /// Restore from this mnemonic instead of generating one
    #[serde(default)]
    pub mnemonic: Option<String>,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            entropy_bits: default_entropy_bits(),
            derivation_path: default_derivation_path(),
            wordlist_path: None,
            passphrase: String::new(),
            mnemonic: None,
        }
    }
}

impl fmt::Debug for WalletSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSection")
            .field("entropy_bits", &self.entropy_bits)
            .field("derivation_path", &self.derivation_path)
            .field("wordlist_path", &self.wordlist_path)
            .field("passphrase", &redacted(!self.passphrase.is_empty()))
            .field("mnemonic", &redacted(self.mnemonic.is_some()))
            .finish()
    }
}

impl Drop for WalletSection {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.passphrase.zeroize();
        self.mnemonic.zeroize();
    }
}

/// Logging and report settings
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pretty-print the JSON report
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            pretty: default_pretty(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_entropy_bits() -> usize {
    128
}

fn default_derivation_path() -> String {
    ETHEREUM_DEFAULT_PATH.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_pretty() -> bool {
    true
}

fn redacted(present: bool) -> &'static str {
    if present {
        "[REDACTED]"
    } else {
        "<none>"
    }
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

// ============================================================================
// Loading & overrides
// ============================================================================

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Like [`CliConfig::from_file`], but a missing file yields the defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `ETHHD_ENTROPY_BITS`
    /// - `ETHHD_DERIVATION_PATH`
    /// - `ETHHD_WORDLIST`
    /// - `ETHHD_PASSPHRASE`
    /// - `ETHHD_MNEMONIC`
    /// - `ETHHD_LOG_LEVEL`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    pub(crate) fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(v) = lookup("ETHHD_ENTROPY_BITS") {
            self.wallet.entropy_bits = v
                .trim()
                .parse()
                .with_context(|| format!("ETHHD_ENTROPY_BITS is not a number: {}", v))?;
        }
        if let Some(v) = lookup("ETHHD_DERIVATION_PATH") {
            self.wallet.derivation_path = v;
        }
        if let Some(v) = lookup("ETHHD_WORDLIST") {
            self.wallet.wordlist_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ETHHD_PASSPHRASE") {
            self.wallet.passphrase = v;
        }
        if let Some(v) = lookup("ETHHD_MNEMONIC") {
            self.wallet.mnemonic = Some(v);
        }
        if let Some(v) = lookup("ETHHD_LOG_LEVEL") {
            self.output.log_level = v;
        }
        Ok(())
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        EntropyStrength::from_bits(self.wallet.entropy_bits)
            .context("wallet.entropy_bits is invalid")?;

        self.derivation_path()
            .context("wallet.derivation_path is invalid")?;

        if let Some(ref path) = self.wallet.wordlist_path {
            anyhow::ensure!(
                path.is_file(),
                "wallet.wordlist_path does not exist: {}",
                path.display()
            );
        }

        if let Some(ref mnemonic) = self.wallet.mnemonic {
            anyhow::ensure!(
                !mnemonic.trim().is_empty(),
                "wallet.mnemonic must not be empty when set"
            );
        }

        anyhow::ensure!(
            LOG_LEVELS.contains(&self.output.log_level.to_ascii_lowercase().as_str()),
            "output.log_level must be one of {}",
            LOG_LEVELS.join(", ")
        );

        Ok(())
    }

    pub fn derivation_path(&self) -> Result<DerivationPath> {
        Ok(self.wallet.derivation_path.parse()?)
    }

    /// Build the library configuration. Loads the wordlist, so a bad file
    /// fails here, once, before any key material exists.
    pub fn wallet_config(&self) -> Result<WalletConfig> {
        let wordlist = match self.wallet.wordlist_path {
            Some(ref path) => Wordlist::from_file(path)
                .with_context(|| format!("Failed to load wordlist {}", path.display()))?,
            None => Wordlist::english(),
        };
        Ok(WalletConfig {
            strength: EntropyStrength::from_bits(self.wallet.entropy_bits)?,
            passphrase: Zeroizing::new(self.wallet.passphrase.clone()),
            derivation_path: self.derivation_path()?,
            wordlist,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
