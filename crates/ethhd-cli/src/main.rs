//! ethhd — Ethereum HD wallet generator
//!
//! Generates a fresh BIP-39 wallet (or restores one), derives the configured
//! BIP-44 path and prints a JSON report with the address and public keys.
//! Mnemonic and private key are printed only with `--reveal-secrets`.
//!
//! # Usage
//!
//! ```bash
//! ethhd                                  # new 12-word wallet, m/44'/60'/0'/0/0
//! ethhd --bits 256 --path "m/44'/60'/0'/0/1"
//! ETHHD_MNEMONIC="..." ethhd --sign-message "hello"
//! ethhd --config ethhd.toml --validate
//! ```

mod config;
mod report;

use anyhow::{Context, Result};
use ethhd_core::{Disclosure, Wallet};
use std::path::PathBuf;

use report::Origin;

/// Command-line flags. Each set flag overrides env and config file.
#[derive(Default)]
struct Args {
    config_path: Option<PathBuf>,
    mnemonic: Option<String>,
    derivation_path: Option<String>,
    entropy_bits: Option<usize>,
    wordlist_path: Option<PathBuf>,
    sign_message: Option<String>,
    reveal_secrets: bool,
    compact: bool,
    validate_only: bool,
}

const DEFAULT_CONFIG_PATH: &str = "ethhd.toml";

fn main() -> Result<()> {
    // Keep seeds and keys out of core files.
    ethhd_core::memory::disable_core_dumps();

    let args = match parse_args(std::env::args().skip(1))? {
        Some(args) => args,
        None => return Ok(()),
    };

    let config_path = args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    // An explicitly named config file must exist; the default one may not.
    let mut cli_config = if args.config_path.is_some() {
        config::CliConfig::from_file(&config_path)
    } else {
        config::CliConfig::from_file_or_default(&config_path)
    }
    .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    cli_config.apply_env_overrides()?;
    apply_args(&mut cli_config, &args);

    cli_config
        .validate()
        .context("Configuration validation failed")?;

    env_logger::Builder::new()
        .parse_filters(&cli_config.output.log_level)
        .init();

    if args.validate_only {
        println!("✅ Configuration is valid.");
        println!("  Entropy:       {} bits", cli_config.wallet.entropy_bits);
        println!("  Path:          {}", cli_config.derivation_path()?);
        println!(
            "  Wordlist:      {}",
            cli_config
                .wallet
                .wordlist_path
                .as_ref()
                .map_or_else(|| "english (built-in)".to_string(), |p| p.display().to_string())
        );
        println!(
            "  Passphrase:    {}",
            if cli_config.wallet.passphrase.is_empty() { "none" } else { "set" }
        );
        println!(
            "  Mode:          {}",
            if cli_config.wallet.mnemonic.is_some() { "restore" } else { "generate" }
        );
        return Ok(());
    }

    let wallet_config = cli_config.wallet_config()?;
    let (mut wallet, origin) = match cli_config.wallet.mnemonic {
        Some(ref phrase) => (
            Wallet::restore(phrase, &wallet_config).context("Failed to restore wallet")?,
            Origin::Restored,
        ),
        None => (
            Wallet::create(&wallet_config).context("Failed to create wallet")?,
            Origin::Generated,
        ),
    };
    log::info!(
        "wallet ready, master fingerprint {}",
        wallet.master_fingerprint()
    );

    let disclosure = args
        .reveal_secrets
        .then(Disclosure::acknowledge_secret_exposure);
    if disclosure.is_some() {
        log::warn!("--reveal-secrets set: mnemonic and private key will be printed");
    }

    let report = report::build(
        &mut wallet,
        origin,
        args.sign_message.as_deref(),
        disclosure,
    )?;
    let pretty = cli_config.output.pretty && !args.compact;
    let json = report::render(&report, pretty)?;
    println!("{}", json.as_str());

    Ok(())
}

/// Parse flags (minimal, no clap). `Ok(None)` means help/version was printed.
fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut args = Args::default();

    while let Some(arg) = argv.next() {
        let mut value = |flag: &str| {
            argv.next()
                .with_context(|| format!("{} requires an argument", flag))
        };
        match arg.as_str() {
            "--config" | "-c" => args.config_path = Some(PathBuf::from(value(&arg)?)),
            "--mnemonic" | "-m" => args.mnemonic = Some(value(&arg)?),
            "--path" | "-p" => args.derivation_path = Some(value(&arg)?),
            "--bits" | "-b" => {
                let v = value(&arg)?;
                args.entropy_bits = Some(
                    v.parse()
                        .with_context(|| format!("--bits expects a number, got {}", v))?,
                );
            }
            "--wordlist" => args.wordlist_path = Some(PathBuf::from(value(&arg)?)),
            "--sign-message" => args.sign_message = Some(value(&arg)?),
            "--reveal-secrets" => args.reveal_secrets = true,
            "--compact" => args.compact = true,
            "--validate" => args.validate_only = true,
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--version" | "-V" => {
                println!("ethhd {}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(Some(args))
}

fn apply_args(config: &mut config::CliConfig, args: &Args) {
    if let Some(ref v) = args.mnemonic {
        config.wallet.mnemonic = Some(v.clone());
    }
    if let Some(ref v) = args.derivation_path {
        config.wallet.derivation_path = v.clone();
    }
    if let Some(v) = args.entropy_bits {
        config.wallet.entropy_bits = v;
    }
    if let Some(ref v) = args.wordlist_path {
        config.wallet.wordlist_path = Some(v.clone());
    }
}

fn print_help() {
    println!(
        r#"ethhd — Ethereum HD wallet generator (BIP-32/39/44)

USAGE:
    ethhd [OPTIONS]

OPTIONS:
    -c, --config <PATH>      Config file path (default: ./ethhd.toml, optional)
    -m, --mnemonic <WORDS>   Restore from a mnemonic instead of generating one
    -p, --path <PATH>        Derivation path (default: m/44'/60'/0'/0/0)
    -b, --bits <N>           Entropy for new wallets: 128/160/192/224/256
        --wordlist <PATH>    2048-word list file (default: built-in English)
        --sign-message <MSG> Sign MSG with the derived key (personal_sign)
        --reveal-secrets     Include mnemonic, private key and xprv in the output
        --compact            Single-line JSON
        --validate           Validate configuration and exit
    -h, --help               Show this message
    -V, --version            Show version

ENVIRONMENT VARIABLES (override config file):
    ETHHD_ENTROPY_BITS       Entropy bits for new wallets
    ETHHD_DERIVATION_PATH    Derivation path
    ETHHD_WORDLIST           Wordlist file
    ETHHD_PASSPHRASE         BIP-39 passphrase
    ETHHD_MNEMONIC           Mnemonic to restore (preferred over --mnemonic,
                             which is visible in the process list)
    ETHHD_LOG_LEVEL          Log level (error/warn/info/debug/trace)

EXAMPLES:
    # New wallet, public report only
    ethhd

    # Restore and derive the second account address
    ETHHD_MNEMONIC="test test ... junk" ethhd --path "m/44'/60'/0'/0/1"

    # Back up a new 24-word wallet (prints secrets!)
    ethhd --bits 256 --reveal-secrets
"#
    );
}
