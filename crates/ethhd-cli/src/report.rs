//! JSON report assembled from a wallet session.
//!
//! The public part is always present. Custody material is a separate
//! optional section, filled only when the caller passes a [`Disclosure`].

use anyhow::{Context, Result};
use ethhd_core::{hash_personal_message, Address, Disclosure, PublicWallet, Wallet};
use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const SECRET_WARNINGS: &[&str] = &[
    "This report contains the mnemonic and private key. Anyone holding them controls the funds.",
    "Do not store this output in shell history, logs, screenshots or cloud notes.",
    "Write the mnemonic down offline and verify it before funding the address.",
];

/// How the wallet came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Generated,
    Restored,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub origin: Origin,
    pub wallet: PublicWallet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_message: Option<SignedMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custody: Option<CustodySection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedMessage {
    pub message: String,
    /// Keccak-256 of the prefixed message, `0x` hex.
    pub message_hash: String,
    /// `r ‖ s ‖ v`, `0x` hex.
    pub signature: String,
    pub v: u8,
    pub signer: Address,
}

/// Serialized custody material. Only built from a
/// [`ethhd_core::CustodyView`]; wiped on drop.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
pub struct CustodySection {
    pub mnemonic: String,
    pub private_key: String,
    pub xprv: String,
}

impl std::fmt::Debug for CustodySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CustodySection([REDACTED])")
    }
}

/// Assemble the report for the wallet's configured path.
pub fn build(
    wallet: &mut Wallet,
    origin: Origin,
    message: Option<&str>,
    disclosure: Option<Disclosure>,
) -> Result<Report> {
    let public = wallet
        .public_view()
        .context("Failed to derive the configured path")?;

    let signed_message = match message {
        Some(message) => {
            let signature = wallet
                .sign_personal_message(message.as_bytes())
                .context("Failed to sign message")?;
            Some(SignedMessage {
                message: message.to_string(),
                message_hash: format!(
                    "0x{}",
                    hex::encode(hash_personal_message(message.as_bytes()))
                ),
                signature: signature.to_hex(),
                v: signature.v(),
                signer: public.checksum_address,
            })
        }
        None => None,
    };

    let custody = match disclosure {
        Some(disclosure) => {
            let view = wallet.custody(disclosure)?;
            Some(CustodySection {
                mnemonic: view.mnemonic().to_string(),
                private_key: view.private_key_hex().to_string(),
                xprv: view.xprv().to_string(),
            })
        }
        None => None,
    };

    let warnings = if custody.is_some() {
        SECRET_WARNINGS.to_vec()
    } else {
        Vec::new()
    };

    Ok(Report {
        origin,
        wallet: public,
        signed_message,
        custody,
        warnings,
    })
}

/// Render as JSON. The text may hold custody material, so it is wiped on drop.
pub fn render(report: &Report, pretty: bool) -> Result<Zeroizing<String>> {
    let json = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };
    json.map(Zeroizing::new).context("Failed to serialize report")
}
