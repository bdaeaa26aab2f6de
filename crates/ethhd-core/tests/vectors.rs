//! Published cross-implementation vectors.
//!
//! - BIP-39: Trezor reference vectors (passphrase "TREZOR")
//! - BIP-44: well-known Ethereum development mnemonics
//! - EIP-55: checksum examples from the EIP

use ethhd_core::{
    entropy_to_mnemonic, mnemonic_to_entropy, Address, DerivationPath, Disclosure, Entropy,
    Mnemonic, Wallet, WalletConfig, Wordlist,
};
use zeroize::Zeroizing;

const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const HARDHAT: &str = "test test test test test test test test test test test junk";

/// (entropy hex, mnemonic, seed hex with passphrase "TREZOR")
const TREZOR_VECTORS: &[(&str, &str, &str)] = &[
    (
        "00000000000000000000000000000000",
        ABANDON_ABOUT,
        "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04",
    ),
    (
        "7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f",
        "legal winner thank year wave sausage worth useful legal winner thank yellow",
        "2e8905819b8723fe2c1d161860e5ee1830318dbf49a83bd451cfb8440c28bd6fa457fe1296106559a3c80937a1c1069be3a3a5bd381ee6260e8d9739fce1f607",
    ),
    (
        "80808080808080808080808080808080",
        "letter advice cage absurd amount doctor acoustic avoid letter advice cage above",
        "d71de856f81a8acc65e6fc851a38d4d7ec216fd0796d0a6827a3ad6ed5511a30fa280f12eb2e47ed2ac03b5c462a0358d18d69fe4f985ec81778c1b370b652a8",
    ),
    (
        "ffffffffffffffffffffffffffffffff",
        "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong",
        "ac27495480225222079d7be181583751e86f571027b0497b5b5d11218e0a8a13332572917f0f8e5a589620c6f15b11c61dee327651a14c34e18231052e48c069",
    ),
];

#[test]
fn test_bip39_trezor_vectors() {
    let english = Wordlist::english();
    for (entropy_hex, phrase, seed_hex) in TREZOR_VECTORS {
        let entropy = Entropy::from_bytes(&hex::decode(entropy_hex).unwrap()).unwrap();

        let mnemonic = entropy_to_mnemonic(&entropy, &english).unwrap();
        assert_eq!(mnemonic.phrase(), *phrase);

        let decoded = mnemonic_to_entropy(phrase, &english).unwrap();
        assert_eq!(decoded, entropy);

        let seed = mnemonic.to_seed("TREZOR");
        assert_eq!(hex::encode(seed.as_bytes()), *seed_hex, "{}", phrase);
    }
}

#[test]
fn test_bip39_reference_seed_empty_passphrase() {
    let mnemonic = Mnemonic::parse(ABANDON_ABOUT).unwrap();
    assert_eq!(
        hex::encode(mnemonic.to_seed("").as_bytes()),
        "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
    );
}

#[test]
fn test_bip39_24_words() {
    let entropy = Entropy::from_bytes(&[0u8; 32]).unwrap();
    let mnemonic = entropy_to_mnemonic(&entropy, &Wordlist::english()).unwrap();
    let expected = format!("{}art", "abandon ".repeat(23));
    assert_eq!(mnemonic.phrase(), expected);

    let reference = bip39::Mnemonic::from_entropy(&[0u8; 32]).unwrap();
    assert_eq!(mnemonic.to_seed("TREZOR").as_bytes(), &reference.to_seed("TREZOR"));
}

#[test]
fn test_bip44_reference_address() {
    let mut wallet = Wallet::restore(ABANDON_ABOUT, &WalletConfig::default()).unwrap();
    let view = wallet.public_view().unwrap();
    assert_eq!(
        view.checksum_address.to_string(),
        "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
    );

    let custody = wallet
        .custody(Disclosure::acknowledge_secret_exposure())
        .unwrap();
    assert_eq!(
        custody.private_key_hex().as_str(),
        "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
    );
}

#[test]
fn test_hardhat_accounts() {
    let mut wallet = Wallet::restore(HARDHAT, &WalletConfig::default()).unwrap();
    let expected = [
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC",
    ];
    for (index, address) in expected.iter().enumerate() {
        let path = DerivationPath::ethereum(0, index as u32).unwrap();
        assert_eq!(wallet.address_at(&path).unwrap().to_string(), *address);
    }

    let custody = wallet
        .custody(Disclosure::acknowledge_secret_exposure())
        .unwrap();
    assert_eq!(
        custody.private_key_hex().as_str(),
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
    );
}

#[test]
fn test_textual_path_variants_derive_same_key() {
    let mut wallet = Wallet::restore(HARDHAT, &WalletConfig::default()).unwrap();
    let a = wallet
        .address_at(&"m/44'/60'/0'/1/0".parse().unwrap())
        .unwrap();
    let b = wallet
        .address_at(&"m/44h/60h/0h/1/0".parse().unwrap())
        .unwrap();
    assert_eq!(a, b);

    // A custom path is always derived, never skipped in favour of the default.
    let default = wallet.address_at(&DerivationPath::ethereum_default()).unwrap();
    assert_ne!(a, default);
}

#[test]
fn test_configured_path_is_used() {
    let config = WalletConfig {
        derivation_path: DerivationPath::ethereum(0, 1).unwrap(),
        ..WalletConfig::default()
    };
    let mut wallet = Wallet::restore(HARDHAT, &config).unwrap();
    assert_eq!(
        wallet.public_view().unwrap().checksum_address.to_string(),
        "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
    );
}

#[test]
fn test_passphrase_wallets_are_unrelated() {
    let hidden = WalletConfig {
        passphrase: Zeroizing::new("TREZOR".to_string()),
        ..WalletConfig::default()
    };
    let mut a = Wallet::restore(ABANDON_ABOUT, &WalletConfig::default()).unwrap();
    let mut b = Wallet::restore(ABANDON_ABOUT, &hidden).unwrap();
    assert_ne!(
        a.public_view().unwrap().checksum_address,
        b.public_view().unwrap().checksum_address
    );
    assert_ne!(a.master_fingerprint(), b.master_fingerprint());
}

#[test]
fn test_eip55_examples() {
    let published = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];
    for checksummed in published {
        let address: Address = checksummed.parse().unwrap();
        assert_eq!(address.to_checksum(), checksummed);
        assert_eq!(address.to_checksum().to_lowercase(), address.to_lowercase_hex());
    }
}
