//! BIP-39 mnemonic codec
//!
//! 1. entropy ‖ SHA-256(entropy)[..ENT/32 bits] is split into 11-bit groups,
//!    each indexing into a 2048-word list.
//! 2. Decoding reverses the split and recomputes the checksum.
//! 3. Seed = PBKDF2-HMAC-SHA512(NFKD(mnemonic), "mnemonic" ‖ NFKD(passphrase),
//!    2048 rounds, 64 bytes).
//!
//! Reference: <https://github.com/bitcoin/bips/blob/master/bip-0039.mediawiki>

use sha2::{Digest, Sha256, Sha512};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use crate::entropy::{Entropy, EntropyStrength};
use crate::error::{Error, Result};
use crate::seed::{Seed, SEED_LEN};
use crate::wordlist::Wordlist;

/// PBKDF2 iteration count fixed by BIP-39.
pub const PBKDF2_ROUNDS: u32 = 2048;

const SALT_PREFIX: &str = "mnemonic";

/// A checksummed mnemonic sentence.
///
/// Only constructed through validation or encoding, so every instance has a
/// valid word count and checksum for the wordlist it was built with. The
/// phrase is zeroized on drop and never shown by `Debug`.
pub struct Mnemonic {
    phrase: Zeroizing<String>,
    word_count: usize,
}

impl Mnemonic {
    /// Generate a new random mnemonic.
    pub fn generate_in(wordlist: &Wordlist, strength: EntropyStrength) -> Result<Self> {
        let entropy = Entropy::generate(strength)?;
        entropy_to_mnemonic(&entropy, wordlist)
    }

    /// Parse and validate a mnemonic sentence.
    ///
    /// Words may be separated by any whitespace and are matched
    /// case-insensitively after NFKD normalization. The stored phrase uses
    /// the wordlist's canonical spelling separated by single spaces.
    pub fn parse_in(wordlist: &Wordlist, phrase: &str) -> Result<Self> {
        let entropy = mnemonic_to_entropy(phrase, wordlist)?;
        entropy_to_mnemonic(&entropy, wordlist)
    }

    /// Parse with the English reference list.
    pub fn parse(phrase: &str) -> Result<Self> {
        Self::parse_in(&Wordlist::english(), phrase)
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split(' ')
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn to_entropy_in(&self, wordlist: &Wordlist) -> Result<Entropy> {
        mnemonic_to_entropy(&self.phrase, wordlist)
    }

    pub fn to_seed(&self, passphrase: &str) -> Seed {
        mnemonic_to_seed(self, passphrase)
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Mnemonic {
    fn eq(&self, other: &Self) -> bool {
        *self.phrase == *other.phrase
    }
}

impl Eq for Mnemonic {}

/// Encode entropy as a mnemonic sentence.
pub fn entropy_to_mnemonic(entropy: &Entropy, wordlist: &Wordlist) -> Result<Mnemonic> {
    let strength = entropy.strength();
    let word_count = strength.word_count();

    // entropy ‖ first checksum byte; only the top ENT/32 bits of it are read.
    let mut data = Zeroizing::new(Vec::with_capacity(strength.byte_len() + 1));
    data.extend_from_slice(entropy.as_bytes());
    data.push(Sha256::digest(entropy.as_bytes())[0]);

    let mut words = Vec::with_capacity(word_count);
    for group in 0..word_count {
        let mut idx: u16 = 0;
        for bit in group * 11..(group + 1) * 11 {
            idx = (idx << 1) | read_bit(&data, bit) as u16;
        }
        let word = wordlist.word(idx).ok_or_else(|| {
            Error::WordlistUnavailable(format!("word index {} out of range", idx))
        })?;
        words.push(word);
    }

    Ok(Mnemonic {
        phrase: Zeroizing::new(words.join(" ")),
        word_count,
    })
}

/// Decode a mnemonic sentence back to its entropy, verifying the checksum.
pub fn mnemonic_to_entropy(phrase: &str, wordlist: &Wordlist) -> Result<Entropy> {
    let normalized = Zeroizing::new(phrase.nfkd().collect::<String>());
    let words: Vec<&str> = normalized.split_whitespace().collect();
    let strength = EntropyStrength::from_word_count(words.len())?;

    let total_bits = words.len() * 11;
    let mut data = Zeroizing::new(vec![0u8; total_bits.div_ceil(8)]);
    for (position, word) in words.iter().enumerate() {
        let idx = wordlist.index_of(word).ok_or_else(|| Error::InvalidWord {
            position,
            word: word.to_string(),
        })?;
        for j in 0..11 {
            if (idx >> (10 - j)) & 1 == 1 {
                let bit = position * 11 + j;
                data[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
    }

    let ent_len = strength.byte_len();
    let cs_shift = 8 - strength.checksum_bits();
    let provided = data[ent_len] >> cs_shift;
    let expected = Sha256::digest(&data[..ent_len])[0] >> cs_shift;
    if provided != expected {
        return Err(Error::InvalidChecksum);
    }

    Entropy::from_bytes(&data[..ent_len])
}

/// Stretch a mnemonic and passphrase into the 64-byte BIP-39 seed.
///
/// Two passphrases over one mnemonic give unrelated seeds; an empty
/// passphrase is a valid, distinct wallet.
pub fn mnemonic_to_seed(mnemonic: &Mnemonic, passphrase: &str) -> Seed {
    let password = Zeroizing::new(mnemonic.phrase().nfkd().collect::<String>());
    let salt = Zeroizing::new(
        SALT_PREFIX
            .chars()
            .chain(passphrase.nfkd())
            .collect::<String>(),
    );

    let mut output = Zeroizing::new([0u8; SEED_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ROUNDS,
        &mut *output,
    );
    Seed::from_bytes(*output)
}

fn read_bit(data: &[u8], bit: usize) -> u8 {
    (data[bit / 8] >> (7 - bit % 8)) & 1
}
