//! BIP-39 wordlists
//!
//! A wordlist is a fixed, ordered set of 2048 unique words. The English
//! reference list ships with the `bip39` crate; other lists can be loaded
//! from a file (one word per line). Any loading problem is reported once,
//! as [`Error::WordlistUnavailable`], when the list is constructed.

use std::collections::HashMap;
use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Number of words in every BIP-39 wordlist (2^11).
pub const WORDLIST_LEN: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wordlist {
    words: Vec<String>,
    index: HashMap<String, u16>,
}

impl Wordlist {
    /// The English reference wordlist.
    pub fn english() -> Self {
        let words: Vec<String> = bip39::Language::English
            .word_list()
            .iter()
            .map(|w| w.to_string())
            .collect();
        let index = build_index(&words);
        Self { words, index }
    }

    /// Build a wordlist from an ordered list of words.
    ///
    /// Words are NFKD-normalized. The list must contain exactly 2048
    /// unique, non-empty, whitespace-free words.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().nfkd().collect::<String>())
            .collect();

        if words.len() != WORDLIST_LEN {
            return Err(Error::WordlistUnavailable(format!(
                "expected {} words, found {}",
                WORDLIST_LEN,
                words.len()
            )));
        }
        if let Some(pos) = words
            .iter()
            .position(|w| w.is_empty() || w.chars().any(char::is_whitespace))
        {
            return Err(Error::WordlistUnavailable(format!(
                "malformed word on line {}",
                pos + 1
            )));
        }

        let index = build_index(&words);
        if index.len() != WORDLIST_LEN {
            return Err(Error::WordlistUnavailable(
                "wordlist contains duplicate words".into(),
            ));
        }

        Ok(Self { words, index })
    }

    /// Parse a wordlist from text, one word per line. Blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_words(text.lines().filter(|l| !l.trim().is_empty()))
    }

    /// Load a wordlist file, one word per line.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::WordlistUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        let list = Self::parse(&text)?;
        log::debug!("loaded wordlist from {}", path.display());
        Ok(list)
    }

    /// Word at an 11-bit index.
    pub fn word(&self, index: u16) -> Option<&str> {
        self.words.get(index as usize).map(String::as_str)
    }

    /// Index of a word. The lookup is NFKD-normalized and case-insensitive.
    pub fn index_of(&self, word: &str) -> Option<u16> {
        let normalized: String = word.nfkd().collect::<String>().to_lowercase();
        self.index.get(&normalized).copied()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl Default for Wordlist {
    fn default() -> Self {
        Self::english()
    }
}

fn build_index(words: &[String]) -> HashMap<String, u16> {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| (w.to_lowercase(), i as u16))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_english_reference_list() {
        let list = Wordlist::english();
        assert_eq!(list.words().len(), WORDLIST_LEN);
        assert_eq!(list.word(0), Some("abandon"));
        assert_eq!(list.word(3), Some("about"));
        assert_eq!(list.word(2047), Some("zoo"));
        assert_eq!(list.word(2048), None);
        assert_eq!(list.index_of("zoo"), Some(2047));
        assert_eq!(list.index_of("Abandon"), Some(0));
        assert_eq!(list.index_of("notaword"), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for word in Wordlist::english().words() {
            writeln!(file, "{}", word).unwrap();
        }
        let loaded = Wordlist::from_file(file.path()).unwrap();
        assert_eq!(loaded, Wordlist::english());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = Wordlist::from_file(Path::new("/nonexistent/wordlist.txt")).unwrap_err();
        assert!(matches!(err, Error::WordlistUnavailable(_)));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = Wordlist::from_words(["abandon", "ability"]).unwrap_err();
        assert!(matches!(err, Error::WordlistUnavailable(_)));
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut words: Vec<String> = Wordlist::english().words().to_vec();
        words[1] = words[0].clone();
        let err = Wordlist::from_words(&words).unwrap_err();
        assert!(matches!(err, Error::WordlistUnavailable(_)));
    }

    #[test]
    fn test_malformed_word_rejected() {
        let mut words: Vec<String> = Wordlist::english().words().to_vec();
        words[10] = "two words".into();
        assert!(matches!(
            Wordlist::from_words(&words),
            Err(Error::WordlistUnavailable(_))
        ));
    }
}
