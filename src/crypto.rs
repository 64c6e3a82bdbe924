//! BIP-39 checksum validation and seed derivation

use crate::error::{CryptoError, Result};
use bip39::Language;
use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::{Digest, Sha256, Sha512};

/// PBKDF2 iteration count for BIP39 seed derivation
const BIP39_PBKDF2_ROUNDS: u32 = 2048;

/// BIP39 salt prefix
const BIP39_SALT_PREFIX: &str = "mnemonic";

/// Engine for BIP-39 phrase validation and seed stretching.
///
/// The wordlist is owned by the `bip39` crate and is static; the engine only
/// carries the selected language.
#[derive(Debug, Clone, Copy)]
pub struct CryptoEngine {
    language: Language,
}

/// Result of BIP39 seed derivation
#[derive(Debug, Clone)]
pub struct Bip39Seed {
    /// The 64-byte seed
    pub seed: [u8; 64],
}

/// Outcome of checking one candidate word ordering.
///
/// `Invalid` is the expected, common case and is not an error: the search
/// loop simply moves on to the next permutation.
#[derive(Debug, Clone)]
pub enum PhraseOutcome {
    /// Checksum matched; the stretched seed is attached.
    Valid(Bip39Seed),
    /// A word was outside the wordlist or the checksum bits mismatched.
    Invalid,
}

impl CryptoEngine {
    /// Create a new engine for the given wordlist language
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Look up a word's index in the wordlist
    pub fn word_index(&self, word: &str) -> Option<u16> {
        self.language
            .word_list()
            .iter()
            .position(|w| *w == word)
            .map(|i| i as u16)
    }

    /// Resolve a whole word set to wordlist indices.
    ///
    /// Done once per run so the per-permutation checksum check never touches
    /// strings.
    pub fn word_indices(&self, words: &[String]) -> Result<Vec<u16>> {
        words
            .iter()
            .map(|w| {
                self.word_index(w)
                    .ok_or_else(|| CryptoError::UnknownWord(w.clone()).into())
            })
            .collect()
    }

    /// Check the BIP-39 checksum for a sequence of wordlist indices.
    ///
    /// Word count must be a multiple of 3 (each 3 words carry 32 entropy
    /// bits and 1 checksum bit) and at most 24, keeping the checksum within
    /// a single byte; anything else is invalid. Pure bit manipulation plus
    /// one SHA-256, cheap enough to run for every permutation.
    pub fn validate_checksum(indices: &[u16]) -> bool {
        let word_count = indices.len();
        if word_count == 0 || word_count % 3 != 0 || word_count > 24 {
            return false;
        }

        let checksum_bits = word_count / 3;
        let entropy_bytes = checksum_bits * 4;

        let packed = pack_indices(indices);
        let hash = Sha256::digest(&packed[..entropy_bytes]);
        let expected = hash[0] >> (8 - checksum_bits);

        // Entropy is always a whole number of bytes, so the checksum bits
        // are the top bits of the byte right after it.
        let actual = packed[entropy_bytes] >> (8 - checksum_bits);

        expected == actual
    }

    /// Stretch a mnemonic phrase into the 512-bit seed.
    ///
    /// PBKDF2-HMAC-SHA512 over the phrase with the fixed salt convention.
    /// Performs no validation; callers check the checksum first.
    pub fn derive_seed(&self, phrase: &str, passphrase: &str) -> Result<Bip39Seed> {
        let salt = format!("{}{}", BIP39_SALT_PREFIX, passphrase);

        let mut seed = [0u8; 64];
        pbkdf2::<Hmac<Sha512>>(
            phrase.as_bytes(),
            salt.as_bytes(),
            BIP39_PBKDF2_ROUNDS,
            &mut seed,
        )
        .map_err(|_| CryptoError::Pbkdf2("PBKDF2 operation failed".to_string()))?;

        Ok(Bip39Seed { seed })
    }

    /// Validate a candidate ordering and, if well-formed, derive its seed.
    ///
    /// Checksum rejection short-circuits before any key stretching; the
    /// expensive PBKDF2 step only runs for checksum-valid phrases.
    pub fn validate_and_seed(&self, words: &[String], passphrase: &str) -> Result<PhraseOutcome> {
        let mut indices = Vec::with_capacity(words.len());
        for word in words {
            match self.word_index(word) {
                Some(idx) => indices.push(idx),
                None => return Ok(PhraseOutcome::Invalid),
            }
        }

        if !Self::validate_checksum(&indices) {
            return Ok(PhraseOutcome::Invalid);
        }

        let phrase = words.join(" ");
        let seed = self.derive_seed(&phrase, passphrase)?;
        Ok(PhraseOutcome::Valid(seed))
    }

    /// Get the wordlist language
    pub fn language(&self) -> Language {
        self.language
    }
}

impl Default for CryptoEngine {
    fn default() -> Self {
        Self::new(Language::English)
    }
}

/// Map a configured language name to a wordlist.
///
/// Only English is shipped; other BIP-39 languages sit behind `bip39` crate
/// features and are rejected at configuration time.
pub fn parse_language(name: &str) -> Option<Language> {
    match name.to_ascii_lowercase().as_str() {
        "english" | "en" => Some(Language::English),
        _ => None,
    }
}

/// Pack 11-bit wordlist indices into the entropy-plus-checksum bit string
fn pack_indices(indices: &[u16]) -> Vec<u8> {
    let total_bits = indices.len() * 11;
    let mut bytes = vec![0u8; total_bits.div_ceil(8)];
    let mut bit = 0usize;

    for &idx in indices {
        for shift in (0..11).rev() {
            if (idx >> shift) & 1 == 1 {
                bytes[bit / 8] |= 1 << (7 - bit % 8);
            }
            bit += 1;
        }
    }

    bytes
}

impl Bip39Seed {
    /// Get the seed as a byte slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.seed
    }

    /// Get the seed as a hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.seed)
    }

    /// Create from hex string
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CryptoError::Bip39(format!("Invalid hex: {}", e)))?;

        if bytes.len() != 64 {
            return Err(CryptoError::Bip39("Seed must be 64 bytes".to_string()).into());
        }

        let mut seed = [0u8; 64];
        seed.copy_from_slice(&bytes);

        Ok(Self { seed })
    }
}
