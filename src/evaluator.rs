//! Candidate evaluation: checksum gate, seed stretch, per-path address check

use crate::address::{parse_path, AddressDeriver};
use crate::config::SearchConfig;
use crate::crypto::CryptoEngine;
use crate::enumerator::MAX_ITEMS;
use crate::error::Result;
use bitcoin::bip32::DerivationPath;
use bitcoin::Address;
use tracing::debug;

/// A winning candidate, rendered for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPhrase {
    /// The mnemonic phrase, words joined by single spaces
    pub phrase: String,
    /// The derived address that matched the target
    pub address: String,
    /// The derivation path it matched on
    pub derivation_path: String,
}

/// Evaluates one permutation at a time against the target address.
///
/// Owns the run's read-only configuration: the candidate words, their
/// precomputed wordlist indices, the parsed derivation paths and the checked
/// target address. All methods take `&self`, so a batch of permutations can
/// be evaluated from multiple threads.
#[derive(Debug)]
pub struct CandidateEvaluator {
    engine: CryptoEngine,
    deriver: AddressDeriver,
    words: Vec<String>,
    word_indices: Vec<u16>,
    passphrase: String,
    target: Address,
    paths: Vec<(String, DerivationPath)>,
}

impl CandidateEvaluator {
    /// Build an evaluator from the run configuration.
    ///
    /// Resolves words to wordlist indices and parses the target address and
    /// every derivation path up front; the per-permutation path stays free
    /// of string parsing.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let language = config.parse_wordlist_language()?;
        let network = config.parse_target_network()?;

        let engine = CryptoEngine::new(language);
        let word_indices = engine.word_indices(&config.words)?;
        let target = config.checked_target_address(network)?;

        let mut paths = Vec::with_capacity(config.derivation_paths.len());
        for path in &config.derivation_paths {
            paths.push((path.clone(), parse_path(path)?));
        }

        Ok(Self {
            engine,
            deriver: AddressDeriver::new(network),
            words: config.words.clone(),
            word_indices,
            passphrase: config.passphrase.clone(),
            target,
            paths,
        })
    }

    /// Number of candidate words
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Evaluate one ordering of the word set.
    ///
    /// Checksum rejection short-circuits before the seed stretch, which in
    /// turn runs once per candidate no matter how many paths are checked.
    /// Paths are tried in configured order and the first address match wins.
    /// A path that fails to derive counts as no match on that path.
    pub fn evaluate(&self, permutation: &[usize]) -> Option<MatchedPhrase> {
        debug_assert_eq!(permutation.len(), self.word_indices.len());

        let mut buf = [0u16; MAX_ITEMS];
        for (slot, &position) in buf.iter_mut().zip(permutation) {
            *slot = self.word_indices[position];
        }
        let indices = &buf[..permutation.len()];

        if !CryptoEngine::validate_checksum(indices) {
            return None;
        }

        let phrase = permutation
            .iter()
            .map(|&position| self.words[position].as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let seed = match self.engine.derive_seed(&phrase, &self.passphrase) {
            Ok(seed) => seed,
            Err(e) => {
                debug!(phrase = %phrase, error = %e, "seed derivation failed; skipping candidate");
                return None;
            }
        };

        for (path_str, path) in &self.paths {
            match self.deriver.derive_address(&seed, path) {
                Ok(address) if address == self.target => {
                    return Some(MatchedPhrase {
                        phrase,
                        address: address.to_string(),
                        derivation_path: path_str.clone(),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(path = %path_str, error = %e, "derivation failed; no match on this path");
                }
            }
        }

        None
    }
}
