//! BIP-39 Mnemonic Ordering Recovery Tool
//!
//! Brute-force search over all orderings of a fixed set of candidate words,
//! looking for the ordering that passes the BIP-39 checksum and derives a
//! specific Native SegWit address under one of the configured HD paths.
//! The search is resumable: a single-integer checkpoint records how many
//! orderings have been fully processed.

pub mod address;
pub mod checkpoint;
pub mod config;
pub mod crypto;
pub mod enumerator;
pub mod error;
pub mod evaluator;
pub mod monitor;
pub mod search;

// Re-export main types
pub use address::AddressDeriver;
pub use checkpoint::CheckpointStore;
pub use config::SearchConfig;
pub use crypto::{Bip39Seed, CryptoEngine, PhraseOutcome};
pub use enumerator::PermutationEnumerator;
pub use error::*;
pub use evaluator::{CandidateEvaluator, MatchedPhrase};
pub use monitor::{MonitorConfig, ProgressReport, SearchMonitor};
pub use search::{SearchDriver, SearchOutcome};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::address::AddressDeriver;
    pub use crate::checkpoint::CheckpointStore;
    pub use crate::config::SearchConfig;
    pub use crate::crypto::{Bip39Seed, CryptoEngine, PhraseOutcome};
    pub use crate::enumerator::PermutationEnumerator;
    pub use crate::error::*;
    pub use crate::evaluator::{CandidateEvaluator, MatchedPhrase};
    pub use crate::search::{SearchDriver, SearchOutcome};
    pub use anyhow::{Context, Result};
}

#[cfg(test)]
mod tests;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Word counts for which BIP-39 defines a checksum
pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Default checkpoint file name in the working directory
pub const DEFAULT_CHECKPOINT_FILE: &str = "progress_checkpoint.txt";

/// Default number of permutations between checkpoint saves
pub const DEFAULT_SAVE_INTERVAL: u64 = 100_000;

/// Default number of permutations between progress reports
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Default number of permutations evaluated per batch
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Derivation paths tried when none are configured: the first three Native
/// SegWit receive addresses and the first change address
pub const DEFAULT_DERIVATION_PATHS: [&str; 4] = [
    "m/84'/0'/0'/0/0",
    "m/84'/0'/0'/0/1",
    "m/84'/0'/0'/0/2",
    "m/84'/0'/0'/1/0",
];
