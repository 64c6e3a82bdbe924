//! Configuration types and parsing for the permutation recovery tool

use crate::crypto::{parse_language, CryptoEngine};
use crate::enumerator::factorial;
use crate::error::{ConfigError, Result};
use bip39::Language;
use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Network};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for a recovery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The scrambled candidate words, in the order that defines ordinal 0
    pub words: Vec<String>,

    /// Target address the correct ordering must derive
    pub target_address: String,

    /// BIP-39 wordlist language
    #[serde(default = "default_language")]
    pub language: String,

    /// Derivation paths to try, in priority order
    #[serde(default = "default_derivation_paths")]
    pub derivation_paths: Vec<String>,

    /// Optional passphrase for BIP39 seed generation
    #[serde(default)]
    pub passphrase: String,

    /// Network the target address belongs to
    #[serde(default = "default_network")]
    pub network: String,

    /// Checkpoint file holding the resumable permutation count
    #[serde(default = "default_checkpoint_file")]
    pub checkpoint_file: PathBuf,

    /// Permutations between checkpoint saves
    #[serde(default = "default_save_interval")]
    pub save_interval: u64,

    /// Permutations between progress reports
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Permutations evaluated per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Worker threads for candidate evaluation (1 = fully sequential)
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,

    /// Whether to render a progress bar
    #[serde(default = "default_show_progress_bar")]
    pub show_progress_bar: bool,
}

/// Default functions for serde
fn default_language() -> String {
    "english".to_string()
}

fn default_derivation_paths() -> Vec<String> {
    crate::DEFAULT_DERIVATION_PATHS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_network() -> String {
    "bitcoin".to_string()
}

fn default_checkpoint_file() -> PathBuf {
    PathBuf::from(crate::DEFAULT_CHECKPOINT_FILE)
}

fn default_save_interval() -> u64 {
    crate::DEFAULT_SAVE_INTERVAL
}

fn default_progress_interval() -> u64 {
    crate::DEFAULT_PROGRESS_INTERVAL
}

fn default_batch_size() -> usize {
    crate::DEFAULT_BATCH_SIZE
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_show_progress_bar() -> bool {
    true
}

impl SearchConfig {
    /// Build a configuration from words and a target, defaults elsewhere
    pub fn for_words_and_target(words: Vec<String>, target_address: String) -> Self {
        Self {
            words,
            target_address,
            language: default_language(),
            derivation_paths: default_derivation_paths(),
            passphrase: String::new(),
            network: default_network(),
            checkpoint_file: default_checkpoint_file(),
            save_interval: default_save_interval(),
            progress_interval: default_progress_interval(),
            batch_size: default_batch_size(),
            num_threads: default_num_threads(),
            show_progress_bar: default_show_progress_bar(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !crate::VALID_WORD_COUNTS.contains(&self.words.len()) {
            return Err(ConfigError::InvalidWordCount(self.words.len()).into());
        }

        let language = self.parse_wordlist_language()?;
        let engine = CryptoEngine::new(language);
        for word in &self.words {
            if engine.word_index(word).is_none() {
                return Err(ConfigError::UnknownWord(word.clone()).into());
            }
        }

        let network = self.parse_target_network()?;
        self.checked_target_address(network)?;

        if self.derivation_paths.is_empty() {
            return Err(ConfigError::NoDerivationPaths.into());
        }
        for path in &self.derivation_paths {
            crate::address::parse_path(path)
                .map_err(|_| ConfigError::InvalidDerivationPath(path.clone()))?;
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size).into());
        }
        if self.save_interval == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "save",
                value: self.save_interval,
            }
            .into());
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "progress",
                value: self.progress_interval,
            }
            .into());
        }

        Ok(())
    }

    /// Resolve the configured wordlist language
    pub fn parse_wordlist_language(&self) -> Result<Language> {
        parse_language(&self.language)
            .ok_or_else(|| ConfigError::UnsupportedLanguage(self.language.clone()).into())
    }

    /// Resolve the configured network name
    pub fn parse_target_network(&self) -> Result<Network> {
        match self.network.to_ascii_lowercase().as_str() {
            "bitcoin" | "mainnet" => Ok(Network::Bitcoin),
            "testnet" => Ok(Network::Testnet),
            "signet" => Ok(Network::Signet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(ConfigError::UnsupportedNetwork(self.network.clone()).into()),
        }
    }

    /// Parse the target address and check it against the configured network
    pub fn checked_target_address(&self, network: Network) -> Result<Address> {
        self.target_address
            .parse::<Address<NetworkUnchecked>>()
            .map_err(|_| ConfigError::InvalidTargetAddress(self.target_address.clone()))?
            .require_network(network)
            .map_err(|_| ConfigError::InvalidTargetAddress(self.target_address.clone()).into())
    }

    /// Total number of orderings to search, `None` if it cannot be represented
    pub fn search_space(&self) -> Option<u128> {
        factorial(self.words.len())
    }
}
