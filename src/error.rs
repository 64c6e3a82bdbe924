//! Error types for the mnemonic permutation recovery tool

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Enumerator error: {0}")]
    Enumerator(#[from] EnumeratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid word count: {0}. Must be 12, 15, 18, 21 or 24")]
    InvalidWordCount(usize),

    #[error("Word not in the BIP-39 wordlist: {0}")]
    UnknownWord(String),

    #[error("Invalid target address: {0}")]
    InvalidTargetAddress(String),

    #[error("Invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    #[error("No derivation paths configured")]
    NoDerivationPaths,

    #[error("Unsupported wordlist language: {0}")]
    UnsupportedLanguage(String),

    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Invalid batch size: {0}. Must be greater than 0")]
    InvalidBatchSize(usize),

    #[error("Invalid {name} interval: {value}. Must be greater than 0")]
    InvalidInterval { name: &'static str, value: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Cryptographic operation errors
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("BIP39 error: {0}")]
    Bip39(String),

    #[error("PBKDF2 error: {0}")]
    Pbkdf2(String),

    #[error("Word not in the BIP-39 wordlist: {0}")]
    UnknownWord(String),
}

/// HD key and address derivation errors.
///
/// Never fatal to the search: a path that fails to derive is treated by the
/// caller as "no match on this path".
#[derive(Error, Debug)]
pub enum DerivationError {
    #[error("BIP32 derivation error: {0}")]
    Bip32(#[from] bitcoin::bip32::Error),

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),
}

/// Permutation enumeration errors
#[derive(Error, Debug)]
pub enum EnumeratorError {
    #[error("Word set of {0} items exceeds the enumerable range")]
    TooManyItems(usize),

    #[error("Ordinal {ordinal} out of range for {total} permutations")]
    OrdinalOutOfRange { ordinal: u128, total: u128 },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RecoveryError>;

/// Convert bip39 errors to our crypto error type
impl From<bip39::Error> for CryptoError {
    fn from(err: bip39::Error) -> Self {
        CryptoError::Bip39(err.to_string())
    }
}
