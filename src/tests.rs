//! End-to-end scenarios for the permutation search pipeline

use crate::address::{parse_path, AddressDeriver};
use crate::checkpoint::CheckpointStore;
use crate::config::SearchConfig;
use crate::crypto::{CryptoEngine, PhraseOutcome};
use crate::enumerator::PermutationEnumerator;
use crate::error::RecoveryError;
use crate::search::{SearchDriver, SearchOutcome};
use bitcoin::Network;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Known seed phrases and their expected outputs
struct TestVector {
    mnemonic: &'static str,
    passphrase: &'static str,
    seed_hex: &'static str,
}

const TEST_VECTORS: &[TestVector] = &[
    TestVector {
        mnemonic: "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
        passphrase: "",
        seed_hex: "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4",
    },
    TestVector {
        mnemonic: "legal winner thank year wave sausage worth useful legal winner thank yellow",
        passphrase: "",
        seed_hex: "878386efb78845b3355bd15ea4d39ef97d179cb712b77d5c12b6be415fffeffe5f377ba02bf3f8544ab800b955e51fbff09828f682052a20faa6addbbddfb096",
    },
    TestVector {
        mnemonic: "letter advice cage absurd amount doctor acoustic avoid letter advice cage above",
        passphrase: "TREZOR",
        seed_hex: "d71de856f81a8acc65e6fc851a38d4d7ec216fd0796d0a6827a3ad6ed5511a30fa280f12eb2e47ed2ac03b5c462a0358d18d69fe4f985ec81778c1b370b652a8",
    },
];

const CANONICAL_12: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const BIP84_RECEIVE_0: &str = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";

fn split(phrase: &str) -> Vec<String> {
    phrase.split_whitespace().map(String::from).collect()
}

fn temp_checkpoint(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "seed-unscrambler-e2e-{}-{}.txt",
        std::process::id(),
        name
    ));
    let _ = std::fs::remove_file(&path);
    path
}

fn quiet_config(words: Vec<String>, target: String, checkpoint: PathBuf) -> SearchConfig {
    let mut config = SearchConfig::for_words_and_target(words, target);
    config.checkpoint_file = checkpoint;
    config.batch_size = 8;
    config.num_threads = 1;
    config.save_interval = 4;
    config.progress_interval = 4;
    config.show_progress_bar = false;
    config
}

/// A small word set plus the first ordering of it that passes the checksum
/// and the address that ordering derives at the first receive path.
///
/// The checksum validator is length-agnostic below the standard phrase
/// lengths, which keeps whole-pipeline scenarios enumerable in a test.
struct SmallScenario {
    words: Vec<String>,
    match_ordinal: u128,
    phrase: String,
    target: String,
}

fn small_scenario() -> SmallScenario {
    let words = split("legal winner thank yellow zoo abandon");
    let engine = CryptoEngine::default();
    let indices = engine.word_indices(&words).unwrap();

    let mut enumerator = PermutationEnumerator::new(words.len()).unwrap();
    let (match_ordinal, permutation) = loop {
        let ordinal = enumerator.processed();
        let permutation = enumerator
            .next_permutation()
            .expect("some ordering of 6 words must pass the 2-bit checksum")
            .to_vec();
        let permuted: Vec<u16> = permutation.iter().map(|&p| indices[p]).collect();
        if CryptoEngine::validate_checksum(&permuted) {
            break (ordinal, permutation);
        }
    };

    let phrase = permutation
        .iter()
        .map(|&p| words[p].as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let seed = engine.derive_seed(&phrase, "").unwrap();
    let deriver = AddressDeriver::new(Network::Bitcoin);
    let path = parse_path("m/84'/0'/0'/0/0").unwrap();
    let target = deriver.derive_address(&seed, &path).unwrap().to_string();

    SmallScenario {
        words,
        match_ordinal,
        phrase,
        target,
    }
}

#[test]
fn test_known_vectors_validate_and_stretch() {
    let engine = CryptoEngine::default();

    for vector in TEST_VECTORS {
        let words = split(vector.mnemonic);
        match engine.validate_and_seed(&words, vector.passphrase).unwrap() {
            PhraseOutcome::Valid(seed) => {
                assert_eq!(seed.to_hex(), vector.seed_hex, "{}", vector.mnemonic)
            }
            PhraseOutcome::Invalid => panic!("known vector rejected: {}", vector.mnemonic),
        }
    }
}

#[test]
fn test_checksum_agrees_with_bip39_parser() {
    let engine = CryptoEngine::default();

    for vector in TEST_VECTORS {
        let words = split(vector.mnemonic);
        let indices = engine.word_indices(&words).unwrap();
        assert!(CryptoEngine::validate_checksum(&indices));
        assert!(bip39::Mnemonic::parse_in(bip39::Language::English, vector.mnemonic).is_ok());
    }

    // A single-word swap must be rejected by both implementations.
    let mut words = split(CANONICAL_12);
    *words.last_mut().unwrap() = "abandon".to_string();
    let swapped = words.join(" ");
    let indices = engine.word_indices(&words).unwrap();
    assert!(!CryptoEngine::validate_checksum(&indices));
    assert!(bip39::Mnemonic::parse_in(bip39::Language::English, &swapped).is_err());
}

#[test]
fn test_canonical_ordering_found_end_to_end() {
    let checkpoint = temp_checkpoint("canonical");
    let config = quiet_config(
        split(CANONICAL_12),
        BIP84_RECEIVE_0.to_string(),
        checkpoint.clone(),
    );

    let mut driver = SearchDriver::new(config, Arc::new(AtomicBool::new(false))).unwrap();
    match driver.run().unwrap() {
        SearchOutcome::Found {
            matched,
            permutations_checked,
        } => {
            assert_eq!(matched.phrase, CANONICAL_12);
            assert_eq!(matched.address, BIP84_RECEIVE_0);
            assert_eq!(matched.derivation_path, "m/84'/0'/0'/0/0");
            assert_eq!(permutations_checked, 1);
        }
        other => panic!("expected Found, got {:?}", other),
    }
    assert!(!checkpoint.exists());
}

#[test]
fn test_small_set_found_from_any_earlier_ordinal() {
    let scenario = small_scenario();

    let resume_points = [0, scenario.match_ordinal / 2, scenario.match_ordinal];
    for &resume_from in &resume_points {
        let checkpoint = temp_checkpoint(&format!("resume-{}", resume_from));
        if resume_from > 0 {
            CheckpointStore::new(checkpoint.clone()).save(resume_from).unwrap();
        }

        let mut config = quiet_config(
            scenario.words.clone(),
            scenario.target.clone(),
            checkpoint.clone(),
        );
        config.derivation_paths = vec!["m/84'/0'/0'/0/0".to_string()];

        let mut driver = SearchDriver::new(config, Arc::new(AtomicBool::new(false))).unwrap();
        match driver.run().unwrap() {
            SearchOutcome::Found {
                matched,
                permutations_checked,
            } => {
                assert_eq!(matched.phrase, scenario.phrase, "resumed from {}", resume_from);
                assert_eq!(permutations_checked, scenario.match_ordinal + 1);
            }
            other => panic!("expected Found resuming from {}, got {:?}", resume_from, other),
        }
        assert!(!checkpoint.exists());
    }
}

#[test]
fn test_small_set_resumed_past_match_exhausts() {
    let scenario = small_scenario();

    let checkpoint = temp_checkpoint("past-match");
    CheckpointStore::new(checkpoint.clone())
        .save(scenario.match_ordinal + 1)
        .unwrap();

    let mut config = quiet_config(
        scenario.words.clone(),
        scenario.target.clone(),
        checkpoint.clone(),
    );
    config.derivation_paths = vec!["m/84'/0'/0'/0/0".to_string()];

    let mut driver = SearchDriver::new(config, Arc::new(AtomicBool::new(false))).unwrap();
    match driver.run().unwrap() {
        SearchOutcome::Exhausted {
            permutations_checked,
        } => assert_eq!(permutations_checked, 720),
        other => panic!("expected Exhausted, got {:?}", other),
    }
    assert!(!checkpoint.exists());
}

#[test]
fn test_small_set_stale_checkpoint_restarts_and_finds() {
    let scenario = small_scenario();

    let checkpoint = temp_checkpoint("stale-small");
    // Larger than 6! = 720: stale state from some other word set.
    CheckpointStore::new(checkpoint.clone()).save(10_000).unwrap();

    let mut config = quiet_config(
        scenario.words.clone(),
        scenario.target.clone(),
        checkpoint.clone(),
    );
    config.derivation_paths = vec!["m/84'/0'/0'/0/0".to_string()];

    let mut driver = SearchDriver::new(config, Arc::new(AtomicBool::new(false))).unwrap();
    match driver.run().unwrap() {
        SearchOutcome::Found { matched, .. } => assert_eq!(matched.phrase, scenario.phrase),
        other => panic!("expected Found, got {:?}", other),
    }
    assert!(!checkpoint.exists());
}

#[test]
fn test_no_valid_ordering_exhausts_exactly() {
    // Four words: no ordering can carry a BIP-39 checksum, so every one of
    // the 4! = 24 permutations is evaluated and rejected.
    let checkpoint = temp_checkpoint("exhaust");
    let config = quiet_config(
        split("abandon ability able about"),
        BIP84_RECEIVE_0.to_string(),
        checkpoint.clone(),
    );

    let mut driver = SearchDriver::new(config, Arc::new(AtomicBool::new(false))).unwrap();
    match driver.run().unwrap() {
        SearchOutcome::Exhausted {
            permutations_checked,
        } => assert_eq!(permutations_checked, 24),
        other => panic!("expected Exhausted, got {:?}", other),
    }
    assert!(!checkpoint.exists());
}

#[test]
fn test_exhaustion_counts_resumed_work_once() {
    let checkpoint = temp_checkpoint("exhaust-resume");
    CheckpointStore::new(checkpoint.clone()).save(10).unwrap();

    let config = quiet_config(
        split("abandon ability able about"),
        BIP84_RECEIVE_0.to_string(),
        checkpoint.clone(),
    );

    let mut driver = SearchDriver::new(config, Arc::new(AtomicBool::new(false))).unwrap();
    match driver.run().unwrap() {
        SearchOutcome::Exhausted {
            permutations_checked,
        } => assert_eq!(permutations_checked, 24),
        other => panic!("expected Exhausted, got {:?}", other),
    }
    assert!(!checkpoint.exists());
}

#[test]
fn test_parallel_evaluation_finds_the_match() {
    let scenario = small_scenario();

    let checkpoint = temp_checkpoint("parallel");
    let mut config = quiet_config(
        scenario.words.clone(),
        scenario.target.clone(),
        checkpoint.clone(),
    );
    config.derivation_paths = vec!["m/84'/0'/0'/0/0".to_string()];
    config.num_threads = 2;

    let mut driver = SearchDriver::new(config, Arc::new(AtomicBool::new(false))).unwrap();
    match driver.run().unwrap() {
        SearchOutcome::Found { matched, .. } => assert_eq!(matched.phrase, scenario.phrase),
        other => panic!("expected Found, got {:?}", other),
    }
    assert!(!checkpoint.exists());
}

#[test]
fn test_cancelled_run_leaves_resumable_checkpoint() {
    let scenario = small_scenario();

    let checkpoint = temp_checkpoint("cancelled");
    let mut config = quiet_config(
        scenario.words.clone(),
        scenario.target.clone(),
        checkpoint.clone(),
    );
    config.derivation_paths = vec!["m/84'/0'/0'/0/0".to_string()];

    let stop = Arc::new(AtomicBool::new(true));
    let mut driver = SearchDriver::new(config, stop).unwrap();
    assert!(matches!(driver.run(), Err(RecoveryError::Cancelled)));

    // The saved count resumes a later run without re-deriving anything lost.
    assert!(checkpoint.exists());
    assert_eq!(CheckpointStore::new(checkpoint.clone()).load(), 0);
    let _ = std::fs::remove_file(&checkpoint);
}
