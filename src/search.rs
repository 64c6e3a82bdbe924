//! Search driver: ties enumeration, evaluation and checkpointing together

use crate::checkpoint::CheckpointStore;
use crate::config::SearchConfig;
use crate::enumerator::PermutationEnumerator;
use crate::error::{RecoveryError, Result};
use crate::evaluator::{CandidateEvaluator, MatchedPhrase};
use crate::monitor::{utils, MonitorConfig, SearchMonitor};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Terminal outcome of a search run.
///
/// There is no partial result: either one ordering matched, or every
/// ordering was checked without a match.
#[derive(Debug)]
pub enum SearchOutcome {
    /// An ordering derived the target address
    Found {
        matched: MatchedPhrase,
        permutations_checked: u128,
    },
    /// The whole search space was checked without a match
    Exhausted { permutations_checked: u128 },
}

/// Drives the search loop: INIT, then RUNNING until FOUND or EXHAUSTED.
///
/// The checkpoint only ever advances past work that has fully completed, so
/// a resumed run re-checks at most the window since the last save and never
/// skips an ordering.
pub struct SearchDriver {
    config: SearchConfig,
    evaluator: CandidateEvaluator,
    enumerator: PermutationEnumerator,
    checkpoint: CheckpointStore,
    monitor: SearchMonitor,
    stop: Arc<AtomicBool>,
}

impl SearchDriver {
    /// Build a driver from a run configuration and a shared stop flag
    pub fn new(config: SearchConfig, stop: Arc<AtomicBool>) -> Result<Self> {
        let evaluator = CandidateEvaluator::new(&config)?;
        let enumerator = PermutationEnumerator::new(config.words.len())?;
        let checkpoint = CheckpointStore::new(config.checkpoint_file.clone());
        let monitor = SearchMonitor::new(
            enumerator.total_permutations(),
            MonitorConfig {
                show_progress_bar: config.show_progress_bar,
            },
        );

        Ok(Self {
            config,
            evaluator,
            enumerator,
            checkpoint,
            monitor,
            stop,
        })
    }

    /// Run the search to a terminal outcome.
    ///
    /// An external stop request surfaces as `RecoveryError::Cancelled` after
    /// the completed count has been saved; everything else recoverable is
    /// logged and absorbed.
    pub fn run(&mut self) -> Result<SearchOutcome> {
        let total = self.enumerator.total_permutations();

        // INIT: load the checkpoint and position the enumerator.
        let saved = self.checkpoint.load();
        let resumed = if saved > total {
            warn!(
                "Checkpoint count {} exceeds {} total permutations; restarting from the beginning",
                utils::format_number(saved),
                utils::format_number(total)
            );
            0
        } else {
            saved
        };
        self.enumerator.skip_to(resumed)?;
        self.monitor.begin(resumed);

        info!(
            "Searching {} orderings of {} words across {} derivation paths",
            utils::format_number(total),
            self.config.words.len(),
            self.config.derivation_paths.len()
        );

        // RUNNING: pull, evaluate, checkpoint.
        let mut processed = resumed;
        let mut last_saved = resumed;
        let mut last_reported = resumed;
        let mut batch: Vec<Vec<usize>> = Vec::with_capacity(self.config.batch_size);

        loop {
            if self.stop.load(Ordering::Relaxed) {
                if let Err(e) = self.checkpoint.save(processed) {
                    warn!(error = %e, "failed to save checkpoint on interrupt");
                }
                self.monitor.finish_interrupted(processed);
                return Err(RecoveryError::Cancelled);
            }

            batch.clear();
            while batch.len() < self.config.batch_size {
                match self.enumerator.next_permutation() {
                    Some(permutation) => batch.push(permutation.to_vec()),
                    None => break,
                }
            }

            if batch.is_empty() {
                // EXHAUSTED
                self.monitor.finish_exhausted(processed);
                info!(
                    "Search space exhausted after {} permutations",
                    utils::format_number(processed)
                );
                if let Err(e) = self.checkpoint.clear() {
                    warn!(error = %e, "failed to remove checkpoint file");
                }
                return Ok(SearchOutcome::Exhausted {
                    permutations_checked: processed,
                });
            }

            match self.evaluate_batch(&batch) {
                Some((offset, matched)) => {
                    // FOUND: persist the final count for audit, then clear.
                    processed += offset as u128 + 1;
                    if let Err(e) = self.checkpoint.save(processed) {
                        warn!(error = %e, "failed to save final count");
                    }
                    self.monitor.finish_found(processed);
                    info!(
                        "Match found after {} permutations",
                        utils::format_number(processed)
                    );
                    if let Err(e) = self.checkpoint.clear() {
                        warn!(error = %e, "failed to remove checkpoint file");
                    }
                    return Ok(SearchOutcome::Found {
                        matched,
                        permutations_checked: processed,
                    });
                }
                None => {
                    processed += batch.len() as u128;

                    if processed - last_reported >= self.config.progress_interval as u128 {
                        let report = self.monitor.record_progress(processed);
                        debug!(
                            "Checked {} of {} permutations ({})",
                            utils::format_number(report.processed),
                            utils::format_number(report.total),
                            utils::format_rate(report.rate)
                        );
                        last_reported = processed;
                    }

                    if processed - last_saved >= self.config.save_interval as u128 {
                        match self.checkpoint.save(processed) {
                            Ok(()) => last_saved = processed,
                            Err(e) => {
                                warn!(error = %e, "checkpoint save failed; search continues")
                            }
                        }
                    }
                }
            }
        }
    }

    /// Evaluate a batch, returning the in-batch offset of a match.
    ///
    /// Sequential evaluation returns the earliest match in the batch. With
    /// more than one thread the batch fans out over the rayon pool and any
    /// thread's match wins; the checkpoint still only moves at batch joins.
    fn evaluate_batch(&self, batch: &[Vec<usize>]) -> Option<(usize, MatchedPhrase)> {
        if self.config.num_threads > 1 {
            batch
                .par_iter()
                .enumerate()
                .find_map_any(|(offset, permutation)| {
                    if self.stop.load(Ordering::Relaxed) {
                        return None;
                    }
                    self.evaluator
                        .evaluate(permutation)
                        .map(|matched| (offset, matched))
                })
        } else {
            batch.iter().enumerate().find_map(|(offset, permutation)| {
                self.evaluator
                    .evaluate(permutation)
                    .map(|matched| (offset, matched))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const CANONICAL_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const BIP84_RECEIVE_0: &str = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";

    fn test_config(name: &str) -> SearchConfig {
        let mut config = SearchConfig::for_words_and_target(
            CANONICAL_12.split_whitespace().map(String::from).collect(),
            BIP84_RECEIVE_0.to_string(),
        );
        config.checkpoint_file = std::env::temp_dir().join(format!(
            "seed-unscrambler-search-{}-{}.txt",
            std::process::id(),
            name
        ));
        config.batch_size = 16;
        config.num_threads = 1;
        config.show_progress_bar = false;
        config
    }

    fn cleanup(path: &PathBuf) {
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_found_on_first_permutation() {
        let config = test_config("first");
        let path = config.checkpoint_file.clone();
        cleanup(&path);

        let stop = Arc::new(AtomicBool::new(false));
        let mut driver = SearchDriver::new(config, stop).unwrap();

        match driver.run().unwrap() {
            SearchOutcome::Found {
                matched,
                permutations_checked,
            } => {
                assert_eq!(matched.phrase, CANONICAL_12);
                assert_eq!(matched.address, BIP84_RECEIVE_0);
                assert_eq!(permutations_checked, 1);
            }
            other => panic!("expected Found, got {:?}", other),
        }

        // Terminal outcome removes the checkpoint.
        assert!(!path.exists());
    }

    #[test]
    fn test_stale_checkpoint_resets_to_zero() {
        let config = test_config("stale");
        let path = config.checkpoint_file.clone();
        cleanup(&path);

        // A count from some other word set, far beyond 12!.
        CheckpointStore::new(path.clone()).save(1_000_000_000_000).unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let mut driver = SearchDriver::new(config, stop).unwrap();

        match driver.run().unwrap() {
            SearchOutcome::Found {
                permutations_checked,
                ..
            } => assert_eq!(permutations_checked, 1),
            other => panic!("expected Found, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_immediate_stop_is_cancelled_and_saves() {
        let config = test_config("cancel");
        let path = config.checkpoint_file.clone();
        cleanup(&path);

        let stop = Arc::new(AtomicBool::new(true));
        let mut driver = SearchDriver::new(config, stop).unwrap();

        assert!(matches!(driver.run(), Err(RecoveryError::Cancelled)));
        // The completed count (zero) was persisted for the next run.
        assert!(path.exists());
        assert_eq!(CheckpointStore::new(path.clone()).load(), 0);
        cleanup(&path);
    }
}
