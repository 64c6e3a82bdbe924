//! Progress reporting and rate tracking

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::info;

/// Periodic progress snapshot handed to reporting
#[derive(Debug, Clone)]
pub struct ProgressReport {
    /// Permutations fully processed, including resumed work
    pub processed: u128,
    /// Total permutations in the search space
    pub total: u128,
    /// Permutations per second since this process started
    pub rate: f64,
    /// Time elapsed in this process
    pub elapsed: Duration,
}

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Whether to show a progress bar
    pub show_progress_bar: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            show_progress_bar: true,
        }
    }
}

/// Tracks and renders search progress.
///
/// The rate excludes work resumed from a checkpoint: only permutations
/// processed by this process divide into this process's elapsed time.
#[derive(Debug)]
pub struct SearchMonitor {
    total: u128,
    resumed_from: u128,
    start_time: Instant,
    progress_bar: Option<ProgressBar>,
}

impl SearchMonitor {
    /// Create a monitor for a search over `total` permutations.
    ///
    /// A 24-word set has more permutations than the bar's u64 position can
    /// hold; those runs fall back to a spinner.
    pub fn new(total: u128, config: MonitorConfig) -> Self {
        let progress_bar = if config.show_progress_bar {
            let pb = match u64::try_from(total) {
                Ok(len) => {
                    let pb = ProgressBar::new(len);
                    pb.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                            .unwrap()
                            .progress_chars("#>-"),
                    );
                    pb
                }
                Err(_) => {
                    let pb = ProgressBar::new_spinner();
                    pb.set_style(
                        ProgressStyle::default_spinner()
                            .template("{spinner:.green} [{elapsed_precise}] {msg}")
                            .unwrap(),
                    );
                    pb
                }
            };
            pb.set_message("Searching for matching ordering...");
            Some(pb)
        } else {
            None
        };

        Self {
            total,
            resumed_from: 0,
            start_time: Instant::now(),
            progress_bar,
        }
    }

    /// Mark the start of the run, resumed at `resumed_from` permutations
    pub fn begin(&mut self, resumed_from: u128) {
        self.resumed_from = resumed_from;
        self.start_time = Instant::now();

        if resumed_from > 0 {
            info!(
                "Resuming from saved progress: {} permutations",
                utils::format_number(resumed_from)
            );
        }

        if let Some(pb) = &self.progress_bar {
            if pb.length().is_some() {
                pb.set_position(u64::try_from(resumed_from).unwrap_or(u64::MAX));
            }
        }
    }

    /// Record progress and produce a report for logging or display
    pub fn record_progress(&self, processed: u128) -> ProgressReport {
        let elapsed = self.start_time.elapsed();
        let fresh = processed.saturating_sub(self.resumed_from);
        let rate = if elapsed.as_secs_f64() > 0.0 {
            fresh as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        if let Some(pb) = &self.progress_bar {
            if pb.length().is_some() {
                pb.set_position(u64::try_from(processed).unwrap_or(u64::MAX));
            }
            pb.set_message(format!(
                "{} checked | {}",
                utils::format_number(processed),
                utils::format_rate(rate)
            ));
        }

        ProgressReport {
            processed,
            total: self.total,
            rate,
            elapsed,
        }
    }

    /// Finish rendering after a match was found
    pub fn finish_found(&self, processed: u128) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(format!(
                "Match found after {} permutations",
                utils::format_number(processed)
            ));
        }
    }

    /// Finish rendering after the search space was exhausted
    pub fn finish_exhausted(&self, processed: u128) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(format!(
                "Exhausted {} permutations without a match",
                utils::format_number(processed)
            ));
        }
    }

    /// Finish rendering after an external stop request
    pub fn finish_interrupted(&self, processed: u128) {
        if let Some(pb) = &self.progress_bar {
            pb.abandon_with_message(format!(
                "Interrupted at {} permutations",
                utils::format_number(processed)
            ));
        }
    }
}

/// Utility functions for monitoring
pub mod utils {
    use std::time::Duration;

    /// Format duration in human-readable form
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Format large counts with thousands separators
    pub fn format_number(num: u128) -> String {
        let num_str = num.to_string();
        let mut result = String::new();

        for (i, c) in num_str.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }

        result.chars().rev().collect()
    }

    /// Format rate with appropriate units
    pub fn format_rate(rate: f64) -> String {
        if rate >= 1_000_000.0 {
            format!("{:.1}M perms/sec", rate / 1_000_000.0)
        } else if rate >= 1_000.0 {
            format!("{:.1}K perms/sec", rate / 1_000.0)
        } else {
            format!("{:.0} perms/sec", rate)
        }
    }
}
