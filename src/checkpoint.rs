//! Durable single-integer checkpoint for resumable searches

use crate::error::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persists the count of fully processed permutations.
///
/// The on-disk format is the decimal count and nothing else, so a human can
/// inspect or edit it. A missing or unparseable file reads as zero; the
/// search restarts from the beginning rather than crashing.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved permutation count, defaulting to 0.
    ///
    /// Never fails: absence means a fresh start, and unreadable or
    /// unparseable content is logged and treated the same way.
    pub fn load(&self) -> u128 {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read checkpoint; starting from 0");
                return 0;
            }
        };

        match content.trim().parse::<u128>() {
            Ok(count) => count,
            Err(_) => {
                warn!(path = %self.path.display(), "checkpoint content is not a count; starting from 0");
                0
            }
        }
    }

    /// Persist the permutation count.
    ///
    /// Writes a sibling temp file, flushes it to disk, then renames it over
    /// the target, so an interrupted save leaves either the old value or the
    /// new one, never a torn write.
    pub fn save(&self, count: u128) -> Result<()> {
        let tmp = self.temp_path();

        let mut file = fs::File::create(&tmp)?;
        file.write_all(count.to_string().as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Remove the persisted state; called once on a terminal outcome.
    ///
    /// Idempotent: clearing an absent checkpoint succeeds.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut os_string = self.path.clone().into_os_string();
        os_string.push(".tmp");
        PathBuf::from(os_string)
    }
}
