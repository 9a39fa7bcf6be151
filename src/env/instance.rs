//! On-disk environment instances
//!
//! Resolves an identity hash to a directory and derives the environment's
//! state from the sentinel files inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Marker written before the tool is invoked
pub const START_SENTINEL: &str = "env_setup_start";

/// Marker written once the tool has finished successfully
pub const DONE_SENTINEL: &str = "env_setup_done";

/// Copy of the specification kept inside the environment directory
pub const SPEC_ARTIFACT: &str = "spack.yaml";

/// Length of the legacy short-hash directory names
pub const SHORT_HASH_LEN: usize = 8;

/// State of an environment directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvState {
    /// No directory exists (will be created)
    Absent,
    /// Setup started but never finished
    Broken,
    /// Environment is finalized and immutable
    Complete,
}

impl EnvState {
    /// Classify the directory at `path` from sentinel evidence
    pub fn detect(path: &Path) -> Self {
        // A stray file named like an environment is not one
        if !path.is_dir() {
            return Self::Absent;
        }

        let started = path.join(START_SENTINEL).exists();
        let done = path.join(DONE_SENTINEL).exists();

        if started && !done {
            Self::Broken
        } else {
            // Directories without any sentinel predate the marker files
            Self::Complete
        }
    }

    /// Whether the directory may be handed out without provisioning
    pub fn is_reusable(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for EnvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Broken => write!(f, "broken"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// An environment directory selected for an identity hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentInstance {
    /// Full identity hash
    pub hash: String,
    /// Selected directory (full or short hash)
    pub path: PathBuf,
}

impl EnvironmentInstance {
    /// Pick the directory for `hash` under `root`.
    ///
    /// The full-hash directory wins when it exists or when no short-hash
    /// directory exists. An existing short-hash directory is only used while
    /// there is no full-hash one. Evaluated against the live filesystem on
    /// every call.
    pub fn resolve(root: &Path, hash: &str) -> Self {
        let short = root.join(&hash[..SHORT_HASH_LEN.min(hash.len())]);
        let full = root.join(hash);

        let path = if full.is_dir() || !short.is_dir() {
            full
        } else {
            short
        };

        Self {
            hash: hash.to_string(),
            path,
        }
    }

    /// Current state, recomputed from disk
    pub fn state(&self) -> EnvState {
        EnvState::detect(&self.path)
    }

    /// Whether the legacy short-hash directory was selected
    pub fn is_short(&self) -> bool {
        self.path.file_name().and_then(|n| n.to_str()) != Some(self.hash.as_str())
    }

    pub fn start_sentinel(&self) -> PathBuf {
        self.path.join(START_SENTINEL)
    }

    pub fn done_sentinel(&self) -> PathBuf {
        self.path.join(DONE_SENTINEL)
    }

    /// Path of the materialized specification
    pub fn artifact_path(&self) -> PathBuf {
        self.path.join(SPEC_ARTIFACT)
    }

    /// Lock file next to (not inside) the environment directory
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// When the done sentinel was written, if it exists
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        std::fs::metadata(self.done_sentinel())
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }
}
