//! Content-addressed environment identity
//!
//! Every environment lives in a directory named after a hash of its
//! specification content and the absolute root directory it is stored under.
//! Same content under the same root = same environment.
//!
//! # Identity
//!
//! - Hash = SHA256 over the canonical root path followed by the raw spec bytes
//! - Moving the root invalidates every environment (binaries embed absolute RPATHs)
//! - Directories named after the 8-character hash prefix are still honoured
//!
//! # Environment States
//!
//! State is read from sentinel files on every query, never cached in memory.
//!
//! | State | Sentinels | Description |
//! |-------|-----------|-------------|
//! | Absent | directory missing | Safe to create |
//! | Broken | start, no done | Setup was interrupted, needs explicit repair |
//! | Complete | start + done (or neither) | Finalized, reused as-is |

pub mod instance;
pub mod spec;

pub use instance::{
    EnvState, EnvironmentInstance, DONE_SENTINEL, SHORT_HASH_LEN, SPEC_ARTIFACT, START_SENTINEL,
};
pub use spec::{canonical_root, EnvironmentSpec};
