//! Configuration schema for spackenv
//!
//! Configuration is stored at `~/.config/spackenv/config.toml`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Environment storage layout
    pub env: EnvConfig,

    /// External tool settings
    pub tool: ToolConfig,

    /// Provisioning behaviour
    pub provision: ProvisionConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Where environments live on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Root directory holding one subdirectory per environment hash
    pub root_dir: PathBuf,

    /// Directory for archived environments (spack environments cannot be archived)
    pub archive_dir: PathBuf,
}

impl Default for EnvConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spackenv");
        Self {
            root_dir: base.join("envs"),
            archive_dir: base.join("archive"),
        }
    }
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Name or path of the spack executable
    pub executable: String,

    /// Shell used to run spack commands
    pub shell: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable: "spack".to_string(),
            shell: "/bin/sh".to_string(),
        }
    }
}

/// What to do when an interrupted setup is found on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokenEnvPolicy {
    /// Refuse to continue until the caller asks for repair
    #[default]
    Fail,
    /// Delete the incomplete directory and provision again
    Remove,
}

/// Housekeeping run after a successful install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupMode {
    /// Downloaded source tarballs
    Tarballs,
    /// Spack's miscellaneous cache
    Cache,
}

impl CleanupMode {
    /// The `spack clean` flag for this mode
    pub fn clean_flag(&self) -> &'static str {
        match self {
            Self::Tarballs => "--downloads",
            Self::Cache => "--misc-cache",
        }
    }
}

impl fmt::Display for CleanupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tarballs => write!(f, "tarballs"),
            Self::Cache => write!(f, "cache"),
        }
    }
}

/// Provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Hold an exclusive lock file while an environment is being created
    pub lock: bool,

    /// Handling of environments left behind by an interrupted setup
    pub broken: BrokenEnvPolicy,

    /// Cleanup modes applied after a successful install
    pub cleanup: Vec<CleanupMode>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            lock: true,
            broken: BrokenEnvPolicy::Fail,
            cleanup: vec![],
        }
    }
}
