//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// spackenv - content-addressed Spack environments
///
/// Creates each distinct environment specification once, under a directory
/// named by its hash, and hands out the same path on every later request.
#[derive(Parser, Debug)]
#[command(name = "spackenv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SPACKENV_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the environment for a specification unless it already exists
    Ensure(EnsureArgs),

    /// Print the identity hash of a specification
    Hash(HashArgs),

    /// Show where an environment lives and whether it is usable
    Status(StatusArgs),

    /// Archive an environment (not supported for spack)
    Archive(ArchiveArgs),

    /// Print a command line that runs inside the activated environment
    Activate(ActivateArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Specification and storage root shared by environment commands
#[derive(Parser, Debug, Clone)]
pub struct EnvArgs {
    /// Specification: a file path, an http(s) URL, or git+<repo>@<rev>:<path>
    pub spec: String,

    /// Root directory for environments (overrides env.root_dir)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

/// Arguments for the ensure command
#[derive(Parser, Debug)]
pub struct EnsureArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Report what would happen without touching disk
    #[arg(long)]
    pub dry_run: bool,

    /// Remove an interrupted environment and create it again
    #[arg(long)]
    pub repair: bool,

    /// Do not take the cross-process creation lock
    #[arg(long)]
    pub no_lock: bool,
}

/// Arguments for the hash command
#[derive(Parser, Debug)]
pub struct HashArgs {
    #[command(flatten)]
    pub env: EnvArgs,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the archive command
#[derive(Parser, Debug)]
pub struct ArchiveArgs {
    #[command(flatten)]
    pub env: EnvArgs,
}

/// Arguments for the activate command
#[derive(Parser, Debug)]
pub struct ActivateArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Command to wrap (after --)
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Output format for status
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
    /// Single line, tab separated
    Plain,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
