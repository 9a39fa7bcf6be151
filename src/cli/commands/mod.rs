//! CLI command implementations

pub mod activate;
pub mod archive;
pub mod completions;
pub mod config;
pub mod ensure;
pub mod hash;
pub mod status;

pub use activate::execute as activate;
pub use archive::execute as archive;
pub use completions::execute as completions;
pub use config::execute as config;
pub use ensure::execute as ensure;
pub use hash::execute as hash;
pub use status::execute as status;

use crate::cli::args::EnvArgs;
use crate::config::Config;
use crate::env::EnvironmentSpec;
use crate::error::SpackEnvResult;
use crate::source::{DefaultSourceReader, SourceRef};
use std::sync::Arc;

/// Build the environment spec named on the command line
fn environment_spec(args: &EnvArgs, config: &Config) -> SpackEnvResult<EnvironmentSpec> {
    let source: SourceRef = args.spec.parse()?;
    let root = args
        .root
        .clone()
        .unwrap_or_else(|| config.env.root_dir.clone());
    Ok(EnvironmentSpec::new(
        source,
        root,
        Arc::new(DefaultSourceReader::new()),
    ))
}
