//! Hash command - print the identity hash of a specification

use crate::cli::args::HashArgs;
use crate::config::Config;
use crate::error::SpackEnvResult;

/// Execute the hash command
pub async fn execute(args: HashArgs, config: &Config) -> SpackEnvResult<()> {
    let spec = super::environment_spec(&args.env, config)?;
    println!("{}", spec.identity_hash().await?);
    Ok(())
}
