//! Archive command

use crate::cli::args::ArchiveArgs;
use crate::config::Config;
use crate::error::SpackEnvResult;
use crate::orchestration::Provisioner;

/// Execute the archive command. Always fails for spack environments.
pub async fn execute(args: ArchiveArgs, config: &Config) -> SpackEnvResult<()> {
    let spec = super::environment_spec(&args.env, config)?;
    let path = Provisioner::from_config(config).archive(&spec)?;
    println!("{}", path.display());
    Ok(())
}
