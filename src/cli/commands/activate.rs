//! Activate command - wrap a command line for the environment

use crate::cli::args::ActivateArgs;
use crate::config::Config;
use crate::error::SpackEnvResult;
use crate::orchestration::{shell_quote, Provisioner};

/// Execute the activate command.
///
/// Prints the wrapped line instead of running it, so callers can
/// `eval` it or hand it to their own job runner.
pub async fn execute(args: ActivateArgs, config: &Config) -> SpackEnvResult<()> {
    let spec = super::environment_spec(&args.env, config)?;
    let cmd = args
        .command
        .iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ");
    let line = Provisioner::from_config(config)
        .shell_command(&spec, &cmd)
        .await?;
    println!("{}", line);
    Ok(())
}
