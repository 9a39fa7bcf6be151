//! Completions command

use crate::cli::args::{Cli, CompletionsArgs};
use crate::error::SpackEnvResult;
use clap::CommandFactory;

/// Write completions for the requested shell to stdout
pub fn execute(args: CompletionsArgs) -> SpackEnvResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
