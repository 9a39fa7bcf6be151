//! spackenv - content-addressed Spack environments
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use spackenv::cli::{Cli, Commands};
use spackenv::config::ConfigManager;
use spackenv::error::SpackEnvResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SpackEnvResult<()> {
    let cli = Cli::parse();

    // Completions need neither logging nor config
    if let Commands::Completions(args) = cli.command {
        return spackenv::cli::commands::completions(args);
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("spackenv=warn"),
        1 => EnvFilter::new("spackenv=info"),
        _ => EnvFilter::new("spackenv=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    match cli.command {
        Commands::Completions(_) => unreachable!("completions handled above"),
        Commands::Ensure(args) => spackenv::cli::commands::ensure(args, &config).await,
        Commands::Hash(args) => spackenv::cli::commands::hash(args, &config).await,
        Commands::Status(args) => spackenv::cli::commands::status(args, &config).await,
        Commands::Archive(args) => spackenv::cli::commands::archive(args, &config).await,
        Commands::Activate(args) => spackenv::cli::commands::activate(args, &config).await,
        Commands::Config(args) => {
            spackenv::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
