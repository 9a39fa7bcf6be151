//! Ensure command - create an environment unless it already exists

use crate::cli::args::EnsureArgs;
use crate::config::{BrokenEnvPolicy, Config};
use crate::env::{EnvState, EnvironmentSpec, SHORT_HASH_LEN};
use crate::error::SpackEnvResult;
use crate::orchestration::{Provisioner, ShellExecutor};
use crate::ui::{self, TaskSpinner, UiContext};
use std::sync::Arc;

/// Execute the ensure command. The environment path is printed to stdout.
pub async fn execute(args: EnsureArgs, config: &Config) -> SpackEnvResult<()> {
    let ctx = UiContext::detect();
    let spec = super::environment_spec(&args.env, config)?;

    let mut provisioner = Provisioner::from_config(config);
    if args.repair {
        provisioner = provisioner.with_broken_policy(BrokenEnvPolicy::Remove);
    }
    if args.no_lock {
        provisioner = provisioner.with_lock(false);
    }

    let (instance, state) = provisioner.status(&spec).await?;
    let in_progress = provisioner.being_created(&instance);

    if args.dry_run {
        let path = provisioner.ensure(&spec, true).await?;
        ui::step_info(&ctx, dry_run_message(state, in_progress));
        println!("{}", path.display());
        return Ok(());
    }

    if state == EnvState::Complete && !in_progress {
        let path = provisioner.ensure(&spec, false).await?;
        println!("{}", path.display());
        return Ok(());
    }

    let path = create(&ctx, provisioner, &spec, config).await?;
    println!("{}", path.display());
    Ok(())
}

fn dry_run_message(state: EnvState, in_progress: bool) -> &'static str {
    match state {
        _ if in_progress => "Environment is being created by another process",
        EnvState::Complete => "Environment already exists",
        EnvState::Broken => "Incomplete environment would be recreated",
        EnvState::Absent => "Environment would be created",
    }
}

async fn create(
    ctx: &UiContext,
    provisioner: Provisioner,
    spec: &EnvironmentSpec,
    config: &Config,
) -> SpackEnvResult<std::path::PathBuf> {
    let hash = spec.identity_hash().await?;
    let spinner = TaskSpinner::start(
        ctx,
        &format!(
            "Creating environment {} from {}",
            &hash[..SHORT_HASH_LEN],
            spec.source().simplify()
        ),
    );

    let listener = spinner.clone();
    let executor = ShellExecutor::new(config.tool.shell.clone())
        .with_listener(Arc::new(move |line: &str| listener.on_line(line)));
    let provisioner = provisioner.with_executor(Arc::new(executor));

    match provisioner.ensure(spec, false).await {
        Ok(path) => {
            spinner.stop("Environment ready");
            Ok(path)
        }
        Err(e) => {
            spinner.stop_error("Environment creation failed");
            Err(e)
        }
    }
}
