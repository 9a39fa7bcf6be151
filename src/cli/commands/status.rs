//! Status command - show where an environment lives and its state

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::env::{EnvState, EnvironmentInstance};
use crate::error::SpackEnvResult;
use crate::orchestration::Provisioner;
use crate::ui::{self, UiContext};
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

/// Status report for one specification
#[derive(Debug, Serialize)]
struct StatusReport {
    source: String,
    hash: String,
    path: String,
    state: EnvState,
    short_path: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl StatusReport {
    fn new(source: String, hash: String, instance: &EnvironmentInstance, state: EnvState) -> Self {
        Self {
            source,
            hash,
            path: instance.path.display().to_string(),
            state,
            short_path: instance.is_short(),
            completed_at: instance.completed_at(),
        }
    }
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> SpackEnvResult<()> {
    let spec = super::environment_spec(&args.env, config)?;
    let (instance, state) = Provisioner::from_config(config).status(&spec).await?;
    let hash = spec.identity_hash().await?.to_string();
    let report = StatusReport::new(spec.source().to_string(), hash, &instance, state);

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => print_plain(&report),
    }

    Ok(())
}

fn print_table(report: &StatusReport) {
    let ctx = UiContext::detect();
    println!("{}", style("Environment").cyan().bold());
    ui::key_value(&ctx, "source", &report.source);
    ui::key_value(&ctx, "hash", &report.hash);
    ui::key_value(&ctx, "path", &report.path);
    ui::key_value_status(
        &ctx,
        "state",
        &report.state.to_string(),
        report.state.is_reusable(),
    );
    if let Some(completed) = report.completed_at {
        ui::key_value(
            &ctx,
            "completed",
            &completed.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
    }
    if report.short_path {
        ui::key_value(&ctx, "layout", "legacy short-hash directory");
    }
}

fn print_plain(report: &StatusReport) {
    println!("{}\t{}\t{}", report.state, report.hash, report.path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn report_for_complete_environment() {
        let root = TempDir::new().unwrap();
        let hash = "098300fbac980bb84ba56a4c92bdd2b9e53c7a31d629b5d0f55743b531b0611b";
        let dir = root.path().join(hash);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("env_setup_start"), "").unwrap();
        fs::write(dir.join("env_setup_done"), "").unwrap();

        let instance = EnvironmentInstance::resolve(root.path(), hash);
        let state = instance.state();
        let report = StatusReport::new("env.yaml".into(), hash.into(), &instance, state);

        assert_eq!(report.state, EnvState::Complete);
        assert!(!report.short_path);
        assert!(report.completed_at.is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"], "complete");
        assert_eq!(json["hash"], hash);
    }

    #[test]
    fn report_for_absent_environment() {
        let root = TempDir::new().unwrap();
        let instance = EnvironmentInstance::resolve(root.path(), "abcdef0123456789");
        let state = instance.state();
        let report =
            StatusReport::new("env.yaml".into(), "abcdef0123456789".into(), &instance, state);

        assert_eq!(report.state, EnvState::Absent);
        assert!(report.completed_at.is_none());
        print_plain(&report);
        print_table(&report);
    }
}
