//! Idempotent environment provisioning
//!
//! `ensure` hands out an existing environment untouched, reports what a dry
//! run would do, or runs the provisioning sequence:
//!
//! 1. create the environment directory
//! 2. touch `env_setup_start`
//! 3. copy the specification to `spack.yaml`
//! 4. `spack env create --dir <env> <env>/spack.yaml`
//! 5. `spack install` inside the activated environment
//! 6. touch `env_setup_done`
//!
//! Any failure in 1-6 removes the directory again, so a start sentinel
//! without a done sentinel only ever means an interrupted process.

use crate::config::{BrokenEnvPolicy, CleanupMode, Config};
use crate::env::{EnvState, EnvironmentInstance, EnvironmentSpec};
use crate::error::{SpackEnvError, SpackEnvResult};
use crate::orchestration::executor::{ProcessExecutor, ShellExecutor};
use crate::orchestration::locator::{ShellLocator, ToolLocator};
use crate::orchestration::lock::EnvLock;
use crate::orchestration::spack::Spack;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Creates spack environments at most once per identity hash
pub struct Provisioner {
    spack: Spack,
    executor: Arc<dyn ProcessExecutor>,
    locator: Arc<dyn ToolLocator>,
    broken: BrokenEnvPolicy,
    lock: bool,
    cleanup: Vec<CleanupMode>,
}

impl Provisioner {
    /// Create a provisioner with locking on and broken environments refused
    pub fn new(
        spack: Spack,
        executor: Arc<dyn ProcessExecutor>,
        locator: Arc<dyn ToolLocator>,
    ) -> Self {
        Self {
            spack,
            executor,
            locator,
            broken: BrokenEnvPolicy::Fail,
            lock: true,
            cleanup: Vec::new(),
        }
    }

    /// Create a provisioner running spack through the configured shell
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Spack::new(config.tool.executable.clone()),
            Arc::new(ShellExecutor::new(config.tool.shell.clone())),
            Arc::new(ShellLocator::new(config.tool.shell.clone())),
        )
        .with_broken_policy(config.provision.broken)
        .with_lock(config.provision.lock)
        .with_cleanup(config.provision.cleanup.clone())
    }

    /// Replace the process executor
    pub fn with_executor(mut self, executor: Arc<dyn ProcessExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Set how interrupted environments are handled
    pub fn with_broken_policy(mut self, policy: BrokenEnvPolicy) -> Self {
        self.broken = policy;
        self
    }

    /// Enable or disable the cross-process creation lock
    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    /// Set cleanup modes run after a successful install
    pub fn with_cleanup(mut self, cleanup: Vec<CleanupMode>) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Identity hash of `spec`, independent of provisioning
    pub async fn hash(&self, spec: &EnvironmentSpec) -> SpackEnvResult<String> {
        Ok(spec.identity_hash().await?.to_string())
    }

    /// Selected directory and its current state
    pub async fn status(
        &self,
        spec: &EnvironmentSpec,
    ) -> SpackEnvResult<(EnvironmentInstance, EnvState)> {
        let instance = spec.resolve().await?;
        let state = instance.state();
        Ok((instance, state))
    }

    /// Spack environments embed absolute link paths and cannot be relocated,
    /// so archiving always fails.
    pub fn archive(&self, spec: &EnvironmentSpec) -> SpackEnvResult<PathBuf> {
        Err(SpackEnvError::UnsupportedOperation(format!(
            "spack does not support environment archives ({})",
            spec.source()
        )))
    }

    /// Wrap `cmd` so it runs inside the activated environment of `spec`
    pub async fn shell_command(&self, spec: &EnvironmentSpec, cmd: &str) -> SpackEnvResult<String> {
        let path = spec.resolve_path().await?;
        Ok(self.spack.shell_command(&path, cmd))
    }

    /// Return the path of a complete environment for `spec`, creating it if
    /// needed. With `dry_run` nothing on disk is touched.
    pub async fn ensure(&self, spec: &EnvironmentSpec, dry_run: bool) -> SpackEnvResult<PathBuf> {
        let instance = spec.resolve().await?;
        let state = instance.state();
        debug!("Environment {} is {}", instance.path.display(), state);

        // A creator holding the lock may not have written any sentinel yet,
        // so whatever is on disk is not trusted until the lock is ours
        let in_progress = self.being_created(&instance);

        match state {
            EnvState::Complete if !in_progress => return Ok(instance.path),
            EnvState::Broken if self.broken == BrokenEnvPolicy::Fail && !in_progress => {
                return Err(SpackEnvError::BrokenEnvironment(instance.path));
            }
            _ if dry_run => {
                self.report_dry_run(spec, state, in_progress);
                return Ok(instance.path);
            }
            _ => {}
        }

        self.check_tool().await?;

        let _lock = if self.lock {
            Some(EnvLock::acquire(&instance.lock_path()).await?)
        } else {
            None
        };

        // Another process may have finished (or given up) while we waited
        let instance = spec.resolve().await?;
        match instance.state() {
            EnvState::Complete => {
                info!(
                    "Spack environment {} was created by another process",
                    spec.source().simplify()
                );
                return Ok(instance.path);
            }
            EnvState::Broken => self.repair(&instance).await?,
            EnvState::Absent => {}
        }

        self.provision(spec, &instance).await?;
        Ok(instance.path)
    }

    /// Whether another process holds the creation lock and has not yet
    /// written the done sentinel
    pub fn being_created(&self, instance: &EnvironmentInstance) -> bool {
        self.lock
            && EnvLock::is_held(&instance.lock_path())
            && !instance.done_sentinel().exists()
    }

    fn report_dry_run(&self, spec: &EnvironmentSpec, state: EnvState, in_progress: bool) {
        let name = spec.source().simplify();
        match state {
            _ if in_progress => {
                info!("Spack environment {} is being created by another process.", name)
            }
            EnvState::Broken => info!("Incomplete spack environment {} will be recreated.", name),
            _ => info!("Spack environment {} will be created.", name),
        }
    }

    async fn check_tool(&self) -> SpackEnvResult<()> {
        let found = self.locator.find_executable(self.spack.executable()).await?;
        debug!("Using {} ({})", self.spack.executable(), found.display());
        Ok(())
    }

    async fn repair(&self, instance: &EnvironmentInstance) -> SpackEnvResult<()> {
        match self.broken {
            BrokenEnvPolicy::Fail => Err(SpackEnvError::BrokenEnvironment(instance.path.clone())),
            BrokenEnvPolicy::Remove => {
                info!(
                    "Removing incomplete environment {}",
                    instance.path.display()
                );
                fs::remove_dir_all(&instance.path).await.map_err(|e| {
                    SpackEnvError::io(
                        format!("removing incomplete environment {}", instance.path.display()),
                        e,
                    )
                })
            }
        }
    }

    async fn provision(
        &self,
        spec: &EnvironmentSpec,
        instance: &EnvironmentInstance,
    ) -> SpackEnvResult<()> {
        let content = spec.content().await?;
        let name = spec.source().simplify();
        info!("Creating spack environment {}...", name);

        match self.run_sequence(instance, content).await {
            Ok(output) => {
                debug!("{}", output);
                info!(
                    "Environment for {} created (location: {})",
                    name,
                    instance.path.display()
                );
                self.run_cleanup().await;
                Ok(())
            }
            Err(e) => {
                rollback(&instance.path).await;
                Err(match e {
                    SpackEnvError::CommandExit { output, .. } => SpackEnvError::ProvisioningFailed {
                        spec: spec.source().to_string(),
                        output,
                    },
                    SpackEnvError::CommandFailed { command, source } => {
                        SpackEnvError::ProvisioningFailed {
                            spec: spec.source().to_string(),
                            output: format!("{}: {}", command, source),
                        }
                    }
                    other => other,
                })
            }
        }
    }

    async fn run_sequence(
        &self,
        instance: &EnvironmentInstance,
        content: &[u8],
    ) -> SpackEnvResult<String> {
        fs::create_dir_all(&instance.path)
            .await
            .map_err(|e| SpackEnvError::io(format!("creating {}", instance.path.display()), e))?;
        touch(&instance.start_sentinel()).await?;

        // Keep the specification next to the environment for inspection
        let artifact = instance.artifact_path();
        fs::write(&artifact, content)
            .await
            .map_err(|e| SpackEnvError::io(format!("writing {}", artifact.display()), e))?;

        info!("Downloading and installing remote packages.");
        let mut output = String::new();
        for command in [
            self.spack.env_create(&instance.path, &artifact),
            self.spack.install(&instance.path),
        ] {
            info!("{}", command);
            output = self.executor.run(&command).await?;
        }

        touch(&instance.done_sentinel()).await?;
        Ok(output)
    }

    async fn run_cleanup(&self) {
        for mode in &self.cleanup {
            let command = self.spack.clean(*mode);
            info!("Cleaning up spack {}: {}", mode, command);
            if let Err(e) = self.executor.run(&command).await {
                warn!("Cleanup of spack {} failed: {}", mode, e);
            }
        }
    }
}

async fn touch(path: &Path) -> SpackEnvResult<()> {
    fs::File::create(path)
        .await
        .map(|_| ())
        .map_err(|e| SpackEnvError::io(format!("creating {}", path.display()), e))
}

/// Remove a partially created environment; errors are logged, never raised.
async fn rollback(path: &Path) {
    match fs::remove_dir_all(path).await {
        Ok(()) => debug!("Removed partial environment {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Failed to remove partial environment {}: {}",
            path.display(),
            e
        ),
    }
}
