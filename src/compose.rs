//! Container lifecycle through the engine's CLI.
//!
//! Every call goes through [`ComposeRunner`] so the sequence can be
//! exercised without a container engine.

use crate::config::ComposeConfig;
use crate::error::{AppError, AppResult};
use crate::output;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured result of one engine invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stderr if present, otherwise stdout
    pub fn message(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

#[async_trait]
pub trait ComposeRunner: Send + Sync {
    /// Run the engine CLI with `args`. Never fails; a process that could
    /// not be started is reported as an unsuccessful output.
    async fn run(&self, args: &[&str]) -> CommandOutput;

    /// Human-readable command line, for messages.
    fn describe(&self, args: &[&str]) -> String;
}

/// Runs the real `docker` binary.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ComposeRunner for DockerCli {
    async fn run(&self, args: &[&str]) -> CommandOutput {
        debug!("Running {}", self.describe(args));
        match Command::new(&self.program).args(args).output().await {
            Ok(out) => CommandOutput {
                success: out.status.success(),
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            },
            Err(e) => {
                warn!("Failed to start {}: {}", self.program, e);
                CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: e.to_string(),
                }
            }
        }
    }

    fn describe(&self, args: &[&str]) -> String {
        std::iter::once(self.program.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The daemon and dashboard containers.
pub struct Services<'a> {
    runner: &'a dyn ComposeRunner,
    config: &'a ComposeConfig,
}

impl<'a> Services<'a> {
    pub fn new(runner: &'a dyn ComposeRunner, config: &'a ComposeConfig) -> Self {
        Self { runner, config }
    }

    /// Stop whatever a previous run left behind. The result is ignored.
    pub async fn down(&self) {
        let out = self.runner.run(&["compose", "down"]).await;
        if !out.success {
            debug!("compose down: {}", out.message());
        }
    }

    pub async fn up(&self) -> AppResult<()> {
        let args = ["compose", "up", "-d"];
        let out = self.runner.run(&args).await;
        if !out.success {
            return Err(AppError::compose(self.runner.describe(&args), out.message()));
        }
        Ok(())
    }

    /// Copy the GeoIP database into the daemon container and restart it.
    ///
    /// Failures are reported as warnings; returns whether the copy and the
    /// restart both succeeded.
    pub async fn install_geoip(&self, db: &Path) -> bool {
        let dir = self.config.container_config_dir.as_str();
        let container = self.config.container.as_str();

        let mkdir = self
            .runner
            .run(&["exec", container, "mkdir", "-p", dir])
            .await;
        if !mkdir.success {
            warn!("mkdir in {} failed: {}", container, mkdir.message());
        }

        let source = db.to_string_lossy();
        let target = format!("{}:{}/", container, dir.trim_end_matches('/'));
        let copy = self.runner.run(&["cp", source.as_ref(), target.as_str()]).await;
        if !copy.success {
            output::warning(format!(
                "Could not copy {} into the container: {}",
                db.display(),
                copy.message()
            ));
            return false;
        }
        output::success(format!("Copied {} into {}", db.display(), container));

        output::processing(format!("Restarting {} to load the GeoIP database...", container));
        let restart = self.runner.run(&["restart", container]).await;
        if !restart.success {
            output::warning(format!("Restart of {} failed: {}", container, restart.message()));
            return false;
        }
        true
    }

    /// `compose ps` must succeed and list a running service.
    pub async fn check_status(&self) -> AppResult<String> {
        let out = self.runner.run(&["compose", "ps"]).await;
        if out.success && out.stdout.contains("Up") {
            Ok(out.stdout)
        } else {
            Err(AppError::ServiceDown(out.message().to_string()))
        }
    }

    /// The daemon container must be up.
    pub async fn container_running(&self) -> AppResult<()> {
        let filter = format!("name={}", self.config.container);
        let out = self
            .runner
            .run(&["ps", "--filter", filter.as_str(), "--format", "{{.Status}}"])
            .await;
        if out.success && out.stdout.contains("Up") {
            Ok(())
        } else {
            Err(AppError::ContainerNotRunning(self.config.container.clone()))
        }
    }

    pub async fn remove_containers(&self) -> bool {
        let args = [
            "rm",
            "-f",
            self.config.container.as_str(),
            self.config.dashboard_container.as_str(),
        ];
        self.report(&args).await
    }

    pub async fn remove_images(&self) -> bool {
        let mut args = vec!["rmi"];
        args.extend(self.config.images.iter().map(String::as_str));
        self.report(&args).await
    }

    /// Prune unused system data, volumes and networks.
    pub async fn prune(&self) -> bool {
        let mut all_ok = true;
        for target in ["system", "volume", "network"] {
            all_ok &= self.report(&[target, "prune", "-f"]).await;
        }
        all_ok
    }

    async fn report(&self, args: &[&str]) -> bool {
        let command = self.runner.describe(args);
        let out = self.runner.run(args).await;
        if out.success {
            output::success(&command);
        } else {
            output::warning(format!("{}: {}", command, out.message()));
        }
        out.success
    }
}
