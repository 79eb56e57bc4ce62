//! Subcommand implementations.

pub mod connectivity;
pub mod secret;
pub mod status;
pub mod uninstall;
pub mod up;

use crate::compose::{ComposeRunner, DockerCli, Services};
use crate::config::AppConfig;
use crate::output;
use crate::probe::PublicIpResolver;
use crate::retry::{Pause, TokioPause};
use tracing::warn;

/// Everything a command needs: settings plus the two side-effect seams.
pub struct Context {
    pub config: AppConfig,
    pub runner: Box<dyn ComposeRunner>,
    pub pause: Box<dyn Pause>,
}

impl Context {
    /// Real engine CLI and real sleeps.
    pub fn new(config: AppConfig) -> Self {
        let runner = DockerCli::new(config.compose.program.clone());
        Self {
            config,
            runner: Box::new(runner),
            pause: Box::new(TokioPause),
        }
    }

    pub fn with_seams(config: AppConfig, runner: Box<dyn ComposeRunner>, pause: Box<dyn Pause>) -> Self {
        Self {
            config,
            runner,
            pause,
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services::new(self.runner.as_ref(), &self.config.compose)
    }

    pub fn pause(&self) -> &dyn Pause {
        self.pause.as_ref()
    }

    /// Public address for the access block; `None` after a warning.
    pub async fn public_ip(&self) -> Option<String> {
        output::processing("Looking up the public address...");
        let resolved = match PublicIpResolver::new(&self.config.discovery) {
            Ok(resolver) => resolver.resolve().await,
            Err(e) => {
                warn!("Public address lookup unavailable: {}", e);
                None
            }
        };
        match &resolved {
            Some(ip) => output::success(format!("Public address: {}", ip)),
            None => output::warning("Could not determine the public address"),
        }
        resolved
    }
}
