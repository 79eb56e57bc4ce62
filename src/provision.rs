//! Turn the operator's configuration into the one the daemon container runs.

use crate::config::AppConfig;
use crate::document::{self, Overrides, POLICY_VERSION};
use crate::error::AppResult;
use crate::secret::{ApiSecret, SecretStore};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug)]
pub struct ProvisionOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Copy of the previously generated configuration, if there was one
    pub backup: Option<PathBuf>,
    pub proxy_count: usize,
    pub secret: ApiSecret,
}

pub struct Provisioner<'a> {
    config: &'a AppConfig,
    secrets: SecretStore,
}

impl<'a> Provisioner<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            secrets: SecretStore::new(&config.paths.secret_file),
        }
    }

    /// Validate `input`, make sure a secret exists, then write the
    /// rewritten configuration.
    ///
    /// An invalid input fails before the secret or output files are touched.
    pub fn provision(&self, input: &Path) -> AppResult<ProvisionOutcome> {
        let loaded = document::load(input)?;
        info!(
            "Loaded {} with {} prox{}",
            input.display(),
            loaded.proxy_count,
            if loaded.proxy_count == 1 { "y" } else { "ies" }
        );

        let secret = self.secrets.ensure_secret()?;
        let overrides = Overrides::from_config(self.config, secret.clone());
        let doc = document::transform(loaded.doc, &overrides)?;
        debug!("Applied routing policy v{}", POLICY_VERSION);

        let output = self.config.paths.output_config.clone();
        let backup = document::save(&doc, &output)?;

        Ok(ProvisionOutcome {
            input: loaded.path,
            output,
            backup,
            proxy_count: loaded.proxy_count,
            secret,
        })
    }
}
