use std::path::PathBuf;
use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("No .yaml or .yml files found in {}", .0.display())]
    NoConfigFiles(PathBuf),

    #[error("Configuration file is empty: {}", .0.display())]
    EmptyDocument(PathBuf),

    #[error("Configuration has no `{field}` node (keys present: {present})")]
    MissingField { field: &'static str, present: String },

    #[error("Configuration field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config file selection aborted: {0}")]
    Selection(String),

    #[error("Failed to persist API secret to {}: {source}", path.display())]
    SecretPersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save configuration to {}: {reason}", path.display())]
    ConfigPersist { path: PathBuf, reason: String },

    #[error("No API secret at {}; run `clashdock up` first", .0.display())]
    SecretMissing(PathBuf),

    #[error("`{command}` failed: {stderr}")]
    Compose { command: String, stderr: String },

    #[error("Services are not running:\n{0}")]
    ServiceDown(String),

    #[error("Container `{0}` is not running; start it with `clashdock up`")]
    ContainerNotRunning(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn compose<C: Into<String>, S: Into<String>>(command: C, stderr: S) -> Self {
        Self::Compose {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    pub fn config_persist<P: Into<PathBuf>, S: ToString>(path: P, reason: S) -> Self {
        Self::ConfigPersist {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Problems with the operator's input file. Never retried.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_)
                | Self::NoConfigFiles(_)
                | Self::EmptyDocument(_)
                | Self::MissingField { .. }
                | Self::InvalidField { .. }
                | Self::Yaml(_)
                | Self::Selection(_)
        )
    }

    /// Failures writing the secret or the generated configuration.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::SecretPersist { .. } | Self::ConfigPersist { .. })
    }

    /// Follow-up advice printed under a fatal error, by error class.
    pub fn hint(&self) -> Option<&'static str> {
        if self.is_input() {
            Some("Fix the Clash configuration file (or pass one with --config) and run again")
        } else if self.is_persistence() {
            Some("Nothing was started; check permissions and free space for the files above")
        } else {
            None
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
