//! Persisted controller secret.
//!
//! The token is generated once, written to a single plain-text file and
//! reused by every later run. Only `clashdock uninstall` removes the file.
//! There is no built-in fallback token: if the file cannot be written the
//! caller gets an error instead of a guessable default.

use crate::error::{AppError, AppResult};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of characters in a generated token.
pub const TOKEN_LENGTH: usize = 64;

/// Bearer token for the external controller.
///
/// Wiped from memory on drop and never printed through `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiSecret(String);

impl ApiSecret {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    /// Generate a fresh token from the OS random source.
    pub fn generate() -> Self {
        let token: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self(token)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiSecret(<redacted>)")
    }
}

/// File-backed secret store.
#[derive(Debug, Clone)]
pub struct SecretStore {
    path: PathBuf,
}

impl SecretStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted token without creating one.
    ///
    /// A missing file or a file holding only whitespace yields `None`.
    pub fn load(&self) -> AppResult<Option<ApiSecret>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut raw = fs::read_to_string(&self.path)?;
        let token = raw.trim().to_string();
        raw.zeroize();

        if token.is_empty() {
            debug!("Secret file {} is empty", self.path.display());
            return Ok(None);
        }
        Ok(Some(ApiSecret(token)))
    }

    /// Like [`load`](Self::load), but a missing secret is an error.
    pub fn require(&self) -> AppResult<ApiSecret> {
        self.load()?
            .ok_or_else(|| AppError::SecretMissing(self.path.clone()))
    }

    /// Return the persisted token, generating and persisting one first if
    /// none exists yet.
    pub fn ensure_secret(&self) -> AppResult<ApiSecret> {
        if let Some(existing) = self.load()? {
            info!("Reusing API secret from {}", self.path.display());
            return Ok(existing);
        }

        let secret = ApiSecret::generate();
        self.persist(&secret)?;
        info!("Generated new API secret at {}", self.path.display());
        Ok(secret)
    }

    fn persist(&self, secret: &ApiSecret) -> AppResult<()> {
        let to_error = |source| AppError::SecretPersist {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(to_error)?;
            }
        }
        fs::write(&self.path, secret.expose()).map_err(to_error)
    }
}
