//! Loading, rewriting and saving the Clash configuration document.

pub mod policy;
pub mod transform;

pub use policy::{POLICY_VERSION, RULES_V1, URL_TEST_MARKER};
pub use transform::{transform, validate, Overrides, REQUIRED_FIELD};

use crate::error::{AppError, AppResult};
use chrono::Local;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An input document that passed validation.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub doc: Value,
    pub proxy_count: usize,
}

/// Parse and validate YAML text read from `origin`.
pub fn parse(text: &str, origin: &Path) -> AppResult<LoadedDocument> {
    if !has_content(text) {
        return Err(AppError::EmptyDocument(origin.to_path_buf()));
    }

    let doc: Value = serde_yaml::from_str(text)?;
    if doc.is_null() {
        return Err(AppError::EmptyDocument(origin.to_path_buf()));
    }

    let proxy_count = validate(&doc)?;
    Ok(LoadedDocument {
        path: origin.to_path_buf(),
        doc,
        proxy_count,
    })
}

/// Whether `text` holds anything besides blank lines, comments and
/// document markers.
fn has_content(text: &str) -> bool {
    text.lines().map(str::trim).any(|line| {
        !line.is_empty() && !line.starts_with('#') && line != "---" && line != "..."
    })
}

/// Read and validate the operator's configuration file.
pub fn load(path: &Path) -> AppResult<LoadedDocument> {
    if !path.is_file() {
        return Err(AppError::ConfigNotFound(path.to_path_buf()));
    }
    debug!("Reading configuration from {}", path.display());
    let text = fs::read_to_string(path)?;
    parse(&text, path)
}

/// Write the generated document to `path`, creating parent directories.
///
/// A previous file at `path` is first copied to a timestamped
/// `<name>.backup.<YYYYmmddHHMMSS>` sibling, whose path is returned.
pub fn save(doc: &Value, path: &Path) -> AppResult<Option<PathBuf>> {
    let yaml = serde_yaml::to_string(doc).map_err(|e| AppError::config_persist(path, e))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| AppError::config_persist(path, e))?;
        }
    }

    let backup = if path.is_file() {
        let backup = backup_path(path, &Local::now().format("%Y%m%d%H%M%S").to_string());
        fs::copy(path, &backup).map_err(|e| AppError::config_persist(&backup, e))?;
        info!("Previous configuration backed up to {}", backup.display());
        Some(backup)
    } else {
        None
    };

    fs::write(path, yaml).map_err(|e| AppError::config_persist(path, e))?;
    info!("Configuration written to {}", path.display());
    Ok(backup)
}

fn backup_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}.backup.", name)
}

fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    path.with_file_name(format!("{}{}", backup_prefix(path), stamp))
}

/// Backups of `path` left by earlier runs, sorted by name.
pub fn backup_files(path: &Path) -> AppResult<Vec<PathBuf>> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let prefix = backup_prefix(path);
    let mut found = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}
