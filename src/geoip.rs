//! GeoIP database download.

use crate::config::GeoipConfig;
use crate::error::AppResult;
use reqwest::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Download the database to `dest`, returning its size in bytes.
///
/// The body is written to a `.part` sibling first and renamed once
/// complete, so an interrupted download never leaves a truncated file.
pub async fn download_geoip(config: &GeoipConfig, dest: &Path) -> AppResult<u64> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    info!("Downloading GeoIP database from {}", config.url);
    let bytes = client
        .get(&config.url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut partial = dest.as_os_str().to_owned();
    partial.push(".part");
    fs::write(&partial, &bytes)?;
    fs::rename(&partial, dest)?;

    info!("GeoIP database saved to {} ({} bytes)", dest.display(), bytes.len());
    Ok(bytes.len() as u64)
}
