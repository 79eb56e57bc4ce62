//! `clashdock uninstall`: remove containers, images and every file the
//! launcher created.

use super::Context;
use crate::config::PathsConfig;
use crate::document;
use crate::error::AppResult;
use crate::output;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files and directories the launcher may have created.
///
/// The output directory is removed whole, backups included, only when
/// the launcher owns it: it is the default `config` directory or holds
/// nothing but the output file and its backups, and it does not contain
/// the working or input directory. Otherwise only the output file and
/// its backups are listed.
pub fn removal_targets(paths: &PathsConfig) -> AppResult<Vec<PathBuf>> {
    let mut targets = Vec::new();

    if owns_output_dir(paths)? {
        targets.push(paths.output_dir());
    } else {
        targets.push(paths.output_config.clone());
        targets.extend(document::backup_files(&paths.output_config)?);
    }

    targets.push(paths.geoip_db.clone());
    targets.push(paths.secret_file.clone());
    targets.dedup();
    Ok(targets)
}

fn owns_output_dir(paths: &PathsConfig) -> AppResult<bool> {
    let dir = paths.output_dir();
    if dir.as_os_str().is_empty() || dir == Path::new(".") {
        return Ok(false);
    }
    let is_default = dir == PathsConfig::default().output_dir();

    let resolved = match dir.canonicalize() {
        Ok(resolved) => resolved,
        // Nothing on disk either way.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(is_default),
        Err(e) => return Err(e.into()),
    };
    let cwd = env::current_dir()?.canonicalize()?;
    let input = paths.input_dir.canonicalize().ok();
    if cwd.starts_with(&resolved) || input.is_some_and(|i| i.starts_with(&resolved)) {
        debug!("{} holds the working or input directory; keeping it", dir.display());
        return Ok(false);
    }
    if is_default {
        return Ok(true);
    }

    let mut owned: Vec<OsString> = document::backup_files(&paths.output_config)?
        .iter()
        .filter_map(|p| p.file_name().map(OsStr::to_os_string))
        .collect();
    if let Some(name) = paths.output_config.file_name() {
        owned.push(name.to_os_string());
    }
    for entry in fs::read_dir(&resolved)? {
        let name = entry?.file_name();
        if !owned.contains(&name) {
            debug!("{} also holds {:?}; keeping it", dir.display(), name);
            return Ok(false);
        }
    }
    Ok(true)
}

/// Ask for a literal `yes`; anything else, including end of input, declines.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> AppResult<bool> {
    writeln!(out, "This removes the Clash containers, images, configuration and secret.")?;
    write!(out, "Type 'yes' to continue: ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

/// Remove a file or directory tree. `Ok(false)` if it was not there.
fn remove_path(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).map(|_| true),
        Ok(_) => fs::remove_file(path).map(|_| true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Delete `targets`, reporting each one. Failures are warnings.
pub fn remove_targets(targets: &[PathBuf]) -> usize {
    let mut removed = 0;
    for target in targets {
        match remove_path(target) {
            Ok(true) => {
                output::success(format!("Removed {}", target.display()));
                removed += 1;
            }
            Ok(false) => debug!("{} not present", target.display()),
            Err(e) => output::warning(format!("Could not remove {}: {}", target.display(), e)),
        }
    }
    removed
}

pub async fn run(ctx: &Context, assume_yes: bool) -> AppResult<()> {
    output::banner("🗑️  Clash Docker uninstall");

    if !assume_yes {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        if !confirm(&mut input, &mut io::stdout())? {
            output::info("Uninstall cancelled");
            return Ok(());
        }
    }

    let services = ctx.services();
    output::processing("Stopping services...");
    services.down().await;

    output::processing("Removing containers...");
    services.remove_containers().await;

    output::processing("Removing images...");
    services.remove_images().await;

    output::processing("Removing files...");
    let targets = removal_targets(&ctx.config.paths)?;
    let removed = remove_targets(&targets);
    output::info(format!("{} path(s) removed", removed));

    output::processing("Pruning unused engine resources...");
    services.prune().await;

    output::success("Uninstall complete");
    Ok(())
}
