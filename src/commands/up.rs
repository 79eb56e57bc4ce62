use super::{connectivity, Context};
use crate::discovery;
use crate::error::AppResult;
use crate::geoip;
use crate::output;
use crate::probe::{probe_control_plane, HttpControlProbe};
use crate::provision::Provisioner;
use crate::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    /// Input file; discovered in the input directory when absent
    pub config: Option<PathBuf>,
    pub skip_geoip: bool,
    /// Run the connectivity probe after the controller answers
    pub probe: bool,
}

/// `clashdock up`: provision, start the services and report.
pub async fn run(ctx: &Context, opts: &UpOptions) -> AppResult<()> {
    output::banner("🚀 Clash Docker launcher");

    let input = discovery::select_config_file(&ctx.config.paths.input_dir, opts.config.as_deref())?;
    output::info(format!("Using configuration {}", input.display()));

    output::processing("Generating configuration...");
    let outcome = Provisioner::new(&ctx.config).provision(&input)?;
    if let Some(backup) = &outcome.backup {
        output::info(format!("Previous configuration saved as {}", backup.display()));
    }
    output::success(format!(
        "Configuration written to {} ({} proxies)",
        outcome.output.display(),
        outcome.proxy_count
    ));

    let services = ctx.services();
    output::processing("Starting services...");
    services.down().await;

    let db = ctx.config.paths.geoip_db.as_path();
    if !db.exists() && ctx.config.geoip.enabled && !opts.skip_geoip {
        output::warning(format!("{} not found, downloading...", db.display()));
        match geoip::download_geoip(&ctx.config.geoip, db).await {
            Ok(size) => output::success(format!("Downloaded {} ({} bytes)", db.display(), size)),
            Err(e) => output::warning(format!("GeoIP download failed, continuing: {}", e)),
        }
    }

    services.up().await?;
    output::success("Services started");

    if db.exists() {
        output::processing(format!("Copying {} into the container...", db.display()));
        services.install_geoip(db).await;
    }

    let ps = services.check_status().await?;
    info!("compose ps:\n{}", ps.trim_end());
    output::success("Services are running");

    let public_ip = ctx.public_ip().await;

    output::processing("Waiting for the controller...");
    let probe = HttpControlProbe::new(&ctx.config.controller, outcome.secret.clone())?;
    let policy = RetryPolicy::from_controller(&ctx.config.controller);
    match probe_control_plane(&probe, policy, ctx.pause()).await {
        Some(snapshot) => output::group_summary(&snapshot),
        None => output::controller_unavailable(),
    }

    output::access_info(&ctx.config, public_ip.as_deref(), Some(&outcome.secret));

    if opts.probe {
        let warmup = Duration::from_secs(ctx.config.probe.warmup_secs);
        connectivity::probe(ctx, warmup).await?;
    }

    output::management_hints();
    Ok(())
}
