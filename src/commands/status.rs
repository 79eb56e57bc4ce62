use super::{connectivity, Context};
use crate::error::AppResult;
use crate::output;
use crate::probe::{probe_control_plane, HttpControlProbe};
use crate::retry::RetryPolicy;
use crate::secret::SecretStore;
use std::time::Duration;

/// `clashdock status`: report on services started earlier.
pub async fn run(ctx: &Context) -> AppResult<()> {
    output::banner("📊 Clash Docker status");

    ctx.services().container_running().await?;
    output::success("Clash container is running");

    let public_ip = ctx.public_ip().await;

    let secret = SecretStore::new(&ctx.config.paths.secret_file).load()?;
    match &secret {
        Some(secret) => {
            let probe = HttpControlProbe::new(&ctx.config.controller, secret.clone())?;
            let policy = RetryPolicy::from_controller(&ctx.config.controller);
            match probe_control_plane(&probe, policy, ctx.pause()).await {
                Some(snapshot) => output::group_summary(&snapshot),
                None => output::controller_unavailable(),
            }
        }
        None => output::warning("No API secret found; run `clashdock up` to provision one"),
    }

    output::access_info(&ctx.config, public_ip.as_deref(), secret.as_ref());

    let warmup = Duration::from_secs(ctx.config.probe.status_warmup_secs);
    connectivity::probe(ctx, warmup).await?;
    Ok(())
}
