use super::Context;
use crate::error::AppResult;
use crate::output;
use crate::probe::{EgressProber, EgressReport};
use std::time::Duration;

/// `clashdock test`
pub async fn run(ctx: &Context) -> AppResult<EgressReport> {
    output::banner("🔍 Clash connectivity test");
    ctx.services().container_running().await?;
    output::success("Clash container is running");

    let warmup = Duration::from_secs(ctx.config.probe.warmup_secs);
    probe(ctx, warmup).await
}

/// Wait `warmup`, probe the configured sites and print the verdict.
pub(crate) async fn probe(ctx: &Context, warmup: Duration) -> AppResult<EgressReport> {
    let prober = EgressProber::new(&ctx.config)?;
    let report = prober
        .probe_after(&ctx.config.probe.sites, warmup, ctx.pause())
        .await;
    output::egress_summary(&report);
    Ok(report)
}
