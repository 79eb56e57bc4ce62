//! End-to-end connectivity check through the daemon's HTTP proxy port.

use crate::config::{AppConfig, ProbeSite};
use crate::error::AppResult;
use crate::output;
use crate::retry::Pause;
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

/// Aggregate result of one probing round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EgressReport {
    pub success: usize,
    pub total: usize,
    /// The negative control went through without the proxy
    pub direct_reachable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    Degraded,
    Failed,
}

impl EgressReport {
    pub fn verdict(&self) -> Verdict {
        if self.success == self.total {
            Verdict::Healthy
        } else if self.success == 0 {
            Verdict::Failed
        } else {
            Verdict::Degraded
        }
    }
}

pub struct EgressProber {
    proxied: Client,
    direct: Client,
    direct_target: String,
}

impl EgressProber {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let proxied = Client::builder()
            .proxy(Proxy::all(config.proxy.url())?)
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(config.probe.site_timeout_secs))
            .build()?;

        let direct = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(config.probe.direct_timeout_secs))
            .build()?;

        Ok(Self::with_clients(
            proxied,
            direct,
            config.probe.direct_target.clone(),
        ))
    }

    /// Build from ready-made clients.
    pub fn with_clients(proxied: Client, direct: Client, direct_target: String) -> Self {
        Self {
            proxied,
            direct,
            direct_target,
        }
    }

    /// Fetch every site through the proxy, then the direct control.
    ///
    /// Individual failures are reported and counted, never returned.
    pub async fn probe_egress(&self, sites: &[ProbeSite]) -> EgressReport {
        output::section("🌐 Connectivity check:");

        let mut success = 0;
        for site in sites {
            match self.proxied.get(&site.url).send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    output::success(format!("{}: reachable", site.name));
                    success += 1;
                }
                Ok(response) => {
                    output::error(format!("{}: HTTP {}", site.name, response.status().as_u16()));
                }
                Err(e) => {
                    debug!("Probe of {} failed: {}", site.url, e);
                    output::error(format!("{}: unreachable", site.name));
                }
            }
        }

        let direct_reachable = self.check_direct().await;
        if direct_reachable {
            output::warning("Direct request succeeded; traffic may be bypassing the proxy");
        } else {
            output::success("Direct request blocked; traffic goes through the proxy");
        }

        let report = EgressReport {
            success,
            total: sites.len(),
            direct_reachable,
        };
        info!(
            "Egress probe: {}/{} sites reachable, direct={}",
            report.success, report.total, report.direct_reachable
        );
        report
    }

    /// Wait `warmup`, then probe.
    pub async fn probe_after(
        &self,
        sites: &[ProbeSite],
        warmup: Duration,
        pause: &dyn Pause,
    ) -> EgressReport {
        output::processing(format!(
            "Waiting {}s for the proxy to settle...",
            warmup.as_secs()
        ));
        pause.pause(warmup).await;
        self.probe_egress(sites).await
    }

    async fn check_direct(&self) -> bool {
        match self.direct.get(&self.direct_target).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("Direct request to {} failed: {}", self.direct_target, e);
                false
            }
        }
    }
}
