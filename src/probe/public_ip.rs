use crate::config::DiscoveryConfig;
use crate::error::AppResult;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Looks up the host's public address from a list of echo services.
pub struct PublicIpResolver {
    client: Client,
    services: Vec<String>,
}

impl PublicIpResolver {
    pub fn new(config: &DiscoveryConfig) -> AppResult<Self> {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            services: config.ip_services.clone(),
        })
    }

    /// First non-empty answer from the services, tried in order.
    pub async fn resolve(&self) -> Option<String> {
        for service in &self.services {
            match self.query(service).await {
                Some(ip) => {
                    debug!("Public address {} from {}", ip, service);
                    return Some(ip);
                }
                None => debug!("No usable answer from {}", service),
            }
        }
        None
    }

    async fn query(&self, service: &str) -> Option<String> {
        let response = self.client.get(service).send().await.ok()?;
        if response.status() != StatusCode::OK {
            return None;
        }
        let body = response.text().await.ok()?;
        let ip = body.trim();
        (!ip.is_empty()).then(|| ip.to_string())
    }
}
