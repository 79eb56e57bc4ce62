//! Readiness polling of the daemon's external controller.
//!
//! One `GET /proxies` per attempt. A refused, dropped or unreachable
//! connection is worth another try; any other failure ends polling at once.

use crate::config::ControllerConfig;
use crate::error::AppResult;
use crate::output;
use crate::retry::{retry_with_backoff, Attempt, Pause, RetryOutcome, RetryPolicy};
use crate::secret::ApiSecret;
use async_trait::async_trait;
use clashdock_types::{ProxiesResponse, ProxyGroupSnapshot};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Raw answer from one controller request.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("controller unreachable: {0}")]
    Unreachable(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("controller answered HTTP {0}")]
    Status(u16),

    #[error("unreadable response body: {0}")]
    Body(String),
}

/// One request against the controller's proxy listing.
#[async_trait]
pub trait ControlProbe: Send + Sync {
    async fn get_proxies(&self) -> Result<ProbeResponse, ProbeError>;
}

/// reqwest-backed probe for `GET /proxies`.
pub struct HttpControlProbe {
    client: Client,
    url: String,
    secret: ApiSecret,
}

impl HttpControlProbe {
    pub fn new(config: &ControllerConfig, secret: ApiSecret) -> AppResult<Self> {
        // The controller is local; never route it through a system proxy.
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.endpoint("/proxies"),
            secret,
        })
    }
}

#[async_trait]
impl ControlProbe for HttpControlProbe {
    async fn get_proxies(&self) -> Result<ProbeResponse, ProbeError> {
        let response = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, self.secret.bearer())
            .send()
            .await
            .map_err(|e| {
                if is_unreachable(&e) {
                    ProbeError::Unreachable(e.to_string())
                } else {
                    ProbeError::Request(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if is_disconnect(&e) {
                ProbeError::Unreachable(e.to_string())
            } else {
                ProbeError::Body(e.to_string())
            }
        })?;
        Ok(ProbeResponse { status, body })
    }
}

/// Whether a failed `send` means the controller is not serving yet.
///
/// Covers refused or timed-out connects and connections the peer dropped
/// before answering, which is how the daemon behaves while it starts.
/// A timeout after the connection was up is a real failure.
fn is_unreachable(e: &reqwest::Error) -> bool {
    if e.is_connect() {
        return true;
    }
    if e.is_timeout() {
        return false;
    }
    // Send-phase errors carry no status; a peer hang-up surfaces here as
    // hyper's incomplete-message error without an io::Error underneath.
    (e.is_request() && e.status().is_none()) || is_disconnect(e)
}

fn is_disconnect(e: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(e);
    while let Some(err) = current {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if is_disconnect_kind(io.kind()) {
                return true;
            }
        }
        if err.to_string().contains("connection closed before message completed") {
            return true;
        }
        current = err.source();
    }
    false
}

fn is_disconnect_kind(kind: std::io::ErrorKind) -> bool {
    use std::io::ErrorKind::*;
    matches!(
        kind,
        ConnectionRefused | ConnectionReset | ConnectionAborted | UnexpectedEof | BrokenPipe
    )
}

fn classify(result: Result<ProbeResponse, ProbeError>) -> Attempt<ProxyGroupSnapshot, ProbeError> {
    match result {
        Ok(ProbeResponse { status: 200, body }) => {
            match serde_json::from_str::<ProxiesResponse>(&body) {
                Ok(parsed) => Attempt::Done(parsed.selector_groups()),
                Err(e) => Attempt::Fatal(ProbeError::Body(e.to_string())),
            }
        }
        Ok(ProbeResponse { status, .. }) => Attempt::Fatal(ProbeError::Status(status)),
        Err(e @ ProbeError::Unreachable(_)) => Attempt::Retry(e),
        Err(e) => Attempt::Fatal(e),
    }
}

/// Poll the controller until it lists its proxy groups.
///
/// Returns `None` once attempts run out or on the first non-retryable
/// failure; never an error.
pub async fn probe_control_plane(
    probe: &dyn ControlProbe,
    policy: RetryPolicy,
    pause: &dyn Pause,
) -> Option<ProxyGroupSnapshot> {
    let outcome = retry_with_backoff(policy, pause, move |attempt| async move {
        debug!("Controller probe {}/{}", attempt, policy.max_attempts);
        let result = classify(probe.get_proxies().await);
        if let Attempt::Retry(_) = result {
            output::processing(format!(
                "Waiting for the controller ({}/{})...",
                attempt, policy.max_attempts
            ));
        }
        result
    })
    .await;

    match outcome {
        RetryOutcome::Ready { value, attempts } => {
            debug!(
                "Controller ready after {} attempt(s), {} selector group(s)",
                attempts,
                value.len()
            );
            Some(value)
        }
        RetryOutcome::Exhausted { attempts, last } => {
            warn!(
                "Controller still unreachable after {} attempt(s): {}",
                attempts,
                last.map(|e| e.to_string()).unwrap_or_default()
            );
            output::warning("Controller did not become reachable in time");
            None
        }
        RetryOutcome::Aborted { attempts, error } => {
            warn!("Controller probe gave up on attempt {}: {}", attempts, error);
            output::warning(format!("Controller request failed: {}", error));
            None
        }
    }
}
