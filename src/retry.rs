//! Bounded retry with a fixed pause between attempts.
//!
//! Each attempt classifies itself as done, worth retrying, or fatal. The
//! pause is injected so callers can count or skip sleeps.

use crate::config::ControllerConfig;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Source of the delay between attempts.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    pub fn from_controller(config: &ControllerConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.backoff_secs))
    }
}

/// What one attempt produced.
#[derive(Debug)]
pub enum Attempt<T, E> {
    Done(T),
    /// Transient failure; try again if attempts remain
    Retry(E),
    /// Give up without using the remaining attempts
    Fatal(E),
}

#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Ready { value: T, attempts: u32 },
    /// Every attempt asked for a retry
    Exhausted { attempts: u32, last: Option<E> },
    Aborted { attempts: u32, error: E },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Aborted { attempts, .. } => *attempts,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ready { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Run `op` up to `policy.max_attempts` times, pausing `policy.backoff`
/// between attempts (never after the last one).
///
/// `op` receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    pause: &dyn Pause,
    mut op: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let mut last = None;

    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Attempt::Done(value) => {
                return RetryOutcome::Ready {
                    value,
                    attempts: attempt,
                }
            }
            Attempt::Fatal(error) => {
                return RetryOutcome::Aborted {
                    attempts: attempt,
                    error,
                }
            }
            Attempt::Retry(error) => {
                last = Some(error);
                if attempt < policy.max_attempts {
                    debug!(
                        "Attempt {}/{} failed, retrying in {:?}",
                        attempt, policy.max_attempts, policy.backoff
                    );
                    pause.pause(policy.backoff).await;
                }
            }
        }
    }

    RetryOutcome::Exhausted {
        attempts: policy.max_attempts,
        last,
    }
}
