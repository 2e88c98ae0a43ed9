//! Node Readiness Prober
//!
//! Polls a single node's administrative endpoint until it answers or the
//! retry budget is exhausted. Exhaustion is a value (`TimedOut`), not an
//! error: the orchestrator decides whether a dead node aborts the run or
//! merely degrades the topology.

use crate::admin::AdminApi;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded retry/backoff policy. Injectable so tests can run the same loops
/// with near-zero waits against the in-memory double.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[serde(with = "millis")]
    pub interval: Duration,
    /// Multiplier applied to the delay after each failed attempt. `1.0`
    /// means fixed-interval polling.
    pub backoff_factor: f64,
    /// Ceiling the backoff never exceeds.
    #[serde(with = "millis")]
    pub max_interval: Duration,
}

impl RetryPolicy {
    /// Default node readiness probing: every 2s, up to 30 attempts.
    pub fn probing() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(2),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(2),
        }
    }

    /// Default primary-election polling: every 1s, up to 60 attempts.
    pub fn election() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(1),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(1),
        }
    }

    /// Zero-wait policy for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            interval: Duration::ZERO,
            backoff_factor: 1.0,
            max_interval: Duration::ZERO,
        }
    }

    /// Delay to sleep after the given zero-based failed attempt. Saturates
    /// at `max_interval`: the exponential can overflow `Duration` long
    /// before a large attempt budget is exhausted.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt as i32).max(0.0);
        let secs = self.interval.as_secs_f64() * factor;
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

/// Result of a readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready { attempts: u32 },
    TimedOut { attempts: u32 },
}

/// Pings `endpoint` until it answers, sleeping `policy.delay(..)` between
/// failures, up to `policy.max_attempts`. Only transient failures are
/// retried; a rejection ends the probe at once.
pub async fn wait_until_ready(
    admin: &dyn AdminApi,
    endpoint: &str,
    policy: &RetryPolicy,
) -> ProbeOutcome {
    for attempt in 0..policy.max_attempts {
        match admin.ping(endpoint).await {
            Ok(()) => {
                tracing::debug!("{} ready after {} attempt(s)", endpoint, attempt + 1);
                return ProbeOutcome::Ready {
                    attempts: attempt + 1,
                };
            }
            Err(e) if !e.is_transient() => {
                // A rejection is not a node that is still starting;
                // retrying cannot fix it.
                tracing::warn!("{} rejected the probe: {}", endpoint, e);
                return ProbeOutcome::TimedOut {
                    attempts: attempt + 1,
                };
            }
            Err(e) => {
                tracing::debug!(
                    "Waiting for {} ({}/{}): {}",
                    endpoint,
                    attempt + 1,
                    policy.max_attempts,
                    e
                );
                if attempt + 1 < policy.max_attempts {
                    tokio::time::sleep(policy.delay(attempt)).await;
                }
            }
        }
    }
    tracing::warn!(
        "{} not reachable after {} attempts",
        endpoint,
        policy.max_attempts
    );
    ProbeOutcome::TimedOut {
        attempts: policy.max_attempts,
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
