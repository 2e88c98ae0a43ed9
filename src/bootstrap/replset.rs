//! Replica-Set Initializer
//!
//! Converts a standalone node into the primary of a new replica set. The
//! initiate command is one-time per set; a server-reported "already
//! initialized" is success, because the orchestrator may be re-run after
//! partial completion. After issuing the command, the initializer polls
//! replica-set status until a member reaches primary state or the bounded
//! wait elapses. A timed-out election is reported `Failed`, but the caller
//! may still proceed, since in some deployments the election completes
//! asynchronously after this step returns.

use crate::admin::{AdminAck, AdminApi};
use crate::bootstrap::probe::RetryPolicy;
use crate::bootstrap::report::StepOutcome;
use crate::plan::ShardSpec;

/// Outcome of [`initialize`], split so the orchestrator can distinguish "the
/// initiate command never took" from "initiated, but the election is still
/// running". The latter does not block shard registration.
#[derive(Debug, Clone)]
pub struct InitializeResult {
    pub outcome: StepOutcome,
    pub initiated: bool,
    pub primary_elected: bool,
}

pub async fn initialize(
    admin: &dyn AdminApi,
    shard: &ShardSpec,
    election: &RetryPolicy,
) -> InitializeResult {
    let endpoint = shard.endpoint();
    let members = vec![endpoint.clone()];

    let ack = match admin
        .replica_set_initiate(&endpoint, &shard.replica_set_id, &members)
        .await
    {
        Ok(ack) => ack,
        Err(e) => {
            tracing::warn!("Failed to initiate {}: {}", shard.replica_set_id, e);
            return InitializeResult {
                outcome: StepOutcome::failed(e.to_string()),
                initiated: false,
                primary_elected: false,
            };
        }
    };

    match ack {
        AdminAck::Applied => {
            tracing::info!("Replica set {} initiated", shard.replica_set_id)
        }
        AdminAck::AlreadyApplied => {
            tracing::info!("Replica set {} already initialized", shard.replica_set_id)
        }
    }

    match wait_for_primary(admin, &endpoint, election).await {
        Ok(()) => InitializeResult {
            outcome: ack.into(),
            initiated: true,
            primary_elected: true,
        },
        Err(reason) => InitializeResult {
            outcome: StepOutcome::failed(reason),
            initiated: true,
            primary_elected: false,
        },
    }
}

/// Polls replica-set status until some member reports `PRIMARY`.
async fn wait_for_primary(
    admin: &dyn AdminApi,
    endpoint: &str,
    election: &RetryPolicy,
) -> Result<(), String> {
    for attempt in 0..election.max_attempts {
        match admin.replica_set_status(endpoint).await {
            Ok(status) if status.has_primary() => {
                tracing::info!("{} has an elected primary", endpoint);
                return Ok(());
            }
            Ok(_) => {
                tracing::debug!(
                    "Waiting for primary on {} ({}/{})",
                    endpoint,
                    attempt + 1,
                    election.max_attempts
                );
            }
            Err(e) => {
                // Status reads can fail transiently mid-election; they
                // consume attempts like an absent primary does.
                tracing::debug!("Status poll on {} failed: {}", endpoint, e);
            }
        }
        if attempt + 1 < election.max_attempts {
            tokio::time::sleep(election.delay(attempt)).await;
        }
    }
    Err(format!(
        "no primary elected on {} within {} polls",
        endpoint, election.max_attempts
    ))
}
