//! Shard Registrar
//!
//! Registers an initialized replica set with the routing layer. Registration
//! is commutative across shards (order never matters), but a shard must be
//! registered before it can receive zone tags or range assignments, which
//! the orchestrator enforces by phase ordering.

use crate::admin::AdminApi;
use crate::bootstrap::report::StepOutcome;
use crate::plan::ShardSpec;

pub async fn register(admin: &dyn AdminApi, shard: &ShardSpec) -> StepOutcome {
    let connection_string = shard.connection_string();
    match admin.add_shard(&connection_string).await {
        Ok(ack) => {
            tracing::info!("Shard {} registered ({})", shard.name, connection_string);
            ack.into()
        }
        Err(e) => {
            tracing::warn!("Failed to register shard {}: {}", shard.name, e);
            StepOutcome::failed(e.to_string())
        }
    }
}
