//! Database/Collection Sharding Configurator
//!
//! Enables partitioning on the logical database and assigns each collection
//! its partition-key shape from the plan: hashed single field for even write
//! spread, ascending range key for scan locality, or a compound key whose
//! leading field routes and trailing field breaks ties. Already-sharded
//! namespaces are reported, never retried. Enabling sharding on the database
//! must precede sharding any of its collections; the orchestrator enforces
//! that ordering, not this module.

use crate::admin::{AdminApi, KeyPattern};
use crate::bootstrap::report::StepOutcome;
use crate::plan::{CollectionSpec, IndexSpec};

pub async fn enable_database(admin: &dyn AdminApi, database: &str) -> StepOutcome {
    match admin.enable_sharding(database).await {
        Ok(ack) => {
            tracing::info!("Sharding enabled on database {}", database);
            ack.into()
        }
        Err(e) => {
            tracing::warn!("Failed to enable sharding on {}: {}", database, e);
            StepOutcome::failed(e.to_string())
        }
    }
}

pub async fn shard_collection(
    admin: &dyn AdminApi,
    namespace: &str,
    collection: &CollectionSpec,
) -> StepOutcome {
    let key = KeyPattern::from_partition_key(&collection.key);
    match admin.shard_collection(namespace, &key).await {
        Ok(ack) => {
            tracing::info!("Collection {} sharded with key {:?}", namespace, collection.key);
            ack.into()
        }
        Err(e) => {
            tracing::warn!("Failed to shard {}: {}", namespace, e);
            StepOutcome::failed(e.to_string())
        }
    }
}

/// Applies one secondary index declaration. Advisory: routing does not
/// depend on these, so failures never fail the run.
pub async fn create_index(
    admin: &dyn AdminApi,
    namespace: &str,
    index: &IndexSpec,
) -> StepOutcome {
    let name = index.index_name();
    let key = KeyPattern::from_index(index);
    match admin.create_index(namespace, &name, &key, index.unique).await {
        Ok(ack) => ack.into(),
        Err(e) => {
            tracing::warn!("Failed to create index {} on {}: {}", name, namespace, e);
            StepOutcome::failed(e.to_string())
        }
    }
}
