//! Zone & Range Assigner
//!
//! Tags shards with zone labels and binds contiguous key ranges to zones so
//! the routing layer directs documents to the correct physical shard set.
//! This is where the hybrid-sharding invariant lives: ranges assigned to the
//! same collection must be mutually disjoint. Each candidate range is
//! checked against every range already assigned this run *before* the
//! command goes out; an overlap is a structural conflict reported with the
//! conflicting range, never silently retried.
//!
//! Assignments for the same collection are serialized through a per-
//! collection mutex so the overlap check stays race-free under the
//! orchestrator's intra-phase concurrency. The routing layer serializes
//! conflicting metadata writes server-side, so no further client-side
//! locking is needed.

use crate::admin::AdminApi;
use crate::bootstrap::report::StepOutcome;
use crate::plan::RangeAssignment;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Run-scoped range bookkeeping plus the zone-tagging entry points.
#[derive(Default)]
pub struct ZoneAssigner {
    /// Ranges assigned so far, per collection. The mutex is per collection:
    /// assignments for different collections proceed concurrently.
    books: DashMap<String, Arc<Mutex<Vec<RangeAssignment>>>>,
}

impl ZoneAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags a shard (by its registered name) with a zone label.
    pub async fn tag_shard(
        &self,
        admin: &dyn AdminApi,
        shard_id: &str,
        zone: &str,
    ) -> StepOutcome {
        match admin.add_shard_to_zone(shard_id, zone).await {
            Ok(ack) => {
                tracing::info!("Shard {} tagged into zone {}", shard_id, zone);
                ack.into()
            }
            Err(e) => {
                tracing::warn!("Failed to tag {} into {}: {}", shard_id, zone, e);
                StepOutcome::failed(e.to_string())
            }
        }
    }

    /// Binds one `[min, max)` range to a zone, rejecting overlaps with any
    /// range already assigned for the same collection during this run.
    pub async fn assign_range(
        &self,
        admin: &dyn AdminApi,
        namespace: &str,
        assignment: &RangeAssignment,
    ) -> StepOutcome {
        let book = self
            .books
            .entry(assignment.collection.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone();

        // Held across the command round-trip: the overlap check and the
        // assignment must be atomic per collection.
        let mut assigned = book.lock().await;

        if let Some(existing) = assigned.iter().find(|r| r.overlaps(assignment)) {
            tracing::warn!("Range {} overlaps existing {}", assignment, existing);
            return StepOutcome::failed(format!("overlaps assigned range {}", existing));
        }

        match admin
            .update_zone_key_range(namespace, &assignment.min, &assignment.max, &assignment.zone)
            .await
        {
            Ok(ack) => {
                tracing::info!("Range {} assigned", assignment);
                assigned.push(assignment.clone());
                ack.into()
            }
            Err(e) => {
                tracing::warn!("Range {} not assigned: {}", assignment, e);
                StepOutcome::failed(e.to_string())
            }
        }
    }
}
