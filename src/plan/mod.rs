//! Topology Plan Module
//!
//! The declarative input consumed once per bootstrap run: which shards exist,
//! which collections are partitioned and by what key shape, which zones group
//! which shards, and which key ranges route to which zones.
//!
//! ## Core Concepts
//! - **Hybrid sharding**: a collection is either pinned whole to one shard
//!   (vertical, hashed key + full-range zone), or split across shards by a
//!   geographic value range (horizontal, compound key + per-region ranges).
//! - **Sentinel bounds**: key-range endpoints use `Min`/`Max` markers so a
//!   range can be open-ended without inventing magic values.
//! - **Structural validation**: dangling shard/zone references and inverted
//!   or overlapping ranges are plan bugs. They are rejected before a single
//!   administrative command goes out, because retrying cannot fix them.

pub mod types;
pub mod validate;

pub use types::{
    CollectionSpec, IndexField, IndexSpec, KeyBound, PartitionKey, RangeAssignment, RangeKey,
    ShardSpec, TopologyPlan, ZoneSpec,
};
pub use validate::{PlanError, coverage_gaps};

#[cfg(test)]
mod tests;
