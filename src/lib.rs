//! Topology Bootstrap & Zone-Routing Orchestrator
//!
//! This library crate turns a declarative shard/zone plan into a running,
//! correctly-routed cluster. It sequences replica-set initialization, shard
//! registration, collection sharding, and zone key-range assignment against
//! the cluster's administrative endpoint, and is safe to re-run against a
//! partially-initialized cluster.
//!
//! ## Architecture Modules
//! The crate is composed of three loosely coupled subsystems:
//!
//! - **`plan`**: The immutable declarative input. Shard, collection, zone,
//!   and key-range declarations, plus the structural validation (unknown
//!   references, inverted or overlapping ranges) that must pass before any
//!   administrative command is issued.
//! - **`admin`**: The administrative command boundary. A typed async client
//!   trait covering the commands the orchestrator issues (liveness probe,
//!   replica-set-initiate, add-shard, shard-collection, zone commands), with
//!   idempotency conflicts classified as values rather than errors.
//! - **`bootstrap`**: The sequencing state machine. Per-shard readiness
//!   probing, replica-set initialization, registration, sharding
//!   configuration, and zone/range assignment, executed phase by phase with
//!   per-unit outcomes collected into a final run report.

pub mod admin;
pub mod bootstrap;
pub mod plan;
