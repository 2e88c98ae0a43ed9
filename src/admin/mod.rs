//! Administrative Command Boundary
//!
//! The orchestrator never touches stored data; it only issues administrative
//! commands (liveness probe, replica-set-initiate, add-shard, sharding and
//! zone configuration) and observes status responses. This module is that
//! boundary.
//!
//! ## Core Concepts
//! - **Typed client trait**: `AdminApi` has one async method per command, so
//!   the same orchestration logic runs against the real HTTP gateway and
//!   against an in-memory double in tests.
//! - **Three-way classification**: every response is `Applied`,
//!   `AlreadyApplied`, or an `AdminError`. "Already initialized" and friends
//!   are values, never errors: re-running against a half-built cluster must
//!   be safe.
//! - **No retries here**: the boundary reports what the cluster said.
//!   Retry/backoff policy belongs to the caller.

pub mod client;
pub mod protocol;

#[cfg(test)]
pub mod mock;

pub use client::{AdminApi, AdminError, HttpAdminClient};
pub use protocol::{AdminAck, KeyPart, KeyPattern, MemberStatus, ReplicaSetStatus, ShardEntry};
