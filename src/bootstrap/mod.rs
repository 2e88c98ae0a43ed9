//! Bootstrap Orchestration Module
//!
//! The sequencing state machine that turns a validated [`crate::plan`] into
//! a running, correctly-routed cluster through the [`crate::admin`] boundary.
//!
//! ## Core Mechanisms
//! - **Phased execution**: readiness probing, replica-set initialization,
//!   shard registration, sharding configuration, zone/range assignment, then
//!   advisory index creation and verification. Strict happens-before between
//!   phases; free concurrency within a phase.
//! - **Idempotent steps**: every mutating step reports `AlreadyDone` when
//!   the cluster already carries its effect, so a run can be repeated against
//!   a partially-built cluster without structural change.
//! - **Partial-failure tolerance**: a failing unit never aborts its
//!   siblings. Dependent units of a failed shard are skipped with an
//!   explicit reason, and the final report carries every unit's outcome.

pub mod orchestrator;
pub mod probe;
pub mod registrar;
pub mod replset;
pub mod report;
pub mod sharding;
pub mod zones;

pub use orchestrator::{Orchestrator, RunOptions};
pub use probe::{ProbeOutcome, RetryPolicy, wait_until_ready};
pub use report::{BootstrapResult, Phase, RunReport, ShardState, StepOutcome, Verdict};
