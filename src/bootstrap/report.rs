use crate::admin::AdminAck;
use serde::Serialize;
use std::fmt;

/// The phases of a bootstrap run, in execution order.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Phase {
    ProbingNodes,
    InitializingReplicaSets,
    RegisteringShards,
    ConfiguringSharding,
    AssigningZones,
    EnsuringIndexes,
    Verifying,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ProbingNodes => "ProbingNodes",
            Phase::InitializingReplicaSets => "InitializingReplicaSets",
            Phase::RegisteringShards => "RegisteringShards",
            Phase::ConfiguringSharding => "ConfiguringSharding",
            Phase::AssigningZones => "AssigningZones",
            Phase::EnsuringIndexes => "EnsuringIndexes",
            Phase::Verifying => "Verifying",
        };
        write!(f, "{}", name)
    }
}

/// Terminal outcome of one bootstrap step.
///
/// `AlreadyDone` is the success-equivalent idempotency outcome: the cluster
/// already carried the step's effect when the command was issued.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Success,
    AlreadyDone,
    Failed { reason: String },
}

impl StepOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        StepOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

impl From<AdminAck> for StepOutcome {
    fn from(ack: AdminAck) -> Self {
        match ack {
            AdminAck::Applied => StepOutcome::Success,
            AdminAck::AlreadyApplied => StepOutcome::AlreadyDone,
        }
    }
}

/// Runtime-observed state of one shard, owned by the orchestrator for the
/// duration of a run. The cluster's own configuration metadata remains the
/// durable source of truth; this is merely the run's working view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShardState {
    pub reachable: bool,
    pub replica_set_initialized: bool,
    pub primary_elected: bool,
    pub registered_with_router: bool,
}

/// Per-step outcome record accumulated into the final report.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapResult {
    pub phase: Phase,
    /// The unit the step acted on: a shard name, a namespace, a zone tag,
    /// or a range description.
    pub unit: String,
    pub outcome: StepOutcome,
    /// Whether a failure of this unit fails the whole run. Advisory units
    /// (index creation, verification read-back) never do.
    pub required: bool,
    pub detail: String,
}

/// Overall run status.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Success,
    Failed,
}

/// The sole observable output of a bootstrap run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: uuid::Uuid,
    pub results: Vec<BootstrapResult>,
    pub verdict: Verdict,
}

impl RunReport {
    pub fn new(results: Vec<BootstrapResult>) -> Self {
        let verdict = if results
            .iter()
            .any(|r| r.required && r.outcome.is_failure())
        {
            Verdict::Failed
        } else {
            Verdict::Success
        };
        Self {
            run_id: uuid::Uuid::new_v4(),
            results,
            verdict,
        }
    }

    pub fn count(&self, phase: Phase, outcome: &StepOutcome) -> usize {
        self.results
            .iter()
            .filter(|r| r.phase == phase && &r.outcome == outcome)
            .count()
    }

    pub fn successes(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == StepOutcome::Success)
            .count()
    }

    pub fn already_done(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == StepOutcome::AlreadyDone)
            .count()
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failure()).count()
    }

    /// Units whose failure drove the verdict.
    pub fn required_failures(&self) -> Vec<&BootstrapResult> {
        self.results
            .iter()
            .filter(|r| r.required && r.outcome.is_failure())
            .collect()
    }

    /// Logs one line per unit plus the aggregate verdict.
    pub fn log_summary(&self) {
        for result in &self.results {
            match &result.outcome {
                StepOutcome::Success => {
                    tracing::info!("[{}] {}: success", result.phase, result.unit)
                }
                StepOutcome::AlreadyDone => {
                    tracing::info!("[{}] {}: already done", result.phase, result.unit)
                }
                StepOutcome::Failed { reason } => tracing::warn!(
                    "[{}] {}: FAILED: {} {}",
                    result.phase,
                    result.unit,
                    reason,
                    if result.required { "" } else { "(advisory)" }
                ),
            }
        }
        tracing::info!(
            "Bootstrap run {}: {:?} ({} success, {} already done, {} failed)",
            self.run_id,
            self.verdict,
            self.successes(),
            self.already_done(),
            self.failures()
        );
        for result in self.required_failures() {
            tracing::warn!("Verdict driven by [{}] {}", result.phase, result.unit);
        }
    }
}
