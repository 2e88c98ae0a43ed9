//! Bootstrap Orchestrator
//!
//! Sequences the whole declared topology through the bootstrap phases:
//! `ProbingNodes -> InitializingReplicaSets -> RegisteringShards ->
//! ConfiguringSharding -> AssigningZones -> EnsuringIndexes -> Verifying`.
//!
//! Phases run strictly in order; a phase only advances once every unit in it
//! has reached a terminal outcome. Within a phase, units over independent
//! shards, collections, and zones run concurrently as spawned tasks; the
//! fan-out is bounded by the plan itself (a handful of shards), so no extra
//! worker limit is needed. Units that depend on a shard that failed an
//! earlier phase are skipped with an explicit reason instead of issuing
//! commands against a half-formed shard.

use crate::admin::AdminApi;
use crate::bootstrap::probe::{ProbeOutcome, RetryPolicy, wait_until_ready};
use crate::bootstrap::report::{BootstrapResult, Phase, RunReport, ShardState, StepOutcome};
use crate::bootstrap::zones::ZoneAssigner;
use crate::bootstrap::{registrar, replset, sharding};
use crate::plan::{TopologyPlan, coverage_gaps};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Per-run knobs. Timeouts and retry budgets are explicit inputs, never
/// hard-coded, so a deployment can tune them per environment and tests can
/// run with zero waits.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Policy for node readiness probing.
    pub probe: RetryPolicy,
    /// Policy for primary-election polling after replica-set initiate.
    pub election: RetryPolicy,
    /// Stop after the current phase once a required unit has failed,
    /// surfacing partial results instead of continuing into an
    /// inconsistent zone configuration.
    pub abort_on_required_failure: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            probe: RetryPolicy::probing(),
            election: RetryPolicy::election(),
            abort_on_required_failure: false,
        }
    }
}

/// The sequencing state machine over one [`TopologyPlan`].
///
/// Stateless between runs: progress is re-derived from the cluster itself
/// (idempotent steps report `AlreadyDone`), never persisted here.
pub struct Orchestrator {
    admin: Arc<dyn AdminApi>,
    plan: Arc<TopologyPlan>,
    options: RunOptions,
    shard_states: Arc<DashMap<String, ShardState>>,
}

impl Orchestrator {
    pub fn new(admin: Arc<dyn AdminApi>, plan: TopologyPlan, options: RunOptions) -> Self {
        let shard_states = Arc::new(DashMap::new());
        for shard in &plan.shards {
            shard_states.insert(shard.name.clone(), ShardState::default());
        }
        Self {
            admin,
            plan: Arc::new(plan),
            options,
            shard_states,
        }
    }

    /// Runs every phase and returns the consolidated report. Never panics on
    /// unit failures; the report carries each unit's classified outcome.
    pub async fn run(&self) -> RunReport {
        tracing::info!(
            "Starting bootstrap: {} shard(s), {} collection(s), {} zone(s), {} range(s)",
            self.plan.shards.len(),
            self.plan.collections.len(),
            self.plan.zones.len(),
            self.plan.ranges.len()
        );

        let mut results = Vec::new();
        let phases = [
            Phase::ProbingNodes,
            Phase::InitializingReplicaSets,
            Phase::RegisteringShards,
            Phase::ConfiguringSharding,
            Phase::AssigningZones,
            Phase::EnsuringIndexes,
            Phase::Verifying,
        ];

        for phase in phases {
            tracing::info!("Phase {}", phase);
            let mut phase_results = match phase {
                Phase::ProbingNodes => self.probe_nodes().await,
                Phase::InitializingReplicaSets => self.initialize_replica_sets().await,
                Phase::RegisteringShards => self.register_shards().await,
                Phase::ConfiguringSharding => self.configure_sharding().await,
                Phase::AssigningZones => self.assign_zones().await,
                Phase::EnsuringIndexes => self.ensure_indexes().await,
                Phase::Verifying => self.verify().await,
            };
            phase_results.sort_by(|a, b| a.unit.cmp(&b.unit));

            let required_failure = phase_results
                .iter()
                .any(|r| r.required && r.outcome.is_failure());
            results.extend(phase_results);

            if required_failure && self.options.abort_on_required_failure {
                tracing::warn!("Aborting after {}: required unit failed", phase);
                break;
            }
        }

        let report = RunReport::new(results);
        report.log_summary();
        report
    }

    fn state(&self, shard: &str) -> ShardState {
        self.shard_states
            .get(shard)
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn update_state(&self, shard: &str, update: impl FnOnce(&mut ShardState)) {
        if let Some(mut state) = self.shard_states.get_mut(shard) {
            update(&mut state);
        }
    }

    /// Drains a phase's spawned units, dropping (and logging) panicked tasks.
    async fn collect(mut set: JoinSet<BootstrapResult>) -> Vec<BootstrapResult> {
        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("Bootstrap unit panicked: {}", e),
            }
        }
        results
    }

    async fn probe_nodes(&self) -> Vec<BootstrapResult> {
        let mut set = JoinSet::new();
        for shard in &self.plan.shards {
            let admin = self.admin.clone();
            let policy = self.options.probe.clone();
            let states = self.shard_states.clone();
            let shard = shard.clone();
            set.spawn(async move {
                let endpoint = shard.endpoint();
                match wait_until_ready(admin.as_ref(), &endpoint, &policy).await {
                    ProbeOutcome::Ready { attempts } => {
                        if let Some(mut state) = states.get_mut(&shard.name) {
                            state.reachable = true;
                        }
                        BootstrapResult {
                            phase: Phase::ProbingNodes,
                            unit: shard.name.clone(),
                            outcome: StepOutcome::Success,
                            required: true,
                            detail: format!("{} ready after {} attempt(s)", endpoint, attempts),
                        }
                    }
                    ProbeOutcome::TimedOut { attempts } => BootstrapResult {
                        phase: Phase::ProbingNodes,
                        unit: shard.name.clone(),
                        outcome: StepOutcome::failed(format!(
                            "{} unreachable after {} attempt(s)",
                            endpoint, attempts
                        )),
                        required: true,
                        detail: String::new(),
                    },
                }
            });
        }
        Self::collect(set).await
    }

    async fn initialize_replica_sets(&self) -> Vec<BootstrapResult> {
        let mut set = JoinSet::new();
        for shard in &self.plan.shards {
            if !self.state(&shard.name).reachable {
                set.spawn(std::future::ready(BootstrapResult {
                    phase: Phase::InitializingReplicaSets,
                    unit: shard.name.clone(),
                    outcome: StepOutcome::failed("skipped: node unreachable"),
                    required: true,
                    detail: String::new(),
                }));
                continue;
            }
            let admin = self.admin.clone();
            let election = self.options.election.clone();
            let states = self.shard_states.clone();
            let shard = shard.clone();
            set.spawn(async move {
                let result = replset::initialize(admin.as_ref(), &shard, &election).await;
                if let Some(mut state) = states.get_mut(&shard.name) {
                    state.replica_set_initialized = result.initiated;
                    state.primary_elected = result.primary_elected;
                }
                BootstrapResult {
                    phase: Phase::InitializingReplicaSets,
                    unit: shard.name.clone(),
                    outcome: result.outcome,
                    required: true,
                    detail: shard.replica_set_id.clone(),
                }
            });
        }
        Self::collect(set).await
    }

    async fn register_shards(&self) -> Vec<BootstrapResult> {
        let mut set = JoinSet::new();
        for shard in &self.plan.shards {
            // Election still in flight is fine; a never-initiated set is not.
            if !self.state(&shard.name).replica_set_initialized {
                set.spawn(std::future::ready(BootstrapResult {
                    phase: Phase::RegisteringShards,
                    unit: shard.name.clone(),
                    outcome: StepOutcome::failed("skipped: replica set not initialized"),
                    required: true,
                    detail: String::new(),
                }));
                continue;
            }
            let admin = self.admin.clone();
            let states = self.shard_states.clone();
            let shard = shard.clone();
            set.spawn(async move {
                let outcome = registrar::register(admin.as_ref(), &shard).await;
                if !outcome.is_failure() {
                    if let Some(mut state) = states.get_mut(&shard.name) {
                        state.registered_with_router = true;
                    }
                }
                BootstrapResult {
                    phase: Phase::RegisteringShards,
                    unit: shard.name.clone(),
                    outcome,
                    required: true,
                    detail: shard.connection_string(),
                }
            });
        }
        Self::collect(set).await
    }

    async fn configure_sharding(&self) -> Vec<BootstrapResult> {
        let mut results = Vec::new();

        // Enabling sharding on the database gates every collection below,
        // so it runs to completion first, inside the same phase.
        let database = self.plan.database.clone();
        let enable_outcome = sharding::enable_database(self.admin.as_ref(), &database).await;
        let enabled = !enable_outcome.is_failure();
        results.push(BootstrapResult {
            phase: Phase::ConfiguringSharding,
            unit: database.clone(),
            outcome: enable_outcome,
            required: true,
            detail: "enable sharding".to_string(),
        });

        let mut set = JoinSet::new();
        for collection in &self.plan.collections {
            let namespace = self.plan.namespace(&collection.name);
            if !enabled {
                set.spawn(std::future::ready(BootstrapResult {
                    phase: Phase::ConfiguringSharding,
                    unit: namespace,
                    outcome: StepOutcome::failed(format!(
                        "skipped: sharding not enabled on {}",
                        database
                    )),
                    required: true,
                    detail: String::new(),
                }));
                continue;
            }
            let admin = self.admin.clone();
            let collection = collection.clone();
            set.spawn(async move {
                let outcome =
                    sharding::shard_collection(admin.as_ref(), &namespace, &collection).await;
                BootstrapResult {
                    phase: Phase::ConfiguringSharding,
                    unit: namespace,
                    outcome,
                    required: true,
                    detail: format!("{:?}", collection.key),
                }
            });
        }
        results.extend(Self::collect(set).await);
        results
    }

    async fn assign_zones(&self) -> Vec<BootstrapResult> {
        let assigner = Arc::new(ZoneAssigner::new());
        let mut results = Vec::new();

        // Zone tags first: a range binding to an empty zone routes nowhere.
        let mut tags = JoinSet::new();
        for zone in &self.plan.zones {
            for member in &zone.member_shards {
                let unit = format!("{} -> {}", member, zone.name);
                let Some(shard) = self.plan.shard(member) else {
                    // Validation catches this; kept as a terminal outcome for
                    // plans run without validation.
                    tags.spawn(std::future::ready(BootstrapResult {
                        phase: Phase::AssigningZones,
                        unit,
                        outcome: StepOutcome::failed(format!("unknown shard {}", member)),
                        required: true,
                        detail: String::new(),
                    }));
                    continue;
                };
                if !self.state(member).registered_with_router {
                    tags.spawn(std::future::ready(BootstrapResult {
                        phase: Phase::AssigningZones,
                        unit,
                        outcome: StepOutcome::failed("skipped: shard not registered"),
                        required: true,
                        detail: String::new(),
                    }));
                    continue;
                }
                let admin = self.admin.clone();
                let assigner = assigner.clone();
                let shard_id = shard.replica_set_id.clone();
                let zone_name = zone.name.clone();
                tags.spawn(async move {
                    let outcome = assigner
                        .tag_shard(admin.as_ref(), &shard_id, &zone_name)
                        .await;
                    BootstrapResult {
                        phase: Phase::AssigningZones,
                        unit,
                        outcome,
                        required: true,
                        detail: shard_id,
                    }
                });
            }
        }
        results.extend(Self::collect(tags).await);

        let mut ranges = JoinSet::new();
        for assignment in &self.plan.ranges {
            let unit = assignment.to_string();
            if let Some(unregistered) = self.unregistered_member(&assignment.zone) {
                ranges.spawn(std::future::ready(BootstrapResult {
                    phase: Phase::AssigningZones,
                    unit,
                    outcome: StepOutcome::failed(format!(
                        "skipped: zone {} member {} not registered",
                        assignment.zone, unregistered
                    )),
                    required: true,
                    detail: String::new(),
                }));
                continue;
            }
            let admin = self.admin.clone();
            let assigner = assigner.clone();
            let namespace = self.plan.namespace(&assignment.collection);
            let assignment = assignment.clone();
            ranges.spawn(async move {
                let outcome = assigner
                    .assign_range(admin.as_ref(), &namespace, &assignment)
                    .await;
                BootstrapResult {
                    phase: Phase::AssigningZones,
                    unit,
                    outcome,
                    required: true,
                    detail: namespace,
                }
            });
        }
        results.extend(Self::collect(ranges).await);
        results
    }

    /// First member of `zone` not yet registered with the router, if any.
    /// A zone unknown to the plan reports itself as the blocker.
    fn unregistered_member(&self, zone: &str) -> Option<String> {
        let Some(spec) = self.plan.zones.iter().find(|z| z.name == zone) else {
            return Some(format!("<unknown zone {}>", zone));
        };
        spec.member_shards
            .iter()
            .find(|m| !self.state(m).registered_with_router)
            .cloned()
    }

    async fn ensure_indexes(&self) -> Vec<BootstrapResult> {
        let mut set = JoinSet::new();
        for collection in &self.plan.collections {
            for index in &collection.indexes {
                let admin = self.admin.clone();
                let namespace = self.plan.namespace(&collection.name);
                let index = index.clone();
                set.spawn(async move {
                    let unit = format!("{}.{}", namespace, index.index_name());
                    let outcome = sharding::create_index(admin.as_ref(), &namespace, &index).await;
                    BootstrapResult {
                        phase: Phase::EnsuringIndexes,
                        unit,
                        outcome,
                        required: false,
                        detail: if index.unique { "unique".to_string() } else { String::new() },
                    }
                });
            }
        }
        Self::collect(set).await
    }

    /// Advisory read-back: registered shard count and key-space coverage.
    /// Purely informational; never affects the verdict.
    async fn verify(&self) -> Vec<BootstrapResult> {
        let mut results = Vec::new();

        let (outcome, detail) = match self.admin.list_shards().await {
            Ok(shards) => {
                let detail = format!(
                    "{} of {} declared shard(s) registered",
                    shards.len(),
                    self.plan.shards.len()
                );
                let outcome = if shards.len() >= self.plan.shards.len() {
                    StepOutcome::Success
                } else {
                    StepOutcome::failed(detail.clone())
                };
                (outcome, detail)
            }
            Err(e) => (StepOutcome::failed(e.to_string()), String::new()),
        };
        results.push(BootstrapResult {
            phase: Phase::Verifying,
            unit: "shard-count".to_string(),
            outcome,
            required: false,
            detail,
        });

        for collection in &self.plan.collections {
            if self.plan.ranges_for(&collection.name).is_empty() {
                continue;
            }
            let gaps = coverage_gaps(self.plan.as_ref(), &collection.name);
            let detail = if gaps.is_empty() {
                "key space fully covered".to_string()
            } else {
                for (from, to) in &gaps {
                    tracing::info!(
                        "Coverage gap in {}: [{} .. {})",
                        collection.name,
                        from,
                        to
                    );
                }
                format!("{} uncovered gap(s) in key space", gaps.len())
            };
            results.push(BootstrapResult {
                phase: Phase::Verifying,
                unit: format!("coverage:{}", collection.name),
                outcome: StepOutcome::Success,
                required: false,
                detail,
            });
        }
        results
    }
}
