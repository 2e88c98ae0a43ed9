use cluster_bootstrap::admin::{AdminApi, HttpAdminClient};
use cluster_bootstrap::bootstrap::{Orchestrator, RunOptions, Verdict};
use cluster_bootstrap::plan::TopologyPlan;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} --plan <topology.json> --router <addr:port> [options]",
            args[0]
        );
        eprintln!("Options:");
        eprintln!("  --probe-attempts <n>     readiness probe budget (default 30)");
        eprintln!("  --probe-interval-ms <n>  delay between probes (default 2000)");
        eprintln!("  --election-attempts <n>  primary election polls (default 60)");
        eprintln!("  --abort-on-failure       stop after a phase with a required failure");
        eprintln!(
            "Example: {} --plan topology.json --router mongo-router:27017",
            args[0]
        );
        std::process::exit(1);
    }

    let mut plan_path: Option<PathBuf> = None;
    let mut router: Option<String> = None;
    let mut options = RunOptions::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--plan" => {
                plan_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--router" => {
                router = Some(args[i + 1].clone());
                i += 2;
            }
            "--probe-attempts" => {
                options.probe.max_attempts = args[i + 1].parse()?;
                i += 2;
            }
            "--probe-interval-ms" => {
                let interval = Duration::from_millis(args[i + 1].parse()?);
                options.probe.interval = interval;
                options.probe.max_interval = interval;
                i += 2;
            }
            "--election-attempts" => {
                options.election.max_attempts = args[i + 1].parse()?;
                i += 2;
            }
            "--abort-on-failure" => {
                options.abort_on_required_failure = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    let plan_path = plan_path.expect("--plan is required");
    let router = router.expect("--router is required");

    let plan = TopologyPlan::load(&plan_path)?;
    tracing::info!(
        "Loaded plan for database '{}' from {}",
        plan.database,
        plan_path.display()
    );
    tracing::info!("Routing admin commands through {}", router);

    let admin: Arc<dyn AdminApi> = Arc::new(HttpAdminClient::new(router));
    let orchestrator = Orchestrator::new(admin, plan, options);
    let report = orchestrator.run().await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.verdict == Verdict::Failed {
        std::process::exit(1);
    }
    Ok(())
}
