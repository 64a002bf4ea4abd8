//! MineGuard hazard simulator CLI
//!
//! Runs hazard scenarios against a deterministic world and optionally
//! exports the spread animation as JSON.

use clap::{Parser, ValueEnum};
use mineguard_core::{HazardType, Location, MissingCoordinates, SimulationQuery};
use mineguard_sim::scenarios::ScenarioId;
use mineguard_sim::{
    HazardReport, ScenarioResult, ScenarioRunner, SimConfig, SimError, SimWorld, MINE_CENTER,
};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MissingPolicy {
    /// Read missing coordinates as 0
    Zero,
    /// Leave unlocated workers out of every tier
    Exclude,
}

impl From<MissingPolicy> for MissingCoordinates {
    fn from(policy: MissingPolicy) -> Self {
        match policy {
            MissingPolicy::Zero => MissingCoordinates::TreatAsZero,
            MissingPolicy::Exclude => MissingCoordinates::Exclude,
        }
    }
}

/// MineGuard hazard spread simulator
#[derive(Parser, Debug)]
#[command(name = "mineguard-sim")]
#[command(about = "Run deterministic hazard spread scenarios for MineGuard", long_about = None)]
struct Args {
    /// Scenario to run (gas_leak, fire, rock_fall, sensor_sweep, status_lifecycle, sos, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Master seed for determinism
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Animation length in seconds
    #[arg(short, long, default_value = "30")]
    duration: f64,

    /// Frames per second
    #[arg(long, default_value = "2")]
    fps: f64,

    /// Seeded workers added to the default roster
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Handling of workers without coordinates
    #[arg(long, value_enum, default_value = "zero")]
    missing: MissingPolicy,

    /// Print a one-off report for a hazard of this type at --time seconds
    /// instead of running scenarios
    #[arg(long, requires = "time")]
    hazard: Option<String>,

    /// Elapsed seconds for --hazard
    #[arg(short, long)]
    time: Option<f64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output
    #[arg(long)]
    json: bool,

    /// Export the scenario's frames to a JSON file
    #[arg(long)]
    export: Option<String>,
}

impl Args {
    fn config(&self) -> SimConfig {
        SimConfig::default()
            .with_seed(self.seed)
            .with_duration(self.duration)
            .with_fps(self.fps)
            .with_extra_workers(self.workers)
            .with_missing_coordinates(self.missing.into())
    }
}

/// Reports one hazard at the mine centre and prints its simulation.
async fn run_report(args: &Args, label: &str, time: f64) -> Result<(), SimError> {
    let world = SimWorld::new(args.config())?;
    let location = Location::new(MINE_CENTER.0, MINE_CENTER.1, "A");
    let hazard = world
        .report(HazardReport::new(HazardType::from(label), location, "W001"))
        .await?;
    let report = world.simulate(&hazard.id, &SimulationQuery::at(time))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report).map_err(mineguard_env::EnvError::from)?);
        return Ok(());
    }

    info!(
        "{} at t={}s: {} of {} workers affected",
        report.hazard_type, report.simulation_time, report.total_affected_workers, report.total_workers
    );
    for zone in report.danger_zones.iter() {
        info!(
            "  {} r={:.4} evacuate within {} min",
            zone.level, zone.radius, zone.evacuation_time_minutes
        );
    }
    for (level, worker) in report.affected_workers.iter() {
        info!(
            "  [{}] {} ({}) d={} - {}",
            level, worker.name, worker.worker_id, worker.distance_from_hazard, worker.recommended_action
        );
    }
    info!("Route: {}", report.evacuation_route.direction);
    Ok(())
}

fn log_result(result: &ScenarioResult) {
    if result.passed {
        info!("✓ {} (seed={}) PASSED", result.scenario.name(), result.seed);
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    if let Some(label) = &args.hazard {
        let time = args.time.unwrap_or_default();
        if let Err(e) = run_report(&args, label, time).await {
            error!("Report failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    if !args.json {
        info!("MineGuard Hazard Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                let names: Vec<&str> = ScenarioId::all().iter().map(|s| s.name()).collect();
                eprintln!("Available scenarios: {}, all", names.join(", "));
                std::process::exit(1);
            }
        }
    };

    let runner = ScenarioRunner::new(args.seed).with_config(args.config());

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        let (result, export) = runner.run_with_export(scenarios[0]).await;
        match export.write_to_file(export_path) {
            Ok(()) => info!("Exported {} frames to {}", export.frames.len(), export_path),
            Err(e) => {
                error!("Failed to write export: {}", e);
                std::process::exit(1);
            }
        }
        log_result(&result);
        if !result.passed {
            std::process::exit(1);
        }
        return;
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    for scenario in &scenarios {
        let result = runner.run(*scenario).await;
        if !args.json {
            log_result(&result);
        }
        all_results.push(result);
    }

    // Summary
    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "frames": r.metrics.frames_generated,
                    "hazards": r.metrics.hazards_created,
                    "max_affected_workers": r.metrics.max_affected_workers,
                    "events": r.metrics.events_published,
                    "time_secs": r.final_time_secs,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
