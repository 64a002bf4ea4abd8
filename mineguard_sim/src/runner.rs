//! Scenario runner - executes hazard scenarios and checks their invariants.

use crate::error::{RegistryError, SimError};
use crate::exporter::SimExport;
use crate::notifier::SimNotifier;
use crate::registry::HazardReport;
use crate::roster::MINE_CENTER;
use crate::scenarios::ScenarioId;
use crate::sensors::{Anomaly, SensorFeed};
use crate::world::{SimConfig, SimWorld};

use mineguard_core::detection::DEFAULT_SENSOR_ID;
use mineguard_core::frames::frame_count;
use mineguard_core::{
    compute_zones, evacuation_route, recommended_action, Hazard, HazardError, HazardSource,
    HazardStatus, HazardType, Location, MissingCoordinates, SimulationFrame, SimulationQuery,
    SimulationReport, Severity, WorkerPosition, ZoneLevel,
};
use mineguard_env::MineGuardContext;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Tolerance for radius comparisons.
const RADIUS_EPSILON: f64 = 1e-12;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all checks
    pub passed: bool,

    /// Virtual clock at the end of the run, in seconds
    pub final_time_secs: f64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioMetrics {
    pub hazards_created: usize,
    pub readings_ingested: usize,
    pub frames_generated: usize,

    /// Largest number of affected workers in any frame
    pub max_affected_workers: usize,

    pub status_changes: usize,
    pub events_published: u64,
    pub publish_failures: u64,
}

/// State of one scenario run.
struct Run {
    world: SimWorld,
    notifier: SimNotifier,
    metrics: ScenarioMetrics,
    export: SimExport,
    report: Option<SimulationReport>,
}

fn ensure(condition: bool, reason: impl FnOnce() -> String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(reason())
    }
}

fn failed<E: std::fmt::Display>(e: E) -> String {
    e.to_string()
}

/// Runs hazard scenarios.
pub struct ScenarioRunner {
    config: SimConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner with default settings.
    pub fn new(seed: u64) -> Self {
        Self {
            config: SimConfig::default().with_seed(seed),
        }
    }

    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the animation duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.config.duration_secs = secs;
        self
    }

    /// Sets the frame rate.
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.config.fps = fps;
        self
    }

    /// Sets the number of scattered workers.
    pub fn with_workers(mut self, extra: usize) -> Self {
        self.config.extra_workers = extra;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_with_export(scenario).await.0
    }

    /// Runs a scenario and also returns its frame export.
    pub async fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.config.seed);

        let mut config = self.config.clone();
        if scenario == ScenarioId::Sos {
            config = config.with_missing_coordinates(MissingCoordinates::Exclude);
        }

        let mut export = SimExport::new(scenario.name(), config.seed, config.fps);
        let notifier = SimNotifier::new(1);
        let world = match SimWorld::new(config) {
            Ok(world) => world.with_notifier(Arc::new(notifier.clone())),
            Err(e) => {
                let reason = e.to_string();
                export.finalize(false, Some(reason.clone()), None);
                return (self.failed_setup(scenario, reason), export);
            }
        };

        let mut run = Run {
            world,
            notifier,
            metrics: ScenarioMetrics::default(),
            export,
            report: None,
        };

        let outcome = match scenario {
            ScenarioId::GasLeak | ScenarioId::Fire | ScenarioId::RockFall => {
                self.run_spread(&mut run, scenario).await
            }
            ScenarioId::SensorSweep => self.run_sensor_sweep(&mut run).await,
            ScenarioId::StatusLifecycle => self.run_status_lifecycle(&mut run).await,
            ScenarioId::Sos => self.run_sos(&mut run).await,
        };

        run.metrics.events_published = run.world.events_published();
        run.metrics.publish_failures = run.world.publish_failures();

        let failure_reason = outcome.err();
        let passed = failure_reason.is_none();
        run.export.finalize(passed, failure_reason.clone(), run.report.take());

        if passed {
            info!(
                "✓ {} complete: {} hazard(s), {} frame(s), {} event(s)",
                scenario.name(),
                run.metrics.hazards_created,
                run.metrics.frames_generated,
                run.metrics.events_published
            );
        }

        let result = ScenarioResult {
            scenario,
            seed: self.config.seed,
            passed,
            final_time_secs: run.world.context.now().as_secs_f64(),
            failure_reason,
            metrics: run.metrics,
        };
        (result, run.export)
    }

    fn failed_setup(&self, scenario: ScenarioId, reason: String) -> ScenarioResult {
        ScenarioResult {
            scenario,
            seed: self.config.seed,
            passed: false,
            final_time_secs: 0.0,
            failure_reason: Some(reason),
            metrics: ScenarioMetrics::default(),
        }
    }

    // ========================================================================
    // SPREAD SCENARIOS
    // ========================================================================

    /// Worker-reported hazard at the mine centre, animated and then reported.
    async fn run_spread(&self, run: &mut Run, scenario: ScenarioId) -> Result<(), String> {
        let hazard_type = scenario.hazard_type().unwrap_or_default();
        let location = Location::new(MINE_CENTER.0, MINE_CENTER.1, scenario.sector());
        let report = HazardReport::new(hazard_type, location, "W001")
            .with_severity(Severity::High)
            .with_description(scenario.description());

        let hazard = run.world.report(report).await.map_err(failed)?;
        run.world.request_simulation(&hazard.id).await;
        run.metrics.hazards_created = 1;

        ensure(
            run.notifier.topics() == ["new-hazard", "start-simulation"],
            || format!("unexpected notifications: {:?}", run.notifier.topics()),
        )?;

        let frames = animate(run, &hazard)?;
        ensure(
            frames.last().map_or(true, |f| f.affected_workers.total() > 0),
            || "no worker was reached by the end of the run".to_string(),
        )?;

        finish_with_report(run, &hazard)
    }

    /// SOS with one worker whose position is unknown.
    async fn run_sos(&self, run: &mut Run) -> Result<(), String> {
        run.world.add_worker(WorkerPosition::unlocated("W099", "Unknown Worker", "Miner", "C"));

        let location = Location::new(MINE_CENTER.0, MINE_CENTER.1, ScenarioId::Sos.sector());
        let report = HazardReport::new(HazardType::SosEmergency, location, "W004")
            .with_severity(Severity::Critical)
            .with_description("Worker pressed the SOS button");
        let hazard = run.world.report(report).await.map_err(failed)?;
        run.world.request_simulation(&hazard.id).await;
        run.metrics.hazards_created = 1;

        let frames = animate(run, &hazard)?;
        for frame in &frames {
            ensure(frame.affected_workers.unlocated == ["W099"], || {
                format!("t={}: unlocated worker not reported", frame.time)
            })?;
        }

        if let Some(last) = frames.last() {
            ensure(
                last.affected_workers
                    .iter()
                    .all(|(_, w)| w.recommended_action.contains(HazardType::SosEmergency.label())),
                || "action text does not name the hazard".to_string(),
            )?;
        }

        finish_with_report(run, &hazard)
    }

    // ========================================================================
    // SENSOR SWEEP
    // ========================================================================

    async fn run_sensor_sweep(&self, run: &mut Run) -> Result<(), String> {
        const TICKS: usize = 24;
        let plan = [
            (3, Anomaly::Co2(2500.0), HazardType::GasLeak, Severity::Critical),
            (7, Anomaly::Co2(1200.0), HazardType::GasLeak, Severity::High),
            (11, Anomaly::Co2(900.0), HazardType::HighCo2Levels, Severity::Medium),
            (15, Anomaly::Temperature(60.0), HazardType::Fire, Severity::Critical),
            (19, Anomaly::Humidity(15.0), HazardType::PoorVentilation, Severity::Medium),
        ];

        let location = Location::new(MINE_CENTER.0, MINE_CENTER.1, "A");
        let mut feed = SensorFeed::new(run.world.config.sensor_seed(), DEFAULT_SENSOR_ID, location)
            .map_err(failed)?;
        for (tick, anomaly, _, _) in plan.iter() {
            feed = feed.with_anomaly(*tick, *anomaly);
        }

        let mut detected = Vec::new();
        for _ in 0..TICKS {
            let reading = feed.next_reading();
            if let Some(hazard) = run.world.ingest_reading(&reading).await {
                debug!("  tick {} -> {}", feed.tick() - 1, hazard.hazard_type);
                detected.push(hazard);
            }
            run.world.advance_secs(1.0);
        }
        run.metrics.readings_ingested = TICKS;
        run.metrics.hazards_created = detected.len();

        ensure(detected.len() == plan.len(), || {
            format!("expected {} detections, got {}", plan.len(), detected.len())
        })?;
        for (hazard, (tick, _, hazard_type, severity)) in detected.iter().zip(plan.iter()) {
            ensure(
                hazard.hazard_type == *hazard_type && hazard.severity == *severity,
                || format!("tick {tick}: detected {} {}", hazard.hazard_type, hazard.severity),
            )?;
            ensure(
                hazard.source == HazardSource::IotSensor
                    && hazard.worker.as_deref() == Some(DEFAULT_SENSOR_ID),
                || format!("tick {tick}: wrong source or reporter"),
            )?;
        }

        let topics = run.notifier.topics();
        ensure(
            topics.len() == 2 * plan.len()
                && topics
                    .chunks(2)
                    .all(|pair| pair == ["new-hazard", "start-simulation"]),
            || format!("unexpected notifications: {topics:?}"),
        )?;

        let registry = &run.world.registry;
        ensure(registry.recent_readings(None).len() == TICKS, || {
            "sensor log is incomplete".to_string()
        })?;
        ensure(registry.active().len() == plan.len(), || {
            "detected hazards are not all active".to_string()
        })?;
        ensure(
            registry.all(None).first().map(|h| h.id) == detected.last().map(|h| h.id),
            || "listing is not newest first".to_string(),
        )?;

        if let Some(first) = detected.first() {
            run.export.hazard = Some(first.clone());
            let frames: Vec<SimulationFrame> = run.world.frames(first).collect();
            run.metrics.frames_generated = frames.len();
            run.export.extend_frames(frames);
        }
        Ok(())
    }

    // ========================================================================
    // STATUS LIFECYCLE
    // ========================================================================

    async fn run_status_lifecycle(&self, run: &mut Run) -> Result<(), String> {
        let location = Location::new(MINE_CENTER.0, MINE_CENTER.1, "B");
        let hazard = run
            .world
            .report(HazardReport::new(HazardType::EquipmentFailure, location.clone(), "W003"))
            .await
            .map_err(failed)?;

        for label in ["acknowledged", "escalated", "acknowledged", "resolved"] {
            let status: HazardStatus = label.parse().map_err(failed)?;
            run.world.advance_secs(10.0);
            let change = run.world.update_status(&hazard.id, status).await.map_err(failed)?;
            ensure(change.changed(), || format!("{label}: status did not change"))?;
            run.metrics.status_changes += 1;
        }

        // Resolved is terminal
        match run.world.update_status(&hazard.id, HazardStatus::Pending).await {
            Err(SimError::Registry(RegistryError::Hazard(HazardError::InvalidTransition { .. }))) => {}
            other => return Err(format!("reopening a resolved hazard gave {other:?}")),
        }

        // Same status is accepted silently
        let second = run
            .world
            .report(HazardReport::new("Flooding", location, "W001"))
            .await
            .map_err(failed)?;
        let change = run
            .world
            .update_status(&second.id, HazardStatus::Pending)
            .await
            .map_err(failed)?;
        ensure(!change.changed(), || "same-status update reported a change".to_string())?;

        ensure(
            run.notifier.topics()
                == [
                    "new-hazard",
                    "hazard-acknowledged",
                    "hazard-escalated",
                    "hazard-acknowledged",
                    "hazard-resolved",
                    "new-hazard",
                ],
            || format!("unexpected notifications: {:?}", run.notifier.topics()),
        )?;

        // A dead sink never blocks the state change
        run.notifier.set_failing(true);
        run.world
            .update_status(&second.id, HazardStatus::Escalated)
            .await
            .map_err(failed)?;
        run.notifier.set_failing(false);
        run.metrics.status_changes += 1;

        let stored = run.world.registry.get(&second.id);
        ensure(
            stored.map(|h| h.status()) == Some(HazardStatus::Escalated),
            || "status change lost when publish failed".to_string(),
        )?;
        ensure(run.world.publish_failures() == 1, || {
            "failed publish was not counted".to_string()
        })?;

        let active: Vec<_> = run.world.registry.active().into_iter().map(|h| h.id).collect();
        ensure(active == [second.id], || format!("unexpected active set: {active:?}"))?;

        run.metrics.hazards_created = 2;
        run.export.hazard = run.world.registry.get(&second.id);
        Ok(())
    }
}

/// Generates the configured frame sequence for `hazard` and checks it.
fn animate(run: &mut Run, hazard: &Hazard) -> Result<Vec<SimulationFrame>, String> {
    let frames: Vec<SimulationFrame> = run.world.frames(hazard).collect();
    check_frames(&run.world, hazard, &frames)?;

    let replay: Vec<SimulationFrame> = run.world.frames(hazard).collect();
    ensure(replay == frames, || "frame sequence is not reproducible".to_string())?;

    run.metrics.frames_generated = frames.len();
    run.metrics.max_affected_workers = frames
        .iter()
        .map(|f| f.affected_workers.total())
        .max()
        .unwrap_or(0);

    run.export.hazard = Some(hazard.clone());
    run.export.extend_frames(frames.iter().cloned());
    Ok(frames)
}

/// Runs the clock to the end of the animation and takes the on-demand report.
fn finish_with_report(run: &mut Run, hazard: &Hazard) -> Result<(), String> {
    run.world.advance_secs(run.world.config.duration_secs);
    let report = run
        .world
        .simulate(&hazard.id, &SimulationQuery::default())
        .map_err(failed)?;

    ensure(report.total_workers == run.world.roster().len(), || {
        "report roster size mismatch".to_string()
    })?;
    ensure(
        report.total_affected_workers == report.affected_workers.total(),
        || "affected total does not match tiers".to_string(),
    )?;
    ensure(
        report.evacuation_route == evacuation_route(&hazard.location.sector),
        || "wrong evacuation route".to_string(),
    )?;
    for (level, worker) in report.affected_workers.iter() {
        ensure(
            worker.recommended_action == recommended_action(Some(level), &hazard.hazard_type),
            || format!("{}: action does not match tier", worker.worker_id),
        )?;
    }

    run.report = Some(report);
    Ok(())
}

/// Structural checks every frame sequence must pass.
fn check_frames(world: &SimWorld, hazard: &Hazard, frames: &[SimulationFrame]) -> Result<(), String> {
    let expected = frame_count(world.config.duration_secs, world.config.fps);
    ensure(frames.len() == expected, || {
        format!("expected {expected} frames, got {}", frames.len())
    })?;

    for frame in frames {
        let t = frame.time;
        let zones = &frame.danger_zones;

        ensure(
            zones.radius(ZoneLevel::Critical) <= zones.radius(ZoneLevel::High)
                && zones.radius(ZoneLevel::High) <= zones.radius(ZoneLevel::Medium),
            || format!("t={t}: rings are not nested"),
        )?;
        ensure(*zones == compute_zones(&hazard.hazard_type, t), || {
            format!("t={t}: zones differ from direct computation")
        })?;
        if t == 0.0 {
            ensure(zones.max_radius() == 0.0, || "rings are not empty at t=0".to_string())?;
        }

        let doubled = compute_zones(&hazard.hazard_type, 2.0 * t);
        for level in ZoneLevel::ALL {
            ensure(
                (doubled.radius(level) - 2.0 * zones.radius(level)).abs() <= RADIUS_EPSILON,
                || format!("t={t}: {level} ring does not grow linearly"),
            )?;
        }

        let mut seen = HashSet::new();
        for (_, worker) in frame.affected_workers.iter() {
            ensure(seen.insert(worker.worker_id.as_str()), || {
                format!("t={t}: {} appears in two tiers", worker.worker_id)
            })?;
        }

        for worker in world.roster() {
            let (Some(lat), Some(lng)) = (worker.lat, worker.lng) else {
                continue;
            };
            let distance = (lat - hazard.location.lat).hypot(lng - hazard.location.lng);
            if distance > zones.max_radius() + RADIUS_EPSILON {
                ensure(frame.affected_workers.level_of(&worker.id).is_none(), || {
                    format!("t={t}: {} listed outside every ring", worker.id)
                })?;
            }
        }

        if (t * world.config.fps).round() as u64 % 10 == 0 {
            debug!(
                "  t={:.1}s | medium radius={:.4} | affected={}",
                t,
                zones.max_radius(),
                frame.affected_workers.total()
            );
        }
    }
    Ok(())
}
