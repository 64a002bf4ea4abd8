//! SimWorld - the simulation harness container.

use crate::context::SimContext;
use crate::error::SimError;
use crate::notifier::SimNotifier;
use crate::registry::{HazardRegistry, HazardReport, StatusChange};
use crate::roster::build_roster;

use mineguard_core::events::publish;
use mineguard_core::frames::{frame_count, DEFAULT_DURATION_SECS, DEFAULT_FPS};
use mineguard_core::{
    Frames, Hazard, HazardEvent, HazardStatus, MissingCoordinates, ProximityClassifier,
    SensorReading, SimulationQuery, SimulationReport, Simulator, WorkerPosition,
};
use mineguard_env::{HazardId, MineGuardContext, NotificationSink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest animation a harness run will materialize.
pub const MAX_FRAMES: usize = 100_000;

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Animation length in seconds
    pub duration_secs: f64,

    /// Frames per second of the animation
    pub fps: f64,

    /// Seeded workers added to the default roster
    pub extra_workers: usize,

    /// Handling of workers without coordinates
    pub missing_coordinates: MissingCoordinates,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            duration_secs: DEFAULT_DURATION_SECS,
            fps: DEFAULT_FPS,
            extra_workers: 0,
            missing_coordinates: MissingCoordinates::default(),
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_extra_workers(mut self, count: usize) -> Self {
        self.extra_workers = count;
        self
    }

    pub fn with_missing_coordinates(mut self, policy: MissingCoordinates) -> Self {
        self.missing_coordinates = policy;
        self
    }

    /// Frames the configured animation produces.
    pub fn frame_count(&self) -> usize {
        frame_count(self.duration_secs, self.fps)
    }

    /// Rejects animations the harness cannot hold in memory.
    pub fn validate(&self) -> Result<(), SimError> {
        let frames = self.frame_count();
        if frames > MAX_FRAMES {
            return Err(SimError::Config(format!(
                "{}s at {} fps is {frames} frames (max {MAX_FRAMES})",
                self.duration_secs, self.fps
            )));
        }
        Ok(())
    }

    /// Seed of the hazard id stream.
    pub fn id_seed(&self) -> u64 {
        self.seed.wrapping_mul(0x9e3779b97f4a7c15)
    }

    /// Seed of the worker scatter stream.
    pub fn roster_seed(&self) -> u64 {
        self.seed.wrapping_mul(0x517cc1b727220a95)
    }

    /// Seed of the sensor noise stream.
    pub fn sensor_seed(&self) -> u64 {
        self.seed ^ 0x5eed_5e25_0000_0001
    }
}

/// Counters kept by a world across its lifetime.
#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    publish_failures: AtomicU64,
}

/// The SimWorld - clock, registry, roster and notification sink for one run.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Shared simulation context (virtual clock)
    pub context: Arc<SimContext>,

    /// Hazard store
    pub registry: HazardRegistry,

    /// Worker snapshot passed to every simulation call
    roster: Vec<WorkerPosition>,

    notifier: Arc<dyn NotificationSink>,

    simulator: Simulator,

    counters: Counters,
}

impl SimWorld {
    /// Creates a new SimWorld with a recording notifier.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let context = SimContext::shared(config.seed);
        let registry = HazardRegistry::new(config.id_seed());
        let roster = build_roster(config.roster_seed(), config.extra_workers)?;
        let simulator = Simulator::new(ProximityClassifier::new(config.missing_coordinates));

        info!(
            "SimWorld created: seed={} workers={} duration={}s fps={}",
            config.seed,
            roster.len(),
            config.duration_secs,
            config.fps
        );

        Ok(Self {
            config,
            context,
            registry,
            roster,
            notifier: Arc::new(SimNotifier::default()),
            simulator,
            counters: Counters::default(),
        })
    }

    /// Replaces the notification sink.
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn roster(&self) -> &[WorkerPosition] {
        &self.roster
    }

    pub fn add_worker(&mut self, worker: WorkerPosition) {
        self.roster.push(worker);
    }

    /// Advances the virtual clock.
    pub fn advance_secs(&self, secs: f64) {
        self.context.advance_secs(secs);
    }

    /// Events handed to the sink so far.
    pub fn events_published(&self) -> u64 {
        self.counters.published.load(Ordering::Relaxed)
    }

    /// Publishes that failed (and were dropped).
    pub fn publish_failures(&self) -> u64 {
        self.counters.publish_failures.load(Ordering::Relaxed)
    }

    /// Best-effort publish: failures are logged and counted, never returned.
    async fn notify(&self, event: HazardEvent) {
        match publish(&*self.notifier, &event, self.context.utc_now()).await {
            Ok(delivered) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
                debug!("{} -> {} subscriber(s)", event.topic(), delivered);
            }
            Err(e) => {
                self.counters.publish_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Failed to publish {} for {}: {}", event.topic(), event.hazard_id().short(), e);
            }
        }
    }

    /// Records a worker report and announces it.
    pub async fn report(&self, report: HazardReport) -> Result<Hazard, SimError> {
        let hazard = self.registry.report(report, self.context.utc_now())?;
        info!(
            "Hazard {} reported: {} ({}) in sector {}",
            hazard.id.short(),
            hazard.hazard_type,
            hazard.severity,
            hazard.location.sector
        );
        self.notify(HazardEvent::new_hazard(hazard.clone())).await;
        Ok(hazard)
    }

    /// Runs a sensor reading through detection; a detected hazard is
    /// announced and its simulation requested.
    pub async fn ingest_reading(&self, reading: &SensorReading) -> Option<Hazard> {
        let Some(hazard) = self.registry.ingest_reading(reading, self.context.utc_now()) else {
            debug!("{}: all readings normal", reading.sensor_id());
            return None;
        };

        info!(
            "{} detected by {}: severity {}",
            hazard.hazard_type,
            reading.sensor_id(),
            hazard.severity
        );
        self.notify(HazardEvent::new_hazard(hazard.clone())).await;
        self.request_simulation(&hazard.id).await;
        Some(hazard)
    }

    /// Asks observers to start animating a hazard.
    pub async fn request_simulation(&self, id: &HazardId) {
        self.notify(HazardEvent::SimulationRequested { hazard_id: *id }).await;
    }

    /// Moves a hazard through its lifecycle; only real changes are announced.
    pub async fn update_status(&self, id: &HazardId, status: HazardStatus) -> Result<StatusChange, SimError> {
        let change = self.registry.update_status(id, status)?;
        if change.changed() {
            info!("Hazard {}: {} -> {}", id.short(), change.previous, status);
            self.notify(HazardEvent::StatusChanged {
                hazard_id: *id,
                from: change.previous,
                to: status,
            })
            .await;
        }
        Ok(change)
    }

    /// On-demand report for a registered hazard against the roster.
    pub fn simulate(&self, id: &HazardId, query: &SimulationQuery) -> Result<SimulationReport, SimError> {
        let hazard = self
            .registry
            .get(id)
            .ok_or(crate::error::RegistryError::NotFound(*id))?;
        Ok(self
            .simulator
            .report(&hazard, &self.roster, query, self.context.utc_now()))
    }

    /// Frame sequence over the configured duration and rate.
    pub fn frames<'a>(&'a self, hazard: &'a Hazard) -> Frames<'a> {
        let query = SimulationQuery::default().with_duration(self.config.duration_secs);
        self.simulator.frames(hazard, &self.roster, &query, self.config.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mineguard_core::{HazardType, Location, ZoneLevel};

    fn world_with_notifier() -> (SimWorld, SimNotifier) {
        let notifier = SimNotifier::new(1);
        let world = SimWorld::new(SimConfig::default())
            .unwrap()
            .with_notifier(Arc::new(notifier.clone()));
        (world, notifier)
    }

    fn fire_report() -> HazardReport {
        HazardReport::new("Fire", Location::new(23.045, 81.325, "B"), "W002")
    }

    #[test]
    fn test_config_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.duration_secs, 30.0);
        assert_eq!(config.fps, 2.0);
        assert_eq!(config.extra_workers, 0);
        assert_eq!(config.missing_coordinates, MissingCoordinates::TreatAsZero);
        assert_ne!(config.id_seed(), config.roster_seed());
        assert_eq!(config.frame_count(), 60);
    }

    #[test]
    fn test_oversized_animation_is_rejected() {
        let huge = SimConfig::default().with_duration(1e12);
        assert!(matches!(huge.validate(), Err(SimError::Config(_))));
        assert!(matches!(SimWorld::new(huge), Err(SimError::Config(_))));

        let edge = SimConfig::default().with_duration(MAX_FRAMES as f64).with_fps(1.0);
        assert_eq!(edge.frame_count(), MAX_FRAMES);
        assert!(edge.validate().is_ok());
        assert!(edge.with_fps(2.0).validate().is_err());
    }

    #[tokio::test]
    async fn test_report_publishes_new_hazard() {
        let (world, notifier) = world_with_notifier();
        let hazard = world.report(fire_report()).await.unwrap();

        assert_eq!(notifier.topics(), vec!["new-hazard".to_string()]);
        assert_eq!(world.events_published(), 1);
        assert_eq!(hazard.created_at, world.context.epoch());
    }

    #[tokio::test]
    async fn test_detected_reading_requests_simulation() {
        let (world, notifier) = world_with_notifier();
        let reading = SensorReading::new(Location::new(23.045, 81.325, "A")).with_temperature(60.0);

        let hazard = world.ingest_reading(&reading).await.unwrap();
        assert_eq!(hazard.hazard_type, HazardType::Fire);
        assert_eq!(notifier.topics(), vec!["new-hazard".to_string(), "start-simulation".to_string()]);

        let normal = SensorReading::new(Location::new(23.045, 81.325, "A"));
        assert!(world.ingest_reading(&normal).await.is_none());
        assert_eq!(notifier.envelopes().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_publish_keeps_state_change() {
        let (world, notifier) = world_with_notifier();
        let hazard = world.report(fire_report()).await.unwrap();

        notifier.set_failing(true);
        world.update_status(&hazard.id, HazardStatus::Resolved).await.unwrap();

        assert_eq!(world.registry.get(&hazard.id).unwrap().status(), HazardStatus::Resolved);
        assert_eq!(world.publish_failures(), 1);
    }

    #[tokio::test]
    async fn test_same_status_is_not_announced() {
        let (world, notifier) = world_with_notifier();
        let hazard = world.report(fire_report()).await.unwrap();

        world.update_status(&hazard.id, HazardStatus::Pending).await.unwrap();
        assert_eq!(notifier.topics(), vec!["new-hazard".to_string()]);
    }

    #[tokio::test]
    async fn test_simulate_uses_virtual_clock() {
        let (world, _) = world_with_notifier();
        let hazard = world.report(fire_report()).await.unwrap();

        world.advance_secs(100.0);
        let report = world.simulate(&hazard.id, &SimulationQuery::default()).unwrap();

        assert_eq!(report.simulation_time, 100.0);
        assert_eq!(report.total_workers, 4);
        assert_eq!(report.total_affected_workers, 4);
        assert_eq!(report.affected_workers.level_of("W004"), Some(ZoneLevel::Critical));

        let missing = HazardId::from_seed(1);
        assert!(world.simulate(&missing, &SimulationQuery::default()).is_err());
    }

    #[tokio::test]
    async fn test_frames_follow_config() {
        let world = SimWorld::new(SimConfig::default().with_duration(5.0).with_fps(4.0)).unwrap();
        let hazard = world.report(fire_report()).await.unwrap();
        assert_eq!(world.frames(&hazard).len(), 20);
    }
}
