//! On-demand simulation report for a single hazard.

use crate::advisor::{evacuation_route, EvacuationRoute};
use crate::frames::{Frames, DEFAULT_DURATION_SECS, DEFAULT_FPS};
use crate::hazard::{Hazard, HazardType, Location};
use crate::proximity::{AffectedWorkers, ProximityClassifier, WorkerPosition};
use crate::zones::{clamp_elapsed, compute_zones, DangerZones};
use chrono::{DateTime, Utc};
use mineguard_env::HazardId;
use serde::{Deserialize, Serialize};

/// Query parameters of an on-demand simulation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationQuery {
    /// Elapsed seconds to simulate; defaults to the hazard's age
    pub time: Option<f64>,

    /// Animation length in seconds; defaults to [`DEFAULT_DURATION_SECS`]
    pub duration: Option<f64>,
}

impl SimulationQuery {
    pub fn at(time: f64) -> Self {
        Self {
            time: Some(time),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Elapsed seconds to simulate for `hazard` as of `now`, never negative.
    pub fn resolve_time(&self, hazard: &Hazard, now: DateTime<Utc>) -> f64 {
        clamp_elapsed(self.time.unwrap_or_else(|| hazard.elapsed_seconds(now)))
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.unwrap_or(DEFAULT_DURATION_SECS)
    }
}

/// Everything a supervisor needs about one hazard right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub hazard_id: HazardId,
    pub hazard_type: HazardType,
    pub location: Location,
    pub simulation_time: f64,
    pub danger_zones: DangerZones,
    pub affected_workers: AffectedWorkers,
    pub total_workers: usize,
    pub total_affected_workers: usize,
    pub evacuation_route: EvacuationRoute,
}

/// Runs zones, classification and routing for `hazard` against `workers`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simulator {
    classifier: ProximityClassifier,
}

impl Simulator {
    pub fn new(classifier: ProximityClassifier) -> Self {
        Self { classifier }
    }

    pub fn report(
        &self,
        hazard: &Hazard,
        workers: &[WorkerPosition],
        query: &SimulationQuery,
        now: DateTime<Utc>,
    ) -> SimulationReport {
        let simulation_time = query.resolve_time(hazard, now);
        let danger_zones = compute_zones(&hazard.hazard_type, simulation_time);
        let affected_workers =
            self.classifier
                .classify(&hazard.location, &danger_zones, workers, &hazard.hazard_type);

        SimulationReport {
            hazard_id: hazard.id,
            hazard_type: hazard.hazard_type.clone(),
            location: hazard.location.clone(),
            simulation_time,
            total_workers: workers.len(),
            total_affected_workers: affected_workers.total(),
            danger_zones,
            affected_workers,
            evacuation_route: evacuation_route(&hazard.location.sector),
        }
    }

    /// Animation over the query's duration at `fps`.
    pub fn frames<'a>(
        &self,
        hazard: &'a Hazard,
        workers: &'a [WorkerPosition],
        query: &SimulationQuery,
        fps: f64,
    ) -> Frames<'a> {
        Frames::new(hazard, workers, query.duration_secs(), fps).with_classifier(self.classifier)
    }

    /// Animation over the query's duration at [`DEFAULT_FPS`].
    pub fn default_frames<'a>(
        &self,
        hazard: &'a Hazard,
        workers: &'a [WorkerPosition],
        query: &SimulationQuery,
    ) -> Frames<'a> {
        self.frames(hazard, workers, query, DEFAULT_FPS)
    }
}

/// [`Simulator::report`] with the default classifier.
pub fn simulate(
    hazard: &Hazard,
    workers: &[WorkerPosition],
    query: &SimulationQuery,
    now: DateTime<Utc>,
) -> SimulationReport {
    Simulator::default().report(hazard, workers, query, now)
}
