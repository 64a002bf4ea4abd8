//! Proximity Classifier - which workers sit inside which danger ring.
//!
//! Distance is planar Euclidean in raw coordinate units (no geodesic
//! correction). Each worker lands in the first ring, innermost first, whose
//! radius reaches them; tiers never overlap.

use crate::advisor::recommended_action;
use crate::hazard::{HazardType, Location, Sector};
use crate::zones::{DangerZones, ZoneLevel};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Decimal places kept in reported distances.
pub const DISTANCE_PRECISION: i32 = 4;

/// A worker's position as supplied by the caller for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPosition {
    pub id: String,
    pub name: String,
    pub role: String,
    pub sector: Sector,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl WorkerPosition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        sector: impl Into<Sector>,
        lat: f64,
        lng: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            sector: sector.into(),
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    /// A worker whose position is unknown.
    pub fn unlocated(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        sector: impl Into<Sector>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            sector: sector.into(),
            lat: None,
            lng: None,
        }
    }

    pub fn is_located(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }

    fn point(&self, policy: MissingCoordinates) -> Option<Vector2<f64>> {
        match (self.lat, self.lng, policy) {
            (Some(lat), Some(lng), _) => Some(Vector2::new(lat, lng)),
            (_, _, MissingCoordinates::Exclude) => None,
            (lat, lng, MissingCoordinates::TreatAsZero) => {
                Some(Vector2::new(lat.unwrap_or(0.0), lng.unwrap_or(0.0)))
            }
        }
    }
}

/// What to do with a worker whose `lat` or `lng` is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCoordinates {
    /// Missing coordinates read as 0. With a hazard far from the origin this
    /// usually leaves the worker unaffected; a hazard near (0, 0) would put
    /// them in its critical ring.
    #[default]
    TreatAsZero,

    /// Leave the worker out of every tier and list them under
    /// [`AffectedWorkers::unlocated`].
    Exclude,
}

/// A worker found inside a danger ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedWorker {
    pub worker_id: String,
    pub name: String,
    pub role: String,
    pub sector: Sector,
    /// Distance to the hazard origin, rounded to [`DISTANCE_PRECISION`] places
    pub distance_from_hazard: f64,
    pub recommended_action: String,
}

/// Classified workers grouped by tier, each tier in input order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AffectedWorkers {
    pub critical: Vec<AffectedWorker>,
    pub high: Vec<AffectedWorker>,
    pub medium: Vec<AffectedWorker>,

    /// Ids of workers skipped for lack of coordinates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unlocated: Vec<String>,
}

impl AffectedWorkers {
    pub fn tier(&self, level: ZoneLevel) -> &[AffectedWorker] {
        match level {
            ZoneLevel::Critical => &self.critical,
            ZoneLevel::High => &self.high,
            ZoneLevel::Medium => &self.medium,
        }
    }

    fn tier_mut(&mut self, level: ZoneLevel) -> &mut Vec<AffectedWorker> {
        match level {
            ZoneLevel::Critical => &mut self.critical,
            ZoneLevel::High => &mut self.high,
            ZoneLevel::Medium => &mut self.medium,
        }
    }

    /// Number of workers across all three tiers.
    pub fn total(&self) -> usize {
        self.critical.len() + self.high.len() + self.medium.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// All affected workers with their tier, innermost tier first.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneLevel, &AffectedWorker)> {
        ZoneLevel::ALL
            .into_iter()
            .flat_map(move |level| self.tier(level).iter().map(move |w| (level, w)))
    }

    /// Tier a worker was placed in, if any.
    pub fn level_of(&self, worker_id: &str) -> Option<ZoneLevel> {
        self.iter()
            .find(|(_, worker)| worker.worker_id == worker_id)
            .map(|(level, _)| level)
    }
}

/// Planar Euclidean distance.
pub fn planar_distance(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    (a - b).norm()
}

/// Rounds a distance for display and stable comparisons.
pub fn round_distance(distance: f64) -> f64 {
    let scale = 10f64.powi(DISTANCE_PRECISION);
    (distance * scale).round() / scale
}

/// Assigns workers to danger tiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityClassifier {
    missing: MissingCoordinates,
}

impl ProximityClassifier {
    pub fn new(missing: MissingCoordinates) -> Self {
        Self { missing }
    }

    /// Classifies `workers` against `zones` centred on `origin`.
    ///
    /// The tier test uses the exact distance; only the reported value is
    /// rounded.
    pub fn classify(
        &self,
        origin: &Location,
        zones: &DangerZones,
        workers: &[WorkerPosition],
        hazard_type: &HazardType,
    ) -> AffectedWorkers {
        let center = Vector2::new(origin.lat, origin.lng);
        let mut affected = AffectedWorkers::default();

        for worker in workers {
            let Some(position) = worker.point(self.missing) else {
                affected.unlocated.push(worker.id.clone());
                continue;
            };

            let distance = planar_distance(&position, &center);
            let Some(level) = zones.tier_for(distance) else {
                continue;
            };

            affected.tier_mut(level).push(AffectedWorker {
                worker_id: worker.id.clone(),
                name: worker.name.clone(),
                role: worker.role.clone(),
                sector: worker.sector.clone(),
                distance_from_hazard: round_distance(distance),
                recommended_action: recommended_action(Some(level), hazard_type),
            });
        }

        affected
    }
}

/// Classifies with the default missing-coordinate policy.
pub fn classify(
    origin: &Location,
    zones: &DangerZones,
    workers: &[WorkerPosition],
    hazard_type: &HazardType,
) -> AffectedWorkers {
    ProximityClassifier::default().classify(origin, zones, workers, hazard_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::compute_zones;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn origin() -> Location {
        Location::new(23.045, 81.325, "A")
    }

    /// Gas Leak after 50s: critical 0.033, high 0.067, medium 0.1.
    fn tenth_radius_zones() -> DangerZones {
        compute_zones(&HazardType::GasLeak, 50.0)
    }

    fn worker_at_offset(id: &str, d_lat: f64) -> WorkerPosition {
        WorkerPosition::new(id, format!("Worker {id}"), "Miner", "A", 23.045 + d_lat, 81.325)
    }

    #[test]
    fn test_worker_between_critical_and_high_lands_in_high() {
        let zones = tenth_radius_zones();
        assert_relative_eq!(zones.radius(ZoneLevel::High), 0.067, epsilon = 1e-12);

        let workers = vec![worker_at_offset("W1", 0.05)];
        let affected = classify(&origin(), &zones, &workers, &HazardType::GasLeak);

        assert_eq!(affected.high.len(), 1);
        assert!(affected.critical.is_empty());
        assert!(affected.medium.is_empty());
        assert_relative_eq!(affected.high[0].distance_from_hazard, 0.05, epsilon = 1e-9);
        assert_eq!(
            affected.high[0].recommended_action,
            "EVACUATE AREA - Gas Leak spreading. Move to safe zone."
        );
    }

    #[test]
    fn test_tiers_are_exclusive() {
        let zones = tenth_radius_zones();
        let workers = vec![
            worker_at_offset("near", 0.0),
            worker_at_offset("mid", 0.05),
            worker_at_offset("edge", 0.09),
            worker_at_offset("far", 0.5),
        ];
        let affected = classify(&origin(), &zones, &workers, &HazardType::GasLeak);

        assert_eq!(affected.level_of("near"), Some(ZoneLevel::Critical));
        assert_eq!(affected.level_of("mid"), Some(ZoneLevel::High));
        assert_eq!(affected.level_of("edge"), Some(ZoneLevel::Medium));
        assert_eq!(affected.level_of("far"), None);
        assert_eq!(affected.total(), 3);
        assert_eq!(affected.iter().filter(|(_, w)| w.worker_id == "near").count(), 1);
    }

    #[test]
    fn test_zero_radius_leaves_everyone_unaffected_but_origin() {
        let zones = compute_zones(&HazardType::GasLeak, 0.0);
        let workers = vec![worker_at_offset("on_top", 0.0), worker_at_offset("off", 0.0001)];
        let affected = classify(&origin(), &zones, &workers, &HazardType::GasLeak);

        assert_eq!(affected.level_of("on_top"), Some(ZoneLevel::Critical));
        assert_eq!(affected.level_of("off"), None);
    }

    #[test]
    fn test_empty_roster_gives_empty_tiers() {
        let affected = classify(&origin(), &tenth_radius_zones(), &[], &HazardType::Fire);
        assert!(affected.is_empty());
        assert!(affected.unlocated.is_empty());
    }

    #[test]
    fn test_missing_coordinates_treated_as_zero() {
        let hazard_at_origin = Location::new(0.0, 0.0, "B");
        let workers = vec![WorkerPosition::unlocated("ghost", "Ghost", "Miner", "B")];
        let affected = classify(&hazard_at_origin, &tenth_radius_zones(), &workers, &HazardType::Fire);

        assert_eq!(affected.level_of("ghost"), Some(ZoneLevel::Critical));
    }

    #[test]
    fn test_missing_coordinates_excluded_and_listed() {
        let hazard_at_origin = Location::new(0.0, 0.0, "B");
        let mut partial = worker_at_offset("half", 0.0);
        partial.lng = None;
        let workers = vec![
            WorkerPosition::unlocated("ghost", "Ghost", "Miner", "B"),
            partial,
        ];

        let classifier = ProximityClassifier::new(MissingCoordinates::Exclude);
        let affected = classifier.classify(&hazard_at_origin, &tenth_radius_zones(), &workers, &HazardType::Fire);

        assert!(affected.is_empty());
        assert_eq!(affected.unlocated, vec!["ghost".to_string(), "half".to_string()]);
    }

    #[test]
    fn test_distance_rounding() {
        assert_eq!(round_distance(0.123456), 0.1235);
        assert_eq!(round_distance(0.00004), 0.0);
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(3.0, 4.0);
        assert_eq!(planar_distance(&a, &b), 5.0);
    }

    #[test]
    fn test_tier_order_follows_input_order() {
        let zones = tenth_radius_zones();
        let workers = vec![worker_at_offset("second", 0.01), worker_at_offset("first", 0.0)];
        let affected = classify(&origin(), &zones, &workers, &HazardType::GasLeak);

        let ids: Vec<&str> = affected.critical.iter().map(|w| w.worker_id.as_str()).collect();
        assert_eq!(ids, vec!["second", "first"]);
    }

    proptest! {
        #[test]
        fn prop_every_worker_lands_in_its_innermost_ring(
            offsets in proptest::collection::vec((-0.2f64..0.2, -0.2f64..0.2), 1..40),
            elapsed in 0.0f64..60.0,
        ) {
            let origin = origin();
            let zones = compute_zones(&HazardType::Fire, elapsed);
            let workers: Vec<WorkerPosition> = offsets
                .iter()
                .enumerate()
                .map(|(i, (d_lat, d_lng))| {
                    WorkerPosition::new(
                        format!("W{i:03}"),
                        format!("Worker {i}"),
                        "Miner",
                        "A",
                        origin.lat + d_lat,
                        origin.lng + d_lng,
                    )
                })
                .collect();

            let affected = classify(&origin, &zones, &workers, &HazardType::Fire);
            let center = Vector2::new(origin.lat, origin.lng);
            let mut placed = 0;

            for worker in &workers {
                let position = Vector2::new(worker.lat.unwrap_or(0.0), worker.lng.unwrap_or(0.0));
                let distance = planar_distance(&position, &center);
                let hits = affected.iter().filter(|(_, w)| w.worker_id == worker.id).count();
                prop_assert!(hits <= 1);

                match affected.level_of(&worker.id) {
                    Some(level) => {
                        placed += 1;
                        prop_assert_eq!(Some(level), zones.tier_for(distance));
                        prop_assert!(distance <= zones.radius(level));
                    }
                    None => prop_assert!(distance > zones.max_radius()),
                }
            }

            prop_assert_eq!(affected.total(), placed);
            prop_assert!(affected.unlocated.is_empty());
        }
    }
}
