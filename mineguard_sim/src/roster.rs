//! Worker roster for simulation runs.
//!
//! The engines never own worker positions; the harness builds a snapshot
//! here and passes it into every call.

use crate::error::SimError;
use mineguard_core::{Sector, WorkerPosition};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Centre of the default mine layout.
pub const MINE_CENTER: (f64, f64) = (23.045, 81.325);

/// Default standard deviation of scattered positions (coordinate units).
pub const DEFAULT_SCATTER_STD: f64 = 0.003;

const ROLES: [&str; 4] = ["Miner", "Driller", "Engineer", "Supervisor"];

/// The four-worker roster every hazard is simulated against by default.
pub fn default_roster() -> Vec<WorkerPosition> {
    vec![
        WorkerPosition::new("W001", "John Smith", "Miner", "A", 23.0455, 81.3240),
        WorkerPosition::new("W002", "Mike Johnson", "Driller", "B", 23.0480, 81.3275),
        WorkerPosition::new("W003", "Sarah Williams", "Engineer", "A", 23.0425, 81.3260),
        WorkerPosition::new("W004", "Tom Brown", "Supervisor", "C", 23.0465, 81.3250),
    ]
}

/// Seeded generator of extra workers scattered around a centre point.
///
/// Uses its own ChaCha8 stream so adding workers never shifts the sensor
/// noise of the same run.
pub struct WorkerScatter {
    rng: ChaCha8Rng,
    center: (f64, f64),
    noise: Normal<f64>,
    next_index: usize,
}

impl WorkerScatter {
    /// Scatter around [`MINE_CENTER`] with [`DEFAULT_SCATTER_STD`].
    pub fn new(seed: u64) -> Result<Self, SimError> {
        Self::around(seed, MINE_CENTER, DEFAULT_SCATTER_STD)
    }

    pub fn around(seed: u64, center: (f64, f64), std_dev: f64) -> Result<Self, SimError> {
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return Err(SimError::Config(format!(
                "scatter spread must be positive and finite, got {std_dev}"
            )));
        }
        let noise = Normal::new(0.0, std_dev).map_err(|e| SimError::Config(format!("scatter spread: {e}")))?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            center,
            noise,
            // Continue numbering after the default roster
            next_index: 5,
        })
    }

    /// Generates the next worker.
    pub fn next_worker(&mut self) -> WorkerPosition {
        let index = self.next_index;
        self.next_index += 1;

        let lat = self.center.0 + self.noise.sample(&mut self.rng);
        let lng = self.center.1 + self.noise.sample(&mut self.rng);
        let sector = match index % 3 {
            0 => Sector::A,
            1 => Sector::B,
            _ => Sector::C,
        };

        WorkerPosition::new(
            format!("W{index:03}"),
            format!("Worker {index:03}"),
            ROLES[index % ROLES.len()],
            sector,
            lat,
            lng,
        )
    }

    /// Generates `count` workers.
    pub fn take_workers(&mut self, count: usize) -> Vec<WorkerPosition> {
        (0..count).map(|_| self.next_worker()).collect()
    }
}

/// Default roster plus `extra` seeded workers.
pub fn build_roster(seed: u64, extra: usize) -> Result<Vec<WorkerPosition>, SimError> {
    let mut roster = default_roster();
    if extra > 0 {
        roster.extend(WorkerScatter::new(seed)?.take_workers(extra));
    }
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let roster = default_roster();
        assert_eq!(roster.len(), 4);
        assert_eq!(roster[3].id, "W004");
        assert_eq!(roster[3].sector, Sector::C);
        assert!(roster.iter().all(WorkerPosition::is_located));
    }

    #[test]
    fn test_scatter_is_deterministic() {
        let a = build_roster(42, 10).unwrap();
        let b = build_roster(42, 10).unwrap();
        let c = build_roster(43, 10).unwrap();

        assert_eq!(a.len(), 14);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a[4].id, "W005");
        assert_eq!(a[13].id, "W014");
    }

    #[test]
    fn test_scatter_stays_near_center() {
        let mut scatter = WorkerScatter::new(7).unwrap();
        for worker in scatter.take_workers(200) {
            let lat = worker.lat.unwrap();
            let lng = worker.lng.unwrap();
            // Eight standard deviations
            assert!((lat - MINE_CENTER.0).abs() < 0.024);
            assert!((lng - MINE_CENTER.1).abs() < 0.024);
        }
    }

    #[test]
    fn test_invalid_spread_is_rejected() {
        for std_dev in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                WorkerScatter::around(1, MINE_CENTER, std_dev),
                Err(SimError::Config(_))
            ));
        }
    }
}
