//! MineGuard Core - Hazard Spread Engine
//!
//! Projects how a mine hazard's danger area grows and who is caught in it:
//! 1. **Zone Calculator**: hazard type + elapsed time → three nested rings
//! 2. **Proximity Classifier**: worker positions → innermost ring per worker
//! 3. **Action/Route Advisor**: ring + hazard + sector → what to do, where to go
//! 4. **Frame Sequencer**: 1 + 2 over a time range, as a replayable animation
//!
//! Every engine is a pure function of its inputs. The worker roster, the
//! clock and the notification sink all belong to the caller.

pub mod hazard;
pub mod zones;
pub mod proximity;
pub mod advisor;
pub mod frames;
pub mod detection;
pub mod report;
pub mod events;

// Re-export key types for convenience
pub use hazard::{
    Hazard, HazardError, HazardSource, HazardStatus, HazardType, Location, Sector, SensorSnapshot,
    Severity,
};
pub use zones::{compute_zones, spread_rate, DangerZone, DangerZones, ZoneLevel};
pub use proximity::{
    classify, AffectedWorker, AffectedWorkers, MissingCoordinates, ProximityClassifier,
    WorkerPosition,
};
pub use advisor::{evacuation_route, recommended_action, EvacuationRoute, RoutePriority};
pub use frames::{generate_frames, Frames, SimulationFrame};
pub use detection::{detect_hazard, Detection, SensorReading};
pub use report::{simulate, SimulationQuery, SimulationReport, Simulator};
pub use events::HazardEvent;
pub use mineguard_env::HazardId;
