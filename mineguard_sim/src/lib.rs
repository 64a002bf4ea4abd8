//! MineGuard Simulation Harness
//!
//! This crate plays the caller side of the hazard spread engine: it owns
//! the hazard registry, the worker roster, a seeded sensor feed and a
//! notification sink, and drives the pure engines in `mineguard_core`
//! under a virtual clock.
//!
//! # Determinism
//!
//! Every source of variation is derived from one 64-bit seed:
//! - **Time**: virtual clock starting at a fixed UTC epoch
//! - **Ids**: hazard ids come from a seeded counter
//! - **Randomness**: roster scatter and sensor noise use separate ChaCha8 streams
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                         SimWorld                          │
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────────┐   │
//! │  │ SimContext │   │HazardRegistry│   │  SimNotifier   │   │
//! │  │  (clock)   │   │ (in-memory)  │   │ (event sink)   │   │
//! │  └─────┬──────┘   └──────┬───────┘   └───────▲────────┘   │
//! │        │                 │                   │            │
//! │        ▼                 ▼                   │            │
//! │  ┌──────────────────────────────────────┐    │            │
//! │  │ mineguard_core::Simulator + Frames   │────┘            │
//! │  │ (zones → tiers → actions → frames)   │  HazardEvent    │
//! │  └──────────────────────────────────────┘                 │
//! │        ▲                                                  │
//! │  ┌─────┴──────┐   ┌────────────┐                          │
//! │  │   Roster   │   │ SensorFeed │                          │
//! │  └────────────┘   └────────────┘                          │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use mineguard_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42).with_workers(20);
//! let result = runner.run(ScenarioId::GasLeak).await;
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod notifier;
mod registry;
mod roster;
mod runner;
mod sensors;
mod world;
pub mod scenarios;

pub use context::SimContext;
pub use error::{RegistryError, SimError};
pub use exporter::SimExport;
pub use notifier::SimNotifier;
pub use registry::{
    HazardRegistry, HazardReport, StatusChange, DEFAULT_LIST_LIMIT, DEFAULT_NEAR_RADIUS,
    DEFAULT_READINGS_LIMIT,
};
pub use roster::{build_roster, default_roster, WorkerScatter, MINE_CENTER};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use sensors::{Anomaly, SensorFeed};
pub use world::{SimConfig, SimWorld, MAX_FRAMES};
