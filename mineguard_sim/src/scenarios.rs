//! Hazard scenarios for the simulation harness.

use mineguard_core::HazardType;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Worker-reported gas leak spreading through sector A
    GasLeak,

    /// Worker-reported fire in sector B
    Fire,

    /// Slow-spreading rock fall in sector C
    RockFall,

    /// Seeded sensor feed with injected anomalies
    SensorSweep,

    /// Acknowledge / escalate / resolve a hazard, including rejected moves
    StatusLifecycle,

    /// SOS with a worker whose position is unknown
    Sos,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::GasLeak,
            ScenarioId::Fire,
            ScenarioId::RockFall,
            ScenarioId::SensorSweep,
            ScenarioId::StatusLifecycle,
            ScenarioId::Sos,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::GasLeak => "gas_leak",
            ScenarioId::Fire => "fire",
            ScenarioId::RockFall => "rock_fall",
            ScenarioId::SensorSweep => "sensor_sweep",
            ScenarioId::StatusLifecycle => "status_lifecycle",
            ScenarioId::Sos => "sos",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::GasLeak => "Gas leak in sector A, zones and affected workers over the run",
            ScenarioId::Fire => "Fire in sector B, fastest-growing worker-reported hazard",
            ScenarioId::RockFall => "Rock fall in sector C, slow spread and main-entrance route",
            ScenarioId::SensorSweep => "Sensor feed with CO2, heat and humidity anomalies",
            ScenarioId::StatusLifecycle => "Lifecycle transitions and their notifications",
            ScenarioId::Sos => "SOS emergency with an unlocated worker excluded from tiers",
        }
    }

    /// Hazard reported by spread scenarios.
    pub fn hazard_type(&self) -> Option<HazardType> {
        match self {
            ScenarioId::GasLeak => Some(HazardType::GasLeak),
            ScenarioId::Fire => Some(HazardType::Fire),
            ScenarioId::RockFall => Some(HazardType::RockFall),
            ScenarioId::Sos => Some(HazardType::SosEmergency),
            ScenarioId::SensorSweep | ScenarioId::StatusLifecycle => None,
        }
    }

    /// Sector the scenario's hazard breaks out in.
    pub fn sector(&self) -> &'static str {
        match self {
            ScenarioId::Fire => "B",
            ScenarioId::RockFall | ScenarioId::Sos => "C",
            _ => "A",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "gas_leak" | "gasleak" | "gas" => Ok(ScenarioId::GasLeak),
            "fire" => Ok(ScenarioId::Fire),
            "rock_fall" | "rockfall" => Ok(ScenarioId::RockFall),
            "sensor_sweep" | "sensors" => Ok(ScenarioId::SensorSweep),
            "status_lifecycle" | "lifecycle" => Ok(ScenarioId::StatusLifecycle),
            "sos" => Ok(ScenarioId::Sos),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
