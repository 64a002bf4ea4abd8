//! Hazard records - what was reported, where, and where it stands now.
//!
//! A hazard is created once (by a worker report or a sensor detection) and
//! afterwards only its `status` moves, following the lifecycle below:
//!
//! ```text
//!            ┌──────────────┐
//!  pending ──┤ acknowledged ├──┐
//!     │      └──────▲───┬───┘  │
//!     │             │   │      ├──► resolved (terminal)
//!     │      ┌──────┴───▼───┐  │
//!     └──────┤  escalated   ├──┘
//!            └──────────────┘
//! ```

use chrono::{DateTime, Utc};
use mineguard_env::HazardId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hazard lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HazardError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: HazardStatus, to: HazardStatus },

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),
}

// ============================================================================
// HAZARD TYPE
// ============================================================================

/// Kind of hazard.
///
/// Labels outside the known set are kept verbatim in `Other` so that action
/// text still names what was reported; they spread at the Gas Leak rate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HazardType {
    #[default]
    GasLeak,
    Fire,
    RockFall,
    PoorVentilation,
    EquipmentFailure,
    SosEmergency,
    /// Raised by the secondary CO2 band of the sensor ladder
    HighCo2Levels,
    Other(String),
}

impl HazardType {
    /// Every named hazard type.
    pub const KNOWN: [HazardType; 7] = [
        HazardType::GasLeak,
        HazardType::Fire,
        HazardType::RockFall,
        HazardType::PoorVentilation,
        HazardType::EquipmentFailure,
        HazardType::SosEmergency,
        HazardType::HighCo2Levels,
    ];

    /// Display label, as used in reports and action text.
    pub fn label(&self) -> &str {
        match self {
            HazardType::GasLeak => "Gas Leak",
            HazardType::Fire => "Fire",
            HazardType::RockFall => "Rock Fall",
            HazardType::PoorVentilation => "Poor Ventilation",
            HazardType::EquipmentFailure => "Equipment Failure",
            HazardType::SosEmergency => "SOS - EMERGENCY",
            HazardType::HighCo2Levels => "High CO2 Levels",
            HazardType::Other(label) => label,
        }
    }

    /// Returns true for labels outside the known set.
    pub fn is_other(&self) -> bool {
        matches!(self, HazardType::Other(_))
    }
}

impl From<&str> for HazardType {
    fn from(label: &str) -> Self {
        HazardType::KNOWN
            .into_iter()
            .find(|known| known.label() == label)
            .unwrap_or_else(|| HazardType::Other(label.to_string()))
    }
}

impl From<String> for HazardType {
    fn from(label: String) -> Self {
        HazardType::from(label.as_str())
    }
}

impl From<HazardType> for String {
    fn from(hazard_type: HazardType) -> Self {
        hazard_type.label().to_string()
    }
}

impl std::fmt::Display for HazardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SEVERITY / STATUS / SOURCE
// ============================================================================

/// Reported severity of a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Severity {
    type Err = HazardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(HazardError::UnknownSeverity(s.to_string())),
        }
    }
}

/// Where a hazard is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardStatus {
    #[default]
    Pending,
    Acknowledged,
    Escalated,
    Resolved,
}

impl HazardStatus {
    pub fn name(&self) -> &'static str {
        match self {
            HazardStatus::Pending => "pending",
            HazardStatus::Acknowledged => "acknowledged",
            HazardStatus::Escalated => "escalated",
            HazardStatus::Resolved => "resolved",
        }
    }

    /// Pending, acknowledged and escalated hazards still need attention.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, HazardStatus::Resolved)
    }

    /// Whether `next` may follow `self`. Re-applying the current status is
    /// always allowed (it changes nothing).
    pub fn can_transition_to(&self, next: HazardStatus) -> bool {
        use HazardStatus::*;

        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Acknowledged | Escalated | Resolved)
                | (Acknowledged, Escalated | Resolved)
                | (Escalated, Acknowledged | Resolved)
        )
    }
}

impl std::fmt::Display for HazardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for HazardStatus {
    type Err = HazardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(HazardStatus::Pending),
            "acknowledged" => Ok(HazardStatus::Acknowledged),
            "escalated" => Ok(HazardStatus::Escalated),
            "resolved" => Ok(HazardStatus::Resolved),
            _ => Err(HazardError::UnknownStatus(s.to_string())),
        }
    }
}

/// Who raised the hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HazardSource {
    #[default]
    #[serde(rename = "WORKER")]
    Worker,
    #[serde(rename = "IOT_SENSOR", alias = "IoT_SENSOR")]
    IotSensor,
}

// ============================================================================
// LOCATION
// ============================================================================

/// A named area of the mine, used for routing and worker grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sector {
    A,
    B,
    C,
    Other(String),
}

impl Sector {
    pub fn label(&self) -> &str {
        match self {
            Sector::A => "A",
            Sector::B => "B",
            Sector::C => "C",
            Sector::Other(label) => label,
        }
    }
}

impl From<&str> for Sector {
    fn from(label: &str) -> Self {
        match label {
            "A" => Sector::A,
            "B" => Sector::B,
            "C" => Sector::C,
            other => Sector::Other(other.to_string()),
        }
    }
}

impl From<String> for Sector {
    fn from(label: String) -> Self {
        Sector::from(label.as_str())
    }
}

impl From<Sector> for String {
    fn from(sector: Sector) -> Self {
        sector.label().to_string()
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A point in the mine. Coordinates are raw units; no projection is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub sector: Sector,
}

impl Location {
    pub fn new(lat: f64, lng: f64, sector: impl Into<Sector>) -> Self {
        Self {
            lat,
            lng,
            sector: sector.into(),
        }
    }
}

/// Environmental readings attached to a sensor-raised hazard.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub co2: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

// ============================================================================
// HAZARD
// ============================================================================

/// A reported hazard.
///
/// Everything except `status` is fixed at creation. Status changes go
/// through [`Hazard::transition_to`], which enforces the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: HazardId,

    #[serde(rename = "type", default)]
    pub hazard_type: HazardType,

    #[serde(default)]
    pub severity: Severity,

    pub location: Location,

    /// Worker or sensor id that raised the hazard
    #[serde(default)]
    pub worker: Option<String>,

    #[serde(default)]
    pub source: HazardSource,

    /// Creation instant (UTC)
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    status: HazardStatus,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "sensorData", default, skip_serializing_if = "Option::is_none")]
    pub sensor_data: Option<SensorSnapshot>,
}

impl Hazard {
    /// Creates a pending worker-reported hazard with medium severity.
    pub fn new(
        id: HazardId,
        hazard_type: HazardType,
        location: Location,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            hazard_type,
            severity: Severity::default(),
            location,
            worker: None,
            source: HazardSource::Worker,
            created_at,
            status: HazardStatus::Pending,
            description: String::new(),
            sensor_data: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_reporter(mut self, reporter: impl Into<String>) -> Self {
        self.worker = Some(reporter.into());
        self
    }

    pub fn with_source(mut self, source: HazardSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_sensor_data(mut self, snapshot: SensorSnapshot) -> Self {
        self.sensor_data = Some(snapshot);
        self
    }

    pub fn status(&self) -> HazardStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Moves the hazard to `next`, returning the previous status.
    pub fn transition_to(&mut self, next: HazardStatus) -> Result<HazardStatus, HazardError> {
        let previous = self.status;
        if !previous.can_transition_to(next) {
            return Err(HazardError::InvalidTransition {
                from: previous,
                to: next,
            });
        }
        self.status = next;
        Ok(previous)
    }

    /// Whole seconds between creation and `now`, never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_seconds().max(0) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_hazard() -> Hazard {
        Hazard::new(
            HazardId::from_seed(1),
            HazardType::Fire,
            Location::new(23.045, 81.325, "A"),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_hazard_type_parses_known_labels() {
        for known in HazardType::KNOWN {
            assert_eq!(HazardType::from(known.label()), known);
        }
        assert_eq!(HazardType::from("SOS - EMERGENCY"), HazardType::SosEmergency);
    }

    #[test]
    fn test_hazard_type_keeps_unknown_label() {
        let flood = HazardType::from("Flooding");
        assert_eq!(flood, HazardType::Other("Flooding".to_string()));
        assert_eq!(flood.to_string(), "Flooding");

        // Exact match only
        assert!(HazardType::from("fire").is_other());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut hazard = sample_hazard();
        assert_eq!(hazard.status(), HazardStatus::Pending);

        assert_eq!(hazard.transition_to(HazardStatus::Escalated), Ok(HazardStatus::Pending));
        assert_eq!(hazard.transition_to(HazardStatus::Acknowledged), Ok(HazardStatus::Escalated));
        assert_eq!(hazard.transition_to(HazardStatus::Escalated), Ok(HazardStatus::Acknowledged));
        assert_eq!(hazard.transition_to(HazardStatus::Resolved), Ok(HazardStatus::Escalated));
        assert!(!hazard.is_active());
    }

    #[test]
    fn test_resolved_is_terminal() {
        let mut hazard = sample_hazard();
        hazard.transition_to(HazardStatus::Resolved).unwrap();

        let err = hazard.transition_to(HazardStatus::Acknowledged).unwrap_err();
        assert_eq!(
            err,
            HazardError::InvalidTransition {
                from: HazardStatus::Resolved,
                to: HazardStatus::Acknowledged,
            }
        );
        // Re-resolving is a no-op
        assert_eq!(hazard.transition_to(HazardStatus::Resolved), Ok(HazardStatus::Resolved));
    }

    #[test]
    fn test_cannot_return_to_pending() {
        let mut hazard = sample_hazard();
        hazard.transition_to(HazardStatus::Acknowledged).unwrap();
        assert!(hazard.transition_to(HazardStatus::Pending).is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Escalated".parse::<HazardStatus>(), Ok(HazardStatus::Escalated));
        assert_eq!(
            "closed".parse::<HazardStatus>(),
            Err(HazardError::UnknownStatus("closed".to_string()))
        );
    }

    #[test]
    fn test_elapsed_seconds_truncates_and_clamps() {
        let hazard = sample_hazard();
        let later = hazard.created_at + Duration::milliseconds(100_900);
        assert_eq!(hazard.elapsed_seconds(later), 100.0);

        let earlier = hazard.created_at - Duration::seconds(5);
        assert_eq!(hazard.elapsed_seconds(earlier), 0.0);
    }

    #[test]
    fn test_hazard_json_shape() {
        let hazard = sample_hazard()
            .with_source(HazardSource::IotSensor)
            .with_sensor_data(SensorSnapshot {
                co2: Some(2500.0),
                ..Default::default()
            });
        let json = serde_json::to_value(&hazard).unwrap();

        assert_eq!(json["type"], "Fire");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["source"], "IOT_SENSOR");
        assert_eq!(json["location"]["sector"], "A");
        assert_eq!(json["sensorData"]["co2"], 2500.0);

        let back: Hazard = serde_json::from_value(json).unwrap();
        assert_eq!(back, hazard);
    }

    #[test]
    fn test_missing_type_defaults_to_gas_leak() {
        let json = serde_json::json!({
            "id": HazardId::from_seed(3),
            "location": { "lat": 1.0, "lng": 2.0, "sector": "Z" },
            "timestamp": "2024-01-01T00:00:00Z",
            "source": "IoT_SENSOR"
        });
        let hazard: Hazard = serde_json::from_value(json).unwrap();

        assert_eq!(hazard.hazard_type, HazardType::GasLeak);
        assert_eq!(HazardType::default(), HazardType::GasLeak);
        assert_eq!(hazard.severity, Severity::Medium);
        assert_eq!(hazard.source, HazardSource::IotSensor);
        assert_eq!(hazard.location.sector, Sector::Other("Z".to_string()));
    }
}
