//! Sensor hazard detection.
//!
//! Readings are run through an ordered list of guarded rules and the first
//! rule that fires decides the hazard type and severity:
//!
//! | # | guard                 | hazard            | severity                    |
//! |---|-----------------------|-------------------|-----------------------------|
//! | 1 | co2 > 1000 ppm        | Gas Leak          | critical if > 2000, else high |
//! | 2 | temperature > 40 °C   | Fire              | critical if > 55, else high |
//! | 3 | humidity < 20 %       | Poor Ventilation  | medium                      |
//! | 4 | 800 < co2 ≤ 1000 ppm  | High CO2 Levels   | medium                      |
//!
//! The order matters when several thresholds are breached at once: a hot,
//! CO2-heavy reading is a Gas Leak, not a Fire.

use crate::hazard::{Hazard, HazardSource, HazardType, Location, SensorSnapshot, Severity};
use chrono::{DateTime, Utc};
use mineguard_env::HazardId;
use serde::{Deserialize, Serialize};

/// CO2 assumed when a reading omits it (ppm).
pub const DEFAULT_CO2_PPM: f64 = 400.0;
/// Temperature assumed when a reading omits it (°C).
pub const DEFAULT_TEMPERATURE_C: f64 = 25.0;
/// Humidity assumed when a reading omits it (%).
pub const DEFAULT_HUMIDITY_PCT: f64 = 60.0;
/// Reporter id used when a reading carries none.
pub const DEFAULT_SENSOR_ID: &str = "SENSOR_01";

/// One reading from a field sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "workerId", default)]
    pub sensor_id: Option<String>,
    #[serde(default)]
    pub co2: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    pub location: Location,
}

impl SensorReading {
    pub fn new(location: Location) -> Self {
        Self {
            sensor_id: None,
            co2: None,
            temperature: None,
            humidity: None,
            location,
        }
    }

    pub fn with_sensor_id(mut self, id: impl Into<String>) -> Self {
        self.sensor_id = Some(id.into());
        self
    }

    pub fn with_co2(mut self, ppm: f64) -> Self {
        self.co2 = Some(ppm);
        self
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub fn with_humidity(mut self, percent: f64) -> Self {
        self.humidity = Some(percent);
        self
    }

    pub fn sensor_id(&self) -> &str {
        self.sensor_id.as_deref().unwrap_or(DEFAULT_SENSOR_ID)
    }

    /// Channel values with defaults filled in.
    pub fn levels(&self) -> Levels {
        Levels {
            co2: self.co2.unwrap_or(DEFAULT_CO2_PPM),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE_C),
            humidity: self.humidity.unwrap_or(DEFAULT_HUMIDITY_PCT),
        }
    }

    /// Builds the hazard record for a detection made from this reading.
    pub fn to_hazard(&self, detection: &Detection, id: HazardId, created_at: DateTime<Utc>) -> Hazard {
        let levels = self.levels();
        Hazard::new(id, detection.hazard_type.clone(), self.location.clone(), created_at)
            .with_severity(detection.severity)
            .with_reporter(self.sensor_id())
            .with_source(HazardSource::IotSensor)
            .with_description(levels.describe())
            .with_sensor_data(levels.snapshot())
    }
}

/// Resolved channel values of a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub co2: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl Levels {
    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            co2: Some(self.co2),
            temperature: Some(self.temperature),
            humidity: Some(self.humidity),
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "Auto-detected: CO2={}ppm, Temp={}°C, Humidity={}%",
            self.co2, self.temperature, self.humidity
        )
    }
}

/// Outcome of a rule firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub hazard_type: HazardType,
    pub severity: Severity,
}

struct DetectionRule {
    guard: fn(&Levels) -> bool,
    classify: fn(&Levels) -> Detection,
}

fn co2_breach(l: &Levels) -> bool {
    l.co2 > 1000.0
}

fn gas_leak(l: &Levels) -> Detection {
    Detection {
        hazard_type: HazardType::GasLeak,
        severity: if l.co2 > 2000.0 { Severity::Critical } else { Severity::High },
    }
}

fn heat_breach(l: &Levels) -> bool {
    l.temperature > 40.0
}

fn fire(l: &Levels) -> Detection {
    Detection {
        hazard_type: HazardType::Fire,
        severity: if l.temperature > 55.0 { Severity::Critical } else { Severity::High },
    }
}

fn dry_air(l: &Levels) -> bool {
    l.humidity < 20.0
}

fn poor_ventilation(_: &Levels) -> Detection {
    Detection {
        hazard_type: HazardType::PoorVentilation,
        severity: Severity::Medium,
    }
}

fn co2_elevated(l: &Levels) -> bool {
    l.co2 > 800.0 && l.co2 <= 1000.0
}

fn high_co2(_: &Levels) -> Detection {
    Detection {
        hazard_type: HazardType::HighCo2Levels,
        severity: Severity::Medium,
    }
}

/// Evaluated top to bottom; do not reorder.
const RULES: [DetectionRule; 4] = [
    DetectionRule { guard: co2_breach, classify: gas_leak },
    DetectionRule { guard: heat_breach, classify: fire },
    DetectionRule { guard: dry_air, classify: poor_ventilation },
    DetectionRule { guard: co2_elevated, classify: high_co2 },
];

/// Classifies resolved channel values.
pub fn detect(levels: &Levels) -> Option<Detection> {
    RULES
        .iter()
        .find(|rule| (rule.guard)(levels))
        .map(|rule| (rule.classify)(levels))
}

/// Classifies a reading; `None` means all readings are within normal range.
pub fn detect_hazard(reading: &SensorReading) -> Option<Detection> {
    detect(&reading.levels())
}
