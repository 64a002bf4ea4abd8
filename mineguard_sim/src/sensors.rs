//! Seeded sensor feed.
//!
//! Produces readings around neutral baselines with Gaussian noise, plus
//! anomalies injected at chosen ticks. Baselines sit many standard
//! deviations below every detection threshold, so only injected anomalies
//! raise hazards.

use crate::error::SimError;
use mineguard_core::{Location, SensorReading};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Neutral channel values (mean, standard deviation).
pub const CO2_BASELINE: (f64, f64) = (450.0, 30.0);
pub const TEMPERATURE_BASELINE: (f64, f64) = (26.0, 1.5);
pub const HUMIDITY_BASELINE: (f64, f64) = (60.0, 4.0);

/// A forced channel value at a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "value", rename_all = "snake_case")]
pub enum Anomaly {
    Co2(f64),
    Temperature(f64),
    Humidity(f64),
}

impl Anomaly {
    fn apply(&self, reading: SensorReading) -> SensorReading {
        match *self {
            Anomaly::Co2(ppm) => reading.with_co2(ppm),
            Anomaly::Temperature(c) => reading.with_temperature(c),
            Anomaly::Humidity(pct) => reading.with_humidity(pct),
        }
    }
}

struct Channel {
    noise: Normal<f64>,
}

impl Channel {
    fn new(name: &str, (mean, std_dev): (f64, f64)) -> Result<Self, SimError> {
        if !(mean.is_finite() && std_dev.is_finite() && std_dev > 0.0) {
            return Err(SimError::Config(format!(
                "{name} noise needs a finite mean and positive spread, got ({mean}, {std_dev})"
            )));
        }
        let noise = Normal::new(mean, std_dev).map_err(|e| SimError::Config(format!("{name} noise: {e}")))?;
        Ok(Self { noise })
    }

    /// One decimal, like a field sensor reports.
    fn sample(&self, rng: &mut ChaCha8Rng) -> f64 {
        (self.noise.sample(rng) * 10.0).round() / 10.0
    }
}

/// Deterministic stream of readings from one sensor.
pub struct SensorFeed {
    rng: ChaCha8Rng,
    sensor_id: String,
    location: Location,
    co2: Channel,
    temperature: Channel,
    humidity: Channel,
    anomalies: Vec<(u64, Anomaly)>,
    tick: u64,
}

impl SensorFeed {
    pub fn new(seed: u64, sensor_id: impl Into<String>, location: Location) -> Result<Self, SimError> {
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            sensor_id: sensor_id.into(),
            location,
            co2: Channel::new("co2", CO2_BASELINE)?,
            temperature: Channel::new("temperature", TEMPERATURE_BASELINE)?,
            humidity: Channel::new("humidity", HUMIDITY_BASELINE)?,
            anomalies: Vec::new(),
            tick: 0,
        })
    }

    /// Forces `anomaly` onto the reading produced at `tick`.
    pub fn with_anomaly(mut self, tick: u64, anomaly: Anomaly) -> Self {
        self.anomalies.push((tick, anomaly));
        self
    }

    /// Ticks produced so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn next_reading(&mut self) -> SensorReading {
        let tick = self.tick;
        self.tick += 1;

        // Always draw all three channels so anomalies never shift the stream
        let co2 = self.co2.sample(&mut self.rng);
        let temperature = self.temperature.sample(&mut self.rng);
        let humidity = self.humidity.sample(&mut self.rng);

        let reading = SensorReading::new(self.location.clone())
            .with_sensor_id(self.sensor_id.clone())
            .with_co2(co2)
            .with_temperature(temperature)
            .with_humidity(humidity);

        self.anomalies
            .iter()
            .filter(|(at, _)| *at == tick)
            .fold(reading, |reading, (_, anomaly)| anomaly.apply(reading))
    }

    pub fn take_readings(&mut self, count: usize) -> Vec<SensorReading> {
        (0..count).map(|_| self.next_reading()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mineguard_core::{detect_hazard, HazardType, Severity};
    use proptest::prelude::*;

    fn feed(seed: u64) -> SensorFeed {
        SensorFeed::new(seed, "SENSOR_01", Location::new(23.045, 81.325, "A")).unwrap()
    }

    #[test]
    fn test_feed_is_deterministic() {
        assert_eq!(feed(42).take_readings(20), feed(42).take_readings(20));
        assert_ne!(feed(42).take_readings(20), feed(43).take_readings(20));
    }

    #[test]
    fn test_baseline_readings_are_normal() {
        let readings = feed(9).take_readings(500);
        assert!(readings.iter().all(|r| detect_hazard(r).is_none()));
    }

    #[test]
    fn test_injected_anomaly() {
        let mut feed = feed(1).with_anomaly(3, Anomaly::Co2(2500.0));
        let readings = feed.take_readings(5);

        assert_eq!(readings[3].co2, Some(2500.0));
        let detection = detect_hazard(&readings[3]).unwrap();
        assert_eq!(detection.hazard_type, HazardType::GasLeak);
        assert_eq!(detection.severity, Severity::Critical);
        assert_eq!(feed.tick(), 5);
    }

    #[test]
    fn test_anomaly_does_not_shift_stream() {
        let plain = feed(5).take_readings(6);
        let spiked = feed(5).with_anomaly(2, Anomaly::Humidity(10.0)).take_readings(6);

        assert_eq!(plain[5], spiked[5]);
        assert_eq!(spiked[2].humidity, Some(10.0));
        assert_eq!(plain[2].co2, spiked[2].co2);
    }

    #[test]
    fn test_channel_rejects_bad_spread() {
        assert!(Channel::new("co2", (450.0, 30.0)).is_ok());
        for baseline in [(450.0, -30.0), (450.0, 0.0), (450.0, f64::NAN), (f64::INFINITY, 30.0)] {
            assert!(matches!(Channel::new("co2", baseline), Err(SimError::Config(_))));
        }
    }

    proptest! {
        #[test]
        fn prop_baseline_never_raises_hazard(seed in any::<u64>()) {
            let readings = feed(seed).take_readings(50);
            prop_assert!(readings.iter().all(|r| detect_hazard(r).is_none()));
        }
    }
}
