//! JSON exporter for frame playback.
//!
//! Writes a scenario's frame sequence plus run metadata so a dashboard (or
//! any JSON consumer) can replay the spread animation.

use mineguard_core::{Hazard, SimulationFrame, SimulationReport};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Frame rate of `frames`
    pub fps: f64,

    /// Time of the last frame in seconds
    pub duration_sec: f64,

    /// Hazard the frames were generated for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazard: Option<Hazard>,

    /// All frames
    pub frames: Vec<SimulationFrame>,

    /// Final on-demand report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SimulationReport>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, fps: f64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            fps,
            duration_sec: 0.0,
            hazard: None,
            frames: Vec::new(),
            report: None,
            passed: false,
            failure_reason: None,
        }
    }

    pub fn with_hazard(mut self, hazard: Hazard) -> Self {
        self.hazard = Some(hazard);
        self
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimulationFrame) {
        self.duration_sec = frame.time;
        self.frames.push(frame);
    }

    pub fn extend_frames(&mut self, frames: impl IntoIterator<Item = SimulationFrame>) {
        for frame in frames {
            self.add_frame(frame);
        }
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>, report: Option<SimulationReport>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
        self.report = report;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
