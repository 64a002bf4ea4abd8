//! Common types for the MineGuard environment abstraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a hazard record.
///
/// Uses UUID v4 in production; simulations derive it from a seed so that two
/// runs with the same seed produce the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HazardId(pub Uuid);

impl HazardId {
    /// Creates a new random HazardId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic HazardId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// First 8 hex chars, for log lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for HazardId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HazardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for HazardId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Envelope for events handed to a notification sink.
///
/// The payload is already-serialized JSON; the sink never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event name observers subscribe to (e.g. "new-hazard")
    pub topic: String,

    /// Event body
    pub payload: serde_json::Value,

    /// When the event was raised (publisher's clock)
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    /// Creates a new envelope.
    pub fn new(topic: impl Into<String>, payload: serde_json::Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            topic: topic.into(),
            payload,
            timestamp,
        }
    }
}
