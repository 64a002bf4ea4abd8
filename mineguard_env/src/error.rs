//! Error types for the MineGuard environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Publishing to the notification sink failed (sink closed, etc.)
    #[error("Publish error: {0}")]
    PublishFailed(String),

    /// Event payload serialization/deserialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EnvError {
    /// Creates a publish error.
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::PublishFailed(msg.into())
    }
}

impl From<serde_json::Error> for EnvError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
