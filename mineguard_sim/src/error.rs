//! Error types for the simulation harness.

use mineguard_core::HazardError;
use mineguard_env::{EnvError, HazardId};
use thiserror::Error;

/// Errors returned by the hazard registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Hazard not found: {0}")]
    NotFound(HazardId),

    #[error("Invalid hazard report: {0}")]
    InvalidReport(String),

    #[error(transparent)]
    Hazard(#[from] HazardError),
}

/// Errors surfaced by the harness.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Export failed: {0}")]
    Io(#[from] std::io::Error),
}
