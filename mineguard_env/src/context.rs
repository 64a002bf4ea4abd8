//! Core environment context trait for MineGuard callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// The central interface for clock access.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time` and the system clock
/// - **Simulation**: `SimContext` - a virtual clock advanced by the harness
///
/// # Determinism
///
/// Anything that would make a run non-reproducible (wall-clock time, seeds)
/// is read through this trait, never directly.
#[async_trait]
pub trait MineGuardContext: Send + Sync + 'static {
    /// Returns the monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns the UTC instant used for hazard timestamps.
    ///
    /// Hazard creation times and the default elapsed time of an on-demand
    /// simulation are both derived from this value.
    fn utc_now(&self) -> DateTime<Utc>;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
