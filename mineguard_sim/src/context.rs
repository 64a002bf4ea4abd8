//! Simulation context implementing MineGuardContext for deterministic runs.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mineguard_env::MineGuardContext;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Simulation context backed by a virtual clock.
///
/// - Virtual time only moves when the harness advances it (or a task sleeps)
/// - Virtual time 0 maps to a fixed UTC epoch, so hazard timestamps and
///   elapsed times are identical across runs with the same seed
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,

    /// UTC instant of virtual time 0
    epoch: DateTime<Utc>,
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(Mutex::new(0)),
            // 2024-01-01 00:00:00 UTC
            epoch: Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_default(),
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// UTC instant of virtual time 0.
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = self.virtual_time_ns.lock().unwrap_or_else(PoisonError::into_inner);
        *time = time.saturating_add(duration.as_nanos() as u64);
    }

    /// Advances virtual time by a (non-negative) number of seconds.
    pub fn advance_secs(&self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.advance_time(Duration::from_secs_f64(secs));
        }
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        *self.virtual_time_ns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
            epoch: self.epoch,
        }
    }
}

#[async_trait]
impl MineGuardContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    fn utc_now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::nanoseconds(self.time_ns().min(i64::MAX as u64) as i64);
        self.epoch + elapsed
    }

    async fn sleep(&self, duration: Duration) {
        // Sleeping in simulation just moves the clock
        self.advance_time(duration);
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
