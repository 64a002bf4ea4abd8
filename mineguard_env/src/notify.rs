//! Outbound notification port.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::types::EventEnvelope;

/// Fan-out of hazard events to whoever is watching (supervisor dashboards,
/// alarm panels, loggers).
///
/// # Delivery
///
/// ```text
/// Registry                  Sink                     Observers
///   |                         |                          |
///   |-- publish(envelope) --->|                          |
///   |                         |-- clone per subscriber ->|
///   |<-- Ok(delivered) -------|                          |
/// ```
///
/// Delivery is best-effort. Callers log a failed publish and carry on; the
/// state change that produced the event has already happened and is not
/// rolled back. No ordering is promised relative to registry writes.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Publishes an event to every current subscriber.
    ///
    /// # Returns
    /// * `Ok(n)` - Number of subscribers the envelope was handed to (may be 0)
    /// * `Err(EnvError::PublishFailed)` - The sink itself is unusable
    async fn publish(&self, envelope: EventEnvelope) -> Result<usize, EnvError>;

    /// Returns the number of currently attached subscribers.
    fn subscriber_count(&self) -> usize;
}
