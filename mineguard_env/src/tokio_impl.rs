//! Production implementations backed by Tokio and the system clock.

use crate::{EnvError, EventEnvelope, MineGuardContext, NotificationSink};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Production context backed by Tokio and the wall clock.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MineGuardContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}

/// Notification sink over a `tokio::sync::broadcast` channel.
///
/// Slow subscribers lag and lose the oldest events rather than blocking the
/// publisher.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<EventEnvelope>,
}

impl BroadcastNotifier {
    /// Creates a notifier buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Attaches a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl NotificationSink for BroadcastNotifier {
    async fn publish(&self, envelope: EventEnvelope) -> Result<usize, EnvError> {
        if self.sender.receiver_count() == 0 {
            return Ok(0);
        }
        self.sender
            .send(envelope)
            .map_err(|e| EnvError::publish(e.to_string()))
    }

    fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
