//! Recording notification sink with fault injection.

use async_trait::async_trait;
use mineguard_core::HazardEvent;
use mineguard_env::{EnvError, EventEnvelope, NotificationSink};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Sink that keeps every published envelope in memory.
///
/// Clones share the same log, so a scenario can hand one clone to the
/// world and inspect another.
#[derive(Clone, Default)]
pub struct SimNotifier {
    log: Arc<Mutex<Vec<EventEnvelope>>>,

    /// Reported subscriber count
    subscribers: Arc<AtomicUsize>,

    /// When set, every publish fails
    failing: Arc<AtomicBool>,
}

impl SimNotifier {
    pub fn new(subscribers: usize) -> Self {
        let notifier = Self::default();
        notifier.subscribers.store(subscribers, Ordering::Relaxed);
        notifier
    }

    /// Makes subsequent publishes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Envelopes published so far, oldest first.
    pub fn envelopes(&self) -> Vec<EventEnvelope> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Topics published so far, oldest first.
    pub fn topics(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.topic.clone())
            .collect()
    }

    /// Decoded events; envelopes that fail to decode are skipped.
    pub fn events(&self) -> Vec<HazardEvent> {
        self.envelopes()
            .iter()
            .filter_map(|e| HazardEvent::from_envelope(e).ok())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for SimNotifier {
    async fn publish(&self, envelope: EventEnvelope) -> Result<usize, EnvError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(EnvError::publish(format!("sink unavailable ({})", envelope.topic)));
        }
        self.log.lock().unwrap_or_else(PoisonError::into_inner).push(envelope);
        Ok(self.subscriber_count())
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mineguard_env::HazardId;

    fn envelope() -> EventEnvelope {
        HazardEvent::SimulationRequested {
            hazard_id: HazardId::from_seed(1),
        }
        .to_envelope(Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn test_records_envelopes() {
        let notifier = SimNotifier::new(3);
        let observer = notifier.clone();

        assert_eq!(notifier.publish(envelope()).await.unwrap(), 3);
        assert_eq!(observer.topics(), vec!["start-simulation".to_string()]);
        assert_eq!(observer.events()[0].hazard_id(), HazardId::from_seed(1));
    }

    #[tokio::test]
    async fn test_failing_sink() {
        let notifier = SimNotifier::new(1);
        notifier.set_failing(true);
        assert!(matches!(
            notifier.publish(envelope()).await,
            Err(EnvError::PublishFailed(_))
        ));
        assert!(notifier.envelopes().is_empty());

        notifier.set_failing(false);
        assert!(notifier.publish(envelope()).await.is_ok());
    }
}
