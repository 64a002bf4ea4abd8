//! Hazard events fanned out to observers.
//!
//! The engines never publish anything themselves; the caller turns state
//! changes into [`HazardEvent`]s and hands them to a
//! [`NotificationSink`](mineguard_env::NotificationSink).

use crate::hazard::{Hazard, HazardStatus};
use chrono::{DateTime, Utc};
use mineguard_env::{EnvError, EventEnvelope, HazardId, NotificationSink};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HazardEvent {
    /// A hazard was reported or detected
    NewHazard { hazard: Box<Hazard> },

    /// Observers should start animating the hazard's spread
    SimulationRequested { hazard_id: HazardId },

    /// A hazard moved through its lifecycle
    StatusChanged {
        hazard_id: HazardId,
        from: HazardStatus,
        to: HazardStatus,
    },
}

impl HazardEvent {
    pub fn new_hazard(hazard: Hazard) -> Self {
        HazardEvent::NewHazard {
            hazard: Box::new(hazard),
        }
    }

    pub fn hazard_id(&self) -> HazardId {
        match self {
            HazardEvent::NewHazard { hazard } => hazard.id,
            HazardEvent::SimulationRequested { hazard_id }
            | HazardEvent::StatusChanged { hazard_id, .. } => *hazard_id,
        }
    }

    /// Topic observers subscribe to.
    pub fn topic(&self) -> &'static str {
        match self {
            HazardEvent::NewHazard { .. } => "new-hazard",
            HazardEvent::SimulationRequested { .. } => "start-simulation",
            HazardEvent::StatusChanged { to, .. } => match to {
                HazardStatus::Acknowledged => "hazard-acknowledged",
                HazardStatus::Escalated => "hazard-escalated",
                HazardStatus::Resolved => "hazard-resolved",
                HazardStatus::Pending => "hazard-updated",
            },
        }
    }

    pub fn to_envelope(&self, at: DateTime<Utc>) -> Result<EventEnvelope, EnvError> {
        Ok(EventEnvelope::new(self.topic(), serde_json::to_value(self)?, at))
    }

    /// Decodes an envelope produced by [`HazardEvent::to_envelope`].
    pub fn from_envelope(envelope: &EventEnvelope) -> Result<Self, EnvError> {
        Ok(serde_json::from_value(envelope.payload.clone())?)
    }
}

/// Serializes `event` and publishes it on `sink`.
pub async fn publish<S>(sink: &S, event: &HazardEvent, at: DateTime<Utc>) -> Result<usize, EnvError>
where
    S: NotificationSink + ?Sized,
{
    sink.publish(event.to_envelope(at)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::{HazardType, Location};
    use chrono::TimeZone;
    use mineguard_env::BroadcastNotifier;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_topics() {
        let id = HazardId::from_seed(1);
        let escalated = HazardEvent::StatusChanged {
            hazard_id: id,
            from: HazardStatus::Acknowledged,
            to: HazardStatus::Escalated,
        };
        assert_eq!(escalated.topic(), "hazard-escalated");
        assert_eq!(HazardEvent::SimulationRequested { hazard_id: id }.topic(), "start-simulation");
    }

    #[test]
    fn test_envelope_roundtrip() {
        let hazard = Hazard::new(
            HazardId::from_seed(2),
            HazardType::RockFall,
            Location::new(1.0, 2.0, "C"),
            at(),
        );
        let event = HazardEvent::new_hazard(hazard);
        let envelope = event.to_envelope(at()).unwrap();

        assert_eq!(envelope.topic, "new-hazard");
        assert_eq!(envelope.payload["event"], "new_hazard");
        assert_eq!(envelope.payload["hazard"]["type"], "Rock Fall");
        assert_eq!(HazardEvent::from_envelope(&envelope).unwrap(), event);
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let sink = BroadcastNotifier::new(4);
        let mut rx = sink.subscribe();
        let event = HazardEvent::SimulationRequested {
            hazard_id: HazardId::from_seed(3),
        };

        let delivered = publish(&sink, &event, at()).await.unwrap();
        assert_eq!(delivered, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(HazardEvent::from_envelope(&received).unwrap().hazard_id(), HazardId::from_seed(3));
    }
}
