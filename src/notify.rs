//! Refresh notifications over NATS

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use crate::domain::events::DomainEvent;

#[derive(Clone)]
pub struct NatsNotifier {
    client: async_nats::Client,
    subject: String,
}

impl NatsNotifier {
    pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self { Self { client, subject: subject.into() } }

    pub async fn publish(&self, event: &DomainEvent) {
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => { tracing::warn!(error = %e, "failed to encode refresh event"); return; }
        };
        if let Err(e) = self.client.publish(self.subject.clone(), payload.into()).await {
            tracing::warn!(subject = %self.subject, error = %e, "failed to publish refresh event");
        }
    }

    /// Forwards every engine event until shutdown.
    pub async fn forward(self, mut events: broadcast::Receiver<DomainEvent>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => self.publish(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => tracing::warn!(skipped, "refresh notifier lagged"),
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        tracing::debug!("refresh notifier stopped");
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::events::{DomainEvent, RefreshEvent};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_event_wire_format() {
        let event = DomainEvent::Refresh(RefreshEvent::Published {
            version: 3, rows: 120, unmapped: 4, refreshed_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["aggregate"], "refresh");
        assert_eq!(json["event"]["type"], "published");
        assert_eq!(json["event"]["unmapped"], 4);
        let aborted = serde_json::to_value(DomainEvent::Refresh(RefreshEvent::Aborted { reason: "db down".into() })).unwrap();
        assert_eq!(aborted["event"]["reason"], "db down");
    }
}
