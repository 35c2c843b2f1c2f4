//! Change feed built on periodic fetches, for stores without a push channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{ChangeNotifier, RemoteDocumentClient, Subscription};
use crate::error::Result;
use crate::models::TripId;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Polls the document and emits it whenever `updated_at` moves.
///
/// The baseline is the version the subscriber already holds; without one the
/// first successful poll only records it. Own writes show up like any other
/// change.
#[derive(Clone)]
pub struct PollingChangeNotifier {
    documents: Arc<dyn RemoteDocumentClient>,
    interval: Duration,
}

impl PollingChangeNotifier {
    pub fn new(documents: Arc<dyn RemoteDocumentClient>) -> Self {
        Self {
            documents,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl ChangeNotifier for PollingChangeNotifier {
    async fn subscribe(
        &self,
        trip_id: &TripId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let documents = Arc::clone(&self.documents);
        let interval = self.interval;
        let polled_id = trip_id.clone();

        let worker = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_seen = since;

            loop {
                ticker.tick().await;
                let remote = match documents.fetch(&polled_id).await {
                    Ok(remote) => remote,
                    Err(error) => {
                        tracing::debug!(trip_id = %polled_id, "Change poll failed: {error}");
                        continue;
                    }
                };

                let changed = last_seen.is_some_and(|seen| seen != remote.updated_at);
                last_seen = Some(remote.updated_at);
                if changed && sender.send(remote).is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(trip_id.clone(), receiver).with_worker(worker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripSnapshot;
    use crate::remote::InMemoryRemote;

    #[tokio::test(start_paused = true)]
    async fn test_emits_only_changes_after_the_baseline() {
        let remote = Arc::new(InMemoryRemote::new().with_next_ids(["abc123"]));
        let created = remote.create(&TripSnapshot::default()).await.unwrap();
        let notifier = PollingChangeNotifier::new(remote.clone())
            .with_interval(Duration::from_millis(100));
        let mut subscription = notifier.subscribe(&created.id, None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(subscription.updates.try_recv().is_err());

        let written = remote
            .simulate_remote_write(&created.id, TripSnapshot::default())
            .unwrap();
        let delivered = subscription.recv().await.unwrap();
        assert_eq!(delivered.updated_at, written.updated_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_known_version_is_the_baseline() {
        let remote = Arc::new(InMemoryRemote::new().with_next_ids(["abc123"]));
        let created = remote.create(&TripSnapshot::default()).await.unwrap();
        let written = remote
            .simulate_remote_write(&created.id, TripSnapshot::default())
            .unwrap();

        let notifier = PollingChangeNotifier::new(remote.clone())
            .with_interval(Duration::from_millis(100));
        let mut subscription = notifier
            .subscribe(&created.id, Some(created.updated_at))
            .await
            .unwrap();

        let delivered = subscription.recv().await.unwrap();
        assert_eq!(delivered.updated_at, written.updated_at);

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(subscription.updates.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disposing_the_subscription_stops_polling() {
        let remote = Arc::new(InMemoryRemote::new().with_next_ids(["abc123"]));
        let created = remote.create(&TripSnapshot::default()).await.unwrap();
        let notifier = PollingChangeNotifier::new(remote.clone())
            .with_interval(Duration::from_millis(100));

        let subscription = notifier.subscribe(&created.id, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(350)).await;
        subscription.dispose();
        let fetches = remote.fetch_count();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(remote.fetch_count(), fetches);
    }
}
