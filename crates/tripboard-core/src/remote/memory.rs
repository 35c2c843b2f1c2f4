//! Process-local remote store for tests and offline demos.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{ChangeNotifier, RemoteDocumentClient, RemoteTrip, Subscription};
use crate::error::{Error, Result};
use crate::models::{TripId, TripSnapshot};

#[derive(Default)]
struct MemoryState {
    documents: HashMap<TripId, RemoteTrip>,
    subscribers: HashMap<TripId, Vec<mpsc::UnboundedSender<RemoteTrip>>>,
    next_ids: VecDeque<String>,
    generated: u64,
    last_write: Option<DateTime<Utc>>,
    replaced: Vec<(TripId, TripSnapshot)>,
}

/// In-memory document store and change feed.
///
/// Every accepted write is delivered to all subscribers of the document,
/// including the writer, the way a hosted realtime feed behaves.
#[derive(Default)]
pub struct InMemoryRemote {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
    latency: Mutex<Option<Duration>>,
    creates: AtomicUsize,
    fetches: AtomicUsize,
    replaces: AtomicUsize,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids handed out by the next `create` calls, in order.
    #[must_use]
    pub fn with_next_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut state) = self.state.lock() {
            state.next_ids.extend(ids.into_iter().map(Into::into));
        }
        self
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        if let Ok(mut slot) = self.latency.lock() {
            *slot = Some(latency);
        }
        self
    }

    /// Make every call fail with `RemoteUnavailable` until switched back.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn replace_count(&self) -> usize {
        self.replaces.load(Ordering::SeqCst)
    }

    /// Payloads of every accepted `replace`, oldest first.
    pub fn replaced(&self) -> Vec<(TripId, TripSnapshot)> {
        self.lock()
            .map(|state| state.replaced.clone())
            .unwrap_or_default()
    }

    /// Current stored document, if any.
    pub fn document(&self, trip_id: &TripId) -> Option<RemoteTrip> {
        self.lock().ok()?.documents.get(trip_id).cloned()
    }

    /// Store a document as another party would, notifying subscribers.
    pub fn simulate_remote_write(
        &self,
        trip_id: &TripId,
        snapshot: TripSnapshot,
    ) -> Result<RemoteTrip> {
        let mut state = self.lock()?;
        Ok(Self::write(&mut state, trip_id.clone(), snapshot))
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::RemoteUnavailable("in-memory remote poisoned".to_string()))
    }

    async fn round_trip(&self) -> Result<()> {
        let latency = self.latency.lock().ok().and_then(|latency| *latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::RemoteUnavailable(
                "in-memory remote is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn write(state: &mut MemoryState, trip_id: TripId, snapshot: TripSnapshot) -> RemoteTrip {
        let mut updated_at = Utc::now();
        if let Some(last) = state.last_write {
            if updated_at <= last {
                updated_at = last + chrono::Duration::milliseconds(1);
            }
        }
        state.last_write = Some(updated_at);

        let document = RemoteTrip {
            id: trip_id.clone(),
            snapshot,
            updated_at,
        };
        state.documents.insert(trip_id.clone(), document.clone());
        if let Some(subscribers) = state.subscribers.get_mut(&trip_id) {
            subscribers.retain(|subscriber| subscriber.send(document.clone()).is_ok());
        }
        document
    }

    fn next_id(state: &mut MemoryState) -> Result<TripId> {
        if let Some(id) = state.next_ids.pop_front() {
            return TripId::new(id);
        }
        state.generated += 1;
        TripId::new(format!("trip-{}", state.generated))
    }
}

#[async_trait]
impl RemoteDocumentClient for InMemoryRemote {
    async fn create(&self, snapshot: &TripSnapshot) -> Result<RemoteTrip> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;
        let mut state = self.lock()?;
        let trip_id = Self::next_id(&mut state)?;
        Ok(Self::write(&mut state, trip_id, snapshot.clone()))
    }

    async fn fetch(&self, trip_id: &TripId) -> Result<RemoteTrip> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;
        self.lock()?
            .documents
            .get(trip_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(trip_id.to_string()))
    }

    async fn replace(&self, trip_id: &TripId, snapshot: &TripSnapshot) -> Result<RemoteTrip> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;
        let mut state = self.lock()?;
        state.replaced.push((trip_id.clone(), snapshot.clone()));
        Ok(Self::write(&mut state, trip_id.clone(), snapshot.clone()))
    }
}

#[async_trait]
impl ChangeNotifier for InMemoryRemote {
    async fn subscribe(
        &self,
        trip_id: &TripId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let online = !self.unavailable.load(Ordering::SeqCst);
        let mut state = self.lock()?;
        if let (Some(since), Some(current)) = (since, state.documents.get(trip_id)) {
            if online && current.updated_at != since {
                let _ = sender.send(current.clone());
            }
        }
        state
            .subscribers
            .entry(trip_id.clone())
            .or_default()
            .push(sender);
        Ok(Subscription::new(trip_id.clone(), receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripDetails;
    use pretty_assertions::assert_eq;

    fn snapshot(style: &str) -> TripSnapshot {
        TripSnapshot {
            items: Vec::new(),
            details: Some(TripDetails {
                style: style.to_string(),
                ..TripDetails::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_create_uses_queued_ids_then_generates() {
        let remote = InMemoryRemote::new().with_next_ids(["abc123"]);
        let first = remote.create(&snapshot("a")).await.unwrap();
        let second = remote.create(&snapshot("b")).await.unwrap();
        assert_eq!(first.id.as_str(), "abc123");
        assert_eq!(second.id.as_str(), "trip-1");
        assert_eq!(remote.create_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_missing_document_is_not_found() {
        let remote = InMemoryRemote::new();
        let err = remote
            .fetch(&TripId::new("missing").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_writes_are_delivered_to_subscribers_including_the_writer() {
        let remote = InMemoryRemote::new().with_next_ids(["abc123"]);
        let created = remote.create(&snapshot("a")).await.unwrap();
        let mut subscription = remote
            .subscribe(&created.id, Some(created.updated_at))
            .await
            .unwrap();

        let replaced = remote.replace(&created.id, &snapshot("b")).await.unwrap();
        let delivered = subscription.recv().await.unwrap();
        assert_eq!(delivered, replaced);
        assert!(replaced.updated_at > created.updated_at);
        assert_eq!(remote.replaced(), vec![(created.id, snapshot("b"))]);
    }

    #[tokio::test]
    async fn test_subscribing_behind_the_stored_version_catches_up() {
        let remote = InMemoryRemote::new().with_next_ids(["abc123"]);
        let created = remote.create(&snapshot("a")).await.unwrap();
        let written = remote
            .simulate_remote_write(&created.id, snapshot("b"))
            .unwrap();

        let mut subscription = remote
            .subscribe(&created.id, Some(created.updated_at))
            .await
            .unwrap();
        assert_eq!(subscription.recv().await.unwrap(), written);

        let mut current = remote
            .subscribe(&created.id, Some(written.updated_at))
            .await
            .unwrap();
        assert!(current.updates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_offline_remote_fails_with_remote_unavailable() {
        let remote = InMemoryRemote::new();
        remote.set_available(false);
        let err = remote.create(&snapshot("a")).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(remote.create_count(), 1);

        remote.set_available(true);
        assert!(remote.create(&snapshot("a")).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let remote = InMemoryRemote::new().with_next_ids(["abc123"]);
        let created = remote.create(&snapshot("a")).await.unwrap();
        drop(
            remote
                .subscribe(&created.id, Some(created.updated_at))
                .await
                .unwrap(),
        );

        remote
            .simulate_remote_write(&created.id, snapshot("b"))
            .unwrap();
        let state = remote.lock().unwrap();
        assert!(state.subscribers[&created.id].is_empty());
    }
}
