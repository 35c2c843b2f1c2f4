//! Local snapshot store contract.
//!
//! The coordinator writes every state change through to a [`SnapshotStore`]
//! so the latest trip survives a restart and stays usable offline.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Trip, TripId};

/// Default per-snapshot size limit, in bytes
pub const DEFAULT_SNAPSHOT_QUOTA: usize = 5 * 1024 * 1024;

/// Where a snapshot lives in the local store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapshotSlot {
    /// The trip that has not been shared yet
    Draft,
    /// A shared trip, keyed by its remote id
    Trip(TripId),
}

impl SnapshotSlot {
    /// Slot for a trip, falling back to the draft slot when unbound
    pub fn for_trip(trip_id: Option<&TripId>) -> Self {
        trip_id.map_or(Self::Draft, |id| Self::Trip(id.clone()))
    }

    pub fn key(&self) -> String {
        match self {
            Self::Draft => "draft".to_string(),
            Self::Trip(id) => format!("trip:{id}"),
        }
    }
}

impl fmt::Display for SnapshotSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Durable key-value persistence of trip snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, slot: &SnapshotSlot, trip: &Trip) -> Result<()>;

    async fn load(&self, slot: &SnapshotSlot) -> Result<Option<Trip>>;

    async fn remove(&self, slot: &SnapshotSlot) -> Result<()>;
}

/// Process-local [`SnapshotStore`], for tests and throwaway sessions
#[derive(Debug)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, Trip>>,
    quota_bytes: usize,
    saves: AtomicUsize,
}

impl Default for MemorySnapshotStore {
    fn default() -> Self {
        Self::with_quota(DEFAULT_SNAPSHOT_QUOTA)
    }
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes,
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Synchronous peek for assertions
    pub fn get(&self, slot: &SnapshotSlot) -> Option<Trip> {
        self.lock().ok()?.get(&slot.key()).cloned()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Trip>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Database("memory snapshot store poisoned".to_string()))
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, slot: &SnapshotSlot, trip: &Trip) -> Result<()> {
        let size = serde_json::to_vec(trip)?.len();
        if size > self.quota_bytes {
            return Err(Error::LocalStorageFull(format!(
                "snapshot for {slot} is {size} bytes, quota is {} bytes",
                self.quota_bytes
            )));
        }
        self.lock()?.insert(slot.key(), trip.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, slot: &SnapshotSlot) -> Result<Option<Trip>> {
        Ok(self.lock()?.get(&slot.key()).cloned())
    }

    async fn remove(&self, slot: &SnapshotSlot) -> Result<()> {
        self.lock()?.remove(&slot.key());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccommodationDraft, Origin, TripMutation};

    #[test]
    fn test_slot_keys() {
        assert_eq!(SnapshotSlot::Draft.key(), "draft");
        let id = TripId::new("abc123").unwrap();
        assert_eq!(SnapshotSlot::for_trip(Some(&id)).key(), "trip:abc123");
        assert_eq!(SnapshotSlot::for_trip(None), SnapshotSlot::Draft);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip_and_quota() {
        let store = MemorySnapshotStore::with_quota(200);
        store.save(&SnapshotSlot::Draft, &Trip::draft()).await.unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(
            store.load(&SnapshotSlot::Draft).await.unwrap(),
            Some(Trip::draft())
        );

        let mut big = Trip::draft();
        let mut draft = AccommodationDraft::named("Big");
        draft.notes = "n".repeat(500);
        big.apply(TripMutation::Add(
            draft.into_accommodation(Origin::User).unwrap(),
        ))
        .unwrap();

        let err = store.save(&SnapshotSlot::Draft, &big).await.unwrap_err();
        assert!(matches!(err, Error::LocalStorageFull(_)));
        assert_eq!(store.get(&SnapshotSlot::Draft), Some(Trip::draft()));
    }
}
