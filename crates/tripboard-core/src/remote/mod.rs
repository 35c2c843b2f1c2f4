//! Remote document store and change feed contracts.
//!
//! The coordinator only sees these traits; the hosted store, the in-memory
//! stand-in, and the polling feed are interchangeable behind them.

mod memory;
mod polling;
mod supabase;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::{Trip, TripId, TripSnapshot};

pub use memory::InMemoryRemote;
pub use polling::{PollingChangeNotifier, DEFAULT_POLL_INTERVAL};
pub use supabase::SupabaseTripClient;

/// A trip document as the remote store holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrip {
    pub id: TripId,
    pub snapshot: TripSnapshot,
    /// Assigned by the store on every accepted write
    pub updated_at: DateTime<Utc>,
}

impl From<RemoteTrip> for Trip {
    fn from(remote: RemoteTrip) -> Self {
        Self {
            id: Some(remote.id),
            items: remote.snapshot.items,
            details: remote.snapshot.details,
            updated_at: Some(remote.updated_at),
        }
    }
}

/// Create / fetch / replace whole trip documents
#[async_trait]
pub trait RemoteDocumentClient: Send + Sync {
    /// Create a new document; the store assigns the id.
    async fn create(&self, snapshot: &TripSnapshot) -> Result<RemoteTrip>;

    /// Fetch a document by id.
    async fn fetch(&self, trip_id: &TripId) -> Result<RemoteTrip>;

    /// Overwrite a document. There is no partial update: last writer wins.
    async fn replace(&self, trip_id: &TripId, snapshot: &TripSnapshot) -> Result<RemoteTrip>;
}

/// Push channel of whole-document snapshots
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Start receiving every change of the document, own writes included.
    ///
    /// `since` is the `updated_at` of the copy the caller already holds. A
    /// version other than that one is delivered even if it was written
    /// before the feed started.
    async fn subscribe(
        &self,
        trip_id: &TripId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Subscription>;
}

/// A live change feed for one trip. Dropping it tears the feed down.
#[derive(Debug)]
pub struct Subscription {
    trip_id: TripId,
    updates: mpsc::UnboundedReceiver<RemoteTrip>,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    pub const fn new(trip_id: TripId, updates: mpsc::UnboundedReceiver<RemoteTrip>) -> Self {
        Self {
            trip_id,
            updates,
            worker: None,
        }
    }

    /// Attach a background task that feeds this subscription; it is aborted
    /// when the subscription is disposed.
    #[must_use]
    pub fn with_worker(mut self, worker: JoinHandle<()>) -> Self {
        self.worker = Some(worker);
        self
    }

    pub const fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    /// Next delivered snapshot; `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<RemoteTrip> {
        self.updates.recv().await
    }

    /// Tear the feed down: stop the worker and close the channel.
    pub fn dispose(mut self) {
        tracing::debug!(trip_id = %self.trip_id, "Disposing change subscription");
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
        self.updates.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// The remote collaborators a coordinator talks to
#[derive(Clone)]
pub struct RemoteBackend {
    pub documents: Arc<dyn RemoteDocumentClient>,
    pub notifier: Arc<dyn ChangeNotifier>,
}

impl RemoteBackend {
    pub fn new(
        documents: Arc<dyn RemoteDocumentClient>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            documents,
            notifier,
        }
    }

    /// Backend for a store without a push channel; changes are found by
    /// fetching the document every `interval`.
    pub fn polling(documents: Arc<dyn RemoteDocumentClient>, interval: Duration) -> Self {
        let notifier = PollingChangeNotifier::new(documents.clone()).with_interval(interval);
        Self {
            documents,
            notifier: Arc::new(notifier),
        }
    }

    /// Backend whose documents and change feed come from one in-memory store.
    pub fn in_memory(remote: Arc<InMemoryRemote>) -> Self {
        Self {
            documents: remote.clone(),
            notifier: remote,
        }
    }
}
