use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};

use super::handle::SyncHandle;
use super::{SyncPhase, SyncSettings, TripView};
use crate::error::{Error, Result};
use crate::models::{Accommodation, Trip, TripId, TripMutation};
use crate::remote::{RemoteBackend, RemoteTrip, Subscription};
use crate::store::{SnapshotSlot, SnapshotStore};

const COMMAND_BUFFER: usize = 64;

type PushFuture = Pin<Box<dyn Future<Output = Result<RemoteTrip>> + Send>>;
pub(super) type Reply<T> = oneshot::Sender<Result<T>>;

pub(super) enum Command {
    Mutate(TripMutation, Reply<()>),
    AddSuggestions(Vec<Accommodation>, Reply<()>),
    EnsureBound(Reply<TripId>),
    Save(Reply<()>),
    Open(TripId, Reply<Trip>),
    Close(Reply<()>),
}

enum Event {
    Command(Command),
    Delivery(Option<RemoteTrip>),
    DebounceElapsed,
    PushCompleted(Result<RemoteTrip>),
    Shutdown,
}

/// Owner of the in-memory trip.
///
/// Runs as a single task; every command, timer fire, push completion and
/// delivery is handled to completion before the next one.
pub struct SyncCoordinator {
    store: Arc<dyn SnapshotStore>,
    backend: Option<RemoteBackend>,
    settings: SyncSettings,
    trip: Trip,
    subscription: Option<Subscription>,
    deadline: Option<Instant>,
    in_flight: Option<PushFuture>,
    push_queued: bool,
    last_delivery: Option<Instant>,
    last_error: Option<String>,
    view: watch::Sender<TripView>,
}

impl SyncCoordinator {
    /// Start a coordinator on the locally saved draft.
    ///
    /// Without a backend the coordinator works on the draft only and never
    /// talks to a remote store.
    pub async fn spawn(
        store: Arc<dyn SnapshotStore>,
        backend: Option<RemoteBackend>,
        settings: SyncSettings,
    ) -> SyncHandle {
        let trip = load_draft(store.as_ref()).await;
        let (view, view_rx) = watch::channel(TripView {
            trip: trip.clone(),
            phase: SyncPhase::Unbound,
            last_error: None,
        });
        let (commands, commands_rx) = mpsc::channel(COMMAND_BUFFER);

        let coordinator = Self {
            store,
            backend,
            settings,
            trip,
            subscription: None,
            deadline: None,
            in_flight: None,
            push_queued: false,
            last_delivery: None,
            last_error: None,
            view,
        };
        tokio::spawn(coordinator.run(commands_rx));

        SyncHandle::new(commands, view_rx)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            let event = tokio::select! {
                command = commands.recv() => command.map_or(Event::Shutdown, Event::Command),
                delivery = next_delivery(&mut self.subscription) => Event::Delivery(delivery),
                () = debounce_elapsed(self.deadline) => Event::DebounceElapsed,
                result = push_completion(&mut self.in_flight) => Event::PushCompleted(result),
            };

            match event {
                Event::Command(Command::Close(reply)) => {
                    self.teardown();
                    self.publish();
                    let _ = reply.send(Ok(()));
                    break;
                }
                Event::Command(command) => self.handle_command(command).await,
                Event::Delivery(Some(remote)) => self.handle_delivery(remote).await,
                Event::Delivery(None) => {
                    tracing::warn!("Change feed ended; live updates stopped");
                    self.subscription = None;
                }
                Event::DebounceElapsed => self.handle_debounce_elapsed(),
                Event::PushCompleted(result) => self.handle_push_completed(result).await,
                Event::Shutdown => {
                    self.teardown();
                    break;
                }
            }
            self.publish();
        }
        tracing::debug!("Sync coordinator stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Mutate(mutation, reply) => {
                let _ = reply.send(self.mutate(mutation).await);
            }
            Command::AddSuggestions(items, reply) => {
                let _ = reply.send(self.add_suggestions(items).await);
            }
            Command::EnsureBound(reply) => {
                let _ = reply.send(self.ensure_bound().await);
            }
            Command::Save(reply) => {
                let _ = reply.send(self.save().await);
            }
            Command::Open(trip_id, reply) => {
                let _ = reply.send(self.open(trip_id).await);
            }
            Command::Close(reply) => {
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn phase(&self) -> SyncPhase {
        if self.trip.id.is_none() {
            SyncPhase::Unbound
        } else if self.deadline.is_some() {
            SyncPhase::Dirty
        } else if self.in_flight.is_some() {
            SyncPhase::Pushing
        } else {
            SyncPhase::Idle
        }
    }

    fn publish(&self) {
        self.view.send_replace(TripView {
            trip: self.trip.clone(),
            phase: self.phase(),
            last_error: self.last_error.clone(),
        });
    }

    fn backend(&self) -> Result<RemoteBackend> {
        self.backend.clone().ok_or(Error::NotConfigured)
    }

    /// Apply a local edit. Failed edits leave the trip untouched.
    async fn mutate(&mut self, mutation: TripMutation) -> Result<()> {
        let mut next = self.trip.clone();
        next.apply(mutation)?;
        self.trip = next;
        self.write_through().await;

        if self.trip.id.is_some() {
            self.deadline = Some(Instant::now() + self.settings.debounce);
            tracing::debug!("Local edit scheduled for push");
        }
        Ok(())
    }

    /// Add a suggestion batch; a draft gets its remote document on the way.
    async fn add_suggestions(&mut self, items: Vec<Accommodation>) -> Result<()> {
        self.mutate(TripMutation::AddBatch(items)).await?;
        if self.trip.id.is_none() && self.backend.is_some() {
            self.ensure_bound().await?;
        }
        Ok(())
    }

    async fn ensure_bound(&mut self) -> Result<TripId> {
        if let Some(trip_id) = &self.trip.id {
            return Ok(trip_id.clone());
        }
        let backend = self.backend()?;

        let remote = backend.documents.create(&self.trip.snapshot()).await?;
        tracing::info!(trip_id = %remote.id, "Trip is now shared");
        self.trip.id = Some(remote.id.clone());
        self.trip.updated_at = Some(remote.updated_at);

        self.write_through().await;
        if let Err(error) = self.store.remove(&SnapshotSlot::Draft).await {
            tracing::warn!("Draft snapshot was not cleared: {error}");
        }
        self.subscribe(&backend, &remote.id).await;
        Ok(remote.id)
    }

    /// Push now. Drafts are created instead.
    async fn save(&mut self) -> Result<()> {
        let Some(trip_id) = self.trip.id.clone() else {
            return self.ensure_bound().await.map(|_| ());
        };
        let backend = self.backend()?;

        self.deadline = None;
        self.push_queued = false;
        if let Some(push) = self.in_flight.take() {
            self.record_push(push.await).await;
        }

        let result = backend
            .documents
            .replace(&trip_id, &self.trip.snapshot())
            .await;
        match result {
            Ok(remote) => {
                self.record_push(Ok(remote)).await;
                Ok(())
            }
            Err(error) => {
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Switch to another shared trip.
    async fn open(&mut self, trip_id: TripId) -> Result<Trip> {
        let backend = self.backend()?;
        if self.trip.id.as_ref() == Some(&trip_id) {
            return Ok(self.trip.clone());
        }

        self.teardown();
        self.trip = Trip::draft();
        tracing::debug!(%trip_id, "Switching trip");

        match backend.documents.fetch(&trip_id).await {
            Ok(remote) => self.trip = remote.into(),
            Err(Error::RemoteUnavailable(message)) => {
                let cached = self
                    .store
                    .load(&SnapshotSlot::Trip(trip_id.clone()))
                    .await
                    .unwrap_or_else(|error| {
                        tracing::warn!(%trip_id, "Cached snapshot unreadable: {error}");
                        None
                    });
                let Some(mut cached) = cached else {
                    self.trip = load_draft(self.store.as_ref()).await;
                    return Err(Error::RemoteUnavailable(message));
                };
                tracing::warn!(%trip_id, "Remote store unavailable, using cached copy: {message}");
                cached.id = Some(trip_id.clone());
                self.trip = cached;
                self.last_error = Some(Error::RemoteUnavailable(message).to_string());
            }
            Err(error) => {
                self.trip = load_draft(self.store.as_ref()).await;
                return Err(error);
            }
        }

        self.write_through().await;
        self.subscribe(&backend, &trip_id).await;
        Ok(self.trip.clone())
    }

    async fn subscribe(&mut self, backend: &RemoteBackend, trip_id: &TripId) {
        if let Some(previous) = self.subscription.take() {
            previous.dispose();
        }
        match backend
            .notifier
            .subscribe(trip_id, self.trip.updated_at)
            .await
        {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(error) => {
                tracing::warn!(%trip_id, "Live updates unavailable: {error}");
            }
        }
    }

    async fn handle_delivery(&mut self, remote: RemoteTrip) {
        if self.trip.id.as_ref() != Some(&remote.id) {
            tracing::debug!(trip_id = %remote.id, "Ignoring delivery for another trip");
            return;
        }
        self.last_delivery = Some(Instant::now());
        self.trip.overwrite(remote.snapshot);
        self.trip.updated_at = Some(remote.updated_at);
        self.write_through().await;
    }

    fn handle_debounce_elapsed(&mut self) {
        self.deadline = None;
        let Some(trip_id) = self.trip.id.clone() else {
            return;
        };

        if let Some(delivered) = self.last_delivery {
            if Instant::now().saturating_duration_since(delivered) < self.settings.echo_window {
                tracing::debug!(%trip_id, "Skipping push right after a remote delivery");
                return;
            }
        }
        if self.in_flight.is_some() {
            self.push_queued = true;
            return;
        }
        self.start_push(trip_id);
    }

    fn start_push(&mut self, trip_id: TripId) {
        let Some(backend) = &self.backend else {
            return;
        };
        let documents = Arc::clone(&backend.documents);
        let snapshot = self.trip.snapshot();
        tracing::debug!(%trip_id, items = snapshot.items.len(), "Pushing trip");
        self.in_flight = Some(Box::pin(async move {
            documents.replace(&trip_id, &snapshot).await
        }));
    }

    async fn handle_push_completed(&mut self, result: Result<RemoteTrip>) {
        self.in_flight = None;
        self.record_push(result).await;

        if std::mem::take(&mut self.push_queued) {
            if let Some(trip_id) = self.trip.id.clone() {
                self.start_push(trip_id);
            }
        }
    }

    async fn record_push(&mut self, result: Result<RemoteTrip>) {
        match result {
            Ok(remote) => {
                self.last_error = None;
                if self.trip.id.as_ref() == Some(&remote.id) {
                    self.trip.updated_at = Some(remote.updated_at);
                    self.write_through().await;
                }
            }
            Err(error) => {
                tracing::warn!("Push failed, will retry after the next edit: {error}");
                self.last_error = Some(error.to_string());
            }
        }
    }

    /// Persist the current trip. Failures are logged, never returned.
    async fn write_through(&mut self) {
        let slot = SnapshotSlot::for_trip(self.trip.id.as_ref());
        if let Err(error) = self.store.save(&slot, &self.trip).await {
            tracing::warn!(%slot, "Snapshot not saved locally: {error}");
            self.last_error = Some(error.to_string());
        }
    }

    /// Cancel the timer, drop any push, and end the change feed.
    fn teardown(&mut self) {
        self.deadline = None;
        self.in_flight = None;
        self.push_queued = false;
        self.last_delivery = None;
        self.last_error = None;
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }
}

async fn load_draft(store: &dyn SnapshotStore) -> Trip {
    match store.load(&SnapshotSlot::Draft).await {
        Ok(Some(mut draft)) => {
            draft.id = None;
            draft
        }
        Ok(None) => Trip::draft(),
        Err(error) => {
            tracing::warn!("Local draft unreadable, starting empty: {error}");
            Trip::draft()
        }
    }
}

async fn next_delivery(subscription: &mut Option<Subscription>) -> Option<RemoteTrip> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => pending().await,
    }
}

async fn debounce_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

async fn push_completion(in_flight: &mut Option<PushFuture>) -> Result<RemoteTrip> {
    match in_flight {
        Some(push) => push.await,
        None => pending().await,
    }
}
