use tokio::sync::{mpsc, oneshot, watch};

use super::coordinator::{Command, Reply};
use super::TripView;
use crate::error::{Error, Result};
use crate::models::{
    Accommodation, AccommodationDraft, AccommodationId, Origin, Trip, TripDetails, TripId,
    TripMutation,
};

/// Cloneable front end of a running [`super::SyncCoordinator`].
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<TripView>,
}

impl SyncHandle {
    pub(super) const fn new(
        commands: mpsc::Sender<Command>,
        view: watch::Receiver<TripView>,
    ) -> Self {
        Self { commands, view }
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| Error::CoordinatorClosed)?;
        response.await.map_err(|_| Error::CoordinatorClosed)?
    }

    /// Latest published state.
    pub fn view(&self) -> TripView {
        self.view.borrow().clone()
    }

    /// Current trip contents.
    pub fn trip(&self) -> Trip {
        self.view.borrow().trip.clone()
    }

    /// Receiver that changes after every handled event.
    pub fn watch(&self) -> watch::Receiver<TripView> {
        self.view.clone()
    }

    /// Apply a local edit.
    pub async fn mutate(&self, mutation: TripMutation) -> Result<()> {
        self.request(|reply| Command::Mutate(mutation, reply)).await
    }

    /// Add an accommodation entered by a person.
    pub async fn add(&self, draft: AccommodationDraft) -> Result<AccommodationId> {
        let item = draft.into_accommodation(Origin::User)?;
        let id = item.id.clone();
        self.mutate(TripMutation::Add(item)).await?;
        Ok(id)
    }

    pub async fn edit(&self, id: AccommodationId, draft: AccommodationDraft) -> Result<()> {
        self.mutate(TripMutation::Edit(id, draft)).await
    }

    pub async fn vote(&self, id: AccommodationId) -> Result<()> {
        self.mutate(TripMutation::Vote(id)).await
    }

    pub async fn remove(&self, id: AccommodationId) -> Result<()> {
        self.mutate(TripMutation::Remove(id)).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.mutate(TripMutation::Clear).await
    }

    pub async fn set_details(&self, details: Option<TripDetails>) -> Result<()> {
        self.mutate(TripMutation::SetDetails(details)).await
    }

    /// Add a suggestion batch, sharing the trip first if it is still a draft
    /// and a remote store is configured.
    ///
    /// The items stay on the list even if sharing fails.
    pub async fn add_suggestions(
        &self,
        drafts: Vec<AccommodationDraft>,
    ) -> Result<Vec<AccommodationId>> {
        let items = drafts
            .into_iter()
            .map(|draft| draft.into_accommodation(Origin::Ai))
            .collect::<Result<Vec<Accommodation>>>()?;
        let ids = items.iter().map(|item| item.id.clone()).collect();
        self.request(|reply| Command::AddSuggestions(items, reply))
            .await?;
        Ok(ids)
    }

    /// Make sure the trip has a remote document, creating it once.
    pub async fn ensure_bound(&self) -> Result<TripId> {
        self.request(Command::EnsureBound).await
    }

    /// Push immediately, or create the document for a draft.
    pub async fn save(&self) -> Result<()> {
        self.request(Command::Save).await
    }

    /// Switch to a shared trip by id.
    pub async fn open(&self, trip_id: TripId) -> Result<Trip> {
        self.request(|reply| Command::Open(trip_id, reply)).await
    }

    /// Stop the coordinator. Pending pushes are dropped.
    pub async fn close(&self) -> Result<()> {
        self.request(Command::Close).await
    }
}
