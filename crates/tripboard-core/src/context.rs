//! Application context: the explicitly passed home of "last active trip",
//! visit history, and stored connection credentials.

use chrono::Utc;

use crate::config::{resolve_connection, ConnectionConfig};
use crate::models::{HistoryEntry, Trip, TripId, VisitHistory};
use crate::services::LocalStore;
use crate::Result;

/// Persisted application state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub last_active_trip: Option<TripId>,
    pub history: VisitHistory,
    /// Credentials used when the build does not supply any
    pub connection: Option<ConnectionConfig>,
}

/// Application state bound to the store it was loaded from.
///
/// Changes stay in memory until [`AppContext::save`] is called.
pub struct AppContext {
    store: LocalStore,
    state: AppState,
}

impl AppContext {
    /// Load the context from the local store.
    pub async fn load(store: LocalStore) -> Result<Self> {
        let state = store.load_app_state().await?;
        Ok(Self { store, state })
    }

    /// Persist the current state.
    pub async fn save(&self) -> Result<()> {
        self.store.save_app_state(&self.state).await
    }

    pub const fn state(&self) -> &AppState {
        &self.state
    }

    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    pub const fn last_active_trip(&self) -> Option<&TripId> {
        self.state.last_active_trip.as_ref()
    }

    pub fn set_last_active_trip(&mut self, trip_id: Option<TripId>) {
        self.state.last_active_trip = trip_id;
    }

    pub const fn history(&self) -> &VisitHistory {
        &self.state.history
    }

    /// Remember a visit to a shared trip and make it the active one.
    ///
    /// Drafts have no id and are not recorded.
    pub fn record_visit(&mut self, trip: &Trip) {
        let Some(trip_id) = trip.id.clone() else {
            return;
        };
        self.state.history.record(HistoryEntry {
            trip_id: trip_id.clone(),
            visited_at: Utc::now(),
            item_count: trip.items.len(),
            style: trip
                .details
                .as_ref()
                .map(|details| details.style.trim().to_string())
                .filter(|style| !style.is_empty()),
        });
        self.state.last_active_trip = Some(trip_id);
    }

    /// Drop a trip from history, e.g. after it turned out to be gone remotely.
    pub fn forget_trip(&mut self, trip_id: &TripId) {
        self.state.history.forget(trip_id);
        if self.state.last_active_trip.as_ref() == Some(trip_id) {
            self.state.last_active_trip = None;
        }
    }

    pub const fn stored_connection(&self) -> Option<&ConnectionConfig> {
        self.state.connection.as_ref()
    }

    /// Store credentials, e.g. ones bundled in a shared link.
    pub fn set_connection(&mut self, connection: Option<ConnectionConfig>) {
        self.state.connection = connection
            .map(ConnectionConfig::normalized)
            .filter(ConnectionConfig::is_configured);
    }

    /// Resolve credentials: build-time values, then the given environment
    /// values, then stored credentials.
    pub fn resolve_connection(&self, env: ConnectionConfig) -> Option<ConnectionConfig> {
        resolve_connection(
            [ConnectionConfig::build_time(), env]
                .into_iter()
                .chain(self.state.connection.clone()),
        )
    }
}
