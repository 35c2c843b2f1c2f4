//! tripboard-core - Core library for Tripboard
//!
//! This crate contains the trip models, the local snapshot store, the remote
//! document client and change feed, and the sync coordinator that keeps one
//! trip consistent between them. The CLI and any other front end drive it
//! through a [`SyncHandle`].

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod remote;
pub mod services;
pub mod share;
pub mod store;
pub mod suggest;
pub mod sync;
mod util;

pub use context::{AppContext, AppState};
pub use error::{Error, Result};
pub use models::{
    Accommodation, AccommodationDraft, AccommodationId, Origin, Trip, TripDetails, TripId,
    TripMutation,
};
pub use remote::RemoteBackend;
pub use services::LocalStore;
pub use share::ShareLink;
pub use store::{SnapshotSlot, SnapshotStore};
pub use sync::{SyncCoordinator, SyncHandle, SyncPhase, SyncSettings, TripView};
