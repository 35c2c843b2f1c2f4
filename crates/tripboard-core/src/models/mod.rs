//! Data models for Tripboard

mod accommodation;
mod history;
mod trip;

pub use accommodation::{Accommodation, AccommodationDraft, AccommodationId, ImageSource, Origin};
pub use history::{HistoryEntry, VisitHistory, HISTORY_LIMIT};
pub use trip::{Trip, TripDetails, TripId, TripMutation, TripSnapshot};
