//! Trip model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::accommodation::{Accommodation, AccommodationDraft, AccommodationId};
use crate::error::{Error, Result};

/// Opaque trip identifier assigned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    /// Wrap a store-assigned identifier, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(Error::InvalidInput("Trip ID cannot be empty".to_string()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trip metadata, also used as the suggestion prompt parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDetails {
    /// Budget per night, free-form
    #[serde(default)]
    pub budget: String,
    /// Party size, free-form
    #[serde(default)]
    pub people: String,
    /// Desired style (e.g. "beachfront", "quiet", "party")
    #[serde(default)]
    pub style: String,
}

/// The shared part of a trip: everything a remote write replaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSnapshot {
    #[serde(default)]
    pub items: Vec<Accommodation>,
    #[serde(default)]
    pub details: Option<TripDetails>,
}

/// A trip: the unit of sharing and synchronization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Remote identifier; `None` while the trip is a local draft
    #[serde(default)]
    pub id: Option<TripId>,
    #[serde(default)]
    pub items: Vec<Accommodation>,
    #[serde(default)]
    pub details: Option<TripDetails>,
    /// Last accepted remote write, display only
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Trip {
    /// An empty local draft
    #[must_use]
    pub fn draft() -> Self {
        Self::default()
    }

    pub const fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    /// Copy of the shared document contents
    #[must_use]
    pub fn snapshot(&self) -> TripSnapshot {
        TripSnapshot {
            items: self.items.clone(),
            details: self.details.clone(),
        }
    }

    /// Replace the shared contents wholesale (last writer wins).
    pub fn overwrite(&mut self, snapshot: TripSnapshot) {
        self.items = snapshot.items;
        self.details = snapshot.details;
    }

    /// Items in display order: most votes first, ties keep list order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&Accommodation> {
        let mut items: Vec<&Accommodation> = self.items.iter().collect();
        items.sort_by(|a, b| b.votes.cmp(&a.votes));
        items
    }

    pub fn get(&self, id: &AccommodationId) -> Option<&Accommodation> {
        self.items.iter().find(|item| &item.id == id)
    }

    fn get_mut(&mut self, id: &AccommodationId) -> Result<&mut Accommodation> {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| Error::AccommodationNotFound(id.to_string()))
    }

    fn insert_front(&mut self, item: Accommodation) -> Result<()> {
        if self.get(&item.id).is_some() {
            return Err(Error::InvalidInput(format!(
                "Accommodation {} is already on the list",
                item.id
            )));
        }
        self.items.insert(0, item);
        Ok(())
    }

    /// Apply a local mutation in place.
    pub fn apply(&mut self, mutation: TripMutation) -> Result<()> {
        match mutation {
            TripMutation::Add(item) => self.insert_front(item)?,
            TripMutation::AddBatch(items) => {
                for item in items {
                    self.insert_front(item)?;
                }
            }
            TripMutation::Edit(id, draft) => self.get_mut(&id)?.apply_draft(draft)?,
            TripMutation::Vote(id) => {
                let item = self.get_mut(&id)?;
                item.votes = item.votes.saturating_add(1);
            }
            TripMutation::Remove(id) => {
                let before = self.items.len();
                self.items.retain(|item| item.id != id);
                if self.items.len() == before {
                    return Err(Error::AccommodationNotFound(id.to_string()));
                }
            }
            TripMutation::Clear => self.items.clear(),
            TripMutation::SetDetails(details) => self.details = details,
        }
        Ok(())
    }
}

/// A local change to a trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripMutation {
    /// Put a new accommodation at the top of the list
    Add(Accommodation),
    /// Add several accommodations, e.g. one suggestion batch
    AddBatch(Vec<Accommodation>),
    /// Replace descriptive fields of an existing accommodation
    Edit(AccommodationId, AccommodationDraft),
    /// Count one more vote
    Vote(AccommodationId),
    /// Delete an accommodation
    Remove(AccommodationId),
    /// Delete every accommodation
    Clear,
    SetDetails(Option<TripDetails>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Origin;
    use pretty_assertions::assert_eq;

    fn place(name: &str) -> Accommodation {
        AccommodationDraft::named(name)
            .into_accommodation(Origin::User)
            .unwrap()
    }

    #[test]
    fn test_trip_id_rejects_blank() {
        assert!(TripId::new("  ").is_err());
        assert_eq!(TripId::new(" abc123 ").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_add_prepends() {
        let mut trip = Trip::draft();
        trip.apply(TripMutation::Add(place("First"))).unwrap();
        trip.apply(TripMutation::Add(place("Second"))).unwrap();
        assert_eq!(trip.items[0].name, "Second");
        assert_eq!(trip.items[1].name, "First");
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut trip = Trip::draft();
        let item = place("Twice");
        trip.apply(TripMutation::Add(item.clone())).unwrap();
        assert!(trip.apply(TripMutation::Add(item)).is_err());
    }

    #[test]
    fn test_vote_increments_without_limit() {
        let mut trip = Trip::draft();
        let item = place("Hut");
        let id = item.id.clone();
        trip.apply(TripMutation::Add(item)).unwrap();
        for _ in 0..3 {
            trip.apply(TripMutation::Vote(id.clone())).unwrap();
        }
        assert_eq!(trip.get(&id).unwrap().votes, 3);
    }

    #[test]
    fn test_unknown_accommodation_is_reported() {
        let mut trip = Trip::draft();
        let missing = AccommodationId::new();
        assert!(matches!(
            trip.apply(TripMutation::Vote(missing.clone())),
            Err(Error::AccommodationNotFound(_))
        ));
        assert!(matches!(
            trip.apply(TripMutation::Remove(missing)),
            Err(Error::AccommodationNotFound(_))
        ));
    }

    #[test]
    fn test_ranked_orders_by_votes_and_keeps_ties_stable() {
        let mut trip = Trip::draft();
        let mut a = place("A");
        let b = place("B");
        let mut c = place("C");
        a.votes = 1;
        c.votes = 5;
        trip.items = vec![a, b, c];

        let names: Vec<&str> = trip.ranked().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_clear_and_details() {
        let mut trip = Trip::draft();
        trip.apply(TripMutation::Add(place("Gone"))).unwrap();
        trip.apply(TripMutation::Clear).unwrap();
        assert!(trip.items.is_empty());

        let details = TripDetails {
            budget: "2000".to_string(),
            people: "6".to_string(),
            style: "beachfront".to_string(),
        };
        trip.apply(TripMutation::SetDetails(Some(details.clone())))
            .unwrap();
        assert_eq!(trip.details, Some(details));
    }

    #[test]
    fn test_overwrite_replaces_everything() {
        let mut trip = Trip::draft();
        trip.apply(TripMutation::Add(place("Local"))).unwrap();
        trip.overwrite(TripSnapshot {
            items: vec![place("Remote")],
            details: None,
        });
        assert_eq!(trip.items.len(), 1);
        assert_eq!(trip.items[0].name, "Remote");
    }
}
