//! Visit history model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trip::TripId;

/// Number of trips remembered in the visit history
pub const HISTORY_LIMIT: usize = 10;

/// One remembered trip visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub trip_id: TripId,
    pub visited_at: DateTime<Utc>,
    /// Number of accommodations seen on the last visit
    #[serde(default)]
    pub item_count: usize,
    /// Trip style, if details were set
    #[serde(default)]
    pub style: Option<String>,
}

/// Most-recent-first list of visited trips, bounded to [`HISTORY_LIMIT`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitHistory(Vec<HistoryEntry>);

impl VisitHistory {
    /// Record a visit, moving an existing entry for the same trip to the front.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.0.retain(|existing| existing.trip_id != entry.trip_id);
        self.0.insert(0, entry);
        self.0.truncate(HISTORY_LIMIT);
    }

    pub fn forget(&mut self, trip_id: &TripId) {
        self.0.retain(|existing| &existing.trip_id != trip_id);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry {
            trip_id: TripId::new(id).unwrap(),
            visited_at: Utc::now(),
            item_count: 0,
            style: None,
        }
    }

    #[test]
    fn test_record_moves_revisit_to_front() {
        let mut history = VisitHistory::default();
        history.record(entry("a"));
        history.record(entry("b"));
        history.record(entry("a"));

        let ids: Vec<&str> = history.entries().iter().map(|e| e.trip_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = VisitHistory::default();
        for index in 0..15 {
            history.record(entry(&format!("trip-{index}")));
        }
        assert_eq!(history.entries().len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].trip_id.as_str(), "trip-14");
        assert_eq!(history.entries()[9].trip_id.as_str(), "trip-5");
    }

    #[test]
    fn test_forget() {
        let mut history = VisitHistory::default();
        history.record(entry("a"));
        history.forget(&TripId::new("a").unwrap());
        assert!(history.is_empty());
    }
}
