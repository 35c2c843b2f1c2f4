//! Cached trip snapshot repository implementation

use crate::error::{Error, Result};
use crate::models::Trip;
use crate::store::SnapshotSlot;
use libsql::Connection;

/// Trait for cached snapshot storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SnapshotRepository {
    /// Persist the snapshot for a slot, replacing any previous one
    async fn save(&self, slot: &SnapshotSlot, trip: &Trip) -> Result<()>;

    /// Load the snapshot stored for a slot
    async fn load(&self, slot: &SnapshotSlot) -> Result<Option<Trip>>;

    /// Delete the snapshot stored for a slot
    async fn remove(&self, slot: &SnapshotSlot) -> Result<()>;
}

/// libSQL implementation of `SnapshotRepository`
pub struct LibSqlSnapshotRepository<'a> {
    conn: &'a Connection,
    quota_bytes: usize,
}

impl<'a> LibSqlSnapshotRepository<'a> {
    /// Create a new repository with the given connection and per-snapshot quota
    pub const fn new(conn: &'a Connection, quota_bytes: usize) -> Self {
        Self { conn, quota_bytes }
    }
}

impl SnapshotRepository for LibSqlSnapshotRepository<'_> {
    async fn save(&self, slot: &SnapshotSlot, trip: &Trip) -> Result<()> {
        let payload = serde_json::to_string(trip)?;
        if payload.len() > self.quota_bytes {
            return Err(Error::LocalStorageFull(format!(
                "snapshot for {slot} is {} bytes, quota is {} bytes",
                payload.len(),
                self.quota_bytes
            )));
        }

        let saved_at = chrono::Utc::now().timestamp_millis();
        self.conn
            .execute(
                "INSERT OR REPLACE INTO trip_snapshots (slot, payload, saved_at) VALUES (?1, ?2, ?3)",
                libsql::params![slot.key(), payload, saved_at],
            )
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn load(&self, slot: &SnapshotSlot) -> Result<Option<Trip>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload FROM trip_snapshots WHERE slot = ?",
                [slot.key()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let payload: String = row.get(0)?;
        Ok(Some(serde_json::from_str(&payload)?))
    }

    async fn remove(&self, slot: &SnapshotSlot) -> Result<()> {
        self.conn
            .execute("DELETE FROM trip_snapshots WHERE slot = ?", [slot.key()])
            .await?;
        Ok(())
    }
}

/// SQLite reports quota problems as "database or disk is full"
fn storage_error(error: libsql::Error) -> Error {
    let message = error.to_string();
    if message.to_ascii_lowercase().contains("full") {
        Error::LocalStorageFull(message)
    } else {
        Error::LibSql(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{AccommodationDraft, Origin, TripId, TripMutation};
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn sample_trip() -> Trip {
        let mut trip = Trip::draft();
        let place = AccommodationDraft::named("Seaside Hut")
            .with_price("1500")
            .into_accommodation(Origin::User)
            .unwrap();
        trip.apply(TripMutation::Add(place)).unwrap();
        trip
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_and_load_draft() {
        let db = setup().await;
        let repo = LibSqlSnapshotRepository::new(db.connection(), 1024 * 1024);

        let trip = sample_trip();
        repo.save(&SnapshotSlot::Draft, &trip).await.unwrap();

        let loaded = repo.load(&SnapshotSlot::Draft).await.unwrap().unwrap();
        assert_eq!(loaded, trip);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_slots_do_not_interfere() {
        let db = setup().await;
        let repo = LibSqlSnapshotRepository::new(db.connection(), 1024 * 1024);

        let mut shared = sample_trip();
        shared.id = Some(TripId::new("abc123").unwrap());
        let slot = SnapshotSlot::Trip(TripId::new("abc123").unwrap());
        repo.save(&slot, &shared).await.unwrap();
        repo.save(&SnapshotSlot::Draft, &Trip::draft()).await.unwrap();

        assert_eq!(repo.load(&slot).await.unwrap(), Some(shared));
        assert_eq!(
            repo.load(&SnapshotSlot::Draft).await.unwrap(),
            Some(Trip::draft())
        );

        repo.remove(&slot).await.unwrap();
        assert_eq!(repo.load(&slot).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_snapshot_over_quota_is_rejected() {
        let db = setup().await;
        let repo = LibSqlSnapshotRepository::new(db.connection(), 64);

        let err = repo
            .save(&SnapshotSlot::Draft, &sample_trip())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LocalStorageFull(_)));
        assert_eq!(repo.load(&SnapshotSlot::Draft).await.unwrap(), None);
    }
}
