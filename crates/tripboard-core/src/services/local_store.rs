//! Local database service shared by the coordinator and the application context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::context::AppState;
use crate::db::{
    AppStateRepository, Database, LibSqlAppStateRepository, LibSqlSnapshotRepository,
    SnapshotRepository,
};
use crate::models::Trip;
use crate::store::{SnapshotSlot, SnapshotStore, DEFAULT_SNAPSHOT_QUOTA};
use crate::Result;

/// Thread-safe service for the local snapshot cache and application state.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
    quota_bytes: usize,
}

impl LocalStore {
    /// Open the local store at the given filesystem path.
    ///
    /// An unreadable database file is moved aside and a fresh one is created,
    /// since everything in it is a cache of remote state or a local draft.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local database at {} is unreadable: {}. Moving it aside and starting fresh.",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        Ok(Self::from_database(db))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory().await?))
    }

    fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            quota_bytes: DEFAULT_SNAPSHOT_QUOTA,
        }
    }

    /// Override the per-snapshot size limit.
    #[must_use]
    pub const fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        error
            .to_string()
            .to_ascii_lowercase()
            .contains("file is not a database")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let base_name = db_path
                .file_name()
                .map_or_else(|| "tripboard.db".into(), |name| name.to_string_lossy());
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted local DB file from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        let Some(parent) = db_path.parent() else {
            return Ok(());
        };
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        let sidecar_prefix = format!("{base_name}-");

        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(&sidecar_prefix) {
                let path = entry.path();
                std::fs::remove_file(&path)?;
                tracing::warn!("Removed stale database sidecar {}", path.display());
            }
        }

        Ok(())
    }

    /// Load persisted application state.
    pub async fn load_app_state(&self) -> Result<AppState> {
        let db = self.db.lock().await;
        LibSqlAppStateRepository::new(db.connection()).load().await
    }

    /// Save application state.
    pub async fn save_app_state(&self, state: &AppState) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlAppStateRepository::new(db.connection())
            .save(state)
            .await
    }
}

#[async_trait]
impl SnapshotStore for LocalStore {
    async fn save(&self, slot: &SnapshotSlot, trip: &Trip) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSnapshotRepository::new(db.connection(), self.quota_bytes)
            .save(slot, trip)
            .await
    }

    async fn load(&self, slot: &SnapshotSlot) -> Result<Option<Trip>> {
        let db = self.db.lock().await;
        LibSqlSnapshotRepository::new(db.connection(), self.quota_bytes)
            .load(slot)
            .await
    }

    async fn remove(&self, slot: &SnapshotSlot) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSnapshotRepository::new(db.connection(), self.quota_bytes)
            .remove(slot)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripId;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_snapshots_survive_reopen() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("tripboard.db");
        let slot = SnapshotSlot::Trip(TripId::new("abc123").unwrap());

        {
            let store = LocalStore::open_path(&db_path).await.unwrap();
            let mut trip = Trip::draft();
            trip.id = Some(TripId::new("abc123").unwrap());
            store.save(&slot, &trip).await.unwrap();
        }

        let store = LocalStore::open_path(&db_path).await.unwrap();
        let loaded = store.load(&slot).await.unwrap().unwrap();
        assert_eq!(loaded.id.unwrap().as_str(), "abc123");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_corrupted_file_is_replaced() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("tripboard.db");
        std::fs::write(&db_path, vec![b'x'; 4096]).unwrap();

        let store = LocalStore::open_path(&db_path).await.unwrap();
        store.save(&SnapshotSlot::Draft, &Trip::draft()).await.unwrap();

        let backups = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("tripboard.db.corrupt-")
            })
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_quarantine_moves_db_and_removes_sidecars() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("tripboard.db");
        let wal_path = tmp.path().join("tripboard.db-wal");
        std::fs::write(&db_path, b"bad-db").unwrap();
        std::fs::write(&wal_path, b"wal").unwrap();

        LocalStore::quarantine_corrupted_db_files(&db_path).unwrap();

        assert!(!db_path.exists());
        assert!(!wal_path.exists());
    }
}
