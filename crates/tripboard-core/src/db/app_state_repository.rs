//! Application state repository implementation

use crate::config::ConnectionConfig;
use crate::context::AppState;
use crate::error::Result;
use crate::models::{TripId, VisitHistory};
use libsql::Connection;

const LAST_ACTIVE_TRIP: &str = "last_active_trip";
const VISIT_HISTORY: &str = "visit_history";
const CONNECTION: &str = "connection";

/// Trait for application state storage operations (async)
#[allow(async_fn_in_trait)]
pub trait AppStateRepository {
    /// Load application state from the database
    async fn load(&self) -> Result<AppState>;

    /// Save application state to the database
    async fn save(&self, state: &AppState) -> Result<()>;
}

/// libSQL implementation of `AppStateRepository`
pub struct LibSqlAppStateRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlAppStateRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl AppStateRepository for LibSqlAppStateRepository<'_> {
    async fn load(&self) -> Result<AppState> {
        let mut state = AppState::default();

        // A damaged value falls back to its default instead of failing startup
        if let Some(value) = self.get_value(LAST_ACTIVE_TRIP).await? {
            state.last_active_trip = TripId::new(value).ok();
        }

        if let Some(value) = self.get_value(VISIT_HISTORY).await? {
            match serde_json::from_str::<VisitHistory>(&value) {
                Ok(history) => state.history = history,
                Err(error) => tracing::warn!("Ignoring unreadable visit history: {}", error),
            }
        }

        if let Some(value) = self.get_value(CONNECTION).await? {
            match serde_json::from_str::<ConnectionConfig>(&value) {
                Ok(connection) => state.connection = Some(connection),
                Err(error) => tracing::warn!("Ignoring unreadable stored credentials: {}", error),
            }
        }

        Ok(state)
    }

    async fn save(&self, state: &AppState) -> Result<()> {
        match &state.last_active_trip {
            Some(trip_id) => self.set_value(LAST_ACTIVE_TRIP, trip_id.as_str()).await?,
            None => self.delete_value(LAST_ACTIVE_TRIP).await?,
        }

        self.set_value(VISIT_HISTORY, &serde_json::to_string(&state.history)?)
            .await?;

        match &state.connection {
            Some(connection) => {
                self.set_value(CONNECTION, &serde_json::to_string(connection)?)
                    .await?;
            }
            None => self.delete_value(CONNECTION).await?,
        }
        Ok(())
    }
}

impl LibSqlAppStateRepository<'_> {
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM app_state WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO app_state (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM app_state WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::HistoryEntry;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_default_state() {
        let db = setup().await;
        let repo = LibSqlAppStateRepository::new(db.connection());

        let state = repo.load().await.unwrap();
        assert_eq!(state, AppState::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_and_load_state() {
        let db = setup().await;
        let repo = LibSqlAppStateRepository::new(db.connection());

        let trip_id = TripId::new("abc123").unwrap();
        let mut state = AppState {
            last_active_trip: Some(trip_id.clone()),
            connection: Some(ConnectionConfig::new(
                "https://project.supabase.co",
                "anon-key",
            )),
            ..AppState::default()
        };
        state.history.record(HistoryEntry {
            trip_id,
            visited_at: chrono::Utc::now(),
            item_count: 2,
            style: Some("beachfront".to_string()),
        });

        repo.save(&state).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), state);

        state.last_active_trip = None;
        state.connection = None;
        repo.save(&state).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), state);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unreadable_history_falls_back_to_empty() {
        let db = setup().await;
        let repo = LibSqlAppStateRepository::new(db.connection());
        repo.set_value(VISIT_HISTORY, "not json").await.unwrap();

        let state = repo.load().await.unwrap();
        assert!(state.history.is_empty());
    }
}
