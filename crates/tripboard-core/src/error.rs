//! Error types for tripboard-core

use thiserror::Error;

/// Result type alias using tripboard-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tripboard-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// No backend connection credentials are available
    #[error("Remote sync is not configured; working on a local draft only")]
    NotConfigured,

    /// Transient network or service failure
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote store answered with a document that does not decode
    #[error("Remote trip document is malformed: {0}")]
    MalformedDocument(String),

    /// Referenced trip does not exist remotely
    #[error("Trip not found: {0}")]
    NotFound(String),

    /// Snapshot did not fit into local storage
    #[error("Local storage is full: {0}")]
    LocalStorageFull(String),

    /// Referenced accommodation is not part of the trip
    #[error("Accommodation not found: {0}")]
    AccommodationNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Suggestion provider failure
    #[error("Suggestion request failed: {0}")]
    Suggestion(String),

    /// The sync coordinator task is no longer running
    #[error("Sync coordinator has shut down")]
    CoordinatorClosed,
}

impl Error {
    /// Whether this error is worth retrying on a later sync cycle.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }
}
