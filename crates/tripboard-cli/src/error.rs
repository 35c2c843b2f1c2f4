use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tripboard_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Place name cannot be empty")]
    EmptyName,
    #[error("Place ID cannot be empty")]
    EmptyPlaceId,
    #[error("Place not found for id/prefix: {0}")]
    PlaceNotFound(String),
    #[error("{0}")]
    AmbiguousPlaceId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Refusing to {0} without --yes")]
    ConfirmationRequired(&'static str),
    #[error(
        "Remote sync is not configured. Set TRIPBOARD_SUPABASE_URL and TRIPBOARD_SUPABASE_ANON_KEY, run `tripboard config set`, or open a link that carries credentials."
    )]
    SyncNotConfigured,
}

impl CliError {
    /// Replace the core's bare "not configured" with setup instructions.
    pub fn with_setup_hint(error: tripboard_core::Error) -> Self {
        match error {
            tripboard_core::Error::NotConfigured => Self::SyncNotConfigured,
            other => Self::Core(other),
        }
    }
}
