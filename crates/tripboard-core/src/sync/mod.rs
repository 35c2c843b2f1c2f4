//! Sync coordination between the in-memory trip, the local snapshot store,
//! and the remote document.
//!
//! A [`SyncCoordinator`] runs as one task that owns the trip. Local edits are
//! written through to the snapshot store and pushed after a quiet period;
//! remote deliveries replace the trip wholesale (last writer wins).

mod coordinator;
mod handle;

use std::time::Duration;

use crate::models::Trip;

pub use coordinator::SyncCoordinator;
pub use handle::SyncHandle;

/// Timing knobs for the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Quiet period after the last local edit before pushing (default: 2s)
    pub debounce: Duration,
    /// A delivery this close before a scheduled push cancels it (default: 1s)
    pub echo_window: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(2000),
            echo_window: Duration::from_millis(1000),
        }
    }
}

impl SyncSettings {
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub const fn with_echo_window(mut self, echo_window: Duration) -> Self {
        self.echo_window = echo_window;
        self
    }
}

/// Where the coordinator is in its push cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// Local draft without a remote document
    #[default]
    Unbound,
    /// Bound, nothing pending
    Idle,
    /// Bound, a push is scheduled
    Dirty,
    /// Bound, a push is in flight
    Pushing,
}

impl SyncPhase {
    pub const fn is_bound(self) -> bool {
        !matches!(self, Self::Unbound)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unbound => "local draft",
            Self::Idle => "synced",
            Self::Dirty => "pending",
            Self::Pushing => "saving",
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the coordinator publishes after every handled event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripView {
    pub trip: Trip,
    pub phase: SyncPhase,
    /// Most recent background failure, cleared by the next successful push
    pub last_error: Option<String>,
}
