//! Database layer for Tripboard

mod app_state_repository;
mod connection;
mod migrations;
mod snapshot_repository;

pub use app_state_repository::{AppStateRepository, LibSqlAppStateRepository};
pub use connection::Database;
pub use snapshot_repository::{LibSqlSnapshotRepository, SnapshotRepository};
