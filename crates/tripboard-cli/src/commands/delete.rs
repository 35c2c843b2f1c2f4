use std::path::Path;

use tripboard_core::{AccommodationId, SyncHandle};

use crate::commands::common::{open_session, resolve_place, TripSelection};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let session = open_session(db_path, TripSelection::LastActive).await?;
    let removed = remove_place(&session.handle, id).await;
    session.finish().await?;

    println!("{}", removed?);
    Ok(())
}

async fn remove_place(handle: &SyncHandle, id: &str) -> Result<AccommodationId, CliError> {
    let place_id = resolve_place(id, &handle.trip())?;
    handle.remove(place_id.clone()).await?;
    Ok(place_id)
}
