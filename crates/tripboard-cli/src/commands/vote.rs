use std::path::Path;

use tripboard_core::{AccommodationId, SyncHandle};

use crate::commands::common::{open_session, resolve_place, TripSelection};
use crate::error::CliError;

pub async fn run_vote(id: &str, times: u32, db_path: &Path) -> Result<(), CliError> {
    let session = open_session(db_path, TripSelection::LastActive).await?;
    let voted = cast_votes(&session.handle, id, times).await;
    let trip = session.finish().await?;

    let place_id = voted?;
    let votes = trip.get(&place_id).map_or(0, |item| item.votes);
    println!("{place_id} {votes}");
    Ok(())
}

async fn cast_votes(
    handle: &SyncHandle,
    id: &str,
    times: u32,
) -> Result<AccommodationId, CliError> {
    let place_id = resolve_place(id, &handle.trip())?;
    for _ in 0..times {
        handle.vote(place_id.clone()).await?;
    }
    Ok(place_id)
}
