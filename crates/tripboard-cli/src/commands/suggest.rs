use std::path::Path;

use tripboard_core::config::SuggestionConfig;
use tripboard_core::suggest::provider_for;
use tripboard_core::{AccommodationId, SyncHandle};

use crate::cli::DetailFields;
use crate::commands::common::{open_session, short_id, TripSelection};
use crate::commands::details::merge_details;
use crate::error::CliError;

pub async fn run_suggest(fields: DetailFields, db_path: &Path) -> Result<(), CliError> {
    let config = SuggestionConfig::from_env();
    let session = open_session(db_path, TripSelection::LastActive).await?;
    let added = request_suggestions(&session.handle, &config, fields).await;
    let trip = session.finish().await;

    let added = added?;
    let trip = trip?;
    if added.is_empty() {
        println!("No suggestions this time");
    }
    for id in &added {
        if let Some(item) = trip.get(id) {
            println!("{}  {}  {}", short_id(id), item.name, item.price);
        }
    }
    if let Some(trip_id) = &trip.id {
        println!("Shared as trip {trip_id}");
    }
    Ok(())
}

async fn request_suggestions(
    handle: &SyncHandle,
    config: &SuggestionConfig,
    fields: DetailFields,
) -> Result<Vec<AccommodationId>, CliError> {
    let mut details = handle.trip().details;
    if !fields.is_empty() {
        let merged = merge_details(details, fields);
        handle.set_details(Some(merged.clone())).await?;
        details = Some(merged);
    }

    let provider = provider_for(config)?;
    let drafts = provider.suggest(&details.unwrap_or_default()).await?;
    if drafts.is_empty() {
        return Ok(Vec::new());
    }
    Ok(handle.add_suggestions(drafts).await?)
}
