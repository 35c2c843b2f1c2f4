use std::path::Path;

use crate::commands::common::{
    format_place_lines, format_trip_header, open_session, place_to_list_item, PlaceListItem,
    TripSelection,
};
use crate::error::CliError;

pub async fn run_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let session = open_session(db_path, TripSelection::LastActive).await?;
    let view = session.view();
    session.finish().await?;

    if as_json {
        let json_items = view
            .trip
            .ranked()
            .into_iter()
            .map(place_to_list_item)
            .collect::<Vec<PlaceListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    println!("{}", format_trip_header(&view));
    if let Some(error) = &view.last_error {
        println!("warning: {error}");
    }
    if view.trip.items.is_empty() {
        println!("No places yet. Add one with `tripboard add <name>` or try `tripboard suggest`.");
    }
    for line in format_place_lines(&view.trip) {
        println!("{line}");
    }

    Ok(())
}
