use std::path::Path;

use tripboard_core::AccommodationDraft;

use crate::cli::PlaceFields;
use crate::commands::common::{apply_place_fields, normalize_name, open_session, TripSelection};
use crate::error::CliError;

pub async fn run_add(
    name_parts: &[String],
    fields: PlaceFields,
    db_path: &Path,
) -> Result<(), CliError> {
    let name = normalize_name(name_parts)?;
    let draft = apply_place_fields(AccommodationDraft::named(name), fields)?;

    let session = open_session(db_path, TripSelection::LastActive).await?;
    let added = session.handle.add(draft).await;
    session.finish().await?;

    println!("{}", added?);
    Ok(())
}
