use std::path::Path;

use tripboard_core::{AccommodationId, SyncHandle};

use crate::cli::PlaceFields;
use crate::commands::common::{
    apply_place_fields, capture_editor_input_with_initial, draft_from, normalize_content,
    open_session, resolve_place, TripSelection,
};
use crate::error::CliError;

/// Changes requested for one place
#[derive(Debug, Default)]
pub struct PlaceEdit {
    pub name: Option<String>,
    pub fields: PlaceFields,
    pub clear_images: bool,
}

impl PlaceEdit {
    fn opens_editor(&self) -> bool {
        self.name.is_none() && self.fields.is_empty() && !self.clear_images
    }
}

pub async fn run_edit(id: &str, edit: PlaceEdit, db_path: &Path) -> Result<(), CliError> {
    let session = open_session(db_path, TripSelection::LastActive).await?;
    let edited = edit_place(&session.handle, id, edit).await;
    session.finish().await?;

    println!("{}", edited?);
    Ok(())
}

async fn edit_place(
    handle: &SyncHandle,
    id: &str,
    edit: PlaceEdit,
) -> Result<AccommodationId, CliError> {
    let trip = handle.trip();
    let place_id = resolve_place(id, &trip)?;
    let Some(item) = trip.get(&place_id) else {
        return Err(CliError::PlaceNotFound(id.to_string()));
    };

    let mut draft = draft_from(item);
    if edit.opens_editor() {
        draft.notes = capture_editor_input_with_initial(&item.notes)?.unwrap_or_default();
        if draft.notes == item.notes {
            return Ok(place_id);
        }
    } else {
        if let Some(name) = edit.name {
            draft.name = normalize_content(&name).ok_or(CliError::EmptyName)?;
        }
        if edit.clear_images {
            draft.images.clear();
        }
        draft = apply_place_fields(draft, edit.fields)?;
    }

    handle.edit(place_id.clone(), draft).await?;
    Ok(place_id)
}
