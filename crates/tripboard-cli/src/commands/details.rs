use std::path::Path;

use tripboard_core::TripDetails;

use crate::cli::DetailFields;
use crate::commands::common::{format_details, open_session, TripSelection};
use crate::error::CliError;

pub async fn run_details(fields: DetailFields, clear: bool, db_path: &Path) -> Result<(), CliError> {
    let session = open_session(db_path, TripSelection::LastActive).await?;
    let current = session.trip().details;

    let updated = if clear {
        session.handle.set_details(None).await.map(|()| None)
    } else if fields.is_empty() {
        Ok(current)
    } else {
        let details = merge_details(current, fields);
        session
            .handle
            .set_details(Some(details.clone()))
            .await
            .map(|()| Some(details))
    };
    session.finish().await?;

    match updated? {
        Some(details) => println!("{}", format_details(&details)),
        None => println!("No trip details set"),
    }
    Ok(())
}

/// Overlay the given fields on existing details; blank values clear a field.
pub fn merge_details(current: Option<TripDetails>, fields: DetailFields) -> TripDetails {
    let mut details = current.unwrap_or_default();
    if let Some(budget) = fields.budget {
        details.budget = budget.trim().to_string();
    }
    if let Some(people) = fields.people {
        details.people = people.trim().to_string();
    }
    if let Some(style) = fields.style {
        details.style = style.trim().to_string();
    }
    details
}
