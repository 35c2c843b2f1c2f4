use std::path::Path;

use crate::commands::common::{open_session, TripSelection};
use crate::error::CliError;

pub async fn run_clear(confirmed: bool, db_path: &Path) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::ConfirmationRequired("delete every place"));
    }

    let session = open_session(db_path, TripSelection::LastActive).await?;
    let removed = session.trip().items.len();
    let cleared = session.handle.clear().await;
    session.finish().await?;
    cleared?;

    println!("Removed {removed} places");
    Ok(())
}
