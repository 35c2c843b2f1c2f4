use std::path::Path;

use crate::commands::common::{format_place_lines, format_trip_header, open_session, TripSelection};
use crate::error::CliError;

pub async fn run_watch(db_path: &Path) -> Result<(), CliError> {
    let session = open_session(db_path, TripSelection::LastActive).await?;
    if session.trip().is_draft() {
        session.finish().await?;
        return Err(CliError::Config(
            "Nothing to watch: share the trip or open a shared one first".to_string(),
        ));
    }

    let mut updates = session.handle.watch();
    let mut last_printed = None;
    loop {
        let view = updates.borrow_and_update().clone();
        if last_printed.as_ref() != Some(&view.trip) {
            println!("{}", format_trip_header(&view));
            for line in format_place_lines(&view.trip) {
                println!("{line}");
            }
            println!();
            last_printed = Some(view.trip);
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.finish().await?;
    Ok(())
}
