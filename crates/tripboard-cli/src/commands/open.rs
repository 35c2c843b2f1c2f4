use std::path::Path;

use tripboard_core::config::ConnectionConfig;
use tripboard_core::{AppContext, ShareLink};

use crate::commands::common::{format_trip_header, open_store, start_session, TripSelection};
use crate::error::CliError;

pub async fn run_open(target: &str, db_path: &Path) -> Result<(), CliError> {
    let link = ShareLink::parse(target)?;

    let store = open_store(db_path).await?;
    let mut context = AppContext::load(store.clone()).await?;
    if let Some(connection) = link.connection.clone() {
        context.set_connection(Some(connection));
    }
    let Some(connection) = context.resolve_connection(ConnectionConfig::from_env()) else {
        return Err(CliError::SyncNotConfigured);
    };

    let session = start_session(store, context, Some(connection), TripSelection::Draft).await?;
    let opened = session.handle.open(link.trip_id.clone()).await;
    let view = session.view();
    session.finish().await?;

    opened?;
    println!("{}", format_trip_header(&view));
    if let Some(error) = &view.last_error {
        println!("warning: {error}");
    }
    println!("{} places", view.trip.items.len());
    Ok(())
}
