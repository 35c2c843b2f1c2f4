use std::path::Path;

use tripboard_core::share::DEFAULT_SHARE_BASE;
use tripboard_core::ShareLink;

use crate::commands::common::{open_session, TripSelection};
use crate::error::CliError;

pub async fn run_share(
    base_url: Option<&str>,
    with_credentials: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let session = open_session(db_path, TripSelection::LastActive).await?;
    if !session.is_connected() {
        session.finish().await?;
        return Err(CliError::SyncNotConfigured);
    }

    let bound = session
        .handle
        .ensure_bound()
        .await
        .map_err(CliError::with_setup_hint);
    let connection = session.connection.clone();
    session.finish().await?;

    let mut link = ShareLink::new(bound?);
    if with_credentials {
        if let Some(connection) = connection {
            link = link.with_connection(connection);
        }
    }
    println!("{}", link.to_url(base_url.unwrap_or(DEFAULT_SHARE_BASE)));
    Ok(())
}
