use std::path::Path;

use tripboard_core::{AppContext, SnapshotSlot, SnapshotStore};

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_new(db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let mut context = AppContext::load(store.clone()).await?;
    context.set_last_active_trip(None);
    store.remove(&SnapshotSlot::Draft).await?;
    context.save().await?;

    println!("Started a new local draft");
    Ok(())
}
