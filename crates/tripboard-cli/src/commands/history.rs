use std::path::Path;

use chrono::Utc;
use tripboard_core::AppContext;

use crate::commands::common::{format_history_lines, history_to_item, open_store, HistoryItem};
use crate::error::CliError;

pub async fn run_history(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let context = AppContext::load(store).await?;
    let entries = context.history().entries();
    let now = Utc::now();

    if as_json {
        let json_items = entries
            .iter()
            .map(|entry| history_to_item(entry, now))
            .collect::<Vec<HistoryItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if entries.is_empty() {
        println!("No trips visited yet");
    } else {
        for line in format_history_lines(entries, now) {
            println!("{line}");
        }
    }

    Ok(())
}
