use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tripboard_core::config::ConnectionConfig;
use tripboard_core::media::{prepare_image_file, ImageOptions};
use tripboard_core::models::{HistoryEntry, ImageSource};
use tripboard_core::remote::{
    RemoteBackend, RemoteDocumentClient, SupabaseTripClient, DEFAULT_POLL_INTERVAL,
};
use tripboard_core::{
    Accommodation, AccommodationDraft, AccommodationId, AppContext, LocalStore, SyncCoordinator,
    SyncHandle, SyncSettings, Trip, TripView,
};

use crate::cli::PlaceFields;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct PlaceListItem {
    pub id: String,
    pub name: String,
    pub price: String,
    pub link: String,
    pub location_link: String,
    pub notes: String,
    pub votes: u32,
    pub added_by: String,
    pub image_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub trip_id: String,
    pub visited_at: String,
    pub relative_time: String,
    pub item_count: usize,
    pub style: Option<String>,
}

/// How a command session picks its trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripSelection {
    /// Reopen the last active trip, if any
    LastActive,
    /// Stay on the local draft; the command opens a trip itself
    Draft,
}

/// A running coordinator plus the application context it was built from.
pub struct Session {
    pub context: AppContext,
    pub handle: SyncHandle,
    pub connection: Option<ConnectionConfig>,
}

impl Session {
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn view(&self) -> TripView {
        self.handle.view()
    }

    pub fn trip(&self) -> Trip {
        self.handle.trip()
    }

    /// Push pending edits, remember the visit, and stop the coordinator.
    pub async fn finish(mut self) -> Result<Trip, CliError> {
        let trip = self.handle.trip();
        let pushed = if trip.is_draft() || !self.is_connected() {
            Ok(())
        } else {
            self.handle.save().await
        };

        let trip = self.handle.trip();
        self.context.record_visit(&trip);
        self.context.save().await?;
        self.handle.close().await?;

        if let Some(warning) = unpushed_warning(pushed)? {
            eprintln!("{warning}");
        }
        Ok(trip)
    }
}

/// Turn a failed final push into a warning when the store was only unreachable.
/// Edits are already in the local snapshot by then.
pub fn unpushed_warning(
    pushed: Result<(), tripboard_core::Error>,
) -> Result<Option<String>, CliError> {
    match pushed {
        Ok(()) => Ok(None),
        Err(error) if error.is_transient() => Ok(Some(format!(
            "warning: changes saved locally but not pushed: {error}"
        ))),
        Err(error) => Err(error.into()),
    }
}

/// Open a session using credentials from the build, environment, or context.
pub async fn open_session(db_path: &Path, selection: TripSelection) -> Result<Session, CliError> {
    let store = open_store(db_path).await?;
    let context = AppContext::load(store.clone()).await?;
    let connection = context.resolve_connection(ConnectionConfig::from_env());
    start_session(store, context, connection, selection).await
}

/// Open a session with an explicit connection (or none for local-only mode).
pub async fn start_session(
    store: LocalStore,
    mut context: AppContext,
    connection: Option<ConnectionConfig>,
    selection: TripSelection,
) -> Result<Session, CliError> {
    let backend = connection.as_ref().map(build_backend).transpose()?;
    let handle =
        SyncCoordinator::spawn(Arc::new(store), backend, SyncSettings::default()).await;

    if selection == TripSelection::LastActive && connection.is_some() {
        if let Some(trip_id) = context.last_active_trip().cloned() {
            match handle.open(trip_id.clone()).await {
                Ok(_) => {}
                Err(tripboard_core::Error::NotFound(_)) => {
                    eprintln!("Trip {trip_id} no longer exists; continuing on the local draft");
                    context.forget_trip(&trip_id);
                }
                Err(error) => {
                    handle.close().await?;
                    return Err(error.into());
                }
            }
        }
    }

    Ok(Session {
        context,
        handle,
        connection,
    })
}

pub fn build_backend(connection: &ConnectionConfig) -> Result<RemoteBackend, CliError> {
    let documents: Arc<dyn RemoteDocumentClient> = Arc::new(
        SupabaseTripClient::new(connection).map_err(CliError::with_setup_hint)?,
    );
    Ok(RemoteBackend::polling(documents, DEFAULT_POLL_INTERVAL))
}

pub async fn open_store(path: &Path) -> Result<LocalStore, CliError> {
    Ok(LocalStore::open_path(path.to_path_buf()).await?)
}

pub fn resolve_place(query: &str, trip: &Trip) -> Result<AccommodationId, CliError> {
    let query = normalize_place_identifier(query)?;
    if let Ok(id) = query.parse::<AccommodationId>() {
        if trip.get(&id).is_some() {
            return Ok(id);
        }
    }

    let query_lower = query.to_ascii_lowercase();
    let matching = trip
        .items
        .iter()
        .filter(|item| {
            item.id
                .as_str()
                .to_ascii_lowercase()
                .starts_with(&query_lower)
        })
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::PlaceNotFound(query)),
        [item] => Ok(item.id.clone()),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|item| short_id(&item.id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousPlaceId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn normalize_place_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyPlaceId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_name(parts: &[String]) -> Result<String, CliError> {
    normalize_content(&parts.join(" ")).ok_or(CliError::EmptyName)
}

pub fn short_id(id: &AccommodationId) -> String {
    id.as_str().chars().take(13).collect()
}

/// Build a draft from CLI fields on top of an existing one.
pub fn apply_place_fields(
    mut draft: AccommodationDraft,
    fields: PlaceFields,
) -> Result<AccommodationDraft, CliError> {
    if let Some(price) = fields.price {
        draft.price = price;
    }
    if let Some(link) = fields.link {
        draft.link = link;
    }
    if let Some(location_link) = fields.location_link {
        draft.location_link = location_link;
    }
    if let Some(notes) = fields.notes {
        draft.notes = notes;
    }
    for image in &fields.images {
        draft.images.push(resolve_image(image)?);
    }
    Ok(draft)
}

/// URLs are kept as links; files are downscaled and embedded.
pub fn resolve_image(value: &str) -> Result<ImageSource, CliError> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(ImageSource::External(value.to_string()));
    }
    let prepared = prepare_image_file(Path::new(value), ImageOptions::default())?;
    tracing::debug!(
        width = prepared.width,
        height = prepared.height,
        bytes = prepared.encoded_bytes,
        "Embedded image {value}"
    );
    Ok(prepared.source)
}

pub fn draft_from(item: &Accommodation) -> AccommodationDraft {
    AccommodationDraft {
        name: item.name.clone(),
        price: item.price.clone(),
        link: item.link.clone(),
        location_link: item.location_link.clone(),
        images: item.images.clone(),
        notes: item.notes.clone(),
    }
}

pub fn format_trip_header(view: &TripView) -> String {
    let now_ms = Utc::now().timestamp_millis();
    let trip = &view.trip;
    let mut header = trip.id.as_ref().map_or_else(
        || "Local draft (not shared)".to_string(),
        |trip_id| format!("Trip {trip_id} ({})", view.phase),
    );
    if let Some(updated_at) = trip.updated_at {
        header.push_str(&format!(
            ", updated {}",
            format_relative_time(updated_at.timestamp_millis(), now_ms)
        ));
    }
    if let Some(details) = &trip.details {
        header.push_str(&format!("\n{}", format_details(details)));
    }
    header
}

pub fn format_details(details: &tripboard_core::TripDetails) -> String {
    let show = |value: &str| {
        if value.trim().is_empty() {
            "-".to_string()
        } else {
            value.trim().to_string()
        }
    };
    format!(
        "budget: {}  people: {}  style: {}",
        show(&details.budget),
        show(&details.people),
        show(&details.style)
    )
}

pub fn format_place_lines(trip: &Trip) -> Vec<String> {
    trip.ranked()
        .into_iter()
        .map(|item| {
            let name = truncate(&item.name, 32);
            let price = if item.price.is_empty() {
                "-".to_string()
            } else {
                item.price.clone()
            };
            let mut line = format!(
                "{:<13}  {:>3} votes  {name:<32}  {price}",
                short_id(&item.id),
                item.votes
            );
            if item.is_suggested() {
                line.push_str("  [suggested]");
            }
            line
        })
        .collect()
}

pub fn place_to_list_item(item: &Accommodation) -> PlaceListItem {
    PlaceListItem {
        id: item.id.to_string(),
        name: item.name.clone(),
        price: item.price.clone(),
        link: item.link.clone(),
        location_link: item.location_link.clone(),
        notes: item.notes.clone(),
        votes: item.votes,
        added_by: if item.is_suggested() { "ai" } else { "user" }.to_string(),
        image_count: item.images.len(),
    }
}

pub fn history_to_item(entry: &HistoryEntry, now: DateTime<Utc>) -> HistoryItem {
    HistoryItem {
        trip_id: entry.trip_id.to_string(),
        visited_at: format_timestamp(entry.visited_at),
        relative_time: format_relative_time(
            entry.visited_at.timestamp_millis(),
            now.timestamp_millis(),
        ),
        item_count: entry.item_count,
        style: entry.style.clone(),
    }
}

pub fn format_history_lines(entries: &[HistoryEntry], now: DateTime<Utc>) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let item = history_to_item(entry, now);
            let style = item.style.map(|style| format!("  {style}")).unwrap_or_default();
            format!(
                "{:<24}  {:<10}  {} places{style}",
                item.trip_id, item.relative_time, item.item_count
            )
        })
        .collect()
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_notes_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn create_temp_notes_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("tripboard-notes-{}-{now}.md", std::process::id()))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("TRIPBOARD_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(env::temp_dir)
        .join("tripboard")
        .join("tripboard.db")
}

