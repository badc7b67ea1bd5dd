use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::AppState;
use crate::database::{canonical_object_id, is_object_id, Document, Update};
use crate::error::ApiError;
use crate::resource::{Resource, WriteAccess, WriteKind};
use crate::validation::{field, FieldRule};

pub const MOVIES_FIELD: &str = "movies";
pub const MOVIE_KEY: &str = "movieId";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WatchStatus {
    Watching,
    #[default]
    PlanToWatch,
    Completed,
    OnHold,
    Dropped,
}

impl WatchStatus {
    pub const NAMES: &'static [&'static str] =
        &["watching", "planToWatch", "completed", "onHold", "dropped"];
}

/// One embedded movie reference in a watchlist's `movies` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    #[serde(rename = "movieId")]
    pub movie_id: String,
    #[serde(default)]
    pub status: WatchStatus,
}

/// A `movies` item as submitted on create; `status` may be omitted or null.
#[derive(Debug, Deserialize)]
struct EntryInput {
    #[serde(rename = "movieId")]
    movie_id: String,
    #[serde(default)]
    status: Option<WatchStatus>,
}

impl From<EntryInput> for WatchlistEntry {
    fn from(input: EntryInput) -> Self {
        WatchlistEntry {
            movie_id: canonical_object_id(&input.movie_id).unwrap_or(input.movie_id),
            status: input.status.unwrap_or_default(),
        }
    }
}

/// Body of `PUT /watchlists/:id`: add or remove a single movie.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieChange {
    pub movie_id: String,
    #[serde(default)]
    pub status: Option<WatchStatus>,
    #[serde(default)]
    pub remove: bool,
}

impl MovieChange {
    pub fn rules() -> Vec<FieldRule> {
        vec![
            field("movieId")
                .truthy("movieId is required")
                .is_object_id("Invalid movieId format"),
            field("status").is_in(WatchStatus::NAMES, "Status must be a valid watch status"),
            field("remove").custom(Value::is_boolean, "remove must be true or false"),
        ]
    }

    /// Set semantics keyed by the canonical `movieId`: adding twice is a no-op.
    pub fn into_update(self) -> Update {
        let movie_id = canonical_object_id(&self.movie_id).unwrap_or(self.movie_id);
        if self.remove {
            Update::Pull {
                field: MOVIES_FIELD.to_string(),
                key: MOVIE_KEY.to_string(),
                value: Value::String(movie_id),
            }
        } else {
            let entry = WatchlistEntry {
                movie_id,
                status: self.status.unwrap_or_default(),
            };
            Update::AddToSet {
                field: MOVIES_FIELD.to_string(),
                key: MOVIE_KEY.to_string(),
                item: entry_value(&entry),
            }
        }
    }
}

pub struct Watchlist;

#[async_trait]
impl Resource for Watchlist {
    const NAME: &'static str = "watchlist";
    const LABEL: &'static str = "Watchlist";
    const COLLECTION: &'static str = "watchlists";
    const FIELDS: &'static [&'static str] = &["name", MOVIES_FIELD];
    // The movies array only changes through single add/remove updates.
    const PATCH_FIELDS: &'static [&'static str] = &["name"];
    const WRITE_ACCESS: WriteAccess = WriteAccess::Owner;

    fn rules() -> Vec<FieldRule> {
        vec![
            field("name")
                .truthy("Name is required")
                .is_string("Name must be a string"),
            field(MOVIES_FIELD)
                .is_array(0, "Movies must be an array")
                .custom(
                    valid_entries,
                    "Each movie needs a valid movieId and an optional valid status",
                ),
        ]
    }

    async fn prepare(mut doc: Document, kind: WriteKind, _state: &AppState) -> Result<Document, ApiError> {
        if kind != WriteKind::Create {
            return Ok(doc);
        }

        let entries: Vec<WatchlistEntry> = match doc.remove(MOVIES_FIELD) {
            None | Some(Value::Null) => Vec::new(),
            Some(raw) => serde_json::from_value::<Vec<EntryInput>>(raw)
                .map_err(|e| {
                    tracing::warn!("Unreadable movies list passed validation: {}", e);
                    ApiError::bad_request("Each movie needs a valid movieId and an optional valid status")
                })?
                .into_iter()
                .map(WatchlistEntry::from)
                .collect(),
        };
        let movies = dedupe_entries(entries).iter().map(entry_value).collect();

        doc.insert(MOVIES_FIELD.to_string(), Value::Array(movies));
        doc.insert(
            "createdAt".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        Ok(doc)
    }
}

fn entry_value(entry: &WatchlistEntry) -> Value {
    serde_json::to_value(entry).unwrap_or(Value::Null)
}

/// Keep the first entry for each movie.
fn dedupe_entries(entries: Vec<WatchlistEntry>) -> Vec<WatchlistEntry> {
    let mut kept: Vec<WatchlistEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !kept.iter().any(|e| e.movie_id == entry.movie_id) {
            kept.push(entry);
        }
    }
    kept
}

fn valid_entries(value: &Value) -> bool {
    let Some(items) = value.as_array() else {
        return false;
    };
    items.iter().all(|item| {
        let id_ok = item.get(MOVIE_KEY).and_then(Value::as_str).map_or(false, is_object_id);
        let status_ok = match item.get("status") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => WatchStatus::NAMES.contains(&s.as_str()),
            Some(_) => false,
        };
        id_ok && status_ok
    })
}
