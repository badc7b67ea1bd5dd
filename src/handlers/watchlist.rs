use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::SessionUser;
use crate::models::watchlist::MovieChange;
use crate::models::Watchlist;
use crate::resource::{authorize_write, require_id, Resource};
use crate::validation::{self, Mode};

use super::crud::update_response;
use super::ownership::load_owned;
use super::JsonBody;

/// PUT /watchlists/:id - add one movie to, or remove one from, the embedded list.
pub async fn change_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Option<SessionUser>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let caller = authorize_write::<Watchlist>(caller)?
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    let id = require_id::<Watchlist>(&id)?;
    validation::check(&body, &MovieChange::rules(), Mode::Full)?;

    let change: MovieChange = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid watchlist change: {}", e)))?;

    load_owned::<Watchlist>(&state, &id, &caller).await?;

    let action = if change.remove { "Removing" } else { "Adding" };
    tracing::info!("{} movie {} on watchlist {}", action, change.movie_id, id.to_hex());

    let result = state
        .store
        .update_one(Watchlist::COLLECTION, &id, change.into_update())
        .await
        .map_err(|e| ApiError::store("An error occurred while updating the watchlist", e))?;

    update_response::<Watchlist>(result)
}
