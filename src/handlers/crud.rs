//! Generic handlers shared by every [`Resource`].
//!
//! Shape of each handler: check write access, parse the id, validate the body,
//! make the store call, map the outcome to a status and JSON body.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};

use crate::app::AppState;
use crate::database::{Update, UpdateResult};
use crate::error::ApiError;
use crate::middleware::SessionUser;
use crate::resource::{
    authorize_write, map_fields, not_found, present_fields, require_id, Resource, WriteAccess, WriteKind,
};
use crate::validation::{self, Mode};

use super::ownership::load_owned;
use super::JsonBody;

/// GET /{resource}
pub async fn list<R: Resource>(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let docs = state
        .store
        .find(R::COLLECTION)
        .await
        .map_err(|e| ApiError::store(format!("An error occurred while retrieving {}", R::COLLECTION), e))?;

    Ok(Json(Value::Array(
        docs.into_iter().map(|d| Value::Object(R::present(d))).collect(),
    )))
}

/// GET /{resource}/:id
pub async fn get<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id::<R>(&id)?;

    let doc = state
        .store
        .find_one(R::COLLECTION, &id)
        .await
        .map_err(|e| ApiError::store(format!("An error occurred while retrieving the {}", R::NAME), e))?
        .ok_or_else(not_found::<R>)?;

    Ok(Json(Value::Object(R::present(doc))))
}

/// POST /{resource}
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    caller: Option<SessionUser>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let caller = authorize_write::<R>(caller)?;
    validation::check(&body, &R::rules(), Mode::Full)?;

    let mut doc = map_fields(&body, R::FIELDS);
    if R::WRITE_ACCESS == WriteAccess::Owner {
        if let Some(caller) = &caller {
            doc.insert(R::OWNER_FIELD.to_string(), Value::String(caller.user_id.clone()));
        }
    }
    let doc = R::prepare(doc, WriteKind::Create, &state).await?;

    let id = state
        .store
        .insert_one(R::COLLECTION, doc)
        .await
        .map_err(|e| ApiError::store(format!("An error occurred while creating the {}", R::NAME), e))?;

    tracing::info!("Created {} {}", R::NAME, id.to_hex());

    let mut response = Map::new();
    response.insert(
        "message".to_string(),
        Value::String(format!("{} created successfully", R::LABEL)),
    );
    response.insert(format!("{}Id", R::NAME), Value::String(id.to_hex()));
    Ok((StatusCode::CREATED, Json(Value::Object(response))))
}

/// PUT /{resource}/:id - whole-document replace
pub async fn replace<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Option<SessionUser>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let caller = authorize_write::<R>(caller)?;
    let id = require_id::<R>(&id)?;
    validation::check(&body, &R::rules(), Mode::Full)?;

    let mut doc = map_fields(&body, R::FIELDS);
    if R::WRITE_ACCESS == WriteAccess::Owner {
        if let Some(caller) = &caller {
            let existing = load_owned::<R>(&state, &id, caller).await?;
            let owner = existing.get(R::OWNER_FIELD).cloned().unwrap_or(Value::Null);
            doc.insert(R::OWNER_FIELD.to_string(), owner);
        }
    }
    let doc = R::prepare(doc, WriteKind::Replace, &state).await?;

    let result = state
        .store
        .replace_one(R::COLLECTION, &id, doc)
        .await
        .map_err(|e| ApiError::store(format!("An error occurred while updating the {}", R::NAME), e))?;

    update_response::<R>(result)
}

/// PATCH /{resource}/:id - set only the supplied fields
pub async fn patch<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Option<SessionUser>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let caller = authorize_write::<R>(caller)?;
    let id = require_id::<R>(&id)?;
    validation::check(&body, &R::rules(), Mode::Partial)?;

    let fields = present_fields(&body, R::PATCH_FIELDS);
    if fields.is_empty() {
        return Err(ApiError::bad_request(format!(
            "No updatable fields supplied; expected one of: {}",
            R::PATCH_FIELDS.join(", ")
        )));
    }

    if R::WRITE_ACCESS == WriteAccess::Owner {
        if let Some(caller) = &caller {
            load_owned::<R>(&state, &id, caller).await?;
        }
    }
    let fields = R::prepare(fields, WriteKind::Patch, &state).await?;

    let result = state
        .store
        .update_one(R::COLLECTION, &id, Update::Set(fields))
        .await
        .map_err(|e| ApiError::store(format!("An error occurred while updating the {}", R::NAME), e))?;

    update_response::<R>(result)
}

/// DELETE /{resource}/:id
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Option<SessionUser>,
) -> Result<Json<Value>, ApiError> {
    let caller = authorize_write::<R>(caller)?;
    let id = require_id::<R>(&id)?;

    if R::WRITE_ACCESS == WriteAccess::Owner {
        if let Some(caller) = &caller {
            load_owned::<R>(&state, &id, caller).await?;
        }
    }

    let result = state
        .store
        .delete_one(R::COLLECTION, &id)
        .await
        .map_err(|e| ApiError::store(format!("An error occurred while deleting the {}", R::NAME), e))?;

    if result.deleted == 0 {
        return Err(not_found::<R>());
    }

    tracing::info!("Deleted {} {}", R::NAME, id.to_hex());
    Ok(Json(json!({ "message": format!("{} deleted successfully", R::LABEL) })))
}

/// Matched nothing: 404. Matched but identical: 200 with a "no changes" note.
pub fn update_response<R: Resource>(result: UpdateResult) -> Result<Json<Value>, ApiError> {
    if result.matched == 0 {
        return Err(not_found::<R>());
    }
    let message = if result.modified == 0 {
        format!("No changes made to {}", R::NAME)
    } else {
        format!("{} updated successfully", R::LABEL)
    };
    Ok(Json(json!({ "message": message })))
}
