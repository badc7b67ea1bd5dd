//! One CRUD capability shared by every entity.
//!
//! An entity supplies its names, the body fields it maps into documents, its
//! validation rules and its write-access level; the generic handlers in
//! [`crate::handlers::crud`] do the rest.

use async_trait::async_trait;
use bson::oid::ObjectId;
use serde_json::Value;

use crate::app::AppState;
use crate::database::{parse_object_id, Document};
use crate::error::ApiError;
use crate::middleware::SessionUser;
use crate::validation::FieldRule;

/// Who may call the mutating routes of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAccess {
    /// Anyone.
    Open,
    /// Any caller with a session.
    Session,
    /// A session, and updates/deletes only by the document's owner.
    Owner,
}

/// Which write path is preparing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Replace,
    Patch,
}

#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Singular name, e.g. `movie`. Also forms the `<name>Id` response key.
    const NAME: &'static str;
    /// Capitalised name for messages, e.g. `Movie`.
    const LABEL: &'static str;
    const COLLECTION: &'static str;
    /// Body fields copied into stored documents; others are dropped.
    const FIELDS: &'static [&'static str];
    /// Fields a partial update may touch.
    const PATCH_FIELDS: &'static [&'static str] = Self::FIELDS;
    const WRITE_ACCESS: WriteAccess = WriteAccess::Open;
    /// Document field holding the owner's session identifier.
    const OWNER_FIELD: &'static str = "user_id";

    fn rules() -> Vec<FieldRule>;

    /// Last step before a document is written.
    async fn prepare(doc: Document, _kind: WriteKind, _state: &AppState) -> Result<Document, ApiError> {
        Ok(doc)
    }

    /// Shape a stored document for the response.
    fn present(doc: Document) -> Document {
        doc
    }
}

/// Copy `fields` out of `body`; missing ones become `null`.
pub fn map_fields(body: &Value, fields: &[&str]) -> Document {
    fields
        .iter()
        .map(|f| (f.to_string(), body.get(*f).cloned().unwrap_or(Value::Null)))
        .collect()
}

/// Copy only the `fields` present in `body`.
pub fn present_fields(body: &Value, fields: &[&str]) -> Document {
    fields
        .iter()
        .filter_map(|f| body.get(*f).map(|v| (f.to_string(), v.clone())))
        .collect()
}

pub fn require_id<R: Resource>(raw: &str) -> Result<ObjectId, ApiError> {
    parse_object_id(raw).ok_or_else(|| ApiError::bad_request(format!("Invalid {} ID format", R::LABEL)))
}

pub fn not_found<R: Resource>() -> ApiError {
    ApiError::not_found(format!("{} not found", R::LABEL))
}

/// Enforce the resource's write access for the caller.
pub fn authorize_write<R: Resource>(caller: Option<SessionUser>) -> Result<Option<SessionUser>, ApiError> {
    match (R::WRITE_ACCESS, caller) {
        (WriteAccess::Open, caller) => Ok(caller),
        (_, Some(caller)) => Ok(Some(caller)),
        (_, None) => Err(ApiError::unauthorized("Authentication required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_fields_drops_unknown_and_nulls_missing() {
        let body = json!({"title": "Up", "extra": true});
        let doc = map_fields(&body, &["title", "genre"]);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc["title"], "Up");
        assert_eq!(doc["genre"], Value::Null);
    }

    #[test]
    fn present_fields_keeps_only_supplied() {
        let body = json!({"name": "Weekend", "user_id": "someone-else"});
        let doc = present_fields(&body, &["name", "movies"]);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["name"], "Weekend");
    }
}
