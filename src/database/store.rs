use async_trait::async_trait;
use bson::oid::ObjectId;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document. The `_id` key is owned by the store.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// Errors from a document store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Malformed stored document: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Outcome of a replace or update, mirroring matched/modified counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteResult {
    pub deleted: u64,
}

/// In-place modification of a single document.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Overwrite the listed top-level fields, leaving the rest alone.
    Set(Document),
    /// Append `item` to the array at `field` unless an element with the same
    /// `key` value is already present.
    AddToSet { field: String, key: String, item: Value },
    /// Remove every element of the array at `field` whose `key` equals `value`.
    Pull { field: String, key: String, value: Value },
}

impl Update {
    /// Compute the document that results from applying this update.
    pub fn apply(&self, doc: &Document) -> Document {
        let mut next = doc.clone();
        match self {
            Update::Set(fields) => {
                for (k, v) in fields {
                    if k != ID_FIELD {
                        next.insert(k.clone(), v.clone());
                    }
                }
            }
            Update::AddToSet { field, key, item } => {
                let mut items = match doc.get(field) {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                let wanted = item.get(key.as_str());
                if items.iter().any(|e| e.get(key.as_str()) == wanted) {
                    return next;
                }
                items.push(item.clone());
                next.insert(field.clone(), Value::Array(items));
            }
            Update::Pull { field, key, value } => {
                if let Some(Value::Array(items)) = doc.get(field) {
                    let kept = items
                        .iter()
                        .filter(|e| e.get(key.as_str()) != Some(value))
                        .cloned()
                        .collect();
                    next.insert(field.clone(), Value::Array(kept));
                }
            }
        }
        next
    }
}

/// Document store operations used by the resource handlers.
///
/// Implementations must validate collection names with [`validate_collection`]
/// and never persist a caller-supplied `_id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection in insertion order.
    async fn find(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, StoreError>;

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<ObjectId, StoreError>;

    async fn replace_one(
        &self,
        collection: &str,
        id: &ObjectId,
        doc: Document,
    ) -> Result<UpdateResult, StoreError>;

    async fn update_one(
        &self,
        collection: &str,
        id: &ObjectId,
        update: Update,
    ) -> Result<UpdateResult, StoreError>;

    async fn delete_one(&self, collection: &str, id: &ObjectId) -> Result<DeleteResult, StoreError>;

    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Collection names become table names, so only `[a-z][a-z0-9_]*` is allowed.
pub fn validate_collection(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

/// Attach the hex id as `_id` for outbound documents.
pub fn with_id(id: &ObjectId, mut doc: Document) -> Document {
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_hex()));
    doc
}

/// Drop any `_id` a caller tried to smuggle into a stored body.
pub fn without_id(mut doc: Document) -> Document {
    doc.remove(ID_FIELD);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn set_only_touches_listed_fields() {
        let original = doc(json!({"name": "Weekend", "user_id": "abc", "movies": []}));
        let next = Update::Set(doc(json!({"name": "Holiday"}))).apply(&original);
        assert_eq!(next["name"], "Holiday");
        assert_eq!(next["user_id"], "abc");
        assert_eq!(next["movies"], json!([]));
    }

    #[test]
    fn add_to_set_skips_existing_key() {
        let original = doc(json!({"movies": [{"movieId": "a", "status": "watching"}]}));
        let update = Update::AddToSet {
            field: "movies".into(),
            key: "movieId".into(),
            item: json!({"movieId": "a", "status": "completed"}),
        };
        assert_eq!(update.apply(&original), original);
    }

    #[test]
    fn add_to_set_creates_missing_array() {
        let original = doc(json!({"name": "Empty", "movies": null}));
        let update = Update::AddToSet {
            field: "movies".into(),
            key: "movieId".into(),
            item: json!({"movieId": "b", "status": "planToWatch"}),
        };
        let next = update.apply(&original);
        assert_eq!(next["movies"], json!([{"movieId": "b", "status": "planToWatch"}]));
    }

    #[test]
    fn pull_removes_matching_entries_only() {
        let original = doc(json!({"movies": [
            {"movieId": "a", "status": "watching"},
            {"movieId": "b", "status": "completed"}
        ]}));
        let update = Update::Pull {
            field: "movies".into(),
            key: "movieId".into(),
            value: json!("a"),
        };
        let next = update.apply(&original);
        assert_eq!(next["movies"], json!([{"movieId": "b", "status": "completed"}]));

        let missing = Update::Pull {
            field: "movies".into(),
            key: "movieId".into(),
            value: json!("zzz"),
        };
        assert_eq!(missing.apply(&next), next);
    }

    #[test]
    fn collection_names_are_restricted() {
        assert!(validate_collection("movies").is_ok());
        assert!(validate_collection("watch_lists2").is_ok());
        assert!(validate_collection("").is_err());
        assert!(validate_collection("Movies").is_err());
        assert!(validate_collection("movies; DROP TABLE users").is_err());
        assert!(validate_collection("_hidden").is_err());
    }
}
