use async_trait::async_trait;
use serde_json::Value;

use crate::app::AppState;
use crate::database::{canonical_object_id, Document};
use crate::error::ApiError;
use crate::resource::{Resource, WriteAccess, WriteKind};
use crate::validation::{at_most_two_decimals, field, FieldRule};

/// A user's review of a movie. `user_id` is set from the session.
pub struct Review;

#[async_trait]
impl Resource for Review {
    const NAME: &'static str = "review";
    const LABEL: &'static str = "Review";
    const COLLECTION: &'static str = "reviews";
    const FIELDS: &'static [&'static str] = &["movieId", "rating", "title", "comment"];
    const WRITE_ACCESS: WriteAccess = WriteAccess::Owner;

    fn rules() -> Vec<FieldRule> {
        vec![
            field("movieId")
                .truthy("Movie ID is required")
                .is_object_id("Movie ID must be a valid id"),
            field("rating")
                .required("Rating is required")
                .is_float(1.0, 10.0, "Rating must be a number between 1 and 10")
                .custom(at_most_two_decimals, "Rating can only have up to two decimal places"),
            field("title")
                .truthy("Title is required")
                .is_string("Title must be a string"),
            field("comment")
                .truthy("Comment is required")
                .is_string("Comment must be a string"),
        ]
    }

    /// Store `movieId` in lower-case hex.
    async fn prepare(mut doc: Document, _kind: WriteKind, _state: &AppState) -> Result<Document, ApiError> {
        let canonical = doc
            .get("movieId")
            .and_then(Value::as_str)
            .and_then(canonical_object_id);
        if let Some(canonical) = canonical {
            doc.insert("movieId".to_string(), Value::String(canonical));
        }
        Ok(doc)
    }
}
