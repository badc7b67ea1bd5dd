use async_trait::async_trait;
use serde_json::Value;

use crate::app::AppState;
use crate::database::Document;
use crate::error::ApiError;
use crate::resource::{Resource, WriteKind};
use crate::validation::{all_strings, field, FieldRule};

pub const PASSWORD_HASH_FIELD: &str = "passwordHash";

pub struct User;

#[async_trait]
impl Resource for User {
    const NAME: &'static str = "user";
    const LABEL: &'static str = "User";
    const COLLECTION: &'static str = "users";
    const FIELDS: &'static [&'static str] = &["username", "password", "email", "watchlists"];

    fn rules() -> Vec<FieldRule> {
        vec![
            field("username")
                .truthy("Username is required")
                .is_string("Username must be a string")
                .min_length(1, "Username cannot be empty"),
            field("password")
                .required("Password is required")
                .is_string("Password must be a string")
                .min_length(6, "Password must be at least 6 characters long"),
            field("email")
                .truthy("Email is required")
                .is_email("Invalid email format"),
            field("watchlists")
                .is_array(1, "Watchlists must contain at least one item")
                .custom(all_strings, "Each item in the watchlist must be a string"),
        ]
    }

    /// Replace the plaintext `password` with a salted bcrypt hash.
    async fn prepare(mut doc: Document, _kind: WriteKind, state: &AppState) -> Result<Document, ApiError> {
        let Some(password) = doc.remove("password") else {
            return Ok(doc);
        };
        let Value::String(password) = password else {
            return Ok(doc);
        };

        let cost = state.config.security.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| {
                tracing::error!("Password hashing task failed: {}", e);
                ApiError::internal_server_error("An error occurred while saving the user")
            })?
            .map_err(|e| {
                tracing::error!("Password hashing failed: {}", e);
                ApiError::internal_server_error("An error occurred while saving the user")
            })?;

        doc.insert(PASSWORD_HASH_FIELD.to_string(), Value::String(hash));
        Ok(doc)
    }

    fn present(mut doc: Document) -> Document {
        doc.remove(PASSWORD_HASH_FIELD);
        doc.remove("password");
        doc
    }
}

