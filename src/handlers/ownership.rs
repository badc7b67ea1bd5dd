use bson::oid::ObjectId;
use serde_json::Value;

use crate::app::AppState;
use crate::database::Document;
use crate::error::ApiError;
use crate::middleware::SessionUser;
use crate::resource::{not_found, Resource};

/// Load a document and confirm `caller` owns it.
///
/// Absent documents are 404; a stored owner that differs from the caller (or
/// is missing) is 403.
pub async fn load_owned<R: Resource>(
    state: &AppState,
    id: &ObjectId,
    caller: &SessionUser,
) -> Result<Document, ApiError> {
    let existing = state
        .store
        .find_one(R::COLLECTION, id)
        .await
        .map_err(|e| ApiError::store(format!("An error occurred while retrieving the {}", R::NAME), e))?
        .ok_or_else(not_found::<R>)?;

    if !is_owner(&existing, R::OWNER_FIELD, caller) {
        tracing::warn!(
            "User {} denied write on {} {}",
            caller.user_id,
            R::NAME,
            id.to_hex()
        );
        return Err(ApiError::forbidden(format!("You can only modify your own {}", R::NAME)));
    }

    Ok(existing)
}

pub fn is_owner(doc: &Document, owner_field: &str, caller: &SessionUser) -> bool {
    doc.get(owner_field).and_then(Value::as_str) == Some(caller.user_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn caller(id: &str) -> SessionUser {
        SessionUser {
            user_id: id.to_string(),
            display_name: None,
        }
    }

    #[test]
    fn owner_matches_exact_identifier() {
        let doc = match json!({"user_id": "abc", "name": "Mine"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(is_owner(&doc, "user_id", &caller("abc")));
        assert!(!is_owner(&doc, "user_id", &caller("abd")));
        assert!(!is_owner(&doc, "owner", &caller("abc")));
    }
}
