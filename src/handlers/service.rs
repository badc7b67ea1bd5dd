use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::SessionUser;
use crate::models::COLLECTIONS;

/// GET / - service banner and the caller's session state.
pub async fn root(caller: Option<SessionUser>) -> Json<Value> {
    let session = match &caller {
        Some(user) => format!(
            "Logged in as {}",
            user.display_name.as_deref().unwrap_or(&user.user_id)
        ),
        None => "Logged out".to_string(),
    };

    let resources: Vec<String> = COLLECTIONS.iter().map(|c| format!("/{}", c)).collect();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "session": session,
        "resources": resources,
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "error": "database unavailable",
                    "timestamp": now,
                })),
            )
        }
    }
}
