use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::error::ApiError;
use crate::handlers::{crud, service, watchlist};
use crate::middleware::load_session;
use crate::models::{Course, Movie, Review, Student, User, Watchlist};
use crate::resource::Resource;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security.cors_origins);

    // Outermost first: panics anywhere below still get a JSON 500.
    let outer = ServiceBuilder::new()
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Router::new()
        // Public
        .route("/", get(service::root))
        .route("/health", get(service::health))
        // Resources
        .merge(resource_routes::<Movie>(put(crud::replace::<Movie>)))
        .merge(resource_routes::<User>(put(crud::replace::<User>)))
        .merge(resource_routes::<Review>(put(crud::replace::<Review>)))
        .merge(resource_routes::<Watchlist>(put(watchlist::change_movie)))
        .merge(resource_routes::<Course>(put(crud::replace::<Course>)))
        .merge(resource_routes::<Student>(put(crud::replace::<Student>)))
        // Global middleware
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(outer)
        .with_state(state)
}

/// `/{collection}` and `/{collection}/:id`, with `item_put` as the item PUT handler.
fn resource_routes<R: Resource>(item_put: MethodRouter<AppState>) -> Router<AppState> {
    let collection = format!("/{}", R::COLLECTION);
    let item = format!("/{}/:id", R::COLLECTION);

    Router::new()
        .route(&collection, get(crud::list::<R>).post(crud::create::<R>))
        .route(
            &item,
            item_put
                .get(crud::get::<R>)
                .patch(crud::patch::<R>)
                .delete(crud::delete::<R>),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(cors::Any)
        .allow_headers(cors::Any)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);

    let error = ApiError::internal_server_error("An unexpected error occurred");
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(error.to_json())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("stored value exploded")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn handler_panic_becomes_json_500_and_serving_continues() {
        let router = Router::new()
            .route("/explode", get(explode))
            .route("/fine", get(|| async { "fine" }))
            .layer(CatchPanicLayer::custom(panic_response));

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "An unexpected error occurred");
        assert!(!body.to_string().contains("exploded"));

        let response = router
            .oneshot(Request::builder().uri("/fine").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn panic_payload_types_are_handled() {
        let payloads: [Box<dyn Any + Send>; 3] = [
            Box::new("static message"),
            Box::new(String::from("owned message")),
            Box::new(42_u8),
        ];
        for payload in payloads {
            let response = panic_response(payload);
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_json(response).await["code"], "INTERNAL_SERVER_ERROR");
        }
    }
}
