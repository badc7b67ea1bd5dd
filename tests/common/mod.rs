#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use movies_to_watch_api::app::{app, AppState};
use movies_to_watch_api::auth::issue_session_token;
use movies_to_watch_api::config::{AppConfig, StoreBackend};
use movies_to_watch_api::database::{DocumentStore, MemoryStore};

pub const ALICE: &str = "60c72b2f9e1d9f4d2c96b3a1";
pub const BOB: &str = "60c72b2f9e1d9f4d2c96b3b2";
pub const ABSENT_ID: &str = "60c72b2f9e1d9f4d2c96b3ff";

/// The whole router over a fresh in-memory store, driven without a socket.
pub struct TestApp {
    router: Router,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let mut config = AppConfig::development();
        config.database.backend = StoreBackend::Memory;
        config.security.bcrypt_cost = 4;

        let router = app(AppState::new(store, config.clone()));
        Self { router, config }
    }

    pub fn token(&self, user_id: &str) -> String {
        issue_session_token(&self.config.security, user_id, None).expect("issue token")
    }

    pub fn named_token(&self, user_id: &str, name: &str) -> String {
        issue_session_token(&self.config.security, user_id, Some(name.to_string())).expect("issue token")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| {
                format!("response was not JSON: {}", String::from_utf8_lossy(&bytes))
            })?
        };
        Ok((status, body))
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, Some(body), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, uri, Some(body), token).await
    }

    pub async fn patch(&self, uri: &str, body: Value, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, uri, Some(body), token).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, None, token).await
    }

    /// POST `body` and return the new document's id from the `<name>Id` key.
    pub async fn create(&self, collection: &str, id_key: &str, body: Value, token: Option<&str>) -> Result<String> {
        let (status, res) = self.post(&format!("/{}", collection), body, token).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create {} failed: {} {}", collection, status, res);
        res.get(id_key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .with_context(|| format!("missing {} in {}", id_key, res))
    }
}
