mod common;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use bson::oid::ObjectId;
use common::{TestApp, ABSENT_ID, ALICE};
use serde_json::json;

use movies_to_watch_api::database::{DeleteResult, Document, DocumentStore, StoreError, Update, UpdateResult};

const DRIVER_TEXT: &str = "connection refused by pg_hba.conf";

/// Every call fails the way a lost database connection would.
struct BrokenStore;

#[async_trait]
impl DocumentStore for BrokenStore {
    async fn find(&self, _: &str) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Query(DRIVER_TEXT.into()))
    }

    async fn find_one(&self, _: &str, _: &ObjectId) -> Result<Option<Document>, StoreError> {
        Err(StoreError::Query(DRIVER_TEXT.into()))
    }

    async fn insert_one(&self, _: &str, _: Document) -> Result<ObjectId, StoreError> {
        Err(StoreError::Query(DRIVER_TEXT.into()))
    }

    async fn replace_one(&self, _: &str, _: &ObjectId, _: Document) -> Result<UpdateResult, StoreError> {
        Err(StoreError::Query(DRIVER_TEXT.into()))
    }

    async fn update_one(&self, _: &str, _: &ObjectId, _: Update) -> Result<UpdateResult, StoreError> {
        Err(StoreError::Query(DRIVER_TEXT.into()))
    }

    async fn delete_one(&self, _: &str, _: &ObjectId) -> Result<DeleteResult, StoreError> {
        Err(StoreError::Query(DRIVER_TEXT.into()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(DRIVER_TEXT.into()))
    }
}

const COLLECTIONS: &[(&str, &str)] = &[
    ("movies", "Movie"),
    ("users", "User"),
    ("reviews", "Review"),
    ("watchlists", "Watchlist"),
    ("courses", "Course"),
    ("students", "Student"),
];

#[tokio::test]
async fn invalid_id_is_400_for_every_resource() -> Result<()> {
    // A broken store proves the id is rejected before any store call.
    let app = TestApp::with_store(Arc::new(BrokenStore));

    for (collection, label) in COLLECTIONS {
        let (status, body) = app.get(&format!("/{}/not-a-valid-id", collection)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", collection);
        assert_eq!(body["error"], format!("Invalid {} ID format", label));
    }
    Ok(())
}

#[tokio::test]
async fn absent_id_is_404_for_every_resource() -> Result<()> {
    let app = TestApp::new();

    for (collection, label) in COLLECTIONS {
        let (status, body) = app.get(&format!("/{}/{}", collection, ABSENT_ID)).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", collection);
        assert_eq!(body["error"], format!("{} not found", label));
    }
    Ok(())
}

#[tokio::test]
async fn store_failures_are_500_without_driver_text() -> Result<()> {
    let app = TestApp::with_store(Arc::new(BrokenStore));
    let token = app.token(ALICE);

    let (status, body) = app.get("/movies").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An error occurred while retrieving movies");
    assert!(!body.to_string().contains(DRIVER_TEXT));

    let (status, body) = app.get(&format!("/reviews/{}", ABSENT_ID)).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains(DRIVER_TEXT));

    let (status, body) = app
        .post(
            "/courses",
            json!({"courseCode": "CSE341", "courseName": "Web Services", "instructor": "Birch", "semester": "Fall"}),
            Some(&token),
        )
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains(DRIVER_TEXT));
    Ok(())
}

#[tokio::test]
async fn health_is_503_when_store_is_down() -> Result<()> {
    let app = TestApp::with_store(Arc::new(BrokenStore));

    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!body.to_string().contains(DRIVER_TEXT));
    Ok(())
}

#[tokio::test]
async fn non_object_body_is_400() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.post("/movies", json!([1, 2, 3]), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
