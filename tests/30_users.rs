mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

fn ana() -> serde_json::Value {
    json!({
        "username": "ana",
        "password": "hunter22",
        "email": "ana@example.com",
        "watchlists": ["Weekend"]
    })
}

#[tokio::test]
async fn password_is_never_returned() -> Result<()> {
    let app = TestApp::new();
    let id = app.create("users", "userId", ana(), None).await?;

    let (status, user) = app.get(&format!("/users/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["username"], "ana");
    assert!(user.get("password").is_none(), "{}", user);
    assert!(user.get("passwordHash").is_none(), "{}", user);

    let (_, list) = app.get("/users").await?;
    assert!(list[0].get("passwordHash").is_none(), "{}", list);
    Ok(())
}

#[tokio::test]
async fn user_validation_messages() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/users",
            json!({"username": "ana", "password": "123", "email": "not-an-email", "watchlists": []}),
            None,
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].to_string();
    assert!(errors.contains("Password must be at least 6 characters long"), "{}", errors);
    assert!(errors.contains("Invalid email format"), "{}", errors);
    assert!(errors.contains("Watchlists must contain at least one item"), "{}", errors);
    Ok(())
}

#[tokio::test]
async fn patch_email_keeps_other_fields() -> Result<()> {
    let app = TestApp::new();
    let id = app.create("users", "userId", ana(), None).await?;
    let uri = format!("/users/{}", id);

    let (status, _) = app.patch(&uri, json!({"email": "ana@movies.test"}), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, user) = app.get(&uri).await?;
    assert_eq!(user["email"], "ana@movies.test");
    assert_eq!(user["username"], "ana");
    Ok(())
}
