use axum::http::StatusCode;
use circlebook::api;
use circlebook::db::init_db;
use circlebook::domain::TelegramId;
use circlebook::Repository;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    repo: Arc<Repository>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let database_url = format!("sqlite:{}", temp_dir.path().join("test.db").display());
    let pool = init_db(&database_url).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let app = api::create_router(api::AppState::new(repo.clone()));

    TestApp {
        app,
        repo,
        _temp: temp_dir,
    }
}

async fn post_user(app: &axum::Router, body: &str) -> (StatusCode, Value) {
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/user")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_post_user_is_idempotent() {
    let test_app = setup_test_app().await;

    let (status, first) = post_user(&test_app.app, r#"{"telegram_id": "123456"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = post_user(&test_app.app, r#"{"telegram_id": "123456"}"#).await;
    assert_eq!(status, StatusCode::OK);

    assert!(first["user_id"].is_i64());
    assert_eq!(first["user_id"], second["user_id"]);

    let tg = TelegramId::from_str("123456").unwrap();
    assert_eq!(test_app.repo.count_users(&tg).await.unwrap(), 1);
}

#[tokio::test]
async fn test_numeric_and_string_ids_resolve_to_same_user() {
    let test_app = setup_test_app().await;

    let (_, from_number) = post_user(&test_app.app, r#"{"telegram_id": 42}"#).await;
    let (_, from_string) = post_user(&test_app.app, r#"{"telegram_id": "42"}"#).await;
    assert_eq!(from_number["user_id"], from_string["user_id"]);
}

#[tokio::test]
async fn test_distinct_ids_get_distinct_users() {
    let test_app = setup_test_app().await;

    let (_, a) = post_user(&test_app.app, r#"{"telegram_id": "a"}"#).await;
    let (_, b) = post_user(&test_app.app, r#"{"telegram_id": "b"}"#).await;
    assert_ne!(a["user_id"], b["user_id"]);
}

#[tokio::test]
async fn test_missing_or_empty_telegram_id_is_rejected() {
    let test_app = setup_test_app().await;

    for body in [r#"{}"#, r#"{"telegram_id": ""}"#, r#"{"telegram_id": null}"#] {
        let (status, json) = post_user(&test_app.app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json, json!({"error": "telegram_id required"}));
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let test_app = setup_test_app().await;

    let (status, json) = post_user(&test_app.app, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}
