//! Admin API integration tests driven through the axum router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use folio_core::db::DatabaseService;
use folio_core::http::{create_router, AppState};
use folio_core::services::RestrictedSanitizer;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

async fn test_app() -> (TempDir, Router) {
    let temp = TempDir::new().unwrap();
    let db = Arc::new(
        DatabaseService::new(temp.path().join("folio.db"))
            .await
            .unwrap(),
    );
    let state = AppState::new(db, Arc::new(RestrictedSanitizer::default()));
    (temp, create_router(state))
}

fn request(method: &str, uri: &str, role: &str, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "1")
        .header("x-user-role", role);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_page(app: &Router, parent_id: Option<i64>, title: &str) -> i64 {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/pages",
            "editor",
            Some(json!({ "parentId": parent_id, "language": "en", "title": title })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (_temp, app) = test_app().await;
    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_identity_headers_are_unauthorized() {
    let (_temp, app) = test_app().await;
    let response = app
        .oneshot(Request::get("/api/pages").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reorder_reports_changed_paths() {
    let (_temp, app) = test_app().await;
    let section = create_page(&app, None, "Section").await;
    let page = create_page(&app, None, "Page").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/pages/reorder",
            "editor",
            Some(json!({ "nodeId": page, "newParentId": section, "newIndex": 0 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(
        body["changedPaths"][page.to_string()]["en"],
        json!("/section/page")
    );
}

#[tokio::test]
async fn test_reorder_into_own_subtree_is_conflict() {
    let (_temp, app) = test_app().await;
    let parent = create_page(&app, None, "Parent").await;
    let child = create_page(&app, Some(parent), "Child").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/pages/reorder",
            "editor",
            Some(json!({ "nodeId": parent, "newParentId": child, "newIndex": 0 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("CYCLE"));
    assert_eq!(body["ok"], json!(false));
}

#[tokio::test]
async fn test_missing_page_is_not_found() {
    let (_temp, app) = test_app().await;
    let (status, body) = send(&app, request("GET", "/api/pages/4242", "editor", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_invalid_media_type_filter_is_rejected() {
    let (_temp, app) = test_app().await;
    let (status, _body) = send(
        &app,
        request("GET", "/api/media?type=spreadsheet", "editor", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_settings_write_requires_admin() {
    let (_temp, app) = test_app().await;

    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/settings/site.default_language",
            "editor",
            Some(json!({ "value": "de" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("FORBIDDEN"));

    let (status, _body) = send(
        &app,
        request(
            "PUT",
            "/api/settings/site.default_language",
            "admin",
            Some(json!({ "value": "de" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request("GET", "/api/settings/site.default_language", "editor", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], json!("de"));
}

#[tokio::test]
async fn test_user_creation_requires_admin() {
    let (_temp, app) = test_app().await;
    let payload = json!({ "username": "ada", "email": "ada@example.com", "role": "editor" });

    let (status, _body) = send(
        &app,
        request("POST", "/api/users", "editor", Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request("POST", "/api/users", "admin", Some(payload))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], json!("ada"));
}

#[tokio::test]
async fn test_trash_listing_and_restore() {
    let (_temp, app) = test_app().await;
    let page = create_page(&app, None, "Doomed").await;

    let (status, _body) = send(
        &app,
        request("DELETE", &format!("/api/pages/{}", page), "editor", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request("GET", "/api/trash/pages", "editor", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _body) = send(
        &app,
        request(
            "POST",
            &format!("/api/trash/pages/{}/restore", page),
            "editor",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _body) = send(
        &app,
        request("GET", &format!("/api/pages/{}", page), "editor", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
