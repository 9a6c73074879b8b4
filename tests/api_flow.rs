//! Handler-level tests through the full router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use gitvault::api::build_router;
use gitvault::config::AppConfig;
use gitvault::startup::build_state;

fn test_router() -> (TempDir, Router) {
    let dir = TempDir::new().expect("create temp base dir");
    let mut config = AppConfig::default();
    config.configserver.base_path = dir.path().to_string_lossy().to_string();

    let state = build_state(&config).expect("build service state");
    (dir, build_router(state))
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn config_payload(action: &str) -> Value {
    json!({
        "appName": "user-svc",
        "namespace": "prod",
        "path": "/",
        "action": action,
        "email": "dev@example.com",
    })
}

#[tokio::test]
async fn test_namespace_lifecycle_over_http() {
    let (_dir, router) = test_router();

    let (status, body) = post(&router, "/namespace/create", json!({ "namespace": "prod" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Namespace created successfully");

    let (status, body) = post(&router, "/namespace/create", json!({ "namespace": "prod" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "NAMESPACE_ALREADY_EXISTS");

    let (status, body) = post(&router, "/namespace/list", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["prod"]));

    let (status, body) = post(&router, "/namespace/create", json!({ "namespace": "admin" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_NAMESPACE");

    let (status, _) = post(&router, "/namespace/delete", json!({ "namespace": "prod" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&router, "/namespace/delete", json!({ "namespace": "prod" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorCode"], "NAMESPACE_NOT_FOUND");
}

#[tokio::test]
async fn test_config_lifecycle_over_http() {
    let (_dir, router) = test_router();
    post(&router, "/namespace/create", json!({ "namespace": "prod" })).await;

    let (status, _) = post(&router, "/config/create", config_payload("create")).await;
    assert_eq!(status, StatusCode::CREATED);

    // Action mismatch is rejected before any repository work.
    let (status, body) = post(&router, "/config/fetch", config_payload("create")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_ACTION_TYPE");

    let (status, body) = post(&router, "/config/fetch", config_payload("fetch")).await;
    assert_eq!(status, StatusCode::OK);
    let content = body["content"].as_str().unwrap();
    assert!(content.contains("name: user-svc"));
    let commit_id = body["commitId"].as_str().unwrap().to_string();
    assert_eq!(commit_id.len(), 40);

    let mut update = config_payload("update");
    update["content"] = json!("server:\n  port: 9191\n");
    update["message"] = json!("Bump port");
    update["commitId"] = json!(commit_id);
    let (status, body) = post(&router, "/config/update", update.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let new_commit = body["commitId"].as_str().unwrap().to_string();
    assert_ne!(new_commit, commit_id);

    // Replaying the same base commit conflicts.
    let (status, body) = post(&router, "/config/update", update).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "CONFIG_CONFLICT");

    let (status, body) = post(&router, "/config/history", config_payload("history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commits"].as_array().unwrap().len(), 2);

    let mut changes = config_payload("changes");
    changes["commitId"] = json!(new_commit);
    let (status, body) = post(&router, "/config/changes", changes).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["changes"].as_str().unwrap().contains("+  port: 9191"));

    let mut delete = config_payload("delete");
    delete["message"] = json!("Remove user-svc");
    let (status, _) = post(&router, "/config/delete", delete).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&router, "/config/fetch", config_payload("fetch")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorCode"], "CONFIG_FILE_NOT_FOUND");
}

#[tokio::test]
async fn test_update_requires_commit_id() {
    let (_dir, router) = test_router();
    post(&router, "/namespace/create", json!({ "namespace": "prod" })).await;
    post(&router, "/config/create", config_payload("create")).await;

    let mut update = config_payload("update");
    update["content"] = json!("a: 1\n");
    update["message"] = json!("No base commit");
    let (status, body) = post(&router, "/config/update", update).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "MISSING_COMMIT_ID");
}

#[tokio::test]
async fn test_vault_endpoints_over_http() {
    let (_dir, router) = test_router();
    post(&router, "/namespace/create", json!({ "namespace": "prod" })).await;

    let (status, body) = post(
        &router,
        "/vault/update",
        json!({
            "namespace": "prod",
            "email": "dev@example.com",
            "commitMessage": "Seed vault",
            "db.password": "s3cret",
            "api.token": "t-42",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (status, body) = post(&router, "/vault/get", json!({ "namespace": "prod" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["secrets"]["db.password"], "s3cret");
    assert_eq!(body["secrets"]["api.token"], "t-42");

    let (status, body) = post(&router, "/vault/get", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_NAMESPACE");
}

#[tokio::test]
async fn test_resolver_endpoint_over_http() {
    let (_dir, router) = test_router();
    post(&router, "/namespace/create", json!({ "namespace": "prod" })).await;
    post(&router, "/config/create", config_payload("create")).await;

    post(
        &router,
        "/vault/update",
        json!({
            "namespace": "prod",
            "email": "dev@example.com",
            "commitMessage": "Seed vault",
            "db.password": "s3cret",
        }),
    )
    .await;

    let (_, fetched) = post(&router, "/config/fetch", config_payload("fetch")).await;
    let mut update = config_payload("update");
    update["content"] = json!("db:\n  password: stub\n  host: pg\n");
    update["message"] = json!("Add db block");
    update["commitId"] = fetched["commitId"].clone();
    let (status, updated) = post(&router, "/config/update", update).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&router, "/user-svc/default/prod").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "user-svc");
    assert_eq!(body["version"], updated["commitId"]);
    let source = &body["propertySources"][0];
    assert_eq!(source["name"], "merged-user-svc-default");
    assert_eq!(source["source"]["db.password"], "s3cret");
    assert_eq!(source["source"]["db.host"], "pg");

    let (status, body) = get(&router, "/ghost/default/prod").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorCode"], "CONFIG_FILE_NOT_FOUND");
}

#[tokio::test]
async fn test_notifications_visible_after_update() {
    let (_dir, router) = test_router();
    post(&router, "/namespace/create", json!({ "namespace": "prod" })).await;
    post(&router, "/config/create", config_payload("create")).await;

    let (_, fetched) = post(&router, "/config/fetch", config_payload("fetch")).await;
    let mut update = config_payload("update");
    update["content"] = json!("a: 1\n");
    update["message"] = json!("Touch");
    update["commitId"] = fetched["commitId"].clone();
    let (_, updated) = post(&router, "/config/update", update).await;

    let (status, body) = post(&router, "/namespace/notify", json!({ "namespace": "prod" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalNotifications"], 1);
    let notification = &body["notifications"][0];
    assert_eq!(notification["id"], updated["commitId"]);
    assert_eq!(notification["status"], "SUCCESS");
}
