//! Exercises the route table in-process: `tower::ServiceExt::oneshot`
//! drives the `axum::Router` directly, without binding a real socket.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use trace_engine::{CompilerConfig, EngineLimits};
use trace_server::{handlers::AppState, routes};

const VALID_SOURCE: &str = "int main(){ int x=1; int y=2; int sum=x+y; return 0; }";

fn app() -> axum::Router {
    let state = Arc::new(AppState::new(EngineLimits::default(), CompilerConfig::default()));
    routes::build(state)
}

async fn post(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn start_rejects_missing_code() {
    let (status, body) = post(app(), "/api/debug/start", json!({ "language": "cpp" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn start_rejects_unsupported_language() {
    let (status, body) = post(
        app(),
        "/api/debug/start",
        json!({ "code": VALID_SOURCE, "language": "rust" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn step_forward_rejects_missing_session_id() {
    let (status, body) = post(app(), "/api/debug/step-forward", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn get_state_rejects_missing_step() {
    let (status, body) = post(
        app(),
        "/api/debug/get-state",
        json!({ "sessionId": "does-not-matter" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn unknown_session_is_reported_as_not_found_with_200() {
    let (status, body) = post(
        app(),
        "/api/debug/step-forward",
        json!({ "sessionId": "nonexistent" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Session Not Found");
}

#[tokio::test]
async fn end_on_unknown_session_is_reported_as_not_found() {
    let (status, body) = post(app(), "/api/debug/end", json!({ "sessionId": "nonexistent" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Session Not Found");
}

// The remaining tests need a `g++` on PATH to actually validate `code`; skip
// gracefully (matching session_manager's own conditional assertion) rather
// than fail in toolchain-less environments.

#[tokio::test]
async fn full_session_lifecycle_has_the_documented_wire_shape() {
    let router = app();
    let (status, start_body) = post(
        router.clone(),
        "/api/debug/start",
        json!({ "code": VALID_SOURCE, "language": "cpp" }),
    )
    .await;
    if status != StatusCode::OK || start_body["success"] != true {
        return;
    }
    assert!(start_body["sessionId"].is_string());
    assert!(start_body["totalSteps"].is_number());
    assert!(start_body["initialState"].is_object());

    let session_id = start_body["sessionId"].as_str().unwrap().to_owned();

    let (status, forward_body) = post(
        router.clone(),
        "/api/debug/step-forward",
        json!({ "sessionId": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(forward_body["success"], true);
    assert!(forward_body["state"].is_object());
    assert!(forward_body["step"].is_number());
    assert!(forward_body["totalSteps"].is_number());
    assert!(forward_body["atEnd"].is_boolean());

    let (status, backward_body) = post(
        router.clone(),
        "/api/debug/step-backward",
        json!({ "sessionId": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(backward_body["success"], true);
    assert!(backward_body["atStart"].is_boolean());

    let (status, get_body) = post(
        router.clone(),
        "/api/debug/get-state",
        json!({ "sessionId": session_id, "step": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(get_body["success"], true);
    assert_eq!(get_body["step"], 0);

    let (status, out_of_range_body) = post(
        router.clone(),
        "/api/debug/get-state",
        json!({ "sessionId": session_id, "step": 1_000_000 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(out_of_range_body["error"], "Validation Error");

    let (status, end_body) = post(router, "/api/debug/end", json!({ "sessionId": session_id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(end_body["success"], true);
}

#[tokio::test]
async fn syntactically_invalid_source_is_reported_as_compilation_error() {
    // A rejected compile and a missing toolchain both surface as
    // `CompileError`, so this holds whether or not `g++` is on `PATH`.
    let (status, body) = post(
        app(),
        "/api/debug/start",
        json!({ "code": "int main(){ int x = ; }", "language": "cpp" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Compilation Error");
}
