//! Integration tests for the plain HTTP endpoints.

mod helpers;

use http::StatusCode;
use serde_json::json;

use beacon_realtime::Coordinate;

use helpers::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_detailed_health_reports_realtime_state() {
    let app = TestApp::new();
    let (_handle, _rx) = app
        .engine
        .registry
        .register(7.into())
        .await
        .expect("register");
    app.engine
        .registry
        .record_and_broadcast(7.into(), Coordinate::opaque("1.0,2.0"))
        .await
        .expect("broadcast");

    let response = app.request("GET", "/api/health/detailed", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["ws_connections"], 1);
    assert_eq!(response.body["markers"], 1);
    assert_eq!(response.body["metrics"]["broadcasts"], 1);
    assert_eq!(response.body["metrics"]["messages_sent"], 1);
}

#[tokio::test]
async fn test_viewer_page_served_at_root() {
    let app = TestApp::new();

    let response = app.request("GET", "/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.content_type.starts_with("text/html"));
    assert!(response.text.contains("/ws/"));
}

#[tokio::test]
async fn test_coordinate_echo() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/coordinate/",
            Some(json!({"latitude": 48.85, "longitude": 2.35})),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"latitude": 48.85, "longitude": 2.35}));
}

#[tokio::test]
async fn test_coordinate_echo_rejects_bad_longitude() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/coordinate",
            Some(json!({"latitude": 0.0, "longitude": 200.0})),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();

    let response = app.request("GET", "/nope", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
