//! Integration tests for WebSocket connection and messaging.

mod helpers;

use beacon_core::config::AppConfig;
use http::StatusCode;
use tokio_tungstenite::tungstenite;

use helpers::{TestServer, next_json, send_text, wait_closed};

#[tokio::test]
async fn test_two_clients_see_growing_markers() {
    let server = TestServer::spawn(AppConfig::default()).await;
    let mut alice = server.connect(1).await;
    let mut bob = server.connect(2).await;

    send_text(&mut alice, "10.0,20.0").await;
    for ws in [&mut alice, &mut bob] {
        let frame = next_json(ws).await;
        assert_eq!(frame["type"], "markers");
        assert_eq!(frame["message"], "user 1's location: 10.0,20.0");
        assert_eq!(frame["markers"]["1"]["coordinate"], "10.0,20.0");
        assert_eq!(frame["markers"]["1"]["size"], 41);
    }

    send_text(&mut bob, "30.0,40.0").await;
    for ws in [&mut alice, &mut bob] {
        let frame = next_json(ws).await;
        assert_eq!(frame["markers"]["2"]["size"], 42);
        assert_eq!(frame["markers"]["1"]["size"], 41);
    }

    send_text(&mut alice, "11.0,21.0").await;
    for ws in [&mut alice, &mut bob] {
        let frame = next_json(ws).await;
        assert_eq!(frame["markers"]["1"]["coordinate"], "11.0,21.0");
        assert_eq!(frame["markers"]["1"]["size"], 43);
        assert_eq!(frame["markers"]["2"]["size"], 42);
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_departure_is_broadcast_to_remaining_clients() {
    let server = TestServer::spawn(AppConfig::default()).await;
    let mut alice = server.connect(1).await;
    let mut bob = server.connect(2).await;

    send_text(&mut alice, "5.0,6.0").await;
    next_json(&mut alice).await;
    next_json(&mut bob).await;

    alice.close(None).await.expect("Failed to close");

    let frame = next_json(&mut bob).await;
    assert_eq!(frame["type"], "markers");
    assert_eq!(frame["message"], "user 1 left");
    assert!(frame["markers"].as_object().unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_upgrade_refused_when_registry_full() {
    let mut config = AppConfig::default();
    config.realtime.max_connections = 1;
    let server = TestServer::spawn(config).await;

    let _first = server.connect(1).await;

    match tokio_tungstenite::connect_async(server.ws_url(2)).await {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
        Err(other) => panic!("Expected HTTP 503, got {other}"),
        Ok(_) => panic!("Expected handshake to be refused"),
    }

    assert_eq!(server.engine.registry.connection_count().await, 1);
    assert_eq!(server.engine.metrics.snapshot().connections_rejected, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_strict_mode_answers_bad_coordinate_with_error() {
    let mut config = AppConfig::default();
    config.realtime.strict_coordinates = true;
    let server = TestServer::spawn(config).await;
    let mut alice = server.connect(1).await;

    send_text(&mut alice, "north pole").await;
    let frame = next_json(&mut alice).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["code"], "INVALID_COORDINATE");
    assert_eq!(server.engine.registry.marker_count().await, 0);

    send_text(&mut alice, "45.5,-73.6").await;
    let frame = next_json(&mut alice).await;
    assert_eq!(frame["markers"]["1"]["size"], 41);

    server.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_open_connections() {
    let server = TestServer::spawn(AppConfig::default()).await;
    let mut alice = server.connect(1).await;
    let engine = server.engine.clone();

    server.shutdown().await;

    assert!(wait_closed(&mut alice).await);
    assert_eq!(engine.registry.connection_count().await, 0);
}
