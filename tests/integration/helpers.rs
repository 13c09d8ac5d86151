//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use futures::{SinkExt, StreamExt};
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use beacon_api::{AppState, build_app};
use beacon_core::config::AppConfig;
use beacon_realtime::RealtimeEngine;

/// Client side of a WebSocket connection to the test server.
pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits for a frame before failing.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test application context for in-process HTTP requests
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Realtime engine behind the router
    pub engine: RealtimeEngine,
}

impl TestApp {
    /// Create a new test application with default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application from an explicit configuration
    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(config);
        let engine = state.realtime.clone();
        Self {
            router: build_app(state),
            engine,
        }
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            content_type,
            text,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header, empty if absent
    pub content_type: String,
    /// Raw body text
    pub text: String,
    /// Parsed JSON body, `Null` if the body is not JSON
    pub body: Value,
}

/// A server bound to an ephemeral port on loopback.
pub struct TestServer {
    /// Bound address
    pub addr: SocketAddr,
    /// Realtime engine shared with the server
    pub engine: RealtimeEngine,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the given configuration
    pub async fn spawn(config: AppConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");

        let state = AppState::new(config);
        let engine = state.realtime.clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let signal = async move {
                let _ = shutdown_rx.await;
            };
            beacon_api::serve(listener, state, signal)
                .await
                .expect("Server failed");
        });

        Self {
            addr,
            engine,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// WebSocket URL for a client id
    pub fn ws_url(&self, client_id: i64) -> String {
        format!("ws://{}/ws/{}", self.addr, client_id)
    }

    /// Connect a WebSocket client as `client_id`
    pub async fn connect(&self, client_id: i64) -> WsClient {
        let (ws, _) = tokio_tungstenite::connect_async(self.ws_url(client_id))
            .await
            .expect("WebSocket handshake failed");
        ws
    }

    /// Fire the shutdown signal and wait for the server task to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(10), &mut self.handle)
            .await
            .expect("Server did not shut down in time")
            .expect("Server task panicked");
    }
}

/// Send a text frame
pub async fn send_text(ws: &mut WsClient, text: &str) {
    ws.send(Message::text(text))
        .await
        .expect("Failed to send frame");
}

/// Wait for the next text frame and parse it as JSON
pub async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let message = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Stream ended")
            .expect("WebSocket error");

        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
        }
    }
}

/// Returns true once the server has closed the stream
pub async fn wait_closed(ws: &mut WsClient) -> bool {
    loop {
        match tokio::time::timeout(RECV_TIMEOUT, ws.next()).await {
            Err(_) => return false,
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
        }
    }
}
