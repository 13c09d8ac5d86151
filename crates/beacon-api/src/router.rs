//! Route definitions for the Beacon HTTP API.
//!
//! The router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with all routes, without middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::viewer::viewer))
        .route("/coordinate", post(handlers::coordinate::echo_coordinate))
        .route("/coordinate/", post(handlers::coordinate::echo_coordinate))
        .route("/ws/{client_id}", get(handlers::ws::ws_upgrade))
        .nest("/api", health_routes())
        .with_state(state)
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
