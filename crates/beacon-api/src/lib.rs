//! # beacon-api
//!
//! HTTP layer for Beacon built on Axum.
//!
//! Serves the viewer page, the coordinate echo endpoint, health checks and
//! the `/ws/{client_id}` WebSocket upgrade that feeds the realtime engine.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server, serve};
pub use error::ApiError;
pub use state::AppState;
