//! HTTP and WebSocket handlers.

pub mod coordinate;
pub mod health;
pub mod viewer;
pub mod ws;
