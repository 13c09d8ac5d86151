//! Response bodies for the HTTP endpoints.

use serde::{Deserialize, Serialize};

use beacon_realtime::MetricsSnapshot;

/// Basic health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status string
    pub status: String,
    /// Server version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Detailed health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status
    pub status: String,
    /// Server version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Open WebSocket connections
    pub ws_connections: usize,
    /// Clients with a marker
    pub markers: usize,
    /// Engine counters
    pub metrics: MetricsSnapshot,
}
