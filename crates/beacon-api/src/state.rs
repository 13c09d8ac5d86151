//! Shared application state passed to every handler.

use std::sync::Arc;
use std::time::Instant;

use beacon_core::config::AppConfig;
use beacon_realtime::RealtimeEngine;

/// State threaded through the router via `with_state`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Realtime engine (registry, metrics, shutdown).
    pub realtime: RealtimeEngine,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Builds the state and a fresh realtime engine from configuration.
    pub fn new(config: AppConfig) -> Self {
        let realtime = RealtimeEngine::new(config.realtime.clone());
        Self {
            config: Arc::new(config),
            realtime,
            started_at: Instant::now(),
        }
    }
}
