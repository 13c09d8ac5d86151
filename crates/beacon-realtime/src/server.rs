//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, mpsc};
use tracing::info;

use beacon_core::config::RealtimeConfig;
use beacon_core::error::AppError;

use crate::message::ClientId;
use crate::metrics::EngineMetrics;
use crate::registry::ConnectionRegistry;
use crate::session::BroadcastSession;

/// Central real-time engine owning the shared registry.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
    /// Set once shutdown has begun; new sessions are refused.
    closing: Arc<AtomicBool>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine.
    pub fn new(config: RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(ConnectionRegistry::new(config.clone(), metrics.clone()));

        info!(
            max_connections = config.max_connections,
            marker_sizing = ?config.marker_sizing,
            "Real-time engine initialized"
        );

        Self {
            registry,
            metrics,
            shutdown_tx,
            closing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Opens a session for a freshly upgraded connection, wired to the
    /// engine's shutdown signal.
    pub async fn open_session(
        &self,
        client_id: ClientId,
    ) -> Result<(BroadcastSession, mpsc::Receiver<String>), AppError> {
        // Subscribe first: a shutdown that starts after the check below is
        // still delivered to this session.
        let shutdown = self.shutdown_receiver();
        if self.closing.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("Server is shutting down"));
        }

        let (session, outbound) = BroadcastSession::open(self.registry.clone(), client_id).await?;
        Ok((session.with_shutdown(shutdown), outbound))
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        info!("Shutting down real-time engine");

        self.closing.store(true, Ordering::SeqCst);

        // Sessions end their loops and unregister themselves
        let _ = self.shutdown_tx.send(());

        self.registry.close_all().await;

        info!("Real-time engine shut down");
        Ok(())
    }
}
