//! Connection registry: live connections plus derived marker state.
//!
//! Every operation runs under a single registry-wide lock, so the marker
//! map, the arrival counter and the connection set are always observed
//! together. Fan-out uses non-blocking queue pushes and never suspends
//! while the lock is held.

mod markers;

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use beacon_core::config::RealtimeConfig;
use beacon_core::error::AppError;
use beacon_core::result::AppResult;

use crate::connection::{ConnectionHandle, ConnectionId, ConnectionInfo};
use crate::message::{ClientId, Coordinate, MarkerMap, OutboundMessage};
use crate::metrics::EngineMetrics;

use self::markers::MarkerBook;

/// Per-peer outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Connections a send was attempted on.
    pub attempted: usize,
    /// Frames queued successfully.
    pub delivered: usize,
    /// Connections removed because their queue was closed or full.
    pub evicted: Vec<ConnectionId>,
    /// Clients whose marker was cleared by those evictions.
    pub departed: Vec<ClientId>,
}

/// Result of [`ConnectionRegistry::record_and_broadcast`].
#[derive(Debug, Clone)]
pub struct BroadcastReport {
    /// Size assigned to the sender's marker.
    pub size: u64,
    /// Status line that was sent.
    pub status: String,
    /// Markers once the broadcast and any evictions are done.
    pub markers: MarkerMap,
    /// Per-peer outcome.
    pub delivery: Delivery,
}

#[derive(Debug)]
struct RegistryState {
    connections: Vec<Arc<ConnectionHandle>>,
    book: MarkerBook,
}

/// Shared registry of open connections and their markers.
#[derive(Debug)]
pub struct ConnectionRegistry {
    state: Mutex<RegistryState>,
    config: RealtimeConfig,
    metrics: Arc<EngineMetrics>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new(config: RealtimeConfig, metrics: Arc<EngineMetrics>) -> Self {
        let book = MarkerBook::new(config.marker_base_size, config.marker_sizing);
        Self {
            state: Mutex::new(RegistryState {
                connections: Vec::new(),
                book,
            }),
            config,
            metrics,
        }
    }

    /// Registers a new connection with no marker.
    ///
    /// Returns the connection handle and the receiver for its outbound
    /// frames. Fails with a capacity error when the registry is full.
    pub async fn register(
        &self,
        client_id: ClientId,
    ) -> AppResult<(Arc<ConnectionHandle>, mpsc::Receiver<String>)> {
        let mut state = self.state.lock().await;

        if state.connections.len() >= self.config.max_connections {
            self.metrics.connection_rejected();
            warn!(
                client_id = %client_id,
                max = self.config.max_connections,
                "Registry at capacity, rejecting connection"
            );
            return Err(AppError::capacity(format!(
                "Connection limit of {} reached",
                self.config.max_connections
            )));
        }

        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(client_id, tx));
        state.connections.push(handle.clone());
        self.metrics.connection_opened();

        info!(
            conn_id = %handle.id,
            client_id = %client_id,
            connections = state.connections.len(),
            "Connection registered"
        );

        Ok((handle, rx))
    }

    /// Removes a connection. Unknown IDs are a no-op returning `false`.
    ///
    /// If this clears the client's marker, the remaining connections are
    /// sent the updated marker map.
    pub async fn unregister(&self, conn_id: &ConnectionId) -> bool {
        let mut state = self.state.lock().await;

        let Some(pos) = state.connections.iter().position(|c| c.id == *conn_id) else {
            debug!(conn_id = %conn_id, "Unregister of unknown connection ignored");
            return false;
        };

        let handle = state.connections.remove(pos);
        handle.mark_closed();
        self.metrics.connection_closed();

        if release_marker(&mut state, handle.client_id) {
            let message = OutboundMessage::departure(handle.client_id, state.book.snapshot());
            if let Err(e) = self.broadcast_locked(&mut state, &message) {
                error!(error = %e, "Failed to serialize departure message");
            }
        }

        info!(
            conn_id = %conn_id,
            client_id = %handle.client_id,
            connections = state.connections.len(),
            "Connection unregistered"
        );

        true
    }

    /// Records a location update and sends the full marker map to every
    /// registered connection, the sender included.
    pub async fn record_and_broadcast(
        &self,
        client_id: ClientId,
        coordinate: Coordinate,
    ) -> AppResult<BroadcastReport> {
        let mut state = self.state.lock().await;

        let size = state.book.record(client_id, coordinate.clone());
        let status = OutboundMessage::location_status(client_id, &coordinate);
        let message = OutboundMessage::snapshot(status.clone(), state.book.snapshot());
        let delivery = self.broadcast_locked(&mut state, &message)?;

        debug!(
            client_id = %client_id,
            size,
            arrivals = state.book.arrivals(),
            attempted = delivery.attempted,
            delivered = delivery.delivered,
            "Location broadcast"
        );

        Ok(BroadcastReport {
            size,
            status,
            markers: state.book.snapshot(),
            delivery,
        })
    }

    /// Fans `message` out, then announces every client whose marker went
    /// away with an evicted connection. Returns the outcome of the first
    /// fan-out.
    fn broadcast_locked(
        &self,
        state: &mut RegistryState,
        message: &OutboundMessage,
    ) -> AppResult<Delivery> {
        let delivery = self.fan_out(state, message)?;

        let mut departed: VecDeque<ClientId> = delivery.departed.iter().copied().collect();
        while let Some(client_id) = departed.pop_front() {
            if state.connections.is_empty() {
                break;
            }
            let departure = OutboundMessage::departure(client_id, state.book.snapshot());
            let follow_up = self.fan_out(state, &departure)?;
            departed.extend(follow_up.departed);
        }

        Ok(delivery)
    }

    /// Sends `message` to every connection in registration order, then
    /// evicts every connection that could not take the frame.
    fn fan_out(
        &self,
        state: &mut RegistryState,
        message: &OutboundMessage,
    ) -> AppResult<Delivery> {
        let frame = serde_json::to_string(message)?;
        let mut delivery = Delivery::default();

        for conn in &state.connections {
            delivery.attempted += 1;
            match conn.send(frame.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(e) => {
                    warn!(
                        conn_id = %conn.id,
                        client_id = %conn.client_id,
                        error = %e,
                        "Delivery failed, evicting connection"
                    );
                    delivery.evicted.push(conn.id);
                }
            }
        }

        if !delivery.evicted.is_empty() {
            let (dead, alive): (Vec<_>, Vec<_>) = state
                .connections
                .drain(..)
                .partition(|c| delivery.evicted.contains(&c.id));
            state.connections = alive;

            for conn in dead {
                conn.mark_closed();
                self.metrics.connection_evicted();
                if release_marker(state, conn.client_id) {
                    delivery.departed.push(conn.client_id);
                }
                info!(conn_id = %conn.id, client_id = %conn.client_id, "Connection evicted");
            }
        }

        self.metrics.broadcast(delivery.delivered as u64, delivery.evicted.len() as u64);
        Ok(delivery)
    }

    /// Drops every connection and marker.
    pub async fn close_all(&self) {
        let mut state = self.state.lock().await;
        let count = state.connections.len();
        for conn in state.connections.drain(..) {
            conn.mark_closed();
            self.metrics.connection_closed();
        }
        state.book.clear();
        info!(count, "All connections closed");
    }

    /// Returns whether a connection is registered.
    pub async fn contains(&self, conn_id: &ConnectionId) -> bool {
        let state = self.state.lock().await;
        state.connections.iter().any(|c| c.id == *conn_id)
    }

    /// Returns the number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }

    /// Returns the number of markers.
    pub async fn marker_count(&self) -> usize {
        self.state.lock().await.book.len()
    }

    /// Returns a copy of the current markers.
    pub async fn markers(&self) -> MarkerMap {
        self.state.lock().await.book.snapshot()
    }

    /// Returns info for every registered connection, in registration order.
    pub async fn connections(&self) -> Vec<ConnectionInfo> {
        let state = self.state.lock().await;
        state.connections.iter().map(|c| c.info()).collect()
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Returns the metrics sink.
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }
}

/// Clears a client's marker unless another open connection shares its ID.
fn release_marker(state: &mut RegistryState, client_id: ClientId) -> bool {
    if state.connections.iter().any(|c| c.client_id == client_id) {
        return false;
    }
    state.book.remove(&client_id).is_some()
}
