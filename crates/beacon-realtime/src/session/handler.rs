//! Broadcast session handler: the per-connection receive loop.

use std::fmt::Display;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use beacon_core::result::AppResult;

use crate::connection::ConnectionHandle;
use crate::message::validator::validate_inbound;
use crate::message::{ClientId, Coordinate, OutboundMessage};
use crate::registry::{BroadcastReport, ConnectionRegistry};

use super::{CloseReason, Frame, SessionState, SessionSummary};

/// One client's session against the shared registry.
#[derive(Debug)]
pub struct BroadcastSession {
    registry: Arc<ConnectionRegistry>,
    handle: Arc<ConnectionHandle>,
    state: SessionState,
    messages_handled: u64,
    shutdown: Option<broadcast::Receiver<()>>,
}

impl BroadcastSession {
    /// Registers a connection for `client_id` and opens the session.
    ///
    /// Returns the session and the receiver of frames destined for the
    /// client. Fails if the registry refuses the connection.
    pub async fn open(
        registry: Arc<ConnectionRegistry>,
        client_id: ClientId,
    ) -> AppResult<(Self, mpsc::Receiver<String>)> {
        let (handle, outbound) = registry.register(client_id).await?;

        debug!(conn_id = %handle.id, client_id = %client_id, "Session open");

        let session = Self {
            registry,
            handle,
            state: SessionState::Open,
            messages_handled: 0,
            shutdown: None,
        };
        Ok((session, outbound))
    }

    /// Ends the session when the engine signals shutdown.
    pub fn with_shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The registered connection.
    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }

    /// Handles one inbound text payload.
    ///
    /// Returns `Ok(None)` when the payload was rejected; the client gets an
    /// error reply and nothing is broadcast.
    pub async fn handle_text(&mut self, text: &str) -> AppResult<Option<BroadcastReport>> {
        self.registry.metrics().message_received();

        let coordinate = match self.accept(text) {
            Ok(coordinate) => coordinate,
            Err(reply) => {
                self.reply(&reply);
                return Ok(None);
            }
        };

        let report = self
            .registry
            .record_and_broadcast(self.handle.client_id, coordinate)
            .await?;
        self.messages_handled += 1;
        Ok(Some(report))
    }

    /// Runs the receive loop until the transport closes, faults, the
    /// connection is evicted, or shutdown is signalled; then unregisters.
    pub async fn run<S, E>(mut self, mut inbound: S) -> SessionSummary
    where
        S: Stream<Item = Result<Frame, E>> + Unpin,
        E: Display,
    {
        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = shutdown_requested(self.shutdown.as_mut()) => break CloseReason::Shutdown,
                _ = self.handle.closed() => break CloseReason::Evicted,
                frame = inbound.next() => frame,
            };

            match next {
                Some(Ok(Frame::Text(text))) => {
                    if let Err(e) = self.handle_text(&text).await {
                        break CloseReason::TransportFault(e.to_string());
                    }
                }
                Some(Ok(Frame::Other)) => {}
                Some(Ok(Frame::Close)) | None => break CloseReason::PeerClosed,
                Some(Err(e)) => break CloseReason::TransportFault(e.to_string()),
            }
        };

        self.close(reason).await
    }

    /// Unregisters the connection and ends the session.
    pub async fn close(mut self, reason: CloseReason) -> SessionSummary {
        self.state = SessionState::Closing;
        self.registry.unregister(&self.handle.id).await;
        self.state = SessionState::Closed;

        match &reason {
            CloseReason::TransportFault(e) => warn!(
                conn_id = %self.handle.id,
                client_id = %self.handle.client_id,
                error = %e,
                "Session ended by transport fault"
            ),
            _ => info!(
                conn_id = %self.handle.id,
                client_id = %self.handle.client_id,
                reason = %reason,
                messages = self.messages_handled,
                "Session closed"
            ),
        }

        SessionSummary {
            conn_id: self.handle.id,
            client_id: self.handle.client_id,
            reason,
            messages_handled: self.messages_handled,
        }
    }

    fn accept(&self, text: &str) -> Result<Coordinate, OutboundMessage> {
        let config = self.registry.config();

        validate_inbound(text, config.max_message_bytes)
            .map_err(|e| OutboundMessage::error("INVALID_MESSAGE", e.message))?;

        if config.strict_coordinates {
            Coordinate::strict(text.trim())
                .map_err(|e| OutboundMessage::error("INVALID_COORDINATE", e.message))
        } else {
            Ok(Coordinate::opaque(text))
        }
    }

    fn reply(&self, message: &OutboundMessage) {
        let frame = match serde_json::to_string(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(conn_id = %self.handle.id, error = %e, "Failed to serialize reply");
                return;
            }
        };
        if let Err(e) = self.handle.send(frame) {
            debug!(conn_id = %self.handle.id, error = %e, "Reply not delivered");
        }
    }
}

async fn shutdown_requested(shutdown: Option<&mut broadcast::Receiver<()>>) {
    match shutdown {
        Some(rx) => {
            let _ = rx.recv().await;
        }
        None => std::future::pending().await,
    }
}
