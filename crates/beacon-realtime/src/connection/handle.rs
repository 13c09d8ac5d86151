//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

use crate::message::ClientId;

/// Unique connection identifier (handle identity).
pub type ConnectionId = Uuid;

/// Why a frame could not be queued for a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The peer's outbound queue is gone; the connection is dead.
    #[error("connection closed")]
    Closed,
    /// The peer's outbound queue is full; this frame was dropped.
    #[error("send buffer full")]
    Full,
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender half of the connection's outbound queue. The receiving
/// half belongs to the task that writes frames onto the socket.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Client identifier supplied by the transport (not unique)
    pub client_id: ClientId,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<String>,
    alive: AtomicBool,
    closed: Notify,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(client_id: ClientId, sender: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            connected_at: Utc::now(),
            sender,
            alive: AtomicBool::new(true),
            closed: Notify::new(),
        }
    }

    /// Queue a serialized frame for this connection.
    ///
    /// Never suspends. A closed queue marks the handle dead.
    pub fn send(&self, frame: String) -> Result<(), DeliveryError> {
        if !self.is_alive() {
            return Err(DeliveryError::Closed);
        }
        match self.sender.try_send(frame) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                Err(DeliveryError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                Err(DeliveryError::Closed)
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as closed
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.closed.notify_waiters();
    }

    /// Resolves once the connection has been marked closed.
    pub async fn closed(&self) {
        let notified = self.closed.notified();
        if !self.is_alive() {
            return;
        }
        notified.await;
    }

    /// Get a snapshot of connection info
    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            client_id: self.client_id,
            connected_at: self.connected_at,
            alive: self.is_alive(),
        }
    }
}

/// Snapshot of connection info (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// Client ID
    pub client_id: ClientId,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Is alive
    pub alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(ClientId::new(7), tx);

        handle.send("hello".to_string()).unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }

    #[test]
    fn test_send_to_dropped_receiver_marks_closed() {
        let (tx, rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(ClientId::new(7), tx);
        drop(rx);

        assert_eq!(handle.send("x".to_string()), Err(DeliveryError::Closed));
        assert!(!handle.is_alive());
    }

    #[test]
    fn test_full_queue_drops_without_closing() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(ClientId::new(7), tx);

        handle.send("first".to_string()).unwrap();
        assert_eq!(handle.send("second".to_string()), Err(DeliveryError::Full));
        assert!(handle.is_alive());
    }

    #[tokio::test]
    async fn test_closed_wakes_when_marked_closed() {
        let (tx, _rx) = mpsc::channel(4);
        let handle = std::sync::Arc::new(ConnectionHandle::new(ClientId::new(1), tx));

        let waiter = tokio::spawn({
            let handle = handle.clone();
            async move { handle.closed().await }
        });
        tokio::task::yield_now().await;
        handle.mark_closed();

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("closed() did not resolve")
            .unwrap();

        // Already closed: resolves immediately.
        handle.closed().await;
    }

    #[test]
    fn test_closed_handle_refuses_frames() {
        let (tx, _rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(ClientId::new(1), tx);
        handle.mark_closed();

        assert_eq!(handle.send("x".to_string()), Err(DeliveryError::Closed));
        assert!(!handle.info().alive);
    }
}
