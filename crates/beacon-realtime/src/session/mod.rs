//! Per-connection broadcast sessions.
//!
//! A session owns one registered connection, turns inbound text frames into
//! location broadcasts, and unregisters the connection when the transport
//! closes, faults, or the engine shuts down.

pub mod handler;

use std::fmt;

use serde::Serialize;

use crate::connection::ConnectionId;
use crate::message::ClientId;

pub use handler::BroadcastSession;

/// Transport-neutral inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text payload.
    Text(String),
    /// The peer closed the connection.
    Close,
    /// Anything else (binary, ping, pong); ignored.
    Other,
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Upgraded, not yet registered.
    Connecting,
    /// Registered and receiving.
    Open,
    /// Receive loop ended, cleanup in progress.
    Closing,
    /// Unregistered. Terminal.
    Closed,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum CloseReason {
    /// Orderly close by the peer, or end of stream.
    PeerClosed,
    /// Unexpected I/O error on the transport.
    TransportFault(String),
    /// The registry dropped this connection after a failed delivery.
    Evicted,
    /// The engine is shutting down.
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => write!(f, "peer closed"),
            Self::TransportFault(e) => write!(f, "transport fault: {e}"),
            Self::Evicted => write!(f, "evicted"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Outcome of a finished session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Connection ID
    pub conn_id: ConnectionId,
    /// Client ID
    pub client_id: ClientId,
    /// Why the session ended
    pub reason: CloseReason,
    /// Location updates broadcast on behalf of this session
    pub messages_handled: u64,
}
