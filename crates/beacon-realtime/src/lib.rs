//! # beacon-realtime
//!
//! Real-time broadcast core for Beacon. Provides:
//!
//! - The connection registry: live connections plus the derived marker map
//! - Atomic record-and-broadcast fan-out with per-peer failure isolation
//! - The per-connection broadcast session state machine
//! - Typed outbound messages and coordinate parsing
//! - Engine metrics and shutdown coordination

pub mod connection;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod session;

pub use connection::{ConnectionHandle, ConnectionId};
pub use message::{ClientId, Coordinate, GeoPoint, Marker, MarkerMap, OutboundMessage};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use registry::{BroadcastReport, ConnectionRegistry, Delivery};
pub use server::RealtimeEngine;
pub use session::{BroadcastSession, CloseReason, Frame, SessionState, SessionSummary};
