//! WebSocket connection handles.

pub mod handle;

pub use handle::{ConnectionHandle, ConnectionId, ConnectionInfo, DeliveryError};
