//! WebSocket message types, coordinate parsing, and inbound validation.

pub mod coordinate;
pub mod types;
pub mod validator;

pub use coordinate::{ClientId, Coordinate, GeoPoint};
pub use types::{Marker, MarkerMap, OutboundMessage};
