//! Outbound WebSocket message type definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::coordinate::{ClientId, Coordinate};

/// Per-client display state relayed to every viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Last reported position.
    pub coordinate: Coordinate,
    /// Rendering hint for the marker.
    pub size: u64,
}

/// All current markers, ordered by client ID.
pub type MarkerMap = BTreeMap<ClientId, Marker>;

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Full marker state after a change.
    Markers {
        /// Human-readable status line.
        message: String,
        /// Every client's current marker.
        markers: MarkerMap,
    },
    /// Error reply to a single client.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// Full marker state with a status line.
    pub fn snapshot(status: String, markers: MarkerMap) -> Self {
        Self::Markers {
            message: status,
            markers,
        }
    }

    /// Status line for a location update.
    pub fn location_status(client_id: ClientId, coordinate: &Coordinate) -> String {
        format!("user {client_id}'s location: {coordinate}")
    }

    /// Status broadcast after a client's marker was removed.
    pub fn departure(client_id: ClientId, markers: MarkerMap) -> Self {
        Self::snapshot(format!("user {client_id} left"), markers)
    }

    /// Error reply.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_wire_shape() {
        let mut markers = MarkerMap::new();
        markers.insert(
            ClientId::new(1),
            Marker {
                coordinate: Coordinate::opaque("10.0,20.0"),
                size: 41,
            },
        );
        let status = OutboundMessage::location_status(ClientId::new(1), &Coordinate::opaque("10.0,20.0"));
        let msg = OutboundMessage::snapshot(status, markers);

        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "markers",
                "message": "user 1's location: 10.0,20.0",
                "markers": {"1": {"coordinate": "10.0,20.0", "size": 41}}
            })
        );
    }

    #[test]
    fn test_error_wire_shape() {
        let msg = OutboundMessage::error("INVALID_COORDINATE", "bad");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "error", "code": "INVALID_COORDINATE", "message": "bad"})
        );
    }
}
