//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// How a client's marker size is derived from arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSizing {
    /// Every broadcast takes the next arrival index; the sender's size is
    /// `base + index`, so a client's marker grows with each update it sends.
    #[default]
    PerMessage,
    /// Size is fixed at a client's first update to `base + rank`, where rank
    /// is the 1-based number of distinct clients that got a marker so far.
    FirstArrival,
}

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Maximum number of simultaneously registered connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Per-connection outbound queue capacity.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Marker size before the arrival index is added.
    #[serde(default = "default_marker_base_size")]
    pub marker_base_size: u64,
    /// Marker sizing policy.
    #[serde(default)]
    pub marker_sizing: MarkerSizing,
    /// Require inbound payloads to parse as latitude/longitude pairs.
    #[serde(default)]
    pub strict_coordinates: bool,
    /// Maximum inbound payload size in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            channel_buffer_size: default_channel_buffer(),
            marker_base_size: default_marker_base_size(),
            marker_sizing: MarkerSizing::default(),
            strict_coordinates: false,
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

fn default_max_connections() -> usize {
    10_000
}

fn default_channel_buffer() -> usize {
    256
}

fn default_marker_base_size() -> u64 {
    40
}

fn default_max_message_bytes() -> usize {
    4096
}
