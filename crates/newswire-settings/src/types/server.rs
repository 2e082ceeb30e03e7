//! Server and delivery settings.

use serde::{Deserialize, Serialize};

/// How inbound frames on the channel are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Route each frame through the command dispatcher.
    #[default]
    Dispatch,
    /// Relay each well-formed frame verbatim to every other open connection.
    Broadcast,
}

impl ChannelMode {
    /// Parse a mode name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "dispatch" => Some(Self::Dispatch),
            "broadcast" => Some(Self::Broadcast),
            _ => None,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Broadcast => "broadcast",
        }
    }
}

/// Server network and channel settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// HTTP + WebSocket port.
    pub port: u16,
    /// Path of the WebSocket endpoint.
    pub ws_path: String,
    /// Channel mode.
    pub mode: ChannelMode,
    /// Directory of static files for the browser client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_dir: Option<String>,
    /// Outbound frames buffered per connection.
    pub max_send_queue: usize,
    /// WebSocket ping interval in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Close a connection after this long without a pong, in milliseconds.
    pub heartbeat_timeout_ms: u64,
    /// Largest accepted inbound WebSocket message, in bytes.
    pub max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ws_path: "/ws".to_string(),
            mode: ChannelMode::Dispatch,
            public_dir: None,
            max_send_queue: 256,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 90_000,
            max_message_size: 1024 * 1024,
        }
    }
}

/// Article delivery settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliverySettings {
    /// Bodies up to this many characters are sent whole.
    pub chunk_threshold: usize,
    /// Upper bound on characters per chunk.
    pub max_chunk_size: usize,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            chunk_threshold: 1000,
            max_chunk_size: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_is_case_insensitive() {
        assert_eq!(ChannelMode::parse("Broadcast"), Some(ChannelMode::Broadcast));
        assert_eq!(ChannelMode::parse("dispatch"), Some(ChannelMode::Dispatch));
        assert_eq!(ChannelMode::parse("echo"), None);
    }

    #[test]
    fn mode_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChannelMode::Broadcast).unwrap(),
            "\"broadcast\""
        );
        let mode: ChannelMode = serde_json::from_str("\"dispatch\"").unwrap();
        assert_eq!(mode, ChannelMode::Dispatch);
        assert_eq!(mode.as_str(), "dispatch");
    }

    #[test]
    fn public_dir_omitted_when_unset() {
        let json = serde_json::to_value(ServerSettings::default()).unwrap();
        assert!(json.get("publicDir").is_none());
        assert_eq!(json["maxMessageSize"], 1024 * 1024);
    }
}
