//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use newswire_settings::{ChannelMode, NewswireSettings};

/// Runtime configuration for [`crate::server::NewswireServer`].
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Listen port (0 picks a free port).
    pub port: u16,
    /// Path of the WebSocket endpoint.
    pub ws_path: String,
    /// How inbound channel frames are handled.
    pub mode: ChannelMode,
    /// Static files served as the router fallback.
    pub public_dir: Option<PathBuf>,
    /// Outbound frames buffered per connection.
    pub max_send_queue: usize,
    /// Interval between server pings.
    pub heartbeat_interval: Duration,
    /// Close a connection after this long without a pong.
    pub heartbeat_timeout: Duration,
    /// Largest accepted inbound message in bytes.
    pub max_message_size: usize,
    /// Bodies up to this many characters are sent as one `article_text`.
    pub chunk_threshold: usize,
    /// Upper bound on characters per `article_chunk`.
    pub max_chunk_size: usize,
    /// Upper bound on any single provider call.
    pub provider_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            ws_path: "/ws".into(),
            mode: ChannelMode::Dispatch,
            public_dir: None,
            max_send_queue: 256,
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(90),
            max_message_size: 1024 * 1024,
            chunk_threshold: 1000,
            max_chunk_size: 1000,
            provider_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Build from loaded settings.
    pub fn from_settings(settings: &NewswireSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            ws_path: settings.server.ws_path.clone(),
            mode: settings.server.mode,
            public_dir: settings.server.public_dir.as_ref().map(PathBuf::from),
            max_send_queue: settings.server.max_send_queue,
            heartbeat_interval: Duration::from_millis(settings.server.heartbeat_interval_ms),
            heartbeat_timeout: Duration::from_millis(settings.server.heartbeat_timeout_ms),
            max_message_size: settings.server.max_message_size,
            chunk_threshold: settings.delivery.chunk_threshold,
            max_chunk_size: settings.delivery.max_chunk_size,
            provider_timeout: Duration::from_millis(settings.providers.timeout_ms),
        }
    }

    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
