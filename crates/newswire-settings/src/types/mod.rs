//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a
//! settings file may be partial: missing fields keep their default value.

mod logging;
mod providers;
mod server;

pub use logging::*;
pub use providers::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "port": 8080, "mode": "broadcast" },
///   "providers": { "google": { "apiKey": "...", "cx": "..." } }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewswireSettings {
    /// Network and channel settings.
    pub server: ServerSettings,
    /// Article delivery (chunking) settings.
    pub delivery: DeliverySettings,
    /// External content providers.
    pub providers: ProviderSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl NewswireSettings {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.server.ws_path.starts_with('/') {
            return Err(SettingsError::InvalidValue(format!(
                "server.wsPath must start with '/': {}",
                self.server.ws_path
            )));
        }
        if self.server.max_send_queue == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxSendQueue must be positive".into(),
            ));
        }
        if self.delivery.max_chunk_size == 0 {
            return Err(SettingsError::InvalidValue(
                "delivery.maxChunkSize must be positive".into(),
            ));
        }
        if self.providers.timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "providers.timeoutMs must be positive".into(),
            ));
        }
        if !self
            .providers
            .feeds
            .categories
            .contains_key(&self.providers.feeds.default_category)
        {
            return Err(SettingsError::InvalidValue(format!(
                "providers.feeds.defaultCategory '{}' is not a configured category",
                self.providers.feeds.default_category
            )));
        }
        Ok(())
    }
}
