//! `tracing` subscriber initialization.

use std::collections::BTreeMap;

use newswire_settings::LoggingSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Errors raised while installing telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
    /// The Prometheus recorder could not be installed.
    #[error("failed to install metrics recorder: {0}")]
    Recorder(String),
}

/// Configuration for log output.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default level. Overridden by `RUST_LOG`.
    pub level: String,
    /// Per-target overrides (e.g. `newswire_server` => `debug`).
    pub module_levels: BTreeMap<String, String>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from(&LoggingSettings::default())
    }
}

impl From<&LoggingSettings> for TelemetryConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.clone(),
            module_levels: settings.module_levels.clone(),
            json: settings.json,
        }
    }
}

/// Build the `EnvFilter` directive string for a config.
pub fn filter_directives(config: &TelemetryConfig) -> String {
    let mut directives = config.level.to_lowercase();
    for (module, level) in &config.module_levels {
        directives.push(',');
        directives.push_str(module);
        directives.push('=');
        directives.push_str(&level.to_lowercase());
    }
    directives
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(config)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_default_level_only() {
        let config = TelemetryConfig::default();
        assert_eq!(filter_directives(&config), "info");
        assert!(!config.json);
    }

    #[test]
    fn directives_include_module_levels() {
        let mut config = TelemetryConfig {
            level: "WARN".into(),
            ..TelemetryConfig::default()
        };
        let _ = config
            .module_levels
            .insert("newswire_server".into(), "DEBUG".into());
        let _ = config
            .module_levels
            .insert("hyper".into(), "error".into());
        assert_eq!(
            filter_directives(&config),
            "warn,hyper=error,newswire_server=debug"
        );
        assert!(EnvFilter::try_new(filter_directives(&config)).is_ok());
    }

    #[test]
    fn config_from_settings() {
        let settings = LoggingSettings {
            level: "debug".into(),
            json: true,
            ..LoggingSettings::default()
        };
        let config = TelemetryConfig::from(&settings);
        assert_eq!(config.level, "debug");
        assert!(config.json);
    }
}
