//! # newswire-agent
//!
//! Newswire server binary: loads settings, starts logging and metrics, and
//! serves the HTTP API and the WebSocket channel until Ctrl-C or SIGTERM.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use newswire_server::config::ServerConfig;
use newswire_server::providers::ProviderSet;
use newswire_server::server::NewswireServer;
use newswire_settings::{ChannelMode, NewswireSettings};
use newswire_telemetry::TelemetryConfig;

/// Newswire news reader backend.
#[derive(Parser, Debug)]
#[command(name = "newswire", about = "News, search and article reader backend", version)]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Channel mode: `dispatch` or `broadcast` (overrides settings).
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ChannelMode>,

    /// Settings file (defaults to `~/.newswire/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Directory of static files served as the browser client.
    #[arg(long)]
    public_dir: Option<String>,
}

impl Cli {
    /// Layer command-line flags over loaded settings.
    fn apply(&self, settings: &mut NewswireSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(mode) = self.mode {
            settings.server.mode = mode;
        }
        if let Some(dir) = &self.public_dir {
            settings.server.public_dir = Some(dir.clone());
        }
        if self.json_logs {
            settings.logging.json = true;
        }
    }
}

fn parse_mode(value: &str) -> Result<ChannelMode, String> {
    ChannelMode::parse(value)
        .ok_or_else(|| format!("unknown mode `{value}`, expected dispatch or broadcast"))
}

/// Resolve once either Ctrl-C or SIGTERM arrives.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.context("Failed to listen for ctrl-c")?,
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Settings first: the log level lives there.
    let settings_path = cli
        .config
        .clone()
        .unwrap_or_else(newswire_settings::settings_path);
    let mut settings = newswire_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    cli.apply(&mut settings);
    settings.validate().context("Invalid settings")?;

    newswire_telemetry::init_logging(&TelemetryConfig::from(&settings.logging))
        .context("Failed to initialize logging")?;

    let metrics = match newswire_telemetry::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "metrics recorder unavailable, /metrics disabled");
            None
        }
    };

    if !settings.providers.google.is_configured() {
        tracing::warn!("Google search credentials missing, search commands will fail");
    }

    let providers = ProviderSet::from_settings(&settings.providers);
    let config = ServerConfig::from_settings(&settings);
    let server = NewswireServer::new(config, providers, metrics);

    let (addr, handle) = server
        .listen()
        .await
        .context("Failed to bind server address")?;
    tracing::info!(
        mode = settings.server.mode.as_str(),
        "newswire listening on http://{addr} (channel at ws://{addr}{})",
        settings.server.ws_path
    );

    shutdown_signal().await?;

    tracing::info!("Shutting down...");
    server.shutdown().graceful_shutdown(vec![handle], None).await;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_leave_settings_untouched() {
        let cli = Cli::parse_from(["newswire"]);
        let mut settings = NewswireSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.server.port, NewswireSettings::default().server.port);
        assert_eq!(settings.server.mode, ChannelMode::Dispatch);
        assert!(!settings.logging.json);
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "newswire",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--mode",
            "Broadcast",
            "--json-logs",
            "--public-dir",
            "/srv/newswire",
        ]);
        let mut settings = NewswireSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.mode, ChannelMode::Broadcast);
        assert!(settings.logging.json);
        assert_eq!(settings.server.public_dir.as_deref(), Some("/srv/newswire"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["newswire", "--mode", "mesh"]).is_err());
    }

    #[test]
    fn config_flag_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"port": 4100}}"#).unwrap();

        let cli = Cli::parse_from(["newswire", "--config", path.to_str().unwrap()]);
        let settings =
            newswire_settings::load_settings_with_env(cli.config.as_ref().unwrap(), &|_| None)
                .unwrap();
        assert_eq!(settings.server.port, 4100);
    }
}
