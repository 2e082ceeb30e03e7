//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::logging::TelemetryError;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render the `/metrics` endpoint.
pub fn install_recorder() -> Result<PrometheusHandle, TelemetryError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::Recorder(e.to_string()))?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric names shared across crates.

/// Commands handled (counter, labels: command).
pub const COMMANDS_TOTAL: &str = "commands_total";
/// Command failures (counter, labels: operation, kind).
pub const COMMAND_ERRORS_TOTAL: &str = "command_errors_total";
/// Command handling duration seconds (histogram, labels: command).
pub const COMMAND_DURATION_SECONDS: &str = "command_duration_seconds";
/// Outbound frames sent (counter, labels: type).
pub const FRAMES_SENT_TOTAL: &str = "frames_sent_total";
/// WebSocket connections opened (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Open WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// WebSocket connection lifetime seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Frames relayed in broadcast mode (counter).
pub const WS_BROADCAST_RELAYED_TOTAL: &str = "ws_broadcast_relayed_total";
/// Broadcast frames dropped on full queues (counter).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// Provider calls (counter, labels: provider).
pub const PROVIDER_REQUESTS_TOTAL: &str = "provider_requests_total";
/// Provider failures (counter, labels: provider, kind).
pub const PROVIDER_ERRORS_TOTAL: &str = "provider_errors_total";
/// Provider call duration seconds (histogram, labels: provider).
pub const PROVIDER_REQUEST_DURATION_SECONDS: &str = "provider_request_duration_seconds";
/// HTTP API requests (counter, labels: route).
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
