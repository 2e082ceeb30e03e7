//! Shared HTTP plumbing for providers.

use std::time::Duration;

use newswire_core::{ProviderError, ProviderResult};
use newswire_settings::ProviderSettings;
use url::Url;

/// Build the `reqwest` client shared by all providers.
pub fn build_client(settings: &ProviderSettings) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(settings.timeout_ms))
        .user_agent(settings.user_agent.clone())
        .build()
        .unwrap_or_default()
}

/// Parse `raw` and require an `http` or `https` scheme.
pub fn parse_http_url(raw: &str) -> ProviderResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|_| ProviderError::invalid_url("Invalid URL format"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ProviderError::invalid_url(
            "Only http and https URLs are supported",
        )),
    }
}

/// Convert a transport error into a provider error.
pub(crate) fn request_error(err: &reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::fetch(format!("Request failed: {err}"))
    }
}
