//! Google Custom Search JSON API client.

use std::time::Duration;

use async_trait::async_trait;
use newswire_core::protocol::MAX_TOP_K;
use newswire_core::{ProviderError, ProviderResult, SearchProvider, SearchResult};
use newswire_settings::GoogleSearchSettings;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::http::request_error;

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

/// Web search through Google Custom Search.
pub struct GoogleSearchProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    cx: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl GoogleSearchProvider {
    /// Create a provider from settings; `timeout` is reported on expiry.
    pub fn new(client: reqwest::Client, settings: &GoogleSearchSettings, timeout: Duration) -> Self {
        Self {
            client,
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            cx: settings.cx.clone().filter(|c| !c.is_empty()),
            endpoint: settings.endpoint.clone(),
            timeout,
        }
    }

    /// Whether both credentials are present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.cx.is_some()
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchProvider {
    async fn search(&self, query: &str, top_k: usize) -> ProviderResult<Vec<SearchResult>> {
        let (Some(key), Some(cx)) = (self.api_key.as_deref(), self.cx.as_deref()) else {
            return Err(ProviderError::Configuration {
                message: "Google Custom Search is not configured (set GOOGLE_CSE_API_KEY and GOOGLE_CSE_CX)"
                    .into(),
            });
        };

        let num = top_k.clamp(1, MAX_TOP_K);
        let num_param = num.to_string();
        debug!(query, num, "google custom search");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", key), ("cx", cx), ("q", query), ("num", num_param.as_str())])
            .send()
            .await
            .map_err(|e| request_error(&e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_error(&e, self.timeout))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_owned))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Parse {
                message: format!("Invalid search response: {e}"),
            })?;

        Ok(parsed.items.into_iter().take(num).collect())
    }
}
