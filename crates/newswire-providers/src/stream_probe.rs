//! Liveness check for radio/audio stream URLs.

use std::time::Duration;

use async_trait::async_trait;
use newswire_core::{ProviderResult, StreamProbe, StreamStatus};
use reqwest::{Response, StatusCode};
use tracing::debug;

use crate::http::{parse_http_url, request_error};

/// Probes a stream with `HEAD`, retrying with `GET` when `HEAD` is refused.
///
/// Only the response head is awaited; the body is never read, so live
/// streams do not hold the probe open.
pub struct HttpStreamProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpStreamProbe {
    /// Create a probe using `client`; `timeout` is reported on expiry.
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl StreamProbe for HttpStreamProbe {
    async fn probe(&self, url: &str) -> ProviderResult<StreamStatus> {
        let url = parse_http_url(url)?;

        let mut response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| request_error(&e, self.timeout))?;

        if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            debug!(%url, "HEAD refused, probing with GET");
            response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| request_error(&e, self.timeout))?;
        }

        Ok(status_of(&response))
    }
}

fn status_of(response: &Response) -> StreamStatus {
    StreamStatus {
        reachable: response.status().is_success(),
        status: Some(response.status().as_u16()),
        content_type: response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    }
}
