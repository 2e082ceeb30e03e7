//! The set of content providers the server talks to.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use newswire_core::{
    ArticleExtractor, FeedFetcher, ProviderError, ProviderResult, SearchProvider, StreamProbe,
};
use newswire_providers::{
    FeedCatalog, GoogleSearchProvider, HtmlArticleExtractor, HttpStreamProbe, RssFeedFetcher,
    build_client,
};
use newswire_settings::ProviderSettings;
use newswire_telemetry::metrics::{
    PROVIDER_ERRORS_TOTAL, PROVIDER_REQUEST_DURATION_SECONDS, PROVIDER_REQUESTS_TOTAL,
};
use tracing::debug;

/// Shared handles to every provider.
#[derive(Clone)]
pub struct ProviderSet {
    /// RSS feeds.
    pub feeds: Arc<dyn FeedFetcher>,
    /// Web search.
    pub search: Arc<dyn SearchProvider>,
    /// Article text extraction.
    pub articles: Arc<dyn ArticleExtractor>,
    /// Stream liveness checks.
    pub streams: Arc<dyn StreamProbe>,
    /// News category table.
    pub catalog: FeedCatalog,
}

impl ProviderSet {
    /// Build the HTTP-backed providers from settings.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        let client = build_client(settings);
        let timeout = Duration::from_millis(settings.timeout_ms);
        Self {
            feeds: Arc::new(RssFeedFetcher::new(client.clone(), timeout)),
            search: Arc::new(GoogleSearchProvider::new(
                client.clone(),
                &settings.google,
                timeout,
            )),
            articles: Arc::new(HtmlArticleExtractor::new(client.clone(), timeout)),
            streams: Arc::new(HttpStreamProbe::new(client, timeout)),
            catalog: FeedCatalog::new(&settings.feeds),
        }
    }
}

/// Run one provider call bounded by `limit`, recording metrics.
///
/// Expiry becomes [`ProviderError::Timeout`].
pub async fn bounded<T>(
    provider: &'static str,
    limit: Duration,
    call: impl Future<Output = ProviderResult<T>>,
) -> ProviderResult<T> {
    counter!(PROVIDER_REQUESTS_TOTAL, "provider" => provider).increment(1);
    let start = Instant::now();

    let result = tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ProviderError::Timeout(limit)));

    histogram!(PROVIDER_REQUEST_DURATION_SECONDS, "provider" => provider)
        .record(start.elapsed().as_secs_f64());
    if let Err(e) = &result {
        counter!(PROVIDER_ERRORS_TOTAL, "provider" => provider, "kind" => e.kind()).increment(1);
        debug!(provider, error = %e, "provider call failed");
    }
    result
}
