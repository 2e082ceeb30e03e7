//! HTTP API consumed by the browser client.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use metrics::counter;
use newswire_core::protocol::clamp_top_k;
use newswire_core::{Feed, ProviderError, SearchResult, StreamStatus};
use newswire_providers::{FeedCategory, google_search_url, parse_http_url, youtube_search_url};
use newswire_telemetry::metrics::HTTP_REQUESTS_TOTAL;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::providers::bounded;
use crate::server::AppState;

/// Error body `{"error": message}` with a status code.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        let status = match err {
            ProviderError::Configuration { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ProviderError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = self.status.as_u16(), error = %self.message, "request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// `?q=` query string.
#[derive(Debug, Default, Deserialize)]
pub struct TextQuery {
    q: Option<String>,
    #[serde(rename = "topK")]
    top_k: Option<String>,
}

impl TextQuery {
    fn required(&self, what: &str) -> Result<String, ApiError> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| ApiError::bad_request(format!("Missing {what}query parameter q")))
    }
}

/// `?category=` query string.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    category: Option<String>,
}

/// `?url=` query string.
#[derive(Debug, Default, Deserialize)]
pub struct UrlQuery {
    url: Option<String>,
}

impl UrlQuery {
    fn required(&self) -> Result<String, ApiError> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| ApiError::bad_request("Missing url query parameter"))
    }
}

/// Reply of `/api/news`.
#[derive(Debug, Serialize)]
pub struct NewsResponse {
    category: String,
    #[serde(flatten)]
    feed: Feed,
}

/// Reply of `/api/search` and `/api/music/search`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLinkResponse {
    query: String,
    search_url: String,
}

/// Reply of `/api/search/google`.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    query: String,
    results: Vec<SearchResult>,
}

/// Reply of `/api/article`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    title: String,
    body_text: String,
    source_url: String,
}

/// Reply of `/api/radio/check`.
#[derive(Debug, Serialize)]
pub struct RadioCheckResponse {
    url: String,
    #[serde(flatten)]
    status: StreamStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn record(route: &'static str) {
    counter!(HTTP_REQUESTS_TOTAL, "route" => route).increment(1);
}

/// GET /api/news?category=
pub async fn news(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<NewsResponse> {
    record("news");
    let catalog = &state.providers.catalog;
    let (key, url) = catalog.resolve(query.category.as_deref()).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Unknown category: {}",
            query.category.as_deref().unwrap_or_default()
        ))
    })?;

    let feed = bounded(
        "feed",
        state.config.provider_timeout,
        state.providers.feeds.fetch(url),
    )
    .await?;

    Ok(Json(NewsResponse {
        category: key.to_owned(),
        feed,
    }))
}

/// GET /api/news/categories
pub async fn categories(State(state): State<AppState>) -> Json<Vec<FeedCategory>> {
    record("news_categories");
    Json(state.providers.catalog.entries())
}

/// GET /api/search?q=
pub async fn search_link(Query(query): Query<TextQuery>) -> ApiResult<SearchLinkResponse> {
    record("search");
    let q = query.required("search ")?;
    Ok(Json(SearchLinkResponse {
        search_url: google_search_url(&q),
        query: q,
    }))
}

/// GET /api/music/search?q=
pub async fn music_search_link(Query(query): Query<TextQuery>) -> ApiResult<SearchLinkResponse> {
    record("music_search");
    let q = query.required("music search ")?;
    Ok(Json(SearchLinkResponse {
        search_url: youtube_search_url(&q),
        query: q,
    }))
}

/// GET /api/search/google?q=&topK=
pub async fn google_search(
    State(state): State<AppState>,
    Query(query): Query<TextQuery>,
) -> ApiResult<SearchResponse> {
    record("search_google");
    let q = query.required("search ")?;
    let top_k = clamp_top_k(query.top_k.as_deref().and_then(|k| k.trim().parse().ok()));

    let mut results = bounded(
        "search",
        state.config.provider_timeout,
        state.providers.search.search(&q, top_k),
    )
    .await?;
    results.truncate(top_k);

    Ok(Json(SearchResponse { query: q, results }))
}

/// GET /api/article?url=
pub async fn article(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> ApiResult<ArticleResponse> {
    record("article");
    let url = query.required()?;
    let article = bounded(
        "article",
        state.config.provider_timeout,
        state.providers.articles.extract(&url),
    )
    .await?;

    Ok(Json(ArticleResponse {
        title: article.title,
        body_text: article.body_text,
        source_url: url,
    }))
}

/// GET /api/radio/check?url=
///
/// A stream that cannot be reached is a normal answer (`reachable: false`),
/// not an HTTP error.
pub async fn radio_check(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> ApiResult<RadioCheckResponse> {
    record("radio_check");
    let url = query.required()?;
    let _ = parse_http_url(&url)?;

    let response = match bounded(
        "stream",
        state.config.provider_timeout,
        state.providers.streams.probe(&url),
    )
    .await
    {
        Ok(status) => RadioCheckResponse {
            url,
            status,
            error: None,
        },
        Err(e) => RadioCheckResponse {
            url,
            status: StreamStatus::default(),
            error: Some(e.to_string()),
        },
    };
    Ok(Json(response))
}

/// GET /metrics
pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => newswire_telemetry::render(handle).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
