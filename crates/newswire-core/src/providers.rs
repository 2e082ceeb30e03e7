//! Contracts for the external content collaborators.
//!
//! Each provider is a narrow async function `input -> result | failure`.
//! Implementations live in `newswire-providers`; tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::protocol::SearchResult;

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Readable text of one web article.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Article title (may be empty).
    pub title: String,
    /// Body text with whitespace collapsed.
    pub body_text: String,
}

/// One entry of an RSS feed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedItem {
    /// Item title.
    pub title: String,
    /// Item URL.
    pub link: String,
    /// Publication date as published.
    pub pub_date: String,
    /// Plain-text excerpt.
    pub content_snippet: String,
    /// Author.
    pub creator: String,
    /// Category labels.
    pub categories: Vec<String>,
}

/// A fetched RSS feed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    /// Channel title.
    pub title: String,
    /// Entries in document order.
    pub items: Vec<FeedItem>,
}

/// Outcome of an audio stream liveness check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatus {
    /// Whether the stream answered with a success status.
    pub reachable: bool,
    /// HTTP status code, when a response arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Reported content type, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Web search collaborator.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run `query`, returning at most `top_k` hits (`top_k` in `[1, 10]`).
    async fn search(&self, query: &str, top_k: usize) -> ProviderResult<Vec<SearchResult>>;
}

/// Article text extraction collaborator.
#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    /// Fetch `url` and extract its readable text.
    async fn extract(&self, url: &str) -> ProviderResult<Article>;
}

/// RSS feed collaborator.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> ProviderResult<Feed>;
}

/// Audio stream liveness collaborator.
#[async_trait]
pub trait StreamProbe: Send + Sync {
    /// Check whether the stream at `url` answers.
    async fn probe(&self, url: &str) -> ProviderResult<StreamStatus>;
}
