//! # newswire-providers
//!
//! Concrete implementations of the provider traits from `newswire-core`:
//!
//! - [`RssFeedFetcher`]: RSS 2.0 feeds over HTTP
//! - [`GoogleSearchProvider`]: Google Custom Search JSON API
//! - [`HtmlArticleExtractor`]: readable text from article pages
//! - [`HttpStreamProbe`]: liveness check for radio/audio stream URLs
//!
//! plus the feed category table and the plain search-link builders used by
//! the HTTP API.

#![deny(unsafe_code)]

pub mod article;
pub mod categories;
pub mod feed;
pub mod http;
pub mod links;
pub mod search;
pub mod stream_probe;

pub use article::{HtmlArticleExtractor, extract_article};
pub use categories::{FeedCatalog, FeedCategory};
pub use feed::{DEFAULT_FEED_TITLE, RssFeedFetcher, parse_feed};
pub use http::{build_client, parse_http_url};
pub use links::{google_search_url, youtube_search_url};
pub use search::GoogleSearchProvider;
pub use stream_probe::HttpStreamProbe;
