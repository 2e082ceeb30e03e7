//! RSS 2.0 feed fetcher.
//!
//! Parsing is regex based: the feeds consumed here are flat `<channel>` /
//! `<item>` documents, and only a handful of child elements are read.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use newswire_core::{Feed, FeedFetcher, FeedItem, ProviderError, ProviderResult};
use regex::Regex;
use tracing::debug;

use crate::http::{parse_http_url, request_error};

/// Channel title used when a feed has none.
pub const DEFAULT_FEED_TITLE: &str = "Thanh Niên";

static ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>").unwrap());
static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());

static TITLE: LazyLock<Regex> = LazyLock::new(|| element("title"));
static LINK: LazyLock<Regex> = LazyLock::new(|| element("link"));
static PUB_DATE: LazyLock<Regex> = LazyLock::new(|| element("pubDate"));
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| element("description"));
static CREATOR: LazyLock<Regex> = LazyLock::new(|| element("dc:creator"));
static CATEGORY: LazyLock<Regex> = LazyLock::new(|| element("category"));

fn element(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}\b[^>]*>(.*?)</{tag}>")).unwrap()
}

/// Fetches feeds over HTTP and parses them with [`parse_feed`].
pub struct RssFeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl RssFeedFetcher {
    /// Create a fetcher using `client`; `timeout` is reported on expiry.
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl FeedFetcher for RssFeedFetcher {
    async fn fetch(&self, url: &str) -> ProviderResult<Feed> {
        let url = parse_http_url(url)?;
        debug!(%url, "fetching feed");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(&e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::fetch(format!(
                "Failed to fetch feed: {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| request_error(&e, self.timeout))?;
        parse_feed(&body)
    }
}

/// Parse an RSS 2.0 document.
pub fn parse_feed(xml: &str) -> ProviderResult<Feed> {
    if !xml.contains("<rss") && !xml.contains("<channel") {
        return Err(ProviderError::Parse {
            message: "Document is not an RSS feed".into(),
        });
    }

    let head = xml.find("<item").map_or(xml, |at| &xml[..at]);
    let title = first_text(&TITLE, head)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_FEED_TITLE.to_owned());

    let items = ITEM
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| parse_item(m.as_str()))
        .collect();

    Ok(Feed { title, items })
}

fn parse_item(block: &str) -> FeedItem {
    let text = |re: &Regex| first_text(re, block).unwrap_or_default();
    FeedItem {
        title: text(&*TITLE),
        link: text(&*LINK),
        pub_date: text(&*PUB_DATE),
        content_snippet: first_text(&DESCRIPTION, block)
            .map(|d| strip_markup(&d))
            .unwrap_or_default(),
        creator: text(&*CREATOR),
        categories: CATEGORY
            .captures_iter(block)
            .filter_map(|c| c.get(1))
            .map(|m| unwrap_text(m.as_str()))
            .filter(|c| !c.is_empty())
            .collect(),
    }
}

fn first_text(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| unwrap_text(m.as_str()))
}

/// CDATA sections are taken literally; anything else is entity-decoded.
fn unwrap_text(raw: &str) -> String {
    let text = if CDATA.is_match(raw) {
        CDATA.replace_all(raw, "$1").into_owned()
    } else {
        decode_entities(raw)
    };
    text.trim().to_owned()
}

fn strip_markup(html: &str) -> String {
    let without_tags = MARKUP.replace_all(html, " ");
    decode_entities(&without_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures<'_>| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        value
            .and_then(char::from_u32)
            .map_or_else(|| caps[0].to_owned(), String::from)
    });
    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
