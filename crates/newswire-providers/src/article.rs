//! Readable article text from HTML pages.
//!
//! Uses `scraper` for element selection and `html2text` as the fallback
//! when a page has no recognisable content container.

use std::time::Duration;

use async_trait::async_trait;
use newswire_core::{Article, ArticleExtractor, ProviderError, ProviderResult};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::http::{parse_http_url, request_error};

const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "svg"];

/// Fetches a page and extracts its readable text with [`extract_article`].
pub struct HtmlArticleExtractor {
    client: reqwest::Client,
    timeout: Duration,
}

impl HtmlArticleExtractor {
    /// Create an extractor using `client`; `timeout` is reported on expiry.
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ArticleExtractor for HtmlArticleExtractor {
    async fn extract(&self, url: &str) -> ProviderResult<Article> {
        let url = parse_http_url(url)?;
        debug!(%url, "fetching article");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(&e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::fetch(format!(
                "Failed to fetch article: {}",
                status.as_u16()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| request_error(&e, self.timeout))?;

        extract_article(&html).ok_or(ProviderError::NoContentExtracted)
    }
}

/// Extract `(title, body)` from an HTML document.
///
/// Body priority: `<article>` → `<main>` → every `<p>` under `<body>` →
/// `html2text` rendering of the whole page. Returns `None` when all of them
/// come out empty.
pub fn extract_article(html: &str) -> Option<Article> {
    let document = Html::parse_document(html);
    let title = extract_title(&document);

    let body_text = ["article", "main"]
        .into_iter()
        .find_map(|sel| {
            first_match(&document, sel)
                .map(element_text)
                .filter(|t| !t.is_empty())
        })
        .or_else(|| {
            let paragraphs = all_matches(&document, "body p")
                .into_iter()
                .map(element_text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (!paragraphs.is_empty()).then_some(paragraphs)
        })
        .or_else(|| {
            let rendered = collapse_whitespace(
                &html2text::from_read(html.as_bytes(), 100).unwrap_or_default(),
            );
            (!rendered.is_empty()).then_some(rendered)
        })?;

    Some(Article { title, body_text })
}

fn extract_title(doc: &Html) -> String {
    // Priority: og:title → <title> → <h1>
    if let Some(content) = first_match(doc, r#"meta[property="og:title"]"#)
        .and_then(|og| og.value().attr("content"))
    {
        let text = collapse_whitespace(content);
        if !text.is_empty() {
            return text;
        }
    }

    ["title", "h1"]
        .into_iter()
        .filter_map(|sel| first_match(doc, sel))
        .map(element_text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn first_match<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    Selector::parse(selector)
        .ok()
        .and_then(|s| doc.select(&s).next())
}

fn all_matches<'a>(doc: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    Selector::parse(selector)
        .map(|s| doc.select(&s).collect())
        .unwrap_or_default()
}

/// Visible text of `el`, skipping script-like subtrees, whitespace collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
