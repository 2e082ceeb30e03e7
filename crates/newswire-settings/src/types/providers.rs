//! External provider settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Google Custom Search JSON API endpoint.
pub const GOOGLE_CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Settings shared by all content providers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    /// Upper bound on any single provider call, in milliseconds.
    pub timeout_ms: u64,
    /// User agent sent with outbound requests.
    pub user_agent: String,
    /// Web search provider.
    pub google: GoogleSearchSettings,
    /// RSS feeds.
    pub feeds: FeedSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            user_agent: format!("newswire/{}", env!("CARGO_PKG_VERSION")),
            google: GoogleSearchSettings::default(),
            feeds: FeedSettings::default(),
        }
    }
}

/// Google Custom Search credentials.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleSearchSettings {
    /// API key (`GOOGLE_CSE_API_KEY`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Search engine id (`GOOGLE_CSE_CX`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cx: Option<String>,
    /// API endpoint.
    pub endpoint: String,
}

impl Default for GoogleSearchSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            cx: None,
            endpoint: GOOGLE_CSE_ENDPOINT.to_string(),
        }
    }
}

impl GoogleSearchSettings {
    /// Whether both credentials are present.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.cx.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// RSS category table.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedSettings {
    /// Category used when a request names none.
    pub default_category: String,
    /// Category key to feed URL.
    pub categories: BTreeMap<String, String>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        let categories = [
            ("thoisu", "https://thanhnien.vn/rss/home.rss"),
            ("thegioi", "https://thanhnien.vn/rss/the-gioi.rss"),
            ("congnghe", "https://thanhnien.vn/rss/cong-nghe.rss"),
            ("giaoduc", "https://thanhnien.vn/rss/giao-duc.rss"),
            ("suckhoe", "https://thanhnien.vn/rss/suc-khoe.rss"),
            ("giaitri", "https://thanhnien.vn/rss/giai-tri.rss"),
            ("kinhdoanh", "https://thanhnien.vn/rss/kinh-doanh.rss"),
            ("thethao", "https://thanhnien.vn/rss/the-thao.rss"),
            ("doi-song", "https://thanhnien.vn/rss/doi-song.rss"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            default_category: "thoisu".to_string(),
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_not_configured_by_default() {
        assert!(!GoogleSearchSettings::default().is_configured());
    }

    #[test]
    fn google_requires_both_credentials() {
        let mut google = GoogleSearchSettings {
            api_key: Some("key".into()),
            ..GoogleSearchSettings::default()
        };
        assert!(!google.is_configured());
        google.cx = Some(String::new());
        assert!(!google.is_configured());
        google.cx = Some("cx".into());
        assert!(google.is_configured());
    }

    #[test]
    fn default_categories_point_at_rss() {
        let feeds = FeedSettings::default();
        assert_eq!(
            feeds.categories.get("congnghe").map(String::as_str),
            Some("https://thanhnien.vn/rss/cong-nghe.rss")
        );
        assert!(feeds.categories.values().all(|u| u.ends_with(".rss")));
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(ProviderSettings::default().user_agent.starts_with("newswire/"));
    }
}
