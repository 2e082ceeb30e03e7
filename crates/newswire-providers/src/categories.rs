//! News category table.

use std::collections::BTreeMap;

use newswire_settings::FeedSettings;
use serde::Serialize;

/// One category and its feed URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeedCategory {
    /// Category key, e.g. `congnghe`.
    pub key: String,
    /// RSS URL.
    pub url: String,
}

/// Category key to RSS URL lookup with a default.
#[derive(Clone, Debug)]
pub struct FeedCatalog {
    default_category: String,
    categories: BTreeMap<String, String>,
}

impl FeedCatalog {
    /// Build from settings.
    pub fn new(settings: &FeedSettings) -> Self {
        Self {
            default_category: settings.default_category.clone(),
            categories: settings.categories.clone(),
        }
    }

    /// Key used when a request names no category.
    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    /// Resolve `key` (or the default when `None` or blank) to `(key, url)`.
    pub fn resolve<'a>(&'a self, key: Option<&'a str>) -> Option<(&'a str, &'a str)> {
        let key = key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(&self.default_category);
        self.categories
            .get_key_value(key)
            .map(|(k, url)| (k.as_str(), url.as_str()))
    }

    /// All categories in key order.
    pub fn entries(&self) -> Vec<FeedCategory> {
        self.categories
            .iter()
            .map(|(key, url)| FeedCategory {
                key: key.clone(),
                url: url.clone(),
            })
            .collect()
    }
}

impl Default for FeedCatalog {
    fn default() -> Self {
        Self::new(&FeedSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_default_when_absent() {
        let catalog = FeedCatalog::default();
        let (key, url) = catalog.resolve(None).unwrap();
        assert_eq!(key, "thoisu");
        assert_eq!(url, "https://thanhnien.vn/rss/home.rss");
        assert_eq!(catalog.resolve(Some("  ")).unwrap().0, "thoisu");
    }

    #[test]
    fn resolves_named_category() {
        let catalog = FeedCatalog::default();
        let (key, url) = catalog.resolve(Some("thethao")).unwrap();
        assert_eq!(key, "thethao");
        assert_eq!(url, "https://thanhnien.vn/rss/the-thao.rss");
    }

    #[test]
    fn unknown_category_is_none() {
        assert!(FeedCatalog::default().resolve(Some("weather")).is_none());
    }

    #[test]
    fn entries_are_sorted() {
        let entries = FeedCatalog::default().entries();
        assert_eq!(entries.len(), 9);
        assert_eq!(entries[0].key, "congnghe");
        assert!(entries.windows(2).all(|w| w[0].key < w[1].key));
    }
}
