//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`NewswireSettings::default()`]
//! 2. If `~/.newswire/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{ChannelMode, NewswireSettings};

/// Resolve the path to the settings file (`~/.newswire/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".newswire").join("settings.json")
}

/// Load settings from the default path with process env overrides.
pub fn load_settings() -> Result<NewswireSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with process env overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<NewswireSettings> {
    load_settings_with_env(path, &|name| std::env::var(name).ok())
}

/// Load settings from `path`, reading overrides through `env`.
pub fn load_settings_with_env(
    path: &Path,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<NewswireSettings> {
    let defaults = serde_json::to_value(NewswireSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: NewswireSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are logged and ignored (file/default value stays).
pub fn apply_env_overrides(settings: &mut NewswireSettings, env: &dyn Fn(&str) -> Option<String>) {
    let reader = EnvReader { env };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = reader.u16("PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = reader.u16("NEWSWIRE_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = reader.string("NEWSWIRE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = reader.string("NEWSWIRE_MODE") {
        match ChannelMode::parse(&v) {
            Some(mode) => settings.server.mode = mode,
            None => warn!(key = "NEWSWIRE_MODE", value = %v, "unknown channel mode, ignoring"),
        }
    }
    if let Some(v) = reader.string("NEWSWIRE_PUBLIC_DIR") {
        settings.server.public_dir = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = reader.string("NEWSWIRE_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = reader.bool("NEWSWIRE_LOG_JSON") {
        settings.logging.json = v;
    }

    // ── Providers ───────────────────────────────────────────────────
    if let Some(v) = reader.u64("NEWSWIRE_PROVIDER_TIMEOUT_MS", 100, 600_000) {
        settings.providers.timeout_ms = v;
    }
    if let Some(v) = reader.string("GOOGLE_CSE_API_KEY") {
        settings.providers.google.api_key = Some(v);
    }
    if let Some(v) = reader.string("GOOGLE_CSE_CX") {
        settings.providers.google.cx = Some(v);
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ── Env readers ─────────────────────────────────────────────────────────────

struct EnvReader<'a> {
    env: &'a dyn Fn(&str) -> Option<String>,
}

impl EnvReader<'_> {
    fn string(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = self.string(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::errors::SettingsError;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn deep_merge_objects_recursively() {
        let target = json!({"a": {"b": 1, "c": 2}, "d": 3});
        let source = json!({"a": {"b": 10}});
        assert_eq!(
            deep_merge(target, source),
            json!({"a": {"b": 10, "c": 2}, "d": 3})
        );
    }

    #[test]
    fn deep_merge_replaces_arrays_and_skips_null() {
        let target = json!({"list": [1, 2, 3], "keep": "yes"});
        let source = json!({"list": [9], "keep": null});
        assert_eq!(
            deep_merge(target, source),
            json!({"list": [9], "keep": "yes"})
        );
    }

    #[test]
    fn deep_merge_adds_new_keys() {
        let merged = deep_merge(json!({"a": 1}), json!({"b": 2}));
        assert_eq!(merged, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_with_env(&dir.path().join("nope.json"), &no_env).unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.mode, ChannelMode::Dispatch);
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server":{"port":8080,"mode":"broadcast"},"delivery":{"maxChunkSize":500}}"#,
        )
        .unwrap();
        let settings = load_settings_with_env(&path, &no_env).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.mode, ChannelMode::Broadcast);
        assert_eq!(settings.server.ws_path, "/ws");
        assert_eq!(settings.delivery.max_chunk_size, 500);
        assert_eq!(settings.delivery.chunk_threshold, 1000);
    }

    #[test]
    fn file_categories_extend_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"providers":{"feeds":{"categories":{"local":"https://example.com/local.rss"}}}}"#,
        )
        .unwrap();
        let settings = load_settings_with_env(&path, &no_env).unwrap();
        assert_eq!(settings.providers.feeds.categories.len(), 10);
        assert!(settings.providers.feeds.categories.contains_key("thoisu"));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_settings_with_env(&path, &no_env).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server":{"wsPath":"socket"}}"#).unwrap();
        let err = load_settings_with_env(&path, &no_env).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut settings = NewswireSettings::default();
        let env = env_from(&[
            ("PORT", "4000"),
            ("NEWSWIRE_HOST", "127.0.0.1"),
            ("NEWSWIRE_MODE", "Broadcast"),
            ("NEWSWIRE_LOG_JSON", "yes"),
            ("NEWSWIRE_PROVIDER_TIMEOUT_MS", "2500"),
            ("GOOGLE_CSE_API_KEY", "key"),
            ("GOOGLE_CSE_CX", "cx"),
        ]);
        apply_env_overrides(&mut settings, &env);
        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.mode, ChannelMode::Broadcast);
        assert!(settings.logging.json);
        assert_eq!(settings.providers.timeout_ms, 2500);
        assert!(settings.providers.google.is_configured());
    }

    #[test]
    fn newswire_port_beats_port() {
        let mut settings = NewswireSettings::default();
        apply_env_overrides(
            &mut settings,
            &env_from(&[("PORT", "4000"), ("NEWSWIRE_PORT", "5000")]),
        );
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut settings = NewswireSettings::default();
        apply_env_overrides(
            &mut settings,
            &env_from(&[
                ("PORT", "0"),
                ("NEWSWIRE_MODE", "echo"),
                ("NEWSWIRE_LOG_JSON", "maybe"),
                ("NEWSWIRE_PROVIDER_TIMEOUT_MS", "abc"),
                ("GOOGLE_CSE_API_KEY", ""),
            ]),
        );
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.mode, ChannelMode::Dispatch);
        assert!(!settings.logging.json);
        assert_eq!(settings.providers.timeout_ms, 5000);
        assert!(settings.providers.google.api_key.is_none());
    }

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("nah"), None);
        assert_eq!(parse_u16_range("8080", 1, 65535), Some(8080));
        assert_eq!(parse_u16_range("70000", 1, 65535), None);
        assert_eq!(parse_u64_range(" 42 ", 1, 100), Some(42));
        assert_eq!(parse_u64_range("0", 1, 100), None);
    }

    #[test]
    fn settings_path_under_home() {
        let path = settings_path();
        assert!(path.ends_with(".newswire/settings.json"));
    }
}
