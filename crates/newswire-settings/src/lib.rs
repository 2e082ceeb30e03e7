//! # newswire-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`NewswireSettings::default()`]
//! 2. **Settings file**: `~/.newswire/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `NEWSWIRE_*`, `PORT`, and the Google
//!    search credentials (highest priority)
//!
//! The binary applies its CLI flags on top of the loaded value.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, load_settings_with_env,
    settings_path,
};
pub use types::*;
