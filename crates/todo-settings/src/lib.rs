//! # todo-settings
//!
//! Configuration management with layered sources for the todo task tracker.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`TodoSettings::default()`]
//! 2. **User file**: `~/.todo/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `TODO_*` overrides (highest priority)
//!
//! Settings are plain values: load them once at startup and pass the
//! relevant section to whoever needs it.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
};
pub use types::{DatabaseSettings, LoggingSettings, TodoSettings, default_db_path};
