//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`TodoSettings::default()`]
//! 2. If `~/.todo/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `TODO_*` environment variable overrides
//! 4. Validate the result

use std::path::{Path, PathBuf};

use serde_json::Value;
use todo_core::constants::{SETTINGS_DIR, SETTINGS_FILE};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::TodoSettings;

/// Override for the database file path.
pub const ENV_DB_PATH: &str = "TODO_DB_PATH";
/// Override for the connection pool size (1..=64).
pub const ENV_DB_POOL_SIZE: &str = "TODO_DB_POOL_SIZE";
/// Override for the busy timeout in milliseconds (0..=600000).
pub const ENV_DB_BUSY_TIMEOUT_MS: &str = "TODO_DB_BUSY_TIMEOUT_MS";
/// Override for the log level directive.
pub const ENV_LOG_LEVEL: &str = "TODO_LOG_LEVEL";

/// Resolve the path to the settings file (`~/.todo/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(SETTINGS_DIR).join(SETTINGS_FILE)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<TodoSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with process env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<TodoSettings> {
    load_with_env(path, |name| std::env::var(name).ok())
}

fn load_with_env(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<TodoSettings> {
    let defaults = serde_json::to_value(TodoSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: TodoSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// Objects merge per key, everything else is replaced by `source`, and null
/// values in `source` keep the `target` value.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `TODO_*` overrides read through `env`.
///
/// Empty values are treated as unset. Out-of-range or unparsable numbers are
/// ignored with a warning.
pub fn apply_env_overrides(settings: &mut TodoSettings, env: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| env(name).filter(|v| !v.is_empty());

    if let Some(v) = read(ENV_DB_PATH) {
        settings.database.path = PathBuf::from(v);
    }
    if let Some(v) = read(ENV_DB_POOL_SIZE) {
        match parse_u32_range(&v, 1, 64) {
            Some(n) => settings.database.pool_size = n,
            None => warn!(key = ENV_DB_POOL_SIZE, value = %v, "invalid env var, ignoring"),
        }
    }
    if let Some(v) = read(ENV_DB_BUSY_TIMEOUT_MS) {
        match parse_u32_range(&v, 0, 600_000) {
            Some(n) => settings.database.busy_timeout_ms = n,
            None => warn!(key = ENV_DB_BUSY_TIMEOUT_MS, value = %v, "invalid env var, ignoring"),
        }
    }
    if let Some(v) = read(ENV_LOG_LEVEL) {
        settings.logging.level = v;
    }
}

/// Parse a string as a `u32` within an inclusive range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}
