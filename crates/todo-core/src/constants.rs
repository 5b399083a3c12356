//! Application-wide constants.

/// Application name, used for directory and file names.
pub const APP_NAME: &str = "todo";

/// Directory (relative to `$HOME`) holding the settings file.
pub const SETTINGS_DIR: &str = ".todo";

/// Settings file name inside [`SETTINGS_DIR`].
pub const SETTINGS_FILE: &str = "settings.json";

/// Data directory (relative to `$HOME`) holding the task database.
pub const DATA_DIR: &[&str] = &[".local", "share", APP_NAME];

/// Database file name inside [`DATA_DIR`].
pub const DB_FILE: &str = "todo.db";

/// Log level used when neither settings nor `RUST_LOG` specify one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";
