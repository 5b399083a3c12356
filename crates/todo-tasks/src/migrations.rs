//! SQL DDL for the task tables.
//!
//! Tags are normalized: `tags` holds each distinct name once and
//! `task_tags` links a task to its tags, with `position` preserving the
//! caller's order. Deleting a task cascades to its links, which requires
//! `PRAGMA foreign_keys = ON` on the connection.

use rusqlite::Connection;
use tracing::debug;

use crate::errors::Result;

/// Create all task tables and indexes.
///
/// Idempotent: every statement uses `IF NOT EXISTS`.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(TASKS_SCHEMA)?;
    debug!("task schema ready");
    Ok(())
}

const TASKS_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT NOT NULL DEFAULT 'medium',
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT,
    due_at TEXT,
    reminder_at TEXT,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due_at);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS task_tags (
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    PRIMARY KEY (task_id, position)
);

CREATE INDEX IF NOT EXISTS idx_task_tags_tag ON task_tags(tag_id);
";
