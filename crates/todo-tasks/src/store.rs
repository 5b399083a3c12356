//! The task store: validated CRUD, listing, and status transitions over an
//! `SQLite` connection pool.
//!
//! Key rules enforced here rather than in SQL:
//!
//! - **Validation first**: `create` and `update` run [`Task::validate`] before
//!   any connection is taken; a failing task is never written.
//! - **Timestamps**: `created_at` is stamped on create, `updated_at` on every
//!   update and status change. The caller's task only sees the new values
//!   once the write has committed.
//! - **Not found**: write paths check affected-row counts and report
//!   [`TaskError::NotFound`] instead of silently succeeding.
//! - **Archived is terminal**: only [`TaskStore::archive_completed`] moves a
//!   task into `archived`, and nothing moves it back out.

use std::path::Path;

use chrono::Utc;
use rusqlite::TransactionBehavior;
use todo_settings::DatabaseSettings;
use tracing::{debug, info};

use crate::connection::{self, ConnectionConfig, ConnectionPool};
use crate::errors::{Result, TaskError};
use crate::migrations::run_migrations;
use crate::model::{Status, Task};
use crate::repository::TaskRepository;
use crate::types::{TagCount, TaskFilter};

/// Handle to a task database.
///
/// Cheap to clone; clones share the same pool. Safe to use from several
/// threads, with write ordering left to `SQLite`'s own locking.
#[derive(Clone)]
pub struct TaskStore {
    pool: ConnectionPool,
}

impl TaskStore {
    // ─────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────

    /// Open (or create) the database file at `path`.
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path, config: &ConnectionConfig) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "opening task database");
        Self::from_pool(connection::new_file(path, config)?)
    }

    /// Open the database described by the `database` settings section.
    pub fn open_from_settings(settings: &DatabaseSettings) -> Result<Self> {
        Self::open(&settings.path, &ConnectionConfig::from(settings))
    }

    /// Private in-memory database, gone when the last clone is dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_pool(connection::new_in_memory(&ConnectionConfig::default())?)
    }

    /// Wrap an existing pool, creating the schema if needed.
    pub fn from_pool(pool: ConnectionPool) -> Result<Self> {
        let conn = pool.get()?;
        run_migrations(&conn)?;
        drop(conn);
        info!(max_connections = pool.max_size(), "task store ready");
        Ok(Self { pool })
    }

    // ─────────────────────────────────────────────────────────────────────
    // CRUD
    // ─────────────────────────────────────────────────────────────────────

    /// Validate and insert `task`, returning the new ID.
    ///
    /// On success `task.id` and `task.created_at` hold the stored values.
    pub fn create(&self, task: &mut Task) -> Result<i64> {
        task.validate()?;
        let now = Utc::now();

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = TaskRepository::insert_task(&tx, task, &now)?;
        TaskRepository::replace_tags(&tx, id, &task.tags)?;
        tx.commit()?;

        task.id = id;
        task.created_at = now;
        debug!(task_id = id, title = %task.title, "task created");
        Ok(id)
    }

    /// Validate and overwrite the stored task with the same ID.
    ///
    /// All mutable fields and the tag list are replaced; `created_at` is
    /// kept. A task cannot be moved into or out of `archived` this way.
    pub fn update(&self, task: &mut Task) -> Result<()> {
        task.validate()?;
        let now = Utc::now();

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = TaskRepository::get_status(&tx, task.id)?
            .ok_or_else(|| TaskError::not_found(task.id))?;
        check_transition(task.id, &current, &task.status)?;

        if TaskRepository::update_task(&tx, task, &now)? == 0 {
            return Err(TaskError::not_found(task.id));
        }
        TaskRepository::replace_tags(&tx, task.id, &task.tags)?;
        tx.commit()?;

        task.updated_at = Some(now);
        debug!(task_id = task.id, "task updated");
        Ok(())
    }

    /// Delete the task with `id`.
    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self.pool.get()?;
        if !TaskRepository::delete_task(&conn, id)? {
            return Err(TaskError::not_found(id));
        }
        debug!(task_id = id, "task deleted");
        Ok(())
    }

    /// Fetch the task with `id`.
    pub fn get(&self, id: i64) -> Result<Task> {
        let conn = self.pool.get()?;
        TaskRepository::get_task(&conn, id)?.ok_or_else(|| TaskError::not_found(id))
    }

    /// Tasks matching `filter`, soonest due first (undated tasks lead), then
    /// newest first.
    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let conn = self.pool.get()?;
        let tasks = TaskRepository::list_tasks(&conn, filter)?;
        debug!(?filter, count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Status transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Mark one task `completed` and stamp `updated_at`.
    ///
    /// Fails with a validation error if the task is already archived.
    pub fn mark_complete(&self, id: i64) -> Result<()> {
        let conn = self.pool.get()?;
        if TaskRepository::mark_complete(&conn, id, &Utc::now())? {
            debug!(task_id = id, "task completed");
            return Ok(());
        }
        match TaskRepository::get_status(&conn, id)? {
            Some(_) => Err(TaskError::Validation(format!(
                "task {id} is archived and cannot be completed"
            ))),
            None => Err(TaskError::not_found(id)),
        }
    }

    /// Move every `completed` task to `archived`, returning how many moved.
    pub fn archive_completed(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        let archived = TaskRepository::archive_completed(&conn, &Utc::now())?;
        info!(archived, "archived completed tasks");
        Ok(archived)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tags
    // ─────────────────────────────────────────────────────────────────────

    /// Tags in use, with the number of tasks carrying each.
    pub fn list_tags(&self) -> Result<Vec<TagCount>> {
        let conn = self.pool.get()?;
        TaskRepository::list_tags(&conn)
    }

    /// Drop tag names no task uses any more.
    pub fn prune_tags(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        let removed = TaskRepository::prune_tags(&conn)?;
        debug!(removed, "pruned unused tags");
        Ok(removed)
    }
}

/// `archived` may only be entered through [`TaskStore::archive_completed`] and
/// never left.
fn check_transition(id: i64, from: &str, to: &str) -> Result<()> {
    let archived = Status::Archived.as_sql();
    let from_archived = from.eq_ignore_ascii_case(archived);
    let to_archived = to.eq_ignore_ascii_case(archived);
    match (from_archived, to_archived) {
        (true, false) => Err(TaskError::Validation(format!(
            "task {id} is archived and cannot change status"
        ))),
        (false, true) => Err(TaskError::Validation(format!(
            "task {id} can only be archived once completed, via archive"
        ))),
        _ => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
