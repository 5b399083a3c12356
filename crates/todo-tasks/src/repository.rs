//! SQL data access layer for tasks and tags.
//!
//! All methods take a `&Connection` and are stateless. They translate between
//! Rust types and SQL and leave validation, timestamps, and not-found
//! reporting to [`TaskStore`](crate::TaskStore). Callers that touch both the
//! task row and its tag links pass a transaction (which derefs to
//! `Connection`).

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::Result;
use crate::model::{Status, Task, tags_from_string};
use crate::types::{TagCount, TaskFilter};

/// Column list shared by every task query. Tags are folded back into their
/// comma-joined form in link order.
const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.priority, t.status, \
     t.created_at, t.updated_at, t.due_at, t.reminder_at, t.notes, \
     (SELECT group_concat(tg.name, ',' ORDER BY tt.position) \
        FROM task_tags tt JOIN tags tg ON tg.id = tt.tag_id \
       WHERE tt.task_id = t.id) AS tags";

/// Encode a timestamp as fixed-width RFC 3339 UTC text.
///
/// Fixed width keeps lexical order equal to chronological order, which the
/// `ORDER BY due_at` listing relies on. That holds for years 0000-9999, the
/// range [`Task::validate`] admits.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decode a timestamp written by [`format_timestamp`].
pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Task repository for SQL CRUD operations.
pub struct TaskRepository;

impl TaskRepository {
    // ─────────────────────────────────────────────────────────────────────
    // Task CRUD
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a task row and return its new ID. Tags are written separately
    /// with [`Self::replace_tags`].
    pub fn insert_task(conn: &Connection, task: &Task, created_at: &DateTime<Utc>) -> Result<i64> {
        let _ = conn.execute(
            "INSERT INTO tasks (title, description, priority, status, created_at,
             due_at, reminder_at, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.title,
                task.description,
                task.priority,
                task.status,
                format_timestamp(created_at),
                task.due_at.as_ref().map(format_timestamp),
                task.reminder_at.as_ref().map(format_timestamp),
                task.notes,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Overwrite every mutable column of the row with `task.id`.
    ///
    /// `created_at` is never touched. Returns the number of rows changed.
    pub fn update_task(conn: &Connection, task: &Task, updated_at: &DateTime<Utc>) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE tasks
             SET title = ?1, description = ?2, priority = ?3, status = ?4,
                 updated_at = ?5, due_at = ?6, reminder_at = ?7, notes = ?8
             WHERE id = ?9",
            params![
                task.title,
                task.description,
                task.priority,
                task.status,
                format_timestamp(updated_at),
                task.due_at.as_ref().map(format_timestamp),
                task.reminder_at.as_ref().map(format_timestamp),
                task.notes,
                task.id,
            ],
        )?;
        Ok(changed)
    }

    /// Replace the tag links of a task with `tags`, in order.
    ///
    /// Unknown tag names are added to `tags`. Duplicates are kept since each
    /// link is keyed by position.
    pub fn replace_tags(conn: &Connection, task_id: i64, tags: &[String]) -> Result<()> {
        let _ = conn.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;

        let mut upsert = conn.prepare_cached("INSERT OR IGNORE INTO tags (name) VALUES (?1)")?;
        let mut lookup = conn.prepare_cached("SELECT id FROM tags WHERE name = ?1")?;
        let mut link = conn.prepare_cached(
            "INSERT INTO task_tags (task_id, tag_id, position) VALUES (?1, ?2, ?3)",
        )?;

        for (position, name) in tags.iter().enumerate() {
            let _ = upsert.execute(params![name])?;
            let tag_id: i64 = lookup.query_row(params![name], |row| row.get(0))?;
            let _ = link.execute(params![task_id, tag_id, position as i64])?;
        }
        Ok(())
    }

    /// Delete a task by ID. Returns true if a row was deleted.
    ///
    /// Tag links go with it through `ON DELETE CASCADE`.
    pub fn delete_task(conn: &Connection, id: i64) -> Result<bool> {
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Get a task by ID.
    pub fn get_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1");
        let task = conn
            .query_row(&sql, params![id], task_from_row)
            .optional()?;
        Ok(task)
    }

    /// Current status string of a task, if it exists.
    pub fn get_status(conn: &Connection, id: i64) -> Result<Option<String>> {
        let status = conn
            .query_row("SELECT status FROM tasks WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(status)
    }

    /// List tasks matching `filter`, soonest due first, newest first among
    /// equal due dates.
    ///
    /// Tasks without a due date sort before dated ones (`SQLite` orders NULL
    /// lowest).
    pub fn list_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("lower(t.status) = ?");
            values.push(Box::new(status.as_sql()));
        }
        if let Some(priority) = filter.priority {
            conditions.push("lower(t.priority) = ?");
            values.push(Box::new(priority.as_sql()));
        }
        if let Some(ref tag) = filter.tag {
            conditions.push(
                "EXISTS (SELECT 1 FROM task_tags tt JOIN tags tg ON tg.id = tt.tag_id \
                 WHERE tt.task_id = t.id AND tg.name = ?)",
            );
            values.push(Box::new(tag.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks t {where_clause} \
             ORDER BY t.due_at ASC, t.created_at DESC, t.id DESC"
        );

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params_refs.as_slice(), task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Status transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Set one task to `completed` unless it is already archived. Returns
    /// true if a row changed.
    pub fn mark_complete(conn: &Connection, id: i64, updated_at: &DateTime<Utc>) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3 AND lower(status) <> ?4",
            params![
                Status::Completed.as_sql(),
                format_timestamp(updated_at),
                id,
                Status::Archived.as_sql(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Move every `completed` task (any letter case) to `archived` in one
    /// statement. Returns the number of rows changed.
    pub fn archive_completed(conn: &Connection, updated_at: &DateTime<Utc>) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE lower(status) = ?3",
            params![
                Status::Archived.as_sql(),
                format_timestamp(updated_at),
                Status::Completed.as_sql(),
            ],
        )?;
        Ok(changed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tags
    // ─────────────────────────────────────────────────────────────────────

    /// Tags currently linked to at least one task, by name.
    pub fn list_tags(conn: &Connection) -> Result<Vec<TagCount>> {
        let mut stmt = conn.prepare(
            "SELECT tg.name, COUNT(DISTINCT tt.task_id) \
             FROM tags tg JOIN task_tags tt ON tt.tag_id = tg.id \
             GROUP BY tg.id ORDER BY tg.name",
        )?;
        let tags = stmt
            .query_map([], |row| {
                Ok(TagCount {
                    name: row.get(0)?,
                    task_count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Remove tags no task links to any more. Returns how many were removed.
    pub fn prune_tags(conn: &Connection) -> Result<usize> {
        let removed = conn.execute(
            "DELETE FROM tags WHERE id NOT IN (SELECT DISTINCT tag_id FROM task_tags)",
            [],
        )?;
        Ok(removed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row converters
// ─────────────────────────────────────────────────────────────────────────────

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let tags: Option<String> = row.get(10)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        priority: row.get(3)?,
        status: row.get(4)?,
        created_at: timestamp_column(row, 5)?.ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(5, "created_at".to_string(), Type::Null)
        })?,
        updated_at: timestamp_column(row, 6)?,
        due_at: timestamp_column(row, 7)?,
        reminder_at: timestamp_column(row, 8)?,
        notes: row.get(9)?,
        tags: tags.as_deref().map(tags_from_string).unwrap_or_default(),
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        parse_timestamp(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::migrations::run_migrations;
    use crate::model::Priority;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, 12, 0, 0).unwrap()
    }

    fn insert(conn: &Connection, task: &Task, created_day: u32) -> i64 {
        let id = TaskRepository::insert_task(conn, task, &at(created_day)).unwrap();
        TaskRepository::replace_tags(conn, id, &task.tags).unwrap();
        id
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    // --- timestamps ---

    #[test]
    fn timestamp_format_is_fixed_width_and_lossless() {
        let ts = Utc.timestamp_opt(1_700_000_000, 5).unwrap();
        let text = format_timestamp(&ts);
        assert_eq!(text, "2023-11-14T22:13:20.000000005Z");
        assert_eq!(parse_timestamp(&text).unwrap(), ts);
        assert_eq!(format_timestamp(&at(1)).len(), text.len());
    }

    // --- CRUD ---

    #[test]
    fn insert_and_get_round_trip() {
        let conn = setup_db();
        let task = Task {
            description: Some("2%".to_string()),
            due_at: Some(at(20)),
            notes: Some("corner shop".to_string()),
            tags: vec!["errand".to_string(), "food".to_string()],
            ..Task::new("Buy milk")
        };
        let id = insert(&conn, &task, 1);

        let fetched = TaskRepository::get_task(&conn, id).unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.created_at, at(1));
        assert_eq!(fetched.due_at, Some(at(20)));
        assert_eq!(fetched.reminder_at, None);
        assert_eq!(fetched.updated_at, None);
        assert_eq!(fetched.tags, vec!["errand", "food"]);
        assert_eq!(fetched.description.as_deref(), Some("2%"));
    }

    #[test]
    fn get_missing_is_none() {
        let conn = setup_db();
        assert!(TaskRepository::get_task(&conn, 404).unwrap().is_none());
        assert!(TaskRepository::get_status(&conn, 404).unwrap().is_none());
    }

    #[test]
    fn update_missing_changes_nothing() {
        let conn = setup_db();
        let task = Task {
            id: 9,
            ..Task::new("ghost")
        };
        assert_eq!(TaskRepository::update_task(&conn, &task, &at(2)).unwrap(), 0);
    }

    #[test]
    fn update_keeps_created_at() {
        let conn = setup_db();
        let id = insert(&conn, &Task::new("Old"), 1);
        let task = Task {
            id,
            title: "New".to_string(),
            ..Task::new("")
        };
        assert_eq!(TaskRepository::update_task(&conn, &task, &at(3)).unwrap(), 1);

        let fetched = TaskRepository::get_task(&conn, id).unwrap().unwrap();
        assert_eq!(fetched.title, "New");
        assert_eq!(fetched.created_at, at(1));
        assert_eq!(fetched.updated_at, Some(at(3)));
    }

    #[test]
    fn replace_tags_preserves_order_and_duplicates() {
        let conn = setup_db();
        let id = insert(&conn, &Task::new("t"), 1);
        let tags: Vec<String> = ["b", "a", "b"].iter().map(|s| (*s).to_string()).collect();
        TaskRepository::replace_tags(&conn, id, &tags).unwrap();

        let fetched = TaskRepository::get_task(&conn, id).unwrap().unwrap();
        assert_eq!(fetched.tags, tags);

        TaskRepository::replace_tags(&conn, id, &[]).unwrap();
        let fetched = TaskRepository::get_task(&conn, id).unwrap().unwrap();
        assert!(fetched.tags.is_empty());
    }

    #[test]
    fn delete_cascades_links() {
        let conn = setup_db();
        let task = Task {
            tags: vec!["x".to_string()],
            ..Task::new("t")
        };
        let id = insert(&conn, &task, 1);
        assert!(TaskRepository::delete_task(&conn, id).unwrap());
        assert!(!TaskRepository::delete_task(&conn, id).unwrap());
        assert!(TaskRepository::list_tags(&conn).unwrap().is_empty());
    }

    // --- listing ---

    #[test]
    fn list_orders_by_due_then_newest() {
        let conn = setup_db();
        let due = |title: &str, day| Task {
            due_at: Some(at(day)),
            ..Task::new(title)
        };
        insert(&conn, &due("late", 25), 1);
        insert(&conn, &due("soon-old", 10), 2);
        insert(&conn, &due("soon-new", 10), 3);
        insert(&conn, &Task::new("undated"), 4);

        let tasks = TaskRepository::list_tasks(&conn, &TaskFilter::all()).unwrap();
        assert_eq!(titles(&tasks), vec!["undated", "soon-new", "soon-old", "late"]);
    }

    #[test]
    fn list_filters_are_anded() {
        let conn = setup_db();
        insert(
            &conn,
            &Task {
                priority: "HIGH".to_string(),
                tags: vec!["work".to_string()],
                ..Task::new("a")
            },
            1,
        );
        insert(
            &conn,
            &Task {
                priority: "high".to_string(),
                ..Task::new("b")
            },
            2,
        );
        insert(
            &conn,
            &Task {
                status: "completed".to_string(),
                priority: "high".to_string(),
                tags: vec!["work".to_string()],
                ..Task::new("c")
            },
            3,
        );

        let high = TaskFilter::all().with_priority(Priority::High);
        assert_eq!(
            titles(&TaskRepository::list_tasks(&conn, &high).unwrap()),
            vec!["c", "b", "a"]
        );

        let pending_work = high.with_status(Status::Pending).with_tag("work");
        let completed = TaskFilter::all().with_status(Status::Completed);
        assert_eq!(
            titles(&TaskRepository::list_tasks(&conn, &completed).unwrap()),
            vec!["c"]
        );
        assert_eq!(
            titles(&TaskRepository::list_tasks(&conn, &pending_work).unwrap()),
            vec!["a"]
        );
    }

    #[test]
    fn list_with_no_match_is_empty() {
        let conn = setup_db();
        insert(&conn, &Task::new("a"), 1);
        let filter = TaskFilter::all().with_tag("nope");
        assert!(TaskRepository::list_tasks(&conn, &filter).unwrap().is_empty());
    }

    // --- transitions ---

    #[test]
    fn mark_complete_skips_archived() {
        let conn = setup_db();
        let id = insert(
            &conn,
            &Task {
                status: "archived".to_string(),
                ..Task::new("old")
            },
            1,
        );
        assert!(!TaskRepository::mark_complete(&conn, id, &at(2)).unwrap());
        assert_eq!(
            TaskRepository::get_status(&conn, id).unwrap().as_deref(),
            Some("archived")
        );
    }

    #[test]
    fn archive_matches_status_in_any_case() {
        let conn = setup_db();
        let id = insert(
            &conn,
            &Task {
                status: "Completed".to_string(),
                ..Task::new("shouty")
            },
            1,
        );
        assert_eq!(TaskRepository::archive_completed(&conn, &at(2)).unwrap(), 1);
        assert_eq!(
            TaskRepository::get_status(&conn, id).unwrap().as_deref(),
            Some("archived")
        );
    }

    #[test]
    fn archive_completed_counts_rows() {
        let conn = setup_db();
        let a = insert(&conn, &Task::new("a"), 1);
        let b = insert(&conn, &Task::new("b"), 2);
        insert(&conn, &Task::new("c"), 3);
        assert!(TaskRepository::mark_complete(&conn, a, &at(4)).unwrap());
        assert!(TaskRepository::mark_complete(&conn, b, &at(4)).unwrap());

        assert_eq!(TaskRepository::archive_completed(&conn, &at(5)).unwrap(), 2);
        assert_eq!(TaskRepository::archive_completed(&conn, &at(6)).unwrap(), 0);

        let archived = TaskRepository::get_task(&conn, a).unwrap().unwrap();
        assert_eq!(archived.status, "archived");
        assert_eq!(archived.updated_at, Some(at(5)));
    }

    // --- tags ---

    #[test]
    fn list_tags_counts_tasks() {
        let conn = setup_db();
        let tagged = |title: &str, tags: &[&str]| Task {
            tags: tags.iter().map(|s| (*s).to_string()).collect(),
            ..Task::new(title)
        };
        insert(&conn, &tagged("a", &["work", "home"]), 1);
        insert(&conn, &tagged("b", &["work", "work"]), 2);

        let tags = TaskRepository::list_tags(&conn).unwrap();
        assert_eq!(
            tags,
            vec![
                TagCount {
                    name: "home".to_string(),
                    task_count: 1
                },
                TagCount {
                    name: "work".to_string(),
                    task_count: 2
                },
            ]
        );
    }

    #[test]
    fn prune_removes_unlinked_tags() {
        let conn = setup_db();
        let id = insert(
            &conn,
            &Task {
                tags: vec!["keep".to_string(), "drop".to_string()],
                ..Task::new("t")
            },
            1,
        );
        TaskRepository::replace_tags(&conn, id, &["keep".to_string()]).unwrap();
        assert_eq!(TaskRepository::prune_tags(&conn).unwrap(), 1);
        assert_eq!(TaskRepository::prune_tags(&conn).unwrap(), 0);
    }
}
