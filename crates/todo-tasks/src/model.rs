//! The task entity, its vocabularies, and its validation rules.
//!
//! `priority` and `status` are kept as the strings the caller supplied so
//! that a task round-trips through the store unchanged. [`Priority`] and
//! [`Status`] are the recognised vocabularies used to validate and filter
//! them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TaskError};

/// Separator used by the single-string tag encoding.
pub const TAG_DELIMITER: char = ',';

/// Years a stored timestamp can hold. Outside this range RFC 3339 needs a
/// signed expanded year, which is neither fixed width nor readable back.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

// ─────────────────────────────────────────────────────────────────────────────
// Vocabularies
// ─────────────────────────────────────────────────────────────────────────────

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Default priority.
    Medium,
    /// Do first.
    High,
}

impl Priority {
    /// All recognised priorities, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// SQL string representation.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    /// Case-insensitive: `"HIGH"`, `"High"` and `"high"` all parse.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_sql().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                TaskError::Validation(
                    "invalid priority, must be one of: low, medium, high".to_string(),
                )
            })
    }
}

/// Task status in the workflow.
///
/// `Pending → Completed → Archived`; nothing moves a task out of `Archived`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Still to do.
    Pending,
    /// Done.
    Completed,
    /// Done and hidden from active views.
    Archived,
}

impl Status {
    /// All recognised statuses in workflow order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Completed, Self::Archived];

    /// SQL string representation.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Status {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_sql().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                TaskError::Validation(
                    "invalid status, must be one of: pending, completed, archived".to_string(),
                )
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Task
// ─────────────────────────────────────────────────────────────────────────────

/// A single to-do item.
///
/// `id` is `0` until the store assigns one on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier.
    pub id: i64,
    /// Short summary; must not be blank.
    pub title: String,
    /// Longer free-form description.
    pub description: Option<String>,
    /// One of `low`/`medium`/`high`, any letter case.
    pub priority: String,
    /// One of `pending`/`completed`/`archived`. Blank means `pending`.
    pub status: String,
    /// Set by the store on create.
    pub created_at: DateTime<Utc>,
    /// Set by the store on every update or status change.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the task is due.
    pub due_at: Option<DateTime<Utc>>,
    /// When to remind about the task. Stored only.
    pub reminder_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Caller-ordered labels. Must not contain [`TAG_DELIMITER`].
    pub tags: Vec<String>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            description: None,
            priority: Priority::Medium.as_sql().to_string(),
            status: Status::Pending.as_sql().to_string(),
            created_at: Utc::now(),
            updated_at: None,
            due_at: None,
            reminder_at: None,
            notes: None,
            tags: Vec::new(),
        }
    }
}

impl Task {
    /// New unsaved task with default priority and status.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Check the task before it is written.
    ///
    /// Fails on a blank title, an unrecognised priority, or a due/reminder
    /// time outside years 0000-9999. A blank status is filled in as
    /// `pending`.
    pub fn validate(&mut self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TaskError::Validation("title cannot be empty".to_string()));
        }
        let _ = self.priority.parse::<Priority>()?;
        check_storable("due_at", self.due_at.as_ref())?;
        check_storable("reminder_at", self.reminder_at.as_ref())?;
        if self.status.is_empty() {
            self.status = Status::Pending.as_sql().to_string();
        }
        Ok(())
    }

    /// Whether the task is in the `completed` status.
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed.as_sql()
    }

    /// Tags joined into their single-string form.
    pub fn tags_string(&self) -> String {
        tags_to_string(&self.tags)
    }
}

fn check_storable(field: &str, ts: Option<&DateTime<Utc>>) -> Result<()> {
    match ts {
        Some(ts) if !STORABLE_YEARS.contains(&ts.year()) => Err(TaskError::Validation(format!(
            "{field} must fall within years 0000-9999"
        ))),
        _ => Ok(()),
    }
}

/// Join tags with [`TAG_DELIMITER`]. No escaping is applied.
pub fn tags_to_string(tags: &[String]) -> String {
    tags.join(&TAG_DELIMITER.to_string())
}

/// Split a single-string tag encoding. The empty string means no tags.
pub fn tags_from_string(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(TAG_DELIMITER).map(String::from).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
