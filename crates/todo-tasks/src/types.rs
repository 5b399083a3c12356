//! Query types for listing tasks and tags.

use serde::{Deserialize, Serialize};

use crate::model::{Priority, Status};

/// Filter for [`TaskStore::list`](crate::TaskStore::list).
///
/// Every set field must match; an empty filter matches all tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    /// Status match, ignoring the letter case the task was stored with.
    pub status: Option<Status>,
    /// Priority match, ignoring the letter case the task was stored with.
    pub priority: Option<Priority>,
    /// Tasks carrying this tag.
    pub tag: Option<String>,
}

impl TaskFilter {
    /// Filter matching every task.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one status.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to one priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restrict to tasks tagged `tag`.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// A tag name and how many tasks carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    /// Tag text.
    pub name: String,
    /// Number of tasks linked to the tag.
    pub task_count: u32,
}
