//! Task data model and operation wire format.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

/// A single task record.
///
/// Timestamps are optional at the wire level: a record arriving without
/// `updatedAt` compares as the earliest possible instant. The sync engine
/// stamps both timestamps when it creates a task locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque unique identifier.
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Immutable after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Monotonic non-decreasing per id across local writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a task with the given id and title; remaining fields default.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            priority: Priority::Medium,
            status: TaskStatus::Todo,
            due_date: None,
            project: None,
            created_at: None,
            updated_at: None,
            completed_at: None,
        }
    }

    /// Update timestamp for ordering and conflict comparison.
    ///
    /// A missing timestamp is treated as the earliest possible value.
    pub fn updated_ts(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Partial field set for task updates.
///
/// `None` means "leave unchanged"; clearing an optional field is not
/// expressible through a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Overwrite the present fields onto `task`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(project) = &self.project {
            task.project = Some(project.clone());
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = Some(completed_at);
        }
        if let Some(updated_at) = self.updated_at {
            task.updated_at = Some(updated_at);
        }
    }
}

/// A recorded intent to mutate a task, queued pending transmission.
///
/// Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    Create {
        task: Task,
    },
    Update {
        #[serde(rename = "taskId")]
        task_id: String,
        updates: TaskPatch,
    },
    Delete {
        #[serde(rename = "taskId")]
        task_id: String,
    },
}

/// A project grouping tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Project {
    /// Built-in project set served when none have been saved.
    pub fn defaults() -> Vec<Project> {
        let entries = [
            ("inbox", "Inbox", "#6366F1"),
            ("work", "Work", "#8B5CF6"),
            ("personal", "Personal", "#10B981"),
            ("learning", "Learning", "#F59E0B"),
        ];
        entries
            .iter()
            .map(|(id, name, color)| Project {
                id: (*id).to_string(),
                name: (*name).to_string(),
                color: (*color).to_string(),
            })
            .collect()
    }
}

/// Response body for `GET /api/tasks` and `POST /api/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksPayload {
    pub tasks: Vec<Task>,
}

/// Request body for `POST /api/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncBatch {
    pub ops: Vec<Operation>,
}

/// Sort tasks newest-updated first.
///
/// This ordering is a contract of the local store's `list()`, and merge
/// results are re-sorted with it before being persisted.
pub fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.updated_ts().cmp(&a.updated_ts()));
}
