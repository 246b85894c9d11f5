//! Task entity, creation drafts, and partial-update patches.

use super::{ParsePriorityError, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority level.
///
/// Derives [`Ord`] so comparisons are ordinal (`Low < Medium < High`), never
/// a lexical string compare.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Lowest urgency.
    Low,
    /// Default urgency.
    #[default]
    Medium,
    /// Highest urgency.
    High,
}

impl Priority {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

/// The central task entity.
///
/// `created_at` and `updated_at` are server-authored and are `None` exactly
/// while a record is optimistic and unacknowledged; the client never
/// fabricates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    completed: bool,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a server-confirmed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTaskData {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Completion flag.
    pub completed: bool,
    /// Priority level.
    pub priority: Priority,
    /// Optional due timestamp.
    pub due_date: Option<DateTime<Utc>>,
    /// Completion timestamp; set iff `completed` is true.
    pub completed_at: Option<DateTime<Utc>>,
    /// Server-authored creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Server-authored last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates an optimistic local record from a validated draft.
    ///
    /// The record carries no server-authored timestamps until the create is
    /// acknowledged.
    #[must_use]
    pub fn optimistic(draft: &TaskDraft, id: TaskId) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            completed: false,
            priority: draft.priority,
            due_date: draft.due_date,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Reconstructs a task from server-confirmed data.
    #[must_use]
    pub fn from_remote(data: RemoteTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            completed: data.completed,
            priority: data.priority,
            due_date: data.due_date,
            completed_at: data.completed_at,
            created_at: Some(data.created_at),
            updated_at: Some(data.updated_at),
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the task is completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns the priority level.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the optional due timestamp.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the completion timestamp, set iff the task is completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the server-authored creation timestamp, if acknowledged.
    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns the server-authored last-update timestamp, if acknowledged.
    #[must_use]
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Applies a partial update in place.
    pub(crate) fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
    }

    /// Sets the completion flag, maintaining the `completed_at` invariant:
    /// the timestamp is present iff the task is completed.
    pub(crate) fn set_completed(&mut self, completed: bool, at: DateTime<Utc>) {
        self.completed = completed;
        self.completed_at = completed.then_some(at);
    }

    /// Merges server-authoritative fields from an acknowledgement.
    ///
    /// Always adopts the server's identifier and lifecycle timestamps; adopts
    /// the completion fields as well when `include_completion` is set (toggle
    /// acknowledgements, where the server owns `completed_at`).
    pub(crate) fn merge_authoritative(&mut self, server: &Self, include_completion: bool) {
        self.id = server.id.clone();
        self.created_at = server.created_at;
        self.updated_at = server.updated_at;
        if include_completion {
            self.completed = server.completed;
            self.completed_at = server.completed_at;
        }
    }

    /// Stamps a server-side update time. Used by server emulations.
    pub(crate) fn touch_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}

/// Validated payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// Creates a draft with the required title.
    ///
    /// The title is trimmed before validation and storage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is empty or
    /// whitespace-only.
    pub fn new(title: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self {
            title: trimmed.to_owned(),
            description: None,
            priority: Priority::default(),
            due_date: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due timestamp.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Returns the draft title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the draft description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the draft priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the draft due timestamp.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }
}

/// Partial update for an existing task.
///
/// The description and due date use a double `Option` so a patch can
/// distinguish "leave unchanged" (`None`) from "clear the value"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is empty or
    /// whitespace-only.
    pub fn with_title(mut self, title: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        self.title = Some(trimmed.to_owned());
        Ok(self)
    }

    /// Sets or clears the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Sets a new priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets or clears the due timestamp.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Reports whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    /// Returns the new title, if set.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}
