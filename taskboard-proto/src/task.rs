//! Task model shared by the `Taskboard` client and server.
//!
//! Defines the task record as it travels over the REST API, the create
//! and patch payloads, and the boundary validation rules every record
//! must satisfy before it is handed to the application layer.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a task.
///
/// Server-assigned ids are opaque strings. The client also mints
/// temporary ids for records that have not been confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a task identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Errors raised when a task payload does not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title is empty.
    #[error("title is required")]
    EmptyTitle,
    /// Assignee is empty.
    #[error("assignee is required")]
    EmptyAssignee,
    /// Due date is not an ISO date or RFC 3339 timestamp.
    #[error("invalid due date: {0:?}")]
    InvalidDueDate(String),
    /// Unknown status label.
    #[error("unknown status: {0:?}")]
    UnknownStatus(String),
    /// Unknown priority label.
    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),
    /// Payload could not be decoded at all.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Being worked on.
    Doing,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// All statuses in workflow order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::Doing, Self::Done];

    /// Returns the wire label (`"Todo"`, `"Doing"`, `"Done"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::Doing => "Doing",
            Self::Done => "Done",
        }
    }

    /// Returns the next status in workflow order, wrapping after `Done`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Todo => Self::Doing,
            Self::Doing => Self::Done,
            Self::Done => Self::Todo,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    /// Parses a status label, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// Urgency of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Can wait.
    Low,
    /// Default urgency.
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// All priorities from least to most urgent.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the wire label (`"Low"`, `"Medium"`, `"High"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Returns the next priority, wrapping after `High`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownPriority(s.to_string()))
    }
}

/// Parses a due date as a calendar instant.
///
/// Accepts a plain ISO date (`2025-01-01`, taken as midnight UTC) or a
/// full RFC 3339 timestamp. Returns `None` for anything else.
#[must_use]
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn validate_fields(title: &str, assignee: &str, due_date: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if assignee.is_empty() {
        return Err(ValidationError::EmptyAssignee);
    }
    if parse_due_date(due_date).is_none() {
        return Err(ValidationError::InvalidDueDate(due_date.to_string()));
    }
    Ok(())
}

/// A task record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique, server-assigned identifier.
    pub id: TaskId,
    /// Short summary, never empty.
    pub title: String,
    /// Workflow state.
    pub status: TaskStatus,
    /// Person responsible, never empty.
    pub assignee: String,
    /// Urgency.
    pub priority: Priority,
    /// ISO date (`YYYY-MM-DD`) or RFC 3339 timestamp.
    pub due_date: String,
    /// Optional free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Task {
    /// Builds a task from a create payload and an assigned id.
    #[must_use]
    pub fn from_new(id: TaskId, new: NewTask) -> Self {
        Self {
            id,
            title: new.title,
            status: new.status,
            assignee: new.assignee,
            priority: new.priority,
            due_date: new.due_date,
            description: new.description,
        }
    }

    /// Checks the record against the boundary rules.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] or [`ValidationError::EmptyAssignee`]
    /// for empty required strings, and [`ValidationError::InvalidDueDate`] if the
    /// due date does not parse.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, &self.assignee, &self.due_date)
    }

    /// Merges a patch into this record. Absent fields are preserved.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assignee) = &patch.assignee {
            self.assignee.clone_from(assignee);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = &patch.due_date {
            self.due_date.clone_from(due_date);
        }
        if let Some(description) = &patch.description {
            self.description = if description.is_empty() {
                None
            } else {
                Some(description.clone())
            };
        }
    }

    /// Returns the record's fields without its id.
    #[must_use]
    pub fn to_new(&self) -> NewTask {
        NewTask {
            title: self.title.clone(),
            status: self.status,
            assignee: self.assignee.clone(),
            priority: self.priority,
            due_date: self.due_date.clone(),
            description: self.description.clone(),
        }
    }
}

/// Payload for creating a task: every field except the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Short summary.
    pub title: String,
    /// Initial workflow state.
    pub status: TaskStatus,
    /// Person responsible.
    pub assignee: String,
    /// Urgency.
    pub priority: Priority,
    /// ISO date or RFC 3339 timestamp.
    pub due_date: String,
    /// Optional notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTask {
    /// Checks the payload against the boundary rules.
    ///
    /// # Errors
    ///
    /// Same rules as [`Task::validate`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, &self.assignee, &self.due_date)
    }
}

/// Partial update for a task. `None` fields are left untouched.
///
/// An empty `description` clears the stored description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// New assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaskPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.status.is_none()
            && self.assignee.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.description.is_none()
    }

    /// Checks the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Task::validate`], but only for fields
    /// the patch sets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.as_deref().is_some_and(str::is_empty) {
            return Err(ValidationError::EmptyTitle);
        }
        if self.assignee.as_deref().is_some_and(str::is_empty) {
            return Err(ValidationError::EmptyAssignee);
        }
        if let Some(due) = &self.due_date
            && parse_due_date(due).is_none()
        {
            return Err(ValidationError::InvalidDueDate(due.clone()));
        }
        Ok(())
    }
}

/// A user known to the backend, offered as an assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}
