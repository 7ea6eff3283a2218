//! Task domain types.
//!
//! Defines the [`Task`] record, its identifier, the closed `priority` and
//! `status` enums, the list [`TaskFilter`], and the normalized field sets
//! ([`NewTask`], [`TaskChanges`]) produced by the validation layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum task title length in characters, after trimming.
pub const MIN_TITLE_LENGTH: usize = 3;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a valid [`TaskId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task id: {0}")]
pub struct ParseTaskIdError(pub String);

impl FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseTaskIdError(s.to_string()))
    }
}

/// Error returned when a string is not one of an enum's wire values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed (`"priority"` or `"status"`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// The default priority.
    #[default]
    Medium,
    /// Do first.
    High,
}

impl Priority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the wire value (`"low"`, `"medium"`, `"high"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ParseEnumError {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

/// Completion status of a task.
///
/// There are exactly two states; a task card toggles between them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not done yet.
    #[default]
    Pending,
    /// Done.
    Completed,
}

impl TaskStatus {
    /// Both statuses.
    pub const ALL: [Self; 2] = [Self::Pending, Self::Completed];

    /// Returns the wire value (`"pending"` or `"completed"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Returns the other status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(ParseEnumError {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// A persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Trimmed title, at least [`MIN_TITLE_LENGTH`] characters.
    pub title: String,
    /// Optional trimmed description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the task is due.
    #[serde(with = "rfc3339_millis")]
    pub due_date: DateTime<Utc>,
    /// Task priority.
    pub priority: Priority,
    /// Completion status.
    pub status: TaskStatus,
    /// Set once when the store creates the record.
    #[serde(with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
    /// Bumped by every successful mutation.
    #[serde(with = "rfc3339_millis")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a record from validated fields, stamping both timestamps with `now`.
    #[must_use]
    pub fn new(id: TaskId, fields: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            due_date: fields.due_date,
            priority: fields.priority,
            status: fields.status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated fields for a task that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Trimmed title.
    pub title: String,
    /// Trimmed description, `None` when absent or blank.
    pub description: Option<String>,
    /// Parsed due date.
    pub due_date: DateTime<Utc>,
    /// Requested priority or the default.
    pub priority: Priority,
    /// Requested status or the default.
    pub status: TaskStatus,
}

/// Validated field replacements for an existing task.
///
/// `None` leaves a field untouched. For `description`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    /// New title.
    pub title: Option<String>,
    /// New description, or `Some(None)` to clear.
    pub description: Option<Option<String>>,
    /// New due date.
    pub due_date: Option<DateTime<Utc>>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New status.
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    /// Writes every present field into `task` and bumps `updated_at`.
    pub fn apply_to(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        task.updated_at = now;
    }
}

/// Optional `(status, priority)` pair narrowing a list query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TaskFilter {
    /// Only tasks with this status.
    pub status: Option<TaskStatus>,
    /// Only tasks with this priority.
    pub priority: Option<Priority>,
}

impl TaskFilter {
    /// A filter that matches every task.
    pub const ALL: Self = Self {
        status: None,
        priority: None,
    };

    /// Returns `true` if `task` passes both halves of the filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| s == task.status)
            && self.priority.is_none_or(|p| p == task.priority)
    }

    /// Query-string pairs for the present halves, in `status`, `priority` order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str()));
        }
        pairs
    }
}

/// Current time truncated to millisecond precision, the precision of the wire format.
#[must_use]
pub fn now() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

/// Drops sub-millisecond precision so a timestamp survives a JSON round trip unchanged.
#[must_use]
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix.
pub mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes as e.g. `2025-01-10T00:00:00.000Z`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Parses any RFC 3339 timestamp and converts it to UTC.
    ///
    /// # Errors
    ///
    /// Returns a deserializer error for strings that are not RFC 3339.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
