//! JSON request and response bodies exchanged between client and server.
//!
//! Request bodies keep every field as a raw `Option<String>` so that a bad
//! enum value or an unparsable date reaches [`crate::validate`] and is
//! reported as a field error rather than a decoder failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::rfc3339_millis;
use crate::validate::FieldError;

/// Body of `POST /api/tasks` and `PUT /api/tasks/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    /// Task title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO-8601 date or date-time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// `low`, `medium` or `high`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// `pending` or `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Body of `PATCH /api/tasks/:id/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Requested status.
    #[serde(default)]
    pub status: Option<String>,
}

/// Query string of `GET /api/tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterQuery {
    /// Status filter; empty means no filter.
    #[serde(default)]
    pub status: Option<String>,
    /// Priority filter; empty means no filter.
    #[serde(default)]
    pub priority: Option<String>,
}

/// Error body returned with every 4xx and 5xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable summary.
    pub message: String,
    /// Field-level detail, present for validation failures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Body of a successful `DELETE /api/tasks/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Confirmation text.
    pub message: String,
}

/// Health of the task store as reported by the probe endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StoreHealth {
    /// The last store operation succeeded.
    #[default]
    Healthy,
    /// The last persist attempt failed.
    Degraded {
        /// Why the store is degraded.
        reason: String,
    },
}

impl StoreHealth {
    /// Returns `true` for [`StoreHealth::Healthy`].
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Body of `GET /api/test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    /// Fixed liveness message.
    pub message: String,
    /// Server time when the probe was answered.
    #[serde(with = "rfc3339_millis")]
    pub timestamp: DateTime<Utc>,
    /// Store health at that moment.
    pub store: StoreHealth,
}
