//! Field-level validation for task requests.
//!
//! Every function here is pure: it turns a raw wire payload into normalized
//! fields or into a [`ValidationErrors`] listing *all* the rules the payload
//! violates, so a caller can show every problem at once.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{
    MIN_TITLE_LENGTH, NewTask, Priority, TaskChanges, TaskFilter, TaskId, TaskStatus,
    truncate_to_millis,
};
use crate::wire::{FilterQuery, StatusPayload, TaskPayload};

const TITLE_REQUIRED: &str = "Title is required";
const TITLE_TOO_SHORT: &str = "Title must be at least 3 characters long";
const DUE_DATE_REQUIRED: &str = "Due date is required";
const DUE_DATE_INVALID: &str = "Invalid date format";
const PRIORITY_INVALID: &str = "Priority must be low, medium, or high";
const STATUS_INVALID: &str = "Status must be pending or completed";
const STATUS_REQUIRED: &str = "Status is required";
const ID_INVALID: &str = "Invalid task ID";
const STATUS_FILTER_INVALID: &str = "Invalid status filter";
const PRIORITY_FILTER_INVALID: &str = "Invalid priority filter";

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Wire name of the offending field (`title`, `dueDate`, ...).
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every rule a request violated, in field order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", summarize(.0))]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Wraps a list of field errors.
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    /// The individual field errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// The first error reported for `field`, if any.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    /// Consumes the wrapper and returns the field errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates a create request.
///
/// `title` and `dueDate` are required; `priority` and `status` fall back to
/// their defaults when absent but must be valid when present.
///
/// # Errors
///
/// Returns every violated rule.
pub fn validate_create(payload: &TaskPayload) -> Result<NewTask, ValidationErrors> {
    let mut errors = Vec::new();

    let title = match payload.title.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("title", TITLE_REQUIRED));
            None
        }
        Some(title) => check_title(title, &mut errors),
    };
    let description = payload.description.as_deref().and_then(normalize_description);
    let due_date = match payload.due_date.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("dueDate", DUE_DATE_REQUIRED));
            None
        }
        Some(raw) => check_due_date(raw, &mut errors),
    };
    let priority = check_priority(payload.priority.as_deref(), &mut errors);
    let status = check_status(payload.status.as_deref(), &mut errors);

    match (title, due_date, errors.is_empty()) {
        (Some(title), Some(due_date), true) => Ok(NewTask {
            title,
            description,
            due_date,
            priority: priority.unwrap_or_default(),
            status: status.unwrap_or_default(),
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

/// Validates an update request against the id taken from the path.
///
/// Every body field is optional; each one that is present must satisfy its
/// rule. A malformed id is reported alongside any body errors.
///
/// # Errors
///
/// Returns every violated rule.
pub fn validate_update(
    id: &str,
    payload: &TaskPayload,
) -> Result<(TaskId, TaskChanges), ValidationErrors> {
    let mut errors = Vec::new();
    let id = check_id(id, &mut errors);

    let title = payload
        .title
        .as_deref()
        .and_then(|raw| check_title(raw.trim(), &mut errors));
    let description = payload.description.as_deref().map(normalize_description);
    let due_date = payload
        .due_date
        .as_deref()
        .and_then(|raw| check_due_date(raw.trim(), &mut errors));
    let priority = check_priority(payload.priority.as_deref(), &mut errors);
    let status = check_status(payload.status.as_deref(), &mut errors);

    match (id, errors.is_empty()) {
        (Some(id), true) => Ok((
            id,
            TaskChanges {
                title,
                description,
                due_date,
                priority,
                status,
            },
        )),
        _ => Err(ValidationErrors(errors)),
    }
}

/// Validates a status transition request.
///
/// # Errors
///
/// Returns every violated rule: a malformed id, a missing status, or a
/// status outside `pending`/`completed`.
pub fn validate_status_change(
    id: &str,
    payload: &StatusPayload,
) -> Result<(TaskId, TaskStatus), ValidationErrors> {
    let mut errors = Vec::new();
    let id = check_id(id, &mut errors);

    let status = match payload.status.as_deref() {
        None | Some("") => {
            errors.push(FieldError::new("status", STATUS_REQUIRED));
            None
        }
        Some(raw) => check_status(Some(raw), &mut errors),
    };

    match (id, status, errors.is_empty()) {
        (Some(id), Some(status), true) => Ok((id, status)),
        _ => Err(ValidationErrors(errors)),
    }
}

/// Validates list query parameters. An absent parameter means "no filter";
/// one that is present must name a value of its enum, so `?status=` is
/// rejected.
///
/// # Errors
///
/// Returns an error for each parameter outside its enum.
pub fn validate_filter(query: &FilterQuery) -> Result<TaskFilter, ValidationErrors> {
    let mut errors = Vec::new();

    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => raw.parse::<TaskStatus>().map_or_else(
            |_| {
                errors.push(FieldError::new("status", STATUS_FILTER_INVALID));
                None
            },
            Some,
        ),
    };
    let priority = match query.priority.as_deref() {
        None => None,
        Some(raw) => raw.parse::<Priority>().map_or_else(
            |_| {
                errors.push(FieldError::new("priority", PRIORITY_FILTER_INVALID));
                None
            },
            Some,
        ),
    };

    if errors.is_empty() {
        Ok(TaskFilter { status, priority })
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Parses an ISO-8601 due date into a UTC timestamp.
///
/// Accepts RFC 3339 date-times with any offset, minute-precision times with
/// an offset or `Z`, naive date-times (taken as UTC) and plain `YYYY-MM-DD`
/// dates (midnight UTC). Impossible calendar
/// dates such as `2025-02-30` are rejected.
#[must_use]
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(truncate_to_millis(dt.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    // A trailing `Z` on any of the naive forms means UTC.
    let naive_part = raw.strip_suffix(['Z', 'z']).unwrap_or(raw);
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_part, format) {
            return Some(truncate_to_millis(naive.and_utc()));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Per-field rules
// ---------------------------------------------------------------------------

fn check_title(trimmed: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    if trimmed.chars().count() < MIN_TITLE_LENGTH {
        errors.push(FieldError::new("title", TITLE_TOO_SHORT));
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_description(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn check_due_date(trimmed: &str, errors: &mut Vec<FieldError>) -> Option<DateTime<Utc>> {
    let parsed = parse_due_date(trimmed);
    if parsed.is_none() {
        errors.push(FieldError::new("dueDate", DUE_DATE_INVALID));
    }
    parsed
}

fn check_priority(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<Priority> {
    let raw = raw?;
    raw.parse().map_or_else(
        |_| {
            errors.push(FieldError::new("priority", PRIORITY_INVALID));
            None
        },
        Some,
    )
}

fn check_status(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<TaskStatus> {
    let raw = raw?;
    raw.parse().map_or_else(
        |_| {
            errors.push(FieldError::new("status", STATUS_INVALID));
            None
        },
        Some,
    )
}

fn check_id(raw: &str, errors: &mut Vec<FieldError>) -> Option<TaskId> {
    raw.parse().map_or_else(
        |_| {
            errors.push(FieldError::new("id", ID_INVALID));
            None
        },
        Some,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(title: Option<&str>, due_date: Option<&str>) -> TaskPayload {
        TaskPayload {
            title: title.map(String::from),
            due_date: due_date.map(String::from),
            ..TaskPayload::default()
        }
    }

    #[test]
    fn create_applies_defaults() {
        let new = validate_create(&payload(Some("Buy milk"), Some("2025-01-10"))).unwrap();
        assert_eq!(new.title, "Buy milk");
        assert_eq!(new.priority, Priority::Medium);
        assert_eq!(new.status, TaskStatus::Pending);
        assert!(new.description.is_none());
        assert_eq!(new.due_date, Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn create_trims_title_and_description() {
        let mut p = payload(Some("  Buy milk  "), Some("2025-01-10"));
        p.description = Some("  two litres ".to_string());
        let new = validate_create(&p).unwrap();
        assert_eq!(new.title, "Buy milk");
        assert_eq!(new.description.as_deref(), Some("two litres"));
    }

    #[test]
    fn create_blank_description_becomes_none() {
        let mut p = payload(Some("Buy milk"), Some("2025-01-10"));
        p.description = Some("   ".to_string());
        assert!(validate_create(&p).unwrap().description.is_none());
    }

    #[test]
    fn create_rejects_short_title_after_trim() {
        let err = validate_create(&payload(Some(" ab "), Some("2025-01-10"))).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.for_field("title").unwrap().message, TITLE_TOO_SHORT);
    }

    #[test]
    fn create_counts_characters_not_bytes() {
        assert!(validate_create(&payload(Some("äöü"), Some("2025-01-10"))).is_ok());
    }

    #[test]
    fn create_requires_title_and_due_date() {
        let err = validate_create(&TaskPayload::default()).unwrap_err();
        assert_eq!(err.for_field("title").unwrap().message, TITLE_REQUIRED);
        assert_eq!(err.for_field("dueDate").unwrap().message, DUE_DATE_REQUIRED);
    }

    #[test]
    fn create_reports_every_violation_at_once() {
        let p = TaskPayload {
            title: Some("ab".to_string()),
            description: None,
            due_date: Some("tomorrow".to_string()),
            priority: Some("urgent".to_string()),
            status: Some("in_progress".to_string()),
        };
        let err = validate_create(&p).unwrap_err();
        let fields: Vec<&str> = err.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "dueDate", "priority", "status"]);
    }

    #[test]
    fn create_accepts_explicit_enums() {
        let mut p = payload(Some("Buy milk"), Some("2025-01-10"));
        p.priority = Some("low".to_string());
        p.status = Some("completed".to_string());
        let new = validate_create(&p).unwrap();
        assert_eq!(new.priority, Priority::Low);
        assert_eq!(new.status, TaskStatus::Completed);
    }

    #[test]
    fn update_allows_empty_body() {
        let id = TaskId::new();
        let (parsed, changes) = validate_update(&id.to_string(), &TaskPayload::default()).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(changes, TaskChanges::default());
    }

    #[test]
    fn update_validates_present_fields() {
        let id = TaskId::new();
        let p = TaskPayload {
            title: Some("ab".to_string()),
            priority: Some("HIGH".to_string()),
            ..TaskPayload::default()
        };
        let err = validate_update(&id.to_string(), &p).unwrap_err();
        assert!(err.for_field("title").is_some());
        assert!(err.for_field("priority").is_some());
    }

    #[test]
    fn update_reports_bad_id_with_body_errors() {
        let p = TaskPayload {
            due_date: Some("2025-13-01".to_string()),
            ..TaskPayload::default()
        };
        let err = validate_update("12345", &p).unwrap_err();
        assert_eq!(err.for_field("id").unwrap().message, ID_INVALID);
        assert_eq!(err.for_field("dueDate").unwrap().message, DUE_DATE_INVALID);
    }

    #[test]
    fn update_blank_description_clears() {
        let p = TaskPayload {
            description: Some(String::new()),
            ..TaskPayload::default()
        };
        let (_, changes) = validate_update(&TaskId::new().to_string(), &p).unwrap();
        assert_eq!(changes.description, Some(None));
    }

    #[test]
    fn status_change_requires_status() {
        let err = validate_status_change(&TaskId::new().to_string(), &StatusPayload::default())
            .unwrap_err();
        assert_eq!(err.for_field("status").unwrap().message, STATUS_REQUIRED);
    }

    #[test]
    fn status_change_rejects_unknown_status() {
        let p = StatusPayload {
            status: Some("archived".to_string()),
        };
        let err = validate_status_change(&TaskId::new().to_string(), &p).unwrap_err();
        assert_eq!(err.for_field("status").unwrap().message, STATUS_INVALID);
    }

    #[test]
    fn status_change_accepts_both_states() {
        for status in TaskStatus::ALL {
            let p = StatusPayload {
                status: Some(status.to_string()),
            };
            let (_, parsed) = validate_status_change(&TaskId::new().to_string(), &p).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn filter_absent_values_mean_no_filter() {
        assert_eq!(validate_filter(&FilterQuery::default()).unwrap(), TaskFilter::ALL);
    }

    #[test]
    fn filter_rejects_empty_values() {
        let query = FilterQuery {
            status: Some(String::new()),
            priority: Some(String::new()),
        };
        let err = validate_filter(&query).unwrap_err();
        assert_eq!(err.for_field("status").unwrap().message, STATUS_FILTER_INVALID);
        assert_eq!(err.for_field("priority").unwrap().message, PRIORITY_FILTER_INVALID);
    }

    #[test]
    fn filter_rejects_unknown_values() {
        let query = FilterQuery {
            status: Some("done".to_string()),
            priority: Some("urgent".to_string()),
        };
        let err = validate_filter(&query).unwrap_err();
        assert_eq!(err.for_field("status").unwrap().message, STATUS_FILTER_INVALID);
        assert_eq!(err.for_field("priority").unwrap().message, PRIORITY_FILTER_INVALID);
    }

    #[test]
    fn filter_parses_both_halves() {
        let query = FilterQuery {
            status: Some("pending".to_string()),
            priority: Some("medium".to_string()),
        };
        let filter = validate_filter(&query).unwrap();
        assert_eq!(filter.status, Some(TaskStatus::Pending));
        assert_eq!(filter.priority, Some(Priority::Medium));
    }

    #[test]
    fn due_date_formats() {
        let midnight = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(parse_due_date("2025-01-10"), Some(midnight));
        assert_eq!(parse_due_date("2025-01-10T00:00:00Z"), Some(midnight));
        assert_eq!(parse_due_date("2025-01-10T00:00:00.000Z"), Some(midnight));
        assert_eq!(parse_due_date("2025-01-10T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_due_date("2025-01-10T00:00"), Some(midnight));
        assert_eq!(parse_due_date("2025-01-10T00:00:00"), Some(midnight));
    }

    #[test]
    fn due_date_accepts_minute_precision_with_zone() {
        let ten = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap();
        assert_eq!(parse_due_date("2025-01-10T10:00Z"), Some(ten));
        assert_eq!(parse_due_date("2025-01-10T12:00+02:00"), Some(ten));
        assert_eq!(parse_due_date("2025-01-10T05:00-0500"), Some(ten));
        assert_eq!(parse_due_date("2025-01-10T10:00:00.000Z"), Some(ten));
        assert!(validate_create(&payload(Some("Buy milk"), Some("2025-01-10T10:00Z"))).is_ok());
    }

    #[test]
    fn due_date_rejects_impossible_dates() {
        assert!(parse_due_date("2025-02-30").is_none());
        assert!(parse_due_date("2025-13-01").is_none());
        assert!(parse_due_date("next week").is_none());
        assert!(parse_due_date("").is_none());
    }

    #[test]
    fn validation_errors_display_lists_fields() {
        let err = ValidationErrors::new(vec![
            FieldError::new("title", "too short"),
            FieldError::new("dueDate", "missing"),
        ]);
        assert_eq!(err.to_string(), "validation failed: title: too short; dueDate: missing");
    }
}
