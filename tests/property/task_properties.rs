//! Property-based tests for the task model and validation rules.
//!
//! Uses proptest to verify:
//! 1. Toggling a status twice gives the original status.
//! 2. Any title shorter than three characters after trimming is rejected
//!    with a `title` error, however much whitespace surrounds it.
//! 3. Any title of three or more characters is accepted and stored trimmed.
//! 4. A filter matches a task exactly when both present halves agree.
//! 5. Filter query strings parse to the filter they name.
//! 6. Timestamps survive the JSON wire format at millisecond precision.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use taskdesk_proto::task::{NewTask, Priority, Task, TaskFilter, TaskId, TaskStatus, now};
use taskdesk_proto::validate::{validate_create, validate_filter};
use taskdesk_proto::wire::{FilterQuery, TaskPayload};

// --- Strategies ---

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

fn arb_filter() -> impl Strategy<Value = TaskFilter> {
    (prop::option::of(arb_status()), prop::option::of(arb_priority()))
        .prop_map(|(status, priority)| TaskFilter { status, priority })
}

/// Any instant between 2000 and 2100, at millisecond precision.
fn arb_due_date() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800_000_i64..4_102_444_800_000_i64).prop_map(|ms| {
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
    })
}

fn arb_task() -> impl Strategy<Value = Task> {
    ("[a-zA-Z]{3,20}", arb_due_date(), arb_priority(), arb_status()).prop_map(
        |(title, due_date, priority, status)| {
            Task::new(
                TaskId::new(),
                NewTask {
                    title,
                    description: None,
                    due_date,
                    priority,
                    status,
                },
                now(),
            )
        },
    )
}

fn payload_with_title(title: String) -> TaskPayload {
    TaskPayload {
        title: Some(title),
        due_date: Some("2025-01-10".to_string()),
        ..TaskPayload::default()
    }
}

// --- Properties ---

proptest! {
    #[test]
    fn toggle_is_an_involution(status in arb_status()) {
        prop_assert_eq!(status.toggled().toggled(), status);
        prop_assert_ne!(status.toggled(), status);
    }

    #[test]
    fn short_titles_are_rejected(
        body in "[a-zA-Z0-9]{0,2}",
        left in " {0,4}",
        right in " {0,4}",
    ) {
        let errors = validate_create(&payload_with_title(format!("{left}{body}{right}")))
            .expect_err("short title must be rejected");
        prop_assert!(errors.for_field("title").is_some());
        // Only the title is wrong.
        prop_assert_eq!(errors.errors().len(), 1);
    }

    #[test]
    fn long_enough_titles_are_trimmed_and_kept(
        body in "[a-zA-Z0-9][a-zA-Z0-9 ]{1,40}[a-zA-Z0-9]",
        pad in " {0,3}",
    ) {
        let fields = validate_create(&payload_with_title(format!("{pad}{body}{pad}")))
            .expect("title is long enough");
        prop_assert_eq!(fields.title, body);
        prop_assert_eq!(fields.priority, Priority::Medium);
        prop_assert_eq!(fields.status, TaskStatus::Pending);
    }

    #[test]
    fn filter_matches_iff_halves_agree(filter in arb_filter(), task in arb_task()) {
        let expected = filter.status.is_none_or(|s| s == task.status)
            && filter.priority.is_none_or(|p| p == task.priority);
        prop_assert_eq!(filter.matches(&task), expected);
        prop_assert!(TaskFilter::ALL.matches(&task));
    }

    #[test]
    fn filter_query_parses_to_named_filter(filter in arb_filter()) {
        let query = FilterQuery {
            status: filter.status.map(|s| s.as_str().to_string()),
            priority: filter.priority.map(|p| p.as_str().to_string()),
        };
        prop_assert_eq!(validate_filter(&query).expect("valid filter"), filter);

        let pairs = filter.query_pairs();
        prop_assert_eq!(
            pairs.len(),
            usize::from(filter.status.is_some()) + usize::from(filter.priority.is_some())
        );
    }

    #[test]
    fn task_json_keeps_millisecond_timestamps(task in arb_task()) {
        let json = serde_json::to_value(&task).expect("serialize");
        prop_assert!(json.get("dueDate").and_then(|v| v.as_str()).is_some_and(|s| s.ends_with('Z')));
        let back: Task = serde_json::from_value(json).expect("deserialize");
        prop_assert_eq!(back, task);
    }
}

#[test]
fn two_character_title_example() {
    let errors = validate_create(&payload_with_title(" ab ".to_string())).unwrap_err();
    assert_eq!(
        errors.for_field("title").map(|e| e.message.as_str()),
        Some("Title must be at least 3 characters long")
    );
}
