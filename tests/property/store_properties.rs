//! Property-based tests for the in-memory task store.
//!
//! Uses proptest to verify, for arbitrary task collections:
//! 1. `list` is sorted ascending by due date whatever the insertion order.
//! 2. A filtered list contains exactly the matching tasks.
//! 3. `create` followed by `get` returns the input fields unchanged.
//! 4. Toggling a status twice through the store restores it.
//! 5. Mutations on an unknown id report not-found.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use taskdesk_proto::task::{NewTask, Priority, TaskChanges, TaskFilter, TaskId, TaskStatus};
use taskdesk_server::store::{MemoryStore, StoreError, TaskStore};

// --- Strategies ---

fn arb_new_task() -> impl Strategy<Value = NewTask> {
    (
        "[a-zA-Z][a-zA-Z ]{2,30}",
        prop::option::of("[a-z ]{1,40}"),
        0_i64..3_650,
        prop::sample::select(Priority::ALL.to_vec()),
        prop::sample::select(TaskStatus::ALL.to_vec()),
    )
        .prop_map(|(title, description, days, priority, status)| NewTask {
            title,
            description,
            due_date: epoch() + Duration::days(days),
            priority,
            status,
        })
}

fn arb_filter() -> impl Strategy<Value = TaskFilter> {
    (
        prop::option::of(prop::sample::select(TaskStatus::ALL.to_vec())),
        prop::option::of(prop::sample::select(Priority::ALL.to_vec())),
    )
        .prop_map(|(status, priority)| TaskFilter { status, priority })
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime")
        .block_on(future)
}

// --- Properties ---

proptest! {
    #[test]
    fn list_is_sorted_by_due_date(tasks in prop::collection::vec(arb_new_task(), 0..40)) {
        let listed = block_on(async {
            let store = MemoryStore::new();
            for fields in tasks.clone() {
                store.create(fields).await.unwrap();
            }
            store.list(TaskFilter::ALL).await.unwrap()
        });
        prop_assert_eq!(listed.len(), tasks.len());
        prop_assert!(listed.windows(2).all(|w| w[0].due_date <= w[1].due_date));
    }

    #[test]
    fn filtered_list_is_exactly_the_matches(
        tasks in prop::collection::vec(arb_new_task(), 0..40),
        filter in arb_filter(),
    ) {
        let (all, filtered) = block_on(async {
            let store = MemoryStore::new();
            for fields in tasks {
                store.create(fields).await.unwrap();
            }
            (
                store.list(TaskFilter::ALL).await.unwrap(),
                store.list(filter).await.unwrap(),
            )
        });
        prop_assert!(filtered.iter().all(|t| filter.matches(t)));
        let expected: Vec<_> = all.into_iter().filter(|t| filter.matches(t)).collect();
        prop_assert_eq!(filtered, expected);
    }

    #[test]
    fn create_then_get_returns_input(fields in arb_new_task()) {
        let (created, fetched) = block_on(async {
            let store = MemoryStore::new();
            let created = store.create(fields.clone()).await.unwrap();
            let fetched = store.get(created.id).await.unwrap();
            (created, fetched)
        });
        prop_assert_eq!(&fetched, &created);
        prop_assert_eq!(fetched.title, fields.title);
        prop_assert_eq!(fetched.description, fields.description);
        prop_assert_eq!(fetched.due_date, fields.due_date);
        prop_assert_eq!(fetched.priority, fields.priority);
        prop_assert_eq!(fetched.status, fields.status);
        prop_assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[test]
    fn double_toggle_restores_status(fields in arb_new_task()) {
        let original = fields.status;
        let restored = block_on(async {
            let store = MemoryStore::new();
            let task = store.create(fields).await.unwrap();
            let once = store.set_status(task.id, task.status.toggled()).await.unwrap();
            store.set_status(once.id, once.status.toggled()).await.unwrap()
        });
        prop_assert_eq!(restored.status, original);
    }

    #[test]
    fn unknown_ids_are_not_found(fields in arb_new_task()) {
        let results = block_on(async {
            let store = MemoryStore::new();
            store.create(fields).await.unwrap();
            let missing = TaskId::new();
            (
                store.get(missing).await,
                store.replace(missing, TaskChanges::default()).await,
                store.set_status(missing, TaskStatus::Completed).await,
                store.delete(missing).await,
            )
        });
        prop_assert!(matches!(results.0, Err(StoreError::NotFound(_))));
        prop_assert!(matches!(results.1, Err(StoreError::NotFound(_))));
        prop_assert!(matches!(results.2, Err(StoreError::NotFound(_))));
        prop_assert!(matches!(results.3, Err(StoreError::NotFound(_))));
    }
}
