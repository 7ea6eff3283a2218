//! Integration tests: HTTP client against a live in-process server.
//!
//! Starts `taskdesk-server` over a memory store on an OS-assigned port and
//! drives it through `HttpTaskApi` and `TaskDataLayer`, covering:
//! - The create / complete / delete lifecycle of a single task
//! - Field-level validation errors surfaced to the client
//! - Filtered listing over every status/priority combination
//! - Not-found versus validation on unknown ids
//! - The connectivity probe

use std::time::Duration;

use taskdesk::api::{ClientError, HttpTaskApi, TaskBackend};
use taskdesk::data::{Connectivity, TaskDataLayer};
use taskdesk::retry::RetryPolicy;
use taskdesk_proto::task::{Priority, TaskFilter, TaskId, TaskStatus};
use taskdesk_proto::wire::TaskPayload;

/// Start the server in-process and return a client for its API.
async fn start_api() -> (HttpTaskApi, tokio::task::JoinHandle<()>) {
    let (addr, handle) = taskdesk_server::server::start_in_memory("127.0.0.1:0")
        .await
        .expect("failed to start server");
    let api = HttpTaskApi::new(&format!("http://{addr}/api"), Duration::from_secs(5))
        .expect("valid base url");
    (api, handle)
}

fn payload(title: &str, due: &str, priority: Option<&str>, status: Option<&str>) -> TaskPayload {
    TaskPayload {
        title: Some(title.to_string()),
        description: None,
        due_date: Some(due.to_string()),
        priority: priority.map(str::to_string),
        status: status.map(str::to_string),
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn buy_milk_lifecycle() {
    let (api, _handle) = start_api().await;

    let created = api
        .create(&payload("Buy milk", "2025-01-10", Some("low"), None))
        .await
        .expect("create should succeed");
    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.priority, Priority::Low);
    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(created.due_date.format("%Y-%m-%d").to_string(), "2025-01-10");

    let completed = api
        .set_status(created.id, TaskStatus::Completed)
        .await
        .expect("status change should succeed");
    assert_eq!(completed.status, TaskStatus::Completed);
    assert!(completed.updated_at >= created.updated_at);

    api.delete(created.id).await.expect("delete should succeed");
    assert_eq!(api.get(created.id).await, Err(ClientError::NotFound));
}

#[tokio::test]
async fn update_changes_only_sent_fields() {
    let (api, _handle) = start_api().await;
    let created = api
        .create(&TaskPayload {
            description: Some("two litres".to_string()),
            ..payload("Buy milk", "2025-01-10", Some("high"), None)
        })
        .await
        .unwrap();

    let updated = api
        .update(
            created.id,
            &TaskPayload {
                title: Some("Buy oat milk".to_string()),
                ..TaskPayload::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Buy oat milk");
    assert_eq!(updated.description.as_deref(), Some("two litres"));
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(api.get(created.id).await.unwrap(), updated);
}

// =============================================================================
// Validation and not-found
// =============================================================================

#[tokio::test]
async fn short_title_is_a_validation_error() {
    let (api, _handle) = start_api().await;
    match api.create(&payload("ab", "2025-01-10", None, None)).await {
        Err(ClientError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.field == "title"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(api.list(TaskFilter::ALL).await.unwrap().is_empty());
}

#[tokio::test]
async fn all_field_errors_are_reported_together() {
    let (api, _handle) = start_api().await;
    let result = api
        .create(&payload("", "not a date", Some("urgent"), None))
        .await;
    let Err(ClientError::Validation(errors)) = result else {
        panic!("expected validation error, got {result:?}");
    };
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"dueDate"));
    assert!(fields.contains(&"priority"));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (api, _handle) = start_api().await;
    let missing = TaskId::new();
    assert_eq!(api.get(missing).await, Err(ClientError::NotFound));
    assert_eq!(
        api.update(missing, &payload("Buy milk", "2025-01-10", None, None))
            .await,
        Err(ClientError::NotFound)
    );
    assert_eq!(
        api.set_status(missing, TaskStatus::Completed).await,
        Err(ClientError::NotFound)
    );
    assert_eq!(api.delete(missing).await, Err(ClientError::NotFound));
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn filters_select_exact_combination() {
    let (api, _handle) = start_api().await;
    let mut day = 1;
    for status in ["pending", "completed"] {
        for priority in ["low", "medium", "high"] {
            api.create(&payload(
                &format!("{priority} {status}"),
                &format!("2025-01-{day:02}"),
                Some(priority),
                Some(status),
            ))
            .await
            .unwrap();
            day += 1;
        }
    }

    let all = api.list(TaskFilter::ALL).await.unwrap();
    assert_eq!(all.len(), 6);
    assert!(all.windows(2).all(|w| w[0].due_date <= w[1].due_date));

    let hits = api
        .list(TaskFilter {
            status: Some(TaskStatus::Pending),
            priority: Some(Priority::Medium),
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "medium pending");

    let completed = api
        .list(TaskFilter {
            status: Some(TaskStatus::Completed),
            priority: None,
        })
        .await
        .unwrap();
    assert_eq!(completed.len(), 3);
    assert!(completed.iter().all(|t| t.status == TaskStatus::Completed));
}

// =============================================================================
// Connectivity
// =============================================================================

#[tokio::test]
async fn probe_reports_healthy_store() {
    let (api, _handle) = start_api().await;
    let probe = api.probe().await.expect("probe should succeed");
    assert_eq!(probe.message, "Backend server is running");
    assert!(probe.store.is_healthy());
}

#[tokio::test]
async fn data_layer_goes_online_and_caches() {
    let (api, _handle) = start_api().await;
    let layer = TaskDataLayer::new(api, RetryPolicy::none());
    assert_eq!(layer.probe().await, Connectivity::Online);

    let created = layer
        .create(&payload("Buy milk", "2025-01-10", None, None))
        .await
        .unwrap();
    assert_eq!(layer.tasks(TaskFilter::ALL).await.unwrap(), vec![created]);
    assert!(layer.cache().list(TaskFilter::ALL).is_some());
}

#[tokio::test]
async fn data_layer_detects_missing_server() {
    // Grab a free port, then release it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpTaskApi::new(&format!("http://{addr}/api"), Duration::from_secs(2)).unwrap();
    let layer = TaskDataLayer::new(api, RetryPolicy::none());
    assert!(matches!(layer.probe().await, Connectivity::Offline(_)));
    assert!(matches!(
        layer.tasks(TaskFilter::ALL).await,
        Err(ClientError::Offline { .. })
    ));
}
