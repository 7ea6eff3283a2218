//! Integration tests for the background data task.
//!
//! Tests that `net::spawn_net` wires `TaskDataLayer` + `HttpTaskApi` to a
//! live server and that the TUI-facing channels behave:
//! - `Connect` reports connectivity and then the first list
//! - Mutations are acknowledged and followed by a fresh list
//! - Server-side validation errors come back as `SaveRejected`
//! - An unreachable server yields `Offline` and blocks mutations
//! - `Shutdown` stops the task

use std::time::Duration;

use tokio::sync::mpsc;

use taskdesk::data::Connectivity;
use taskdesk::net::{self, NetCommand, NetConfig, NetEvent};
use taskdesk::retry::RetryPolicy;
use taskdesk_proto::task::{TaskFilter, TaskStatus};
use taskdesk_proto::wire::TaskPayload;

/// Start the server in-process and return its API base URL.
async fn start_server() -> (String, tokio::task::JoinHandle<()>) {
    let (addr, handle) = taskdesk_server::server::start_in_memory("127.0.0.1:0")
        .await
        .expect("failed to start server");
    (format!("http://{addr}/api"), handle)
}

fn make_config(api_url: &str) -> NetConfig {
    NetConfig {
        api_url: api_url.to_string(),
        request_timeout: Duration::from_secs(2),
        retry: RetryPolicy::none(),
        channel_capacity: 16,
    }
}

async fn next_event(rx: &mut mpsc::Receiver<NetEvent>) -> NetEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for event")
        .expect("channel closed unexpectedly")
}

fn buy_milk() -> TaskPayload {
    TaskPayload {
        title: Some("Buy milk".to_string()),
        due_date: Some("2025-01-10".to_string()),
        priority: Some("low".to_string()),
        ..TaskPayload::default()
    }
}

#[tokio::test]
async fn connect_reports_online_then_loads() {
    let (url, _handle) = start_server().await;
    let (cmd_tx, mut evt_rx) = net::spawn_net(&make_config(&url)).expect("spawn_net failed");

    cmd_tx
        .send(NetCommand::Connect {
            filter: TaskFilter::ALL,
        })
        .await
        .unwrap();

    assert_eq!(
        next_event(&mut evt_rx).await,
        NetEvent::Connectivity(Connectivity::Online)
    );
    match next_event(&mut evt_rx).await {
        NetEvent::TasksLoaded { filter, tasks } => {
            assert_eq!(filter, TaskFilter::ALL);
            assert!(tasks.is_empty());
        }
        other => panic!("expected TasksLoaded, got: {other:?}"),
    }
}

#[tokio::test]
async fn mutations_are_followed_by_a_reload() {
    let (url, _handle) = start_server().await;
    let (cmd_tx, mut evt_rx) = net::spawn_net(&make_config(&url)).unwrap();
    let filter = TaskFilter::ALL;

    cmd_tx.send(NetCommand::Connect { filter }).await.unwrap();
    next_event(&mut evt_rx).await;
    next_event(&mut evt_rx).await;

    cmd_tx
        .send(NetCommand::Create {
            payload: buy_milk(),
            filter,
        })
        .await
        .unwrap();
    let created = match next_event(&mut evt_rx).await {
        NetEvent::Saved { task, created } => {
            assert!(created);
            task
        }
        other => panic!("expected Saved, got: {other:?}"),
    };
    assert_eq!(
        next_event(&mut evt_rx).await,
        NetEvent::TasksLoaded {
            filter,
            tasks: vec![created.clone()],
        }
    );

    cmd_tx
        .send(NetCommand::Toggle {
            task: created.clone(),
            filter,
        })
        .await
        .unwrap();
    match next_event(&mut evt_rx).await {
        NetEvent::StatusChanged(task) => assert_eq!(task.status, TaskStatus::Completed),
        other => panic!("expected StatusChanged, got: {other:?}"),
    }
    match next_event(&mut evt_rx).await {
        NetEvent::TasksLoaded { tasks, .. } => {
            assert_eq!(tasks[0].status, TaskStatus::Completed);
        }
        other => panic!("expected TasksLoaded, got: {other:?}"),
    }

    cmd_tx
        .send(NetCommand::Delete {
            id: created.id,
            filter,
        })
        .await
        .unwrap();
    assert_eq!(next_event(&mut evt_rx).await, NetEvent::Deleted(created.id));
    assert_eq!(
        next_event(&mut evt_rx).await,
        NetEvent::TasksLoaded {
            filter,
            tasks: Vec::new(),
        }
    );
}

#[tokio::test]
async fn server_validation_comes_back_as_rejection() {
    let (url, _handle) = start_server().await;
    let (cmd_tx, mut evt_rx) = net::spawn_net(&make_config(&url)).unwrap();
    let filter = TaskFilter::ALL;

    cmd_tx.send(NetCommand::Connect { filter }).await.unwrap();
    next_event(&mut evt_rx).await;
    next_event(&mut evt_rx).await;

    cmd_tx
        .send(NetCommand::Create {
            payload: TaskPayload {
                title: Some("ab".to_string()),
                ..buy_milk()
            },
            filter,
        })
        .await
        .unwrap();
    match next_event(&mut evt_rx).await {
        NetEvent::SaveRejected(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "title");
        }
        other => panic!("expected SaveRejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_offline() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (cmd_tx, mut evt_rx) =
        net::spawn_net(&make_config(&format!("http://{addr}/api"))).unwrap();
    let filter = TaskFilter::ALL;

    cmd_tx.send(NetCommand::Connect { filter }).await.unwrap();
    assert!(matches!(
        next_event(&mut evt_rx).await,
        NetEvent::Connectivity(Connectivity::Offline(_))
    ));

    // Retrying while still down answers again rather than staying silent.
    cmd_tx.send(NetCommand::Connect { filter }).await.unwrap();
    assert!(matches!(
        next_event(&mut evt_rx).await,
        NetEvent::Connectivity(Connectivity::Offline(_))
    ));

    cmd_tx
        .send(NetCommand::Create {
            payload: buy_milk(),
            filter,
        })
        .await
        .unwrap();
    assert!(matches!(
        next_event(&mut evt_rx).await,
        NetEvent::SaveFailed(taskdesk::api::ClientError::Offline { .. })
    ));
}

#[tokio::test]
async fn invalid_url_fails_to_spawn() {
    let result = net::spawn_net(&make_config("not a url"));
    assert!(result.is_err());
}

#[tokio::test]
async fn shutdown_closes_event_channel() {
    let (url, _handle) = start_server().await;
    let (cmd_tx, mut evt_rx) = net::spawn_net(&make_config(&url)).unwrap();

    cmd_tx.send(NetCommand::Shutdown).await.unwrap();
    let closed = tokio::time::timeout(Duration::from_secs(5), evt_rx.recv())
        .await
        .expect("timeout waiting for channel close");
    assert!(closed.is_none());
}
