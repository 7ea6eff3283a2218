//! Background data task wiring the TUI to the task service.
//!
//! This module bridges the synchronous TUI event loop (crossterm poll-based)
//! with the async [`TaskDataLayer`]. It spawns one tokio task that owns the
//! data layer and communicates with the main thread via [`NetCommand`] /
//! [`NetEvent`] channels.
//!
//! # Architecture
//!
//! ```text
//! TUI (main thread)  ←── NetEvent ───  data task (TaskDataLayer → HTTP)
//!                     ─── NetCommand →
//! ```
//!
//! Commands are handled one at a time in arrival order. Every successful
//! mutation is followed by a reload of the list the UI is showing.

use std::time::Duration;

use tokio::sync::mpsc;

use taskdesk_proto::task::{Task, TaskFilter, TaskId};
use taskdesk_proto::validate::FieldError;
use taskdesk_proto::wire::TaskPayload;

use crate::api::{ClientError, HttpTaskApi, TaskBackend};
use crate::data::{Connectivity, TaskDataLayer};
use crate::retry::RetryPolicy;

/// Commands sent from the TUI main loop to the data task.
#[derive(Debug, Clone)]
pub enum NetCommand {
    /// Probe the server (again) and, if it answers, load `filter`.
    Connect {
        /// List to load once online.
        filter: TaskFilter,
    },
    /// Load a list, from the cache if present.
    Load {
        /// Which list.
        filter: TaskFilter,
    },
    /// Drop cached data and load a list.
    Refresh {
        /// Which list.
        filter: TaskFilter,
    },
    /// Create a task, then reload `filter`.
    Create {
        /// Raw form fields.
        payload: TaskPayload,
        /// List to reload afterwards.
        filter: TaskFilter,
    },
    /// Update a task, then reload `filter`.
    Update {
        /// Task to change.
        id: TaskId,
        /// Raw form fields.
        payload: TaskPayload,
        /// List to reload afterwards.
        filter: TaskFilter,
    },
    /// Flip a task between pending and completed, then reload `filter`.
    Toggle {
        /// The task as currently displayed.
        task: Task,
        /// List to reload afterwards.
        filter: TaskFilter,
    },
    /// Delete a task, then reload `filter`.
    Delete {
        /// Task to delete.
        id: TaskId,
        /// List to reload afterwards.
        filter: TaskFilter,
    },
    /// Stop the data task.
    Shutdown,
}

/// Events sent from the data task to the TUI main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    /// Server reachability changed, or a reconnect attempt finished.
    Connectivity(Connectivity),
    /// A list finished loading.
    TasksLoaded {
        /// The filter it was loaded for.
        filter: TaskFilter,
        /// Matching tasks, sorted by due date.
        tasks: Vec<Task>,
    },
    /// A list could not be loaded.
    LoadFailed {
        /// The filter that failed.
        filter: TaskFilter,
        /// Why.
        error: ClientError,
    },
    /// A create or update succeeded.
    Saved {
        /// The stored task.
        task: Task,
        /// `true` for a create.
        created: bool,
    },
    /// The server rejected a create or update with field errors.
    SaveRejected(Vec<FieldError>),
    /// A create or update failed for another reason.
    SaveFailed(ClientError),
    /// A status toggle succeeded.
    StatusChanged(Task),
    /// A delete succeeded.
    Deleted(TaskId),
    /// A toggle or delete failed.
    MutationFailed(ClientError),
}

/// Configuration for the data task.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Base URL of the task API.
    pub api_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Backoff schedule for reads.
    pub retry: RetryPolicy,
    /// Capacity of both channels.
    pub channel_capacity: usize,
}

/// Spawn the data task against the HTTP API and return channel handles.
///
/// Nothing is sent until the caller issues [`NetCommand::Connect`].
///
/// # Errors
///
/// Returns an error if the API URL is invalid or the HTTP client cannot be
/// built.
pub fn spawn_net(
    config: &NetConfig,
) -> Result<(mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>), ClientError> {
    let api = HttpTaskApi::new(&config.api_url, config.request_timeout)?;
    tracing::info!(api = %api.base_url(), "data task starting");
    Ok(spawn_with_backend(
        TaskDataLayer::new(api, config.retry),
        config.channel_capacity,
    ))
}

/// Spawn the data task over any [`TaskBackend`].
pub fn spawn_with_backend<B>(
    data: TaskDataLayer<B>,
    channel_capacity: usize,
) -> (mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>)
where
    B: TaskBackend + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(channel_capacity.max(1));
    let (evt_tx, evt_rx) = mpsc::channel(channel_capacity.max(1));
    tokio::spawn(run(data, cmd_rx, evt_tx));
    (cmd_tx, evt_rx)
}

async fn run<B: TaskBackend>(
    data: TaskDataLayer<B>,
    mut cmd_rx: mpsc::Receiver<NetCommand>,
    evt_tx: mpsc::Sender<NetEvent>,
) {
    let mut reported = data.connectivity();
    while let Some(cmd) = cmd_rx.recv().await {
        if matches!(cmd, NetCommand::Shutdown) {
            break;
        }
        let mut events = Vec::new();
        handle(&data, cmd, &mut events).await;

        // Surface connectivity changes caused by any request.
        let current = data.connectivity();
        if current != reported {
            if !events.iter().any(|e| matches!(e, NetEvent::Connectivity(_))) {
                events.insert(0, NetEvent::Connectivity(current.clone()));
            }
            reported = current;
        }
        for event in events {
            if evt_tx.send(event).await.is_err() {
                tracing::debug!("event receiver dropped, stopping data task");
                return;
            }
        }
    }
    tracing::info!("data task stopped");
}

async fn handle<B: TaskBackend>(
    data: &TaskDataLayer<B>,
    cmd: NetCommand,
    events: &mut Vec<NetEvent>,
) {
    match cmd {
        NetCommand::Connect { filter } => {
            // Always answer so the UI can clear its loading state.
            let state = data.retry_connection().await;
            let online = state.is_online();
            events.push(NetEvent::Connectivity(state));
            if online {
                load(data, filter, events).await;
            }
        }
        NetCommand::Load { filter } => load(data, filter, events).await,
        NetCommand::Refresh { filter } => match data.refresh(filter).await {
            Ok(tasks) => events.push(NetEvent::TasksLoaded { filter, tasks }),
            Err(error) => events.push(NetEvent::LoadFailed { filter, error }),
        },
        NetCommand::Create { payload, filter } => {
            let result = data.create(&payload).await;
            save_outcome(data, result, true, filter, events).await;
        }
        NetCommand::Update { id, payload, filter } => {
            let result = data.update(id, &payload).await;
            save_outcome(data, result, false, filter, events).await;
        }
        NetCommand::Toggle { task, filter } => match data.toggle_status(&task).await {
            Ok(task) => {
                tracing::info!(id = %task.id, status = %task.status, "status toggled");
                events.push(NetEvent::StatusChanged(task));
                load(data, filter, events).await;
            }
            Err(e) => events.push(NetEvent::MutationFailed(e)),
        },
        NetCommand::Delete { id, filter } => match data.delete(id).await {
            Ok(()) => {
                tracing::info!(%id, "task deleted");
                events.push(NetEvent::Deleted(id));
                load(data, filter, events).await;
            }
            Err(e) => events.push(NetEvent::MutationFailed(e)),
        },
        NetCommand::Shutdown => {}
    }
}

async fn save_outcome<B: TaskBackend>(
    data: &TaskDataLayer<B>,
    result: Result<Task, ClientError>,
    created: bool,
    filter: TaskFilter,
    events: &mut Vec<NetEvent>,
) {
    match result {
        Ok(task) => {
            tracing::info!(id = %task.id, created, "task saved");
            events.push(NetEvent::Saved { task, created });
            load(data, filter, events).await;
        }
        Err(ClientError::Validation(errors)) => events.push(NetEvent::SaveRejected(errors)),
        Err(e) => {
            tracing::warn!(error = %e, "save failed");
            events.push(NetEvent::SaveFailed(e));
        }
    }
}

async fn load<B: TaskBackend>(
    data: &TaskDataLayer<B>,
    filter: TaskFilter,
    events: &mut Vec<NetEvent>,
) {
    match data.tasks(filter).await {
        Ok(tasks) => events.push(NetEvent::TasksLoaded { filter, tasks }),
        Err(error) => {
            tracing::warn!(%error, ?filter, "load failed");
            events.push(NetEvent::LoadFailed { filter, error });
        }
    }
}
