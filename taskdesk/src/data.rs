//! Client-side data layer.
//!
//! [`TaskDataLayer`] sits between the UI and a [`TaskBackend`]. It gates
//! every request on a connectivity probe, serves reads from the
//! [`QueryCache`] when possible, retries failed reads, and invalidates the
//! cache after each successful mutation.

use std::fmt;

use parking_lot::RwLock;

use taskdesk_proto::task::{Task, TaskFilter, TaskId, TaskStatus};
use taskdesk_proto::wire::TaskPayload;

use crate::api::{ClientError, TaskBackend};
use crate::cache::QueryCache;
use crate::retry::{RetryPolicy, retry_read};

/// What the client knows about the server's reachability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Connectivity {
    /// No probe has completed yet.
    #[default]
    Unknown,
    /// The last probe or request reached the server.
    Online,
    /// The server could not be reached.
    Offline(String),
}

impl Connectivity {
    /// Returns `true` for [`Connectivity::Online`].
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "connecting"),
            Self::Online => write!(f, "online"),
            Self::Offline(reason) => write!(f, "offline ({reason})"),
        }
    }
}

/// Cached, connectivity-aware access to tasks.
pub struct TaskDataLayer<B> {
    backend: B,
    cache: QueryCache,
    retry: RetryPolicy,
    connectivity: RwLock<Connectivity>,
}

impl<B: TaskBackend> TaskDataLayer<B> {
    /// Wraps `backend`. Connectivity starts as [`Connectivity::Unknown`], so
    /// nothing is fetched until [`Self::probe`] succeeds.
    #[must_use]
    pub fn new(backend: B, retry: RetryPolicy) -> Self {
        Self {
            backend,
            cache: QueryCache::new(),
            retry,
            connectivity: RwLock::new(Connectivity::Unknown),
        }
    }

    /// The wrapped backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The query cache.
    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Current connectivity.
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity.read().clone()
    }

    fn set_connectivity(&self, next: Connectivity) {
        let mut current = self.connectivity.write();
        if *current != next {
            tracing::info!(from = %*current, to = %next, "connectivity changed");
            *current = next;
        }
    }

    /// Runs the connectivity probe once and records the outcome.
    pub async fn probe(&self) -> Connectivity {
        let next = match self.backend.probe().await {
            Ok(probe) => {
                if !probe.store.is_healthy() {
                    tracing::warn!(store = ?probe.store, "server reports a degraded store");
                }
                Connectivity::Online
            }
            Err(e) => Connectivity::Offline(e.to_string()),
        };
        self.set_connectivity(next.clone());
        next
    }

    /// Re-probes after an offline state. Coming back online clears the
    /// cache so nothing fetched before the outage is shown.
    pub async fn retry_connection(&self) -> Connectivity {
        let was_online = self.connectivity().is_online();
        let next = self.probe().await;
        if next.is_online() && !was_online {
            self.cache.clear();
        }
        next
    }

    fn ensure_online(&self) -> Result<(), ClientError> {
        match &*self.connectivity.read() {
            Connectivity::Online => Ok(()),
            Connectivity::Unknown => Err(ClientError::Offline {
                reason: "connection not established".to_string(),
            }),
            Connectivity::Offline(reason) => Err(ClientError::Offline {
                reason: reason.clone(),
            }),
        }
    }

    /// Marks the server offline if `err` shows it cannot be reached.
    fn observe<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(e) = &result
            && matches!(e, ClientError::Connect(_) | ClientError::Timeout)
        {
            self.set_connectivity(Connectivity::Offline(e.to_string()));
        }
        result
    }

    /// Tasks matching `filter`, from the cache or fetched with retries.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Offline`] without issuing a request unless the
    /// server is known to be online; otherwise the last fetch error.
    pub async fn tasks(&self, filter: TaskFilter) -> Result<Vec<Task>, ClientError> {
        self.ensure_online()?;
        if let Some(tasks) = self.cache.list(filter) {
            return Ok(tasks);
        }
        let tasks = self.observe(retry_read(&self.retry, || self.backend.list(filter)).await)?;
        self.cache.put_list(filter, tasks.clone());
        Ok(tasks)
    }

    /// One task, from the cache or fetched with retries.
    ///
    /// # Errors
    ///
    /// Same as [`Self::tasks`].
    pub async fn task(&self, id: TaskId) -> Result<Task, ClientError> {
        self.ensure_online()?;
        if let Some(task) = self.cache.task(id) {
            return Ok(task);
        }
        let task = self.observe(retry_read(&self.retry, || self.backend.get(id)).await)?;
        self.cache.put_task(task.clone());
        Ok(task)
    }

    /// Drops cached data and refetches the list for `filter`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::tasks`].
    pub async fn refresh(&self, filter: TaskFilter) -> Result<Vec<Task>, ClientError> {
        self.cache.clear();
        self.tasks(filter).await
    }

    /// Creates a task. Sent once, never retried.
    ///
    /// # Errors
    ///
    /// Returns the request error, including [`ClientError::Validation`] for
    /// a rejected payload.
    pub async fn create(&self, payload: &TaskPayload) -> Result<Task, ClientError> {
        self.ensure_online()?;
        let task = self.observe(self.backend.create(payload).await)?;
        self.cache.invalidate_lists();
        Ok(task)
    }

    /// Updates the fields present in `payload`. Sent once, never retried.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn update(&self, id: TaskId, payload: &TaskPayload) -> Result<Task, ClientError> {
        self.ensure_online()?;
        let task = self.observe(self.backend.update(id, payload).await)?;
        self.invalidate_after_change(id);
        Ok(task)
    }

    /// Sets a task's status. Sent once, never retried.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<Task, ClientError> {
        self.ensure_online()?;
        let task = self.observe(self.backend.set_status(id, status).await)?;
        self.invalidate_after_change(id);
        Ok(task)
    }

    /// Flips `task` between pending and completed.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn toggle_status(&self, task: &Task) -> Result<Task, ClientError> {
        self.set_status(task.id, task.status.toggled()).await
    }

    /// Deletes a task. Sent once, never retried.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn delete(&self, id: TaskId) -> Result<(), ClientError> {
        self.ensure_online()?;
        self.observe(self.backend.delete(id).await)?;
        self.invalidate_after_change(id);
        Ok(())
    }

    fn invalidate_after_change(&self, id: TaskId) {
        self.cache.invalidate_lists();
        self.cache.invalidate_task(id);
    }
}
