//! Task store persisted as a JSON document.
//!
//! The whole collection is kept in memory and rewritten to disk after every
//! mutation. Writes go to a sibling `.tmp` file that is then renamed over the
//! document, so a crash mid-write never leaves a truncated file behind. If a
//! write fails the in-memory change is rolled back and the store reports
//! itself as degraded until the next successful write.

use std::path::{Path, PathBuf};

use parking_lot::RwLock as HealthLock;
use tokio::sync::RwLock;

use taskdesk_proto::task::{NewTask, Task, TaskChanges, TaskFilter, TaskId, TaskStatus, now};
use taskdesk_proto::wire::StoreHealth;

use super::{OpenRetry, StoreError, TaskStore, TaskTable};

/// JSON-document backed [`TaskStore`].
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    table: RwLock<TaskTable>,
    health: HealthLock<StoreHealth>,
}

impl FileStore {
    /// Opens the document at `path`, retrying transient read failures.
    ///
    /// A missing document is treated as an empty collection and its parent
    /// directory is created. I/O failures are retried on the `retry`
    /// schedule; a document that exists but does not decode fails at once.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] for an undecodable document, or the
    /// last [`StoreError::Read`] once every attempt has failed.
    pub async fn open(path: impl Into<PathBuf>, retry: OpenRetry) -> Result<Self, StoreError> {
        let path = path.into();
        let attempts = retry.attempts.max(1);
        let mut attempt = 1;
        let table = loop {
            match load(&path).await {
                Ok(table) => break table,
                Err(e @ StoreError::Read { .. }) if attempt < attempts => {
                    let delay = retry.delay_after(attempt);
                    tracing::warn!(
                        path = %path.display(),
                        attempt,
                        attempts,
                        ?delay,
                        error = %e,
                        "store open failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };
        tracing::info!(path = %path.display(), tasks = table.len(), "file store opened");
        Ok(Self {
            path,
            table: RwLock::new(table),
            health: HealthLock::new(StoreHealth::Healthy),
        })
    }

    /// Writes `table` to disk and records the outcome in the health flag.
    async fn persist(&self, table: &TaskTable) -> Result<(), StoreError> {
        let result = write_document(&self.path, table).await;
        match &result {
            Ok(()) => *self.health.write() = StoreHealth::Healthy,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to persist tasks");
                *self.health.write() = StoreHealth::Degraded {
                    reason: e.to_string(),
                };
            }
        }
        result
    }
}

async fn load(path: &Path) -> Result<TaskTable, StoreError> {
    let read_err = |source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(read_err)?;
    }
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TaskTable::new()),
        Err(e) => return Err(read_err(e)),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(TaskTable::new());
    }
    let tasks: Vec<Task> = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(TaskTable::from_tasks(tasks))
}

async fn write_document(path: &Path, table: &TaskTable) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(&table.snapshot())?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let persist_err = |source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp, &bytes).await.map_err(persist_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(persist_err)
}

impl TaskStore for FileStore {
    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>, StoreError> {
        Ok(self.table.read().await.list(filter))
    }

    async fn get(&self, id: TaskId) -> Result<Task, StoreError> {
        self.table
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, fields: NewTask) -> Result<Task, StoreError> {
        let task = Task::new(TaskId::new(), fields, now());
        let mut table = self.table.write().await;
        table.insert(task.clone());
        if let Err(e) = self.persist(&table).await {
            table.remove(&task.id);
            return Err(e);
        }
        drop(table);
        Ok(task)
    }

    async fn replace(&self, id: TaskId, changes: TaskChanges) -> Result<Task, StoreError> {
        let stamp = now();
        let mut table = self.table.write().await;
        let (before, after) = table
            .update(&id, |task| changes.apply_to(task, stamp))
            .ok_or(StoreError::NotFound(id))?;
        if let Err(e) = self.persist(&table).await {
            table.insert(before);
            return Err(e);
        }
        drop(table);
        Ok(after)
    }

    async fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<Task, StoreError> {
        let changes = TaskChanges {
            status: Some(status),
            ..TaskChanges::default()
        };
        self.replace(id, changes).await
    }

    async fn delete(&self, id: TaskId) -> Result<Task, StoreError> {
        let mut table = self.table.write().await;
        let removed = table.remove(&id).ok_or(StoreError::NotFound(id))?;
        if let Err(e) = self.persist(&table).await {
            table.insert(removed);
            return Err(e);
        }
        drop(table);
        Ok(removed)
    }

    fn health(&self) -> StoreHealth {
        self.health.read().clone()
    }
}
