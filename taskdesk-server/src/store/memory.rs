//! Process-local task store.

use tokio::sync::RwLock;

use taskdesk_proto::task::{NewTask, Task, TaskChanges, TaskFilter, TaskId, TaskStatus, now};
use taskdesk_proto::wire::StoreHealth;

use super::{StoreError, TaskStore, TaskTable};

/// Keeps every task in an indexed table behind an async [`RwLock`].
///
/// Nothing survives a restart. Reads share the lock; each mutation holds the
/// write lock for the whole read-modify-write, so concurrent updates to one
/// record are serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<TaskTable>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

}

impl TaskStore for MemoryStore {
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
        self.table.write().await.insert(task.clone());
        Ok(task)
    }

    async fn replace(&self, id: TaskId, changes: TaskChanges) -> Result<Task, StoreError> {
        let stamp = now();
        self.table
            .write()
            .await
            .update(&id, |task| changes.apply_to(task, stamp))
            .map(|(_, after)| after)
            .ok_or(StoreError::NotFound(id))
    }

    async fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<Task, StoreError> {
        let changes = TaskChanges {
            status: Some(status),
            ..TaskChanges::default()
        };
        self.replace(id, changes).await
    }

    async fn delete(&self, id: TaskId) -> Result<Task, StoreError> {
        self.table
            .write()
            .await
            .remove(&id)
            .ok_or(StoreError::NotFound(id))
    }

    fn health(&self) -> StoreHealth {
        StoreHealth::Healthy
    }
}
