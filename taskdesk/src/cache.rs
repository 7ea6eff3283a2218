//! Query cache for fetched task data.
//!
//! Entries are keyed by the query that produced them, so each filter
//! combination is cached separately. Nothing is patched in place: every
//! mutation drops the entries it may have affected and the next read
//! refetches.

use std::collections::HashMap;

use parking_lot::Mutex;

use taskdesk_proto::task::{Task, TaskFilter, TaskId};

/// Identifies a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// A list query with its filter.
    List(TaskFilter),
    /// A single-task query.
    Task(TaskId),
}

#[derive(Debug, Clone)]
enum CachedData {
    List(Vec<Task>),
    Task(Task),
}

/// Thread-safe map from [`QueryKey`] to fetched data.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CachedData>>,
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result of the list query for `filter`.
    #[must_use]
    pub fn list(&self, filter: TaskFilter) -> Option<Vec<Task>> {
        match self.entries.lock().get(&QueryKey::List(filter)) {
            Some(CachedData::List(tasks)) => Some(tasks.clone()),
            _ => None,
        }
    }

    /// Cached result of the single-task query for `id`.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Task> {
        match self.entries.lock().get(&QueryKey::Task(id)) {
            Some(CachedData::Task(task)) => Some(task.clone()),
            _ => None,
        }
    }

    /// Stores a list result.
    pub fn put_list(&self, filter: TaskFilter, tasks: Vec<Task>) {
        self.insert(QueryKey::List(filter), CachedData::List(tasks));
    }

    /// Stores a single-task result.
    pub fn put_task(&self, task: Task) {
        self.insert(QueryKey::Task(task.id), CachedData::Task(task));
    }

    fn insert(&self, key: QueryKey, data: CachedData) {
        self.entries.lock().insert(key, data);
    }

    /// Drops every list entry.
    pub fn invalidate_lists(&self) {
        self.entries
            .lock()
            .retain(|key, _| !matches!(key, QueryKey::List(_)));
    }

    /// Drops the single-task entry for `id`.
    pub fn invalidate_task(&self, id: TaskId) {
        self.entries.lock().remove(&QueryKey::Task(id));
    }

    /// Drops everything.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
