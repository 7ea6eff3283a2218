//! Indexed in-memory task table shared by every store backend.
//!
//! Besides the id → record map, the table keeps two secondary indexes:
//! an ordered `(due_date, id)` set used for sorted listing, and one such set
//! per `(status, priority)` pair so the fully-filtered query reads a single
//! bucket. Every mutation goes through [`TaskTable::insert`],
//! [`TaskTable::remove`] or [`TaskTable::update`], which keep the indexes in
//! step with the records.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use taskdesk_proto::task::{Priority, Task, TaskFilter, TaskId, TaskStatus};

type DueKey = (DateTime<Utc>, TaskId);

/// Task records plus their due-date and `(status, priority)` indexes.
#[derive(Debug, Default, Clone)]
pub struct TaskTable {
    records: HashMap<TaskId, Task>,
    by_due: BTreeSet<DueKey>,
    by_status_priority: HashMap<(TaskStatus, Priority), BTreeSet<DueKey>>,
}

impl TaskTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from loaded records. A repeated id keeps the last record.
    #[must_use]
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut table = Self::new();
        for task in tasks {
            table.insert(task);
        }
        table
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.records.get(id)
    }

    /// Inserts or replaces a record, returning the previous one.
    pub fn insert(&mut self, task: Task) -> Option<Task> {
        let previous = self.remove(&task.id);
        self.index(&task);
        self.records.insert(task.id, task);
        previous
    }

    /// Removes a record, returning it if it existed.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let task = self.records.remove(id)?;
        self.unindex(&task);
        Some(task)
    }

    /// Mutates a record in place and re-indexes it.
    ///
    /// Returns `(before, after)` copies, or `None` if the id is unknown.
    pub fn update(&mut self, id: &TaskId, mutate: impl FnOnce(&mut Task)) -> Option<(Task, Task)> {
        let mut task = self.remove(id)?;
        let before = task.clone();
        mutate(&mut task);
        // The id is the primary key and never changes.
        task.id = before.id;
        let after = task.clone();
        self.index(&task);
        self.records.insert(task.id, task);
        Some((before, after))
    }

    /// Records passing `filter`, ascending by due date then id.
    #[must_use]
    pub fn list(&self, filter: TaskFilter) -> Vec<Task> {
        match (filter.status, filter.priority) {
            (Some(status), Some(priority)) => self
                .by_status_priority
                .get(&(status, priority))
                .map(|bucket| self.resolve(bucket.iter()))
                .unwrap_or_default(),
            _ => self
                .resolve(self.by_due.iter())
                .into_iter()
                .filter(|task| filter.matches(task))
                .collect(),
        }
    }

    /// Every record in due-date order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.resolve(self.by_due.iter())
    }

    fn resolve<'a>(&self, keys: impl Iterator<Item = &'a DueKey>) -> Vec<Task> {
        keys.filter_map(|(_, id)| self.records.get(id))
            .cloned()
            .collect()
    }

    fn index(&mut self, task: &Task) {
        let key = (task.due_date, task.id);
        self.by_due.insert(key);
        self.by_status_priority
            .entry((task.status, task.priority))
            .or_default()
            .insert(key);
    }

    fn unindex(&mut self, task: &Task) {
        let key = (task.due_date, task.id);
        self.by_due.remove(&key);
        let bucket_key = (task.status, task.priority);
        if let Some(bucket) = self.by_status_priority.get_mut(&bucket_key) {
            bucket.remove(&key);
            if bucket.is_empty() {
                self.by_status_priority.remove(&bucket_key);
            }
        }
    }

    /// Asserts that both indexes describe exactly the stored records.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.by_due.len(), self.records.len());
        let bucketed: usize = self.by_status_priority.values().map(BTreeSet::len).sum();
        assert_eq!(bucketed, self.records.len());
        for task in self.records.values() {
            let key = (task.due_date, task.id);
            assert!(self.by_due.contains(&key));
            assert!(
                self.by_status_priority
                    .get(&(task.status, task.priority))
                    .is_some_and(|b| b.contains(&key))
            );
        }
    }
}
