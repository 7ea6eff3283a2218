//! Task persistence.
//!
//! [`TaskStore`] is the contract the HTTP layer programs against. Two
//! backends implement it: [`MemoryStore`] keeps everything in process, and
//! [`FileStore`] persists the collection as a JSON document on disk. Both
//! share the indexed [`TaskTable`].

pub mod file;
pub mod memory;
pub mod table;

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use taskdesk_proto::task::{NewTask, Task, TaskChanges, TaskFilter, TaskId, TaskStatus};
use taskdesk_proto::wire::StoreHealth;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use table::TaskTable;

/// Upper bound on the delay between two store open attempts.
const MAX_OPEN_DELAY: Duration = Duration::from_secs(30);

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No task with this id exists.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The backing document could not be read.
    #[error("failed to read store document {path}: {source}")]
    Read {
        /// Path of the document.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The backing document exists but is not a valid task array.
    #[error("corrupt store document {path}: {source}")]
    Corrupt {
        /// Path of the document.
        path: PathBuf,
        /// Decoder error.
        source: serde_json::Error,
    },

    /// Writing the backing document failed.
    #[error("failed to persist tasks to {path}: {source}")]
    Persist {
        /// Path of the document.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The task collection could not be encoded.
    #[error("failed to encode tasks: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Async task persistence with per-record atomic operations.
///
/// # Invariant
///
/// [`TaskStore::list`] returns tasks in ascending `due_date` order, with
/// ties broken by id (creation order).
pub trait TaskStore: Send + Sync + 'static {
    /// Tasks passing `filter`, sorted by due date.
    fn list(
        &self,
        filter: TaskFilter,
    ) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// A single task.
    fn get(&self, id: TaskId) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Inserts a new task, assigning its id and timestamps.
    fn create(&self, fields: NewTask) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Applies validated field replacements to an existing task.
    fn replace(
        &self,
        id: TaskId,
        changes: TaskChanges,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Sets only the status of an existing task.
    fn set_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Removes a task, returning the removed record.
    fn delete(&self, id: TaskId) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Current health of the backend.
    fn health(&self) -> StoreHealth;
}

/// Where tasks are kept, parsed from a store connection string.
///
/// `memory` or `memory://` selects [`MemoryStore`]; `file://<path>` or a
/// bare path selects [`FileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// In-process only.
    Memory,
    /// JSON document at this path.
    File(PathBuf),
}

/// Error returned for an empty store connection string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("store connection string is empty")]
pub struct ParseStoreLocationError;

impl FromStr for StoreLocation {
    type Err = ParseStoreLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" => Err(ParseStoreLocationError),
            "memory" | "memory://" => Ok(Self::Memory),
            _ => {
                let path = s.strip_prefix("file://").unwrap_or(s);
                if path.is_empty() {
                    return Err(ParseStoreLocationError);
                }
                Ok(Self::File(PathBuf::from(path)))
            }
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory://"),
            Self::File(path) => write!(f, "file://{}", path.display()),
        }
    }
}

/// Bounded retry schedule for opening a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRetry {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Delay after the first failure; doubles after each further failure.
    pub base_delay: Duration,
}

impl Default for OpenRetry {
    fn default() -> Self {
        Self {
            attempts: 5,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl OpenRetry {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_OPEN_DELAY)
    }
}
