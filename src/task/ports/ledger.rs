//! Ledger port for task records.

use crate::task::domain::{Task, TaskId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task ledger operations.
pub type TaskLedgerResult<T> = Result<T, TaskLedgerError>;

/// Per-project store of every task ever admitted.
///
/// A ledger has a single writer (the project's queue) and any number of
/// concurrent readers. Records are never evicted.
#[async_trait]
pub trait TaskLedger: Send + Sync {
    /// Records a newly admitted task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLedgerError::DuplicateTask`] when the identifier is
    /// already recorded.
    async fn record(&self, task: &Task) -> TaskLedgerResult<()>;

    /// Replaces the stored state of an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLedgerError::NotFound`] when the task was never
    /// recorded.
    async fn update(&self, task: &Task) -> TaskLedgerResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find(&self, id: TaskId) -> TaskLedgerResult<Option<Task>>;

    /// Returns every recorded task keyed by identifier.
    async fn all(&self) -> TaskLedgerResult<BTreeMap<TaskId, Task>>;
}

/// Errors returned by task ledger implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskLedgerError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Storage-layer failure.
    #[error("ledger storage error: {0}")]
    Storage(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskLedgerError {
    /// Wraps a storage error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Arc::new(err))
    }
}
