//! In-memory task ledger.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::task::{
    domain::{Task, TaskId},
    ports::{TaskLedger, TaskLedgerError, TaskLedgerResult},
};

/// Thread-safe in-memory task ledger.
///
/// Holds the full history for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskLedger {
    tasks: Arc<RwLock<BTreeMap<TaskId, Task>>>,
}

impl InMemoryTaskLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(err: &PoisonError<T>) -> TaskLedgerError {
    TaskLedgerError::storage(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskLedger for InMemoryTaskLedger {
    async fn record(&self, task: &Task) -> TaskLedgerResult<()> {
        let mut tasks = self.tasks.write().map_err(|err| poisoned(&err))?;
        if tasks.contains_key(&task.id()) {
            return Err(TaskLedgerError::DuplicateTask(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskLedgerResult<()> {
        let mut tasks = self.tasks.write().map_err(|err| poisoned(&err))?;
        let stored = tasks
            .get_mut(&task.id())
            .ok_or(TaskLedgerError::NotFound(task.id()))?;
        *stored = task.clone();
        Ok(())
    }

    async fn find(&self, id: TaskId) -> TaskLedgerResult<Option<Task>> {
        let tasks = self.tasks.read().map_err(|err| poisoned(&err))?;
        Ok(tasks.get(&id).cloned())
    }

    async fn all(&self) -> TaskLedgerResult<BTreeMap<TaskId, Task>> {
        let tasks = self.tasks.read().map_err(|err| poisoned(&err))?;
        Ok(tasks.clone())
    }
}
