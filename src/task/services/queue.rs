//! Per-project FIFO queue with a single worker.
//!
//! Admission allocates the next task identifier, records the pending task and
//! enqueues it under one lock, so identifier order, ledger order and execution
//! order always agree. The worker pops tasks one at a time and runs each to a
//! terminal state before taking the next.

use super::CommandExecutor;
use crate::project::domain::ProjectName;
use crate::task::domain::{Command, Task, TaskId};
use crate::task::ports::{TaskLedger, TaskLedgerError};
use mockable::Clock;
use std::sync::{Arc, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Errors returned by queue admission and waiting.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue has shut down and accepts no more commands.
    #[error("queue for project {0} is closed")]
    Closed(ProjectName),

    /// The task ledger rejected the admission.
    #[error(transparent)]
    Ledger(#[from] TaskLedgerError),
}

struct Admission {
    next_id: TaskId,
    sender: Option<mpsc::UnboundedSender<Task>>,
}

/// FIFO command queue of one project.
pub struct ProjectQueue<C>
where
    C: Clock + Send + Sync + 'static,
{
    project: ProjectName,
    ledger: Arc<dyn TaskLedger>,
    clock: Arc<C>,
    admission: Mutex<Admission>,
    completed: watch::Receiver<TaskId>,
    worker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<C> ProjectQueue<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates the queue and spawns its worker.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(
        project: ProjectName,
        ledger: Arc<dyn TaskLedger>,
        executor: CommandExecutor,
        clock: Arc<C>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (completed_tx, completed) = watch::channel(TaskId::from_raw(0));
        let worker = Worker {
            project: project.clone(),
            ledger: Arc::clone(&ledger),
            executor: Arc::new(executor),
            clock: Arc::clone(&clock),
            completed: completed_tx,
        };
        let handle = tokio::spawn(worker.run(receiver));

        Self {
            project,
            ledger,
            clock,
            admission: Mutex::new(Admission {
                next_id: TaskId::FIRST,
                sender: Some(sender),
            }),
            completed,
            worker: std::sync::Mutex::new(Some(handle)),
        }
    }

    /// Returns the project this queue serves.
    #[must_use]
    pub const fn project(&self) -> &ProjectName {
        &self.project
    }

    /// Returns the ledger holding this queue's tasks.
    #[must_use]
    pub fn ledger(&self) -> &dyn TaskLedger {
        &*self.ledger
    }

    /// Admits a command and returns its task identifier.
    ///
    /// The task is visible in the ledger as `Pending` before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] after shutdown or
    /// [`QueueError::Ledger`] when the ledger rejects the record. No
    /// identifier is consumed in either case.
    pub async fn submit(&self, command: Command) -> Result<TaskId, QueueError> {
        let mut admission = self.admission.lock().await;
        let Some(sender) = admission.sender.as_ref().filter(|sender| !sender.is_closed()) else {
            return Err(QueueError::Closed(self.project.clone()));
        };
        let id = admission.next_id;
        let task = Task::pending(id, command, &*self.clock);
        self.ledger.record(&task).await?;
        if sender.send(task).is_err() {
            return Err(QueueError::Closed(self.project.clone()));
        }
        admission.next_id = id.next();
        info!(project = %self.project, task_id = %id, "task admitted");
        Ok(id)
    }

    /// Waits until task `id` has reached a terminal state.
    ///
    /// Returns immediately for tasks that already completed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] when the worker stopped before the task
    /// ran.
    pub async fn wait_for(&self, id: TaskId) -> Result<(), QueueError> {
        let mut completed = self.completed.clone();
        completed
            .wait_for(|done| *done >= id)
            .await
            .map(|_| ())
            .map_err(|_| QueueError::Closed(self.project.clone()))
    }

    /// Stops admission, drains the tasks already queued and waits for the
    /// worker to exit.
    pub async fn shutdown(&self) {
        self.admission.lock().await.sender = None;
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        if let Err(err) = handle.await {
            error!(project = %self.project, error = %err, "queue worker terminated abnormally");
        }
    }
}

struct Worker<C> {
    project: ProjectName,
    ledger: Arc<dyn TaskLedger>,
    executor: Arc<CommandExecutor>,
    clock: Arc<C>,
    completed: watch::Sender<TaskId>,
}

impl<C> Worker<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn run(self, mut receiver: mpsc::UnboundedReceiver<Task>) {
        info!(project = %self.project, "queue worker started");
        while let Some(task) = receiver.recv().await {
            let id = self.process(task).await;
            self.completed.send_replace(id);
        }
        info!(project = %self.project, "queue worker stopped");
    }

    async fn process(&self, mut task: Task) -> TaskId {
        let id = task.id();
        let kind = task.command().kind();
        if let Err(err) = task.start(&*self.clock) {
            error!(project = %self.project, task_id = %id, error = %err, "cannot start task");
            return id;
        }
        self.persist(&task).await;
        info!(project = %self.project, task_id = %id, %kind, "task started");

        let transition = match self.execute_contained(task.command().clone()).await {
            Ok(()) => {
                info!(project = %self.project, task_id = %id, %kind, "task succeeded");
                task.succeed(&*self.clock)
            }
            Err(detail) => {
                warn!(project = %self.project, task_id = %id, %kind, error = %detail, "task failed");
                task.fail(detail, &*self.clock)
            }
        };
        if let Err(err) = transition {
            error!(project = %self.project, task_id = %id, error = %err, "cannot complete task");
        }
        self.persist(&task).await;
        id
    }

    /// Runs the command on its own Tokio task. A panic inside a backend
    /// fails the task and leaves the worker running.
    async fn execute_contained(&self, command: Command) -> Result<(), String> {
        let executor = Arc::clone(&self.executor);
        match tokio::spawn(async move { executor.execute(&command).await }).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.to_string()),
            Err(join_error) => Err(format!("command execution aborted: {join_error}")),
        }
    }

    async fn persist(&self, task: &Task) {
        if let Err(err) = self.ledger.update(task).await {
            error!(
                project = %self.project,
                task_id = %task.id(),
                error = %err,
                "failed to persist task state"
            );
        }
    }
}
