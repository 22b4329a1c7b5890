//! Errors surfaced by the orchestrator facade.

use crate::project::domain::{ProjectDomainError, ProjectName};
use crate::project::ports::BackendError;
use crate::task::domain::{TaskDomainError, TaskId};
use crate::task::ports::TaskLedgerError;
use crate::task::services::QueueError;
use thiserror::Error;

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Service-level errors for orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The project key does not resolve. No state was changed.
    #[error("unknown project: {0}")]
    UnknownProject(String),

    /// Command or query parameters are malformed.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// A backend adapter call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The task ledger failed.
    #[error(transparent)]
    Ledger(#[from] TaskLedgerError),

    /// The project's queue no longer accepts commands.
    #[error("queue for project {0} is closed")]
    QueueClosed(ProjectName),

    /// No task with the identifier exists in the project.
    #[error("task {task_id} not found in project {project}")]
    TaskNotFound {
        /// Project name.
        project: ProjectName,
        /// Requested task identifier.
        task_id: TaskId,
    },
}

impl From<ProjectDomainError> for OrchestratorError {
    fn from(err: ProjectDomainError) -> Self {
        Self::Validation(TaskDomainError::Project(err))
    }
}

impl From<QueueError> for OrchestratorError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Closed(project) => Self::QueueClosed(project),
            QueueError::Ledger(ledger_error) => Self::Ledger(ledger_error),
        }
    }
}
