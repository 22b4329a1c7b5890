//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use crate::project::domain::{ArchiveOptionsError, ProjectDomainError};
use thiserror::Error;

/// Errors returned while constructing commands or moving tasks between
/// statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A project-level value (name, branch) failed validation.
    #[error(transparent)]
    Project(#[from] ProjectDomainError),

    /// The archive type or one of its flags is not supported.
    #[error(transparent)]
    Archive(#[from] ArchiveOptionsError),

    /// Svn commits need a message.
    #[error("svn commit message must not be empty")]
    EmptySvnMessage,

    /// The status change is not allowed by the task state machine.
    #[error("invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// Failed tasks must carry an explanation.
    #[error("failure detail for task {0} must not be empty")]
    EmptyFailureDetail(TaskId),
}

/// Error returned while parsing a task status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing a command kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown command kind: {0}")]
pub struct ParseCommandKindError(pub String);
