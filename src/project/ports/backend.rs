//! Shared error type and backend bundle for project ports.

use super::{FtpBackend, GitBackend, SvnBackend};
use crate::config::ProjectConfig;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for backend port operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors returned by backend adapters.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// An external command exited unsuccessfully.
    #[error("command `{command}` exited with status {exit_code}: {stderr}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Process exit code, `-1` when terminated by a signal.
        exit_code: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// An external command exceeded its time budget.
    #[error("command `{command}` timed out after {timeout_secs}s")]
    TimedOut {
        /// Rendered command line.
        command: String,
        /// Budget that was exceeded.
        timeout_secs: u64,
    },

    /// The requested remote file does not exist.
    #[error("remote file not found: {0}")]
    NotFound(String),

    /// Backend output could not be interpreted.
    #[error("unexpected backend output: {0}")]
    Parse(String),

    /// The backend refused the operation.
    #[error("{operation} rejected: {reason}")]
    Rejected {
        /// Operation name.
        operation: String,
        /// Reason reported by the backend.
        reason: String,
    },

    /// Filesystem or process I/O failure.
    #[error("backend I/O error: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),
}

impl BackendError {
    /// Wraps an I/O error from an adapter.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }

    /// Creates a rejection for the named operation.
    pub fn rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// The three backends serving one project.
#[derive(Clone)]
pub struct ProjectBackends {
    /// Git working-copy backend.
    pub git: Arc<dyn GitBackend>,
    /// Subversion backend.
    pub svn: Arc<dyn SvnBackend>,
    /// FTP endpoint backend.
    pub ftp: Arc<dyn FtpBackend>,
}

impl ProjectBackends {
    /// Bundles backend adapters for one project.
    #[must_use]
    pub fn new(
        git: Arc<dyn GitBackend>,
        svn: Arc<dyn SvnBackend>,
        ftp: Arc<dyn FtpBackend>,
    ) -> Self {
        Self { git, svn, ftp }
    }
}

impl fmt::Debug for ProjectBackends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectBackends").finish_non_exhaustive()
    }
}

/// Builds the backends for each configured project.
pub trait BackendProvider {
    /// Returns the backends serving `project`.
    fn backends_for(&self, project: &ProjectConfig) -> ProjectBackends;
}
