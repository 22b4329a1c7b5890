//! Subversion backend port.

use super::BackendResult;
use crate::project::domain::{BranchName, LogEntry, LogLimit};
use async_trait::async_trait;

/// Operations against a project's Subversion working copy and remote.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SvnBackend: Send + Sync {
    /// Mirrors the Git working copy (already at `branch`) into the svn
    /// working copy, scheduling additions and deletions.
    async fn sync_from_git(&self, branch: &BranchName) -> BackendResult<()>;

    /// Commits the svn working copy.
    ///
    /// Returns the committed revision, or `None` when there was nothing to
    /// commit.
    async fn commit(&self, message: &str) -> BackendResult<Option<u64>>;

    /// Reads at most `limit` history records, most recent first.
    async fn log(&self, limit: LogLimit) -> BackendResult<Vec<LogEntry>>;
}
