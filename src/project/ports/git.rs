//! Git backend port.

use super::BackendResult;
use crate::project::domain::{BranchName, GitInfo, SvnTag};
use async_trait::async_trait;

/// Operations against a project's Git working copy and remote.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Checks out `branch` and hard-resets it to the remote tip.
    async fn checkout_or_update(&self, branch: &BranchName) -> BackendResult<()>;

    /// Runs the project's code generator inside the working copy.
    async fn generate(&self) -> BackendResult<()>;

    /// Stages all changes, commits them and publishes `branch`.
    ///
    /// Succeeds without creating a commit when the working copy is clean.
    async fn commit(&self, branch: &BranchName) -> BackendResult<()>;

    /// Returns `branch` to its post-checkout state.
    ///
    /// Drops uncommitted changes and any local commits not yet published,
    /// resetting to the remote tip that checkout used.
    async fn discard_local_changes(&self, branch: &BranchName) -> BackendResult<()>;

    /// Reads the current branch, head commit, branch list and svn tags.
    async fn current_info(&self) -> BackendResult<GitInfo>;

    /// Records `tag` as the svn tag pointer of `branch`.
    async fn set_tag_for_branch(&self, branch: &BranchName, tag: &SvnTag) -> BackendResult<()>;
}
