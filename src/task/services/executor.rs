//! Dispatch of queued commands to project backends.

use crate::project::domain::BranchName;
use crate::project::ports::{BackendResult, ProjectBackends};
use crate::project::services::GitInfoCache;
use crate::task::domain::{Command, CommandAction};
use tracing::{debug, info, warn};

/// Runs one command against the backends of its project.
///
/// Each command kind maps to a fixed sequence of backend calls. The first
/// failing step aborts the sequence and its error becomes the task failure.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    backends: ProjectBackends,
    git_info: GitInfoCache,
}

impl CommandExecutor {
    /// Creates an executor for one project.
    #[must_use]
    pub const fn new(backends: ProjectBackends, git_info: GitInfoCache) -> Self {
        Self { backends, git_info }
    }

    /// Executes `command` and refreshes the cached Git snapshot on success.
    ///
    /// # Errors
    ///
    /// Returns the error of the first backend step that failed.
    pub async fn execute(&self, command: &Command) -> BackendResult<()> {
        let branch = command.branch();
        match command.action() {
            CommandAction::GenerateAndCommitGit => self.generate_and_commit(branch).await?,
            CommandAction::CommitToSvn { message } => self.commit_to_svn(branch, message).await?,
            CommandAction::CompressAndUploadFtp { archive } => {
                self.backends.git.checkout_or_update(branch).await?;
                let receipt = self
                    .backends
                    .ftp
                    .archive_and_upload(branch, archive)
                    .await?;
                info!(
                    remote_name = %receipt.remote_name,
                    size = receipt.size,
                    sha256 = %receipt.sha256,
                    "uploaded archive"
                );
            }
        }
        self.refresh_git_info().await;
        Ok(())
    }

    async fn generate_and_commit(&self, branch: &BranchName) -> BackendResult<()> {
        let git = &self.backends.git;
        git.checkout_or_update(branch).await?;
        let outcome = match git.generate().await {
            Ok(()) => git.commit(branch).await,
            Err(err) => Err(err),
        };
        if let Err(err) = outcome {
            if let Err(discard_error) = git.discard_local_changes(branch).await {
                warn!(%branch, error = %discard_error, "failed to discard local changes");
            }
            return Err(err);
        }
        Ok(())
    }

    async fn commit_to_svn(&self, branch: &BranchName, message: &str) -> BackendResult<()> {
        self.backends.git.checkout_or_update(branch).await?;
        self.backends.svn.sync_from_git(branch).await?;
        match self.backends.svn.commit(message).await? {
            Some(revision) => info!(%branch, revision, "committed to svn"),
            None => info!(%branch, "svn working copy already up to date"),
        }
        Ok(())
    }

    async fn refresh_git_info(&self) {
        match self.backends.git.current_info().await {
            Ok(info) => {
                debug!(current_branch = info.current_branch(), "refreshed git info");
                self.git_info.store(info);
            }
            Err(err) => {
                warn!(error = %err, "failed to refresh git info; cache invalidated");
                self.git_info.invalidate();
            }
        }
    }
}
