//! Mutating commands submitted against a project.

use super::{ParseCommandKindError, TaskDomainError};
use crate::project::domain::{ArchiveOptions, BranchName, ProjectName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of a [`CommandAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Check out a branch, run code generation and commit the result to Git.
    GenerateAndCommitGit,
    /// Sync the svn working copy from a Git branch and commit it to Subversion.
    CommitToSvn,
    /// Archive a Git branch and upload it to the FTP endpoint.
    CompressAndUploadFtp,
}

impl CommandKind {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GenerateAndCommitGit => "generate_and_commit_git",
            Self::CommitToSvn => "commit_to_svn",
            Self::CompressAndUploadFtp => "compress_and_upload_ftp",
        }
    }
}

impl TryFrom<&str> for CommandKind {
    type Error = ParseCommandKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "generate_and_commit_git" | "git-gen" => Ok(Self::GenerateAndCommitGit),
            "commit_to_svn" | "svn-commit" => Ok(Self::CommitToSvn),
            "compress_and_upload_ftp" | "ftp-compress" => Ok(Self::CompressAndUploadFtp),
            _ => Err(ParseCommandKindError(value.to_owned())),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a command does, together with the parameters only that action uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandAction {
    /// Check out, generate, commit.
    GenerateAndCommitGit,
    /// Sync from Git and commit to Subversion.
    CommitToSvn {
        /// Svn commit message.
        message: String,
    },
    /// Archive and upload.
    CompressAndUploadFtp {
        /// Archive type and flags.
        archive: ArchiveOptions,
    },
}

/// A requested mutating operation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    project: ProjectName,
    branch: BranchName,
    action: CommandAction,
}

impl Command {
    /// Creates a generate-and-commit command.
    #[must_use]
    pub const fn generate_and_commit(project: ProjectName, branch: BranchName) -> Self {
        Self {
            project,
            branch,
            action: CommandAction::GenerateAndCommitGit,
        }
    }

    /// Creates an svn commit command.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptySvnMessage`] when the message is blank.
    pub fn commit_to_svn(
        project: ProjectName,
        branch: BranchName,
        message: impl Into<String>,
    ) -> Result<Self, TaskDomainError> {
        let raw = message.into();
        if raw.trim().is_empty() {
            return Err(TaskDomainError::EmptySvnMessage);
        }
        Ok(Self {
            project,
            branch,
            action: CommandAction::CommitToSvn { message: raw },
        })
    }

    /// Creates an archive-and-upload command.
    #[must_use]
    pub const fn compress_and_upload(
        project: ProjectName,
        branch: BranchName,
        archive: ArchiveOptions,
    ) -> Self {
        Self {
            project,
            branch,
            action: CommandAction::CompressAndUploadFtp { archive },
        }
    }

    /// Returns the target project.
    #[must_use]
    pub const fn project(&self) -> &ProjectName {
        &self.project
    }

    /// Returns the target branch.
    #[must_use]
    pub const fn branch(&self) -> &BranchName {
        &self.branch
    }

    /// Returns the action and its parameters.
    #[must_use]
    pub const fn action(&self) -> &CommandAction {
        &self.action
    }

    /// Returns the command kind.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self.action {
            CommandAction::GenerateAndCommitGit => CommandKind::GenerateAndCommitGit,
            CommandAction::CommitToSvn { .. } => CommandKind::CommitToSvn,
            CommandAction::CompressAndUploadFtp { .. } => CommandKind::CompressAndUploadFtp,
        }
    }

    /// Returns the svn commit message, for svn commits.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.action {
            CommandAction::CommitToSvn { message } => Some(message),
            _ => None,
        }
    }

    /// Returns the archive parameters, for uploads.
    #[must_use]
    pub const fn archive(&self) -> Option<&ArchiveOptions> {
        match &self.action {
            CommandAction::CompressAndUploadFtp { archive } => Some(archive),
            _ => None,
        }
    }
}
