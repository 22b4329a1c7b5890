//! Error types for project domain validation and parsing.

use super::ZipType;
use thiserror::Error;

/// Errors returned while constructing project domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectDomainError {
    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,

    /// The project name contains whitespace or path separators.
    #[error("invalid project name '{0}', expected no whitespace or '/'")]
    InvalidProjectName(String),

    /// The branch name is not a usable Git ref name.
    #[error("invalid branch name '{0}'")]
    InvalidBranchName(String),

    /// The branch is not part of the project's configured branch set.
    #[error("branch '{branch}' is not configured for project '{project}'")]
    BranchNotConfigured {
        /// Project name.
        project: String,
        /// Rejected branch name.
        branch: String,
    },

    /// The svn tag is empty or contains whitespace.
    #[error("invalid svn tag '{0}'")]
    InvalidSvnTag(String),

    /// The remote file name escapes the endpoint root or is empty.
    #[error("invalid remote file name '{0}'")]
    InvalidFileName(String),

    /// The svn log limit must be at least one.
    #[error("svn log limit must be at least 1, got {0}")]
    InvalidLogLimit(u32),
}

/// Error returned while parsing an archive type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported zip type: {0}")]
pub struct ParseZipTypeError(pub String);

/// Errors returned while parsing archive parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArchiveOptionsError {
    /// The archive type is not supported.
    #[error(transparent)]
    ZipType(#[from] ParseZipTypeError),

    /// The flag is not on the allow-list for the archive type.
    #[error("unsupported {zip_type} flag '{flag}'")]
    UnsupportedFlag {
        /// Archive type the flag was given for.
        zip_type: ZipType,
        /// Rejected flag.
        flag: String,
    },
}
