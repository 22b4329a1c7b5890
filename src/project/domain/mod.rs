//! Domain model for managed projects.
//!
//! Value objects here are validated at construction so that services and
//! adapters only ever see well-formed project names, branch names, tags and
//! remote file names.

mod error;
mod ftp;
mod git;
mod names;
mod svn;

pub use error::{ArchiveOptionsError, ParseZipTypeError, ProjectDomainError};
pub use ftp::{ArchiveOptions, FtpEntry, FtpEntryKind, FtpFilter, UploadReceipt, ZipType};
pub use git::{BranchInfo, GitInfo};
pub use names::{BranchName, ProjectName, RemoteFileName, SvnTag};
pub use svn::{LogEntry, LogLimit};
