//! Port contracts for project backends.
//!
//! Ports define the narrow interface the orchestrator needs from Git,
//! Subversion and FTP without committing to how those systems are reached.

pub mod backend;
pub mod ftp;
pub mod git;
pub mod svn;

pub use backend::{BackendError, BackendProvider, BackendResult, ProjectBackends};
pub use ftp::FtpBackend;
pub use git::GitBackend;
pub use svn::SvnBackend;

#[cfg(test)]
pub use ftp::MockFtpBackend;
#[cfg(test)]
pub use git::MockGitBackend;
#[cfg(test)]
pub use svn::MockSvnBackend;
