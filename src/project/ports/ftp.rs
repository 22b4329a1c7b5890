//! FTP backend port.

use super::BackendResult;
use crate::project::domain::{
    ArchiveOptions, BranchName, FtpEntry, FtpFilter, RemoteFileName, UploadReceipt,
};
use async_trait::async_trait;

/// Operations against a project's FTP endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FtpBackend: Send + Sync {
    /// Lists entries at the endpoint root whose names pass `filter`.
    async fn list(&self, filter: &FtpFilter) -> BackendResult<Vec<FtpEntry>>;

    /// Reads a remote file.
    async fn read_file(&self, name: &RemoteFileName) -> BackendResult<Vec<u8>>;

    /// Replaces a remote file atomically.
    async fn write_file(&self, name: &RemoteFileName, content: &[u8]) -> BackendResult<()>;

    /// Archives the working copy at `branch` and uploads it.
    ///
    /// The upload is all-or-nothing: no partially written remote file is
    /// left behind on failure.
    async fn archive_and_upload(
        &self,
        branch: &BranchName,
        options: &ArchiveOptions,
    ) -> BackendResult<UploadReceipt>;
}
