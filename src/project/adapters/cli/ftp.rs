//! FTP backend over a mounted endpoint directory.
//!
//! The endpoint is reached through a local mount point (curlftpfs, NFS
//! export or a plain directory in tests). All access goes through a
//! capability handle on the mount root, so remote names cannot escape it.
//! Uploads land under a hidden `.partial` name and are renamed into place.

use super::archive::{build_archive, default_scratch_dir, digest_file, scratch_path};
use super::template::{TemplateContext, render};
use super::{CommandRunner, timestamp};
use crate::config::ProjectConfig;
use crate::project::domain::{
    ArchiveOptions, BranchName, FtpEntry, FtpEntryKind, FtpFilter, ProjectName, RemoteFileName,
    UploadReceipt,
};
use crate::project::ports::{BackendError, BackendResult, FtpBackend};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::io::{self, ErrorKind};
use std::sync::Arc;
use tracing::{info, warn};

const PARTIAL_SUFFIX: &str = ".partial";

/// FTP adapter bound to one project's mounted endpoint.
pub struct MountedFtp {
    project: ProjectName,
    root: Utf8PathBuf,
    git_working_copy: Utf8PathBuf,
    archive_name: String,
    scratch_dir: Utf8PathBuf,
    runner: CommandRunner,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl MountedFtp {
    /// Creates the adapter for `project`.
    #[must_use]
    pub fn new(
        project: &ProjectConfig,
        runner: CommandRunner,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            project: project.name.clone(),
            root: project.ftp.root.clone(),
            git_working_copy: project.git.working_copy.clone(),
            archive_name: project.ftp.archive_name.clone(),
            scratch_dir: default_scratch_dir(),
            runner,
            clock,
        }
    }

    /// Builds scratch archives under `dir` instead of the system temporary
    /// directory.
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: Utf8PathBuf) -> Self {
        self.scratch_dir = dir;
        self
    }

    async fn with_root<T, F>(&self, operation: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> io::Result<T> + Send + 'static,
    {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let dir = Dir::open_ambient_dir(&root, ambient_authority())?;
            operation(&dir)
        })
        .await
        .map_err(BackendError::io)?
        .map_err(BackendError::io)
    }

    fn archive_remote_name(
        &self,
        branch: &BranchName,
        options: &ArchiveOptions,
    ) -> BackendResult<RemoteFileName> {
        let context = TemplateContext {
            project: self.project.as_str(),
            branch: branch.as_str(),
            timestamp: timestamp(&*self.clock),
            zip_type: options.zip_type().extension(),
        };
        let rendered = render("archive", &self.archive_name, &context)?;
        RemoteFileName::new(rendered.replace('/', "-"))
            .map_err(|err| BackendError::rejected("archive", err.to_string()))
    }

    async fn remove_scratch(&self, scratch: &Utf8Path) {
        let path = scratch.to_owned();
        let removed = tokio::task::spawn_blocking(move || std::fs::remove_file(path.as_std_path()))
            .await
            .unwrap_or_else(|join_error| Err(io::Error::other(join_error)));
        match removed {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                warn!(project = %self.project, path = %scratch, error = %err, "failed to remove scratch archive");
            }
            _ => {}
        }
    }

    async fn upload_scratch(
        &self,
        scratch: &Utf8Path,
        remote_name: &RemoteFileName,
    ) -> BackendResult<UploadReceipt> {
        let source = scratch.to_owned();
        let (size, sha256) = tokio::task::spawn_blocking(move || digest_file(&source))
            .await
            .map_err(BackendError::io)??;

        let archive_path = scratch.to_owned();
        let target = remote_name.clone();
        self.with_root(move |dir| {
            let mut reader = std::fs::File::open(archive_path.as_std_path())?;
            write_atomically(dir, &target, |file| io::copy(&mut reader, file).map(|_| ()))
        })
        .await?;

        Ok(UploadReceipt {
            remote_name: remote_name.to_string(),
            size,
            sha256,
        })
    }
}

#[async_trait]
impl FtpBackend for MountedFtp {
    async fn list(&self, filter: &FtpFilter) -> BackendResult<Vec<FtpEntry>> {
        let name_filter = filter.clone();
        let mut entries = self
            .with_root(move |dir| list_entries(dir, &name_filter))
            .await?;
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(entries)
    }

    async fn read_file(&self, name: &RemoteFileName) -> BackendResult<Vec<u8>> {
        let target = name.clone();
        let root = self.root.clone();
        let read = tokio::task::spawn_blocking(move || {
            let dir = Dir::open_ambient_dir(&root, ambient_authority())?;
            dir.read(target.as_path())
        })
        .await
        .map_err(BackendError::io)?;
        match read {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(BackendError::NotFound(name.to_string()))
            }
            Err(err) => Err(BackendError::io(err)),
        }
    }

    async fn write_file(&self, name: &RemoteFileName, content: &[u8]) -> BackendResult<()> {
        let target = name.clone();
        let bytes = content.to_vec();
        self.with_root(move |dir| {
            write_atomically(dir, &target, |file| io::Write::write_all(file, &bytes))
        })
        .await
    }

    async fn archive_and_upload(
        &self,
        branch: &BranchName,
        options: &ArchiveOptions,
    ) -> BackendResult<UploadReceipt> {
        let remote_name = self.archive_remote_name(branch, options)?;
        let scratch = scratch_path(&self.scratch_dir, options.zip_type().extension());

        let built = build_archive(&self.runner, &self.git_working_copy, &scratch, options).await;
        let outcome = match built {
            Ok(()) => self.upload_scratch(&scratch, &remote_name).await,
            Err(err) => Err(err),
        };
        self.remove_scratch(&scratch).await;

        let receipt = outcome?;
        info!(
            project = %self.project,
            %branch,
            remote_name = %receipt.remote_name,
            size = receipt.size,
            "archive uploaded"
        );
        Ok(receipt)
    }
}

fn list_entries(dir: &Dir, filter: &FtpFilter) -> io::Result<Vec<FtpEntry>> {
    let mut entries = Vec::new();
    for entry_result in dir.entries()? {
        let entry = entry_result?;
        let name = entry.file_name()?;
        if name.starts_with('.') || !filter.matches(&name) {
            continue;
        }
        let metadata = entry.metadata()?;
        let modified = metadata
            .modified()
            .ok()
            .map(|time| DateTime::<Utc>::from(time.into_std()));
        let kind = if metadata.is_dir() {
            FtpEntryKind::Directory
        } else {
            FtpEntryKind::File
        };
        entries.push(FtpEntry {
            name,
            size: metadata.len(),
            modified,
            kind,
        });
    }
    Ok(entries)
}

/// Writes `name` through a hidden temporary file renamed into place, so
/// readers never observe partial content.
fn write_atomically(
    dir: &Dir,
    name: &RemoteFileName,
    fill: impl FnOnce(&mut cap_std::fs_utf8::File) -> io::Result<()>,
) -> io::Result<()> {
    let path = name.as_path();
    let parent_dir = path.parent().filter(|candidate| !candidate.as_str().is_empty());
    if let Some(nested) = parent_dir {
        dir.create_dir_all(nested)?;
    }
    let file_name = path.file_name().unwrap_or(name.as_str());
    let temp_name = format!(".{file_name}.{}{PARTIAL_SUFFIX}", uuid::Uuid::new_v4().simple());
    let temp_path = parent_dir.map_or_else(
        || Utf8PathBuf::from(&temp_name),
        |nested| nested.join(&temp_name),
    );

    let written = dir.create(&temp_path).and_then(|mut file| {
        fill(&mut file)?;
        file.sync_all()
    });
    let renamed = written.and_then(|()| dir.rename(&temp_path, dir, path));
    if renamed.is_err() && dir.remove_file(&temp_path).is_err() {
        warn!(path = %temp_path, "failed to remove partial upload");
    }
    renamed
}
