//! Orchestrator facade: asynchronous command submission and synchronous
//! queries across all managed projects.

use super::{OrchestratorError, OrchestratorResult, ProjectRegistry};
use crate::config::{ConfigError, OrchestratorConfig};
use crate::project::domain::{
    ArchiveOptions, BranchName, FtpEntry, FtpFilter, GitInfo, LogEntry, LogLimit, ProjectName,
    RemoteFileName, SvnTag,
};
use crate::project::ports::BackendProvider;
use crate::task::domain::{Command, Task, TaskDomainError, TaskId};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestedAction {
    Generate,
    SvnCommit { message: String },
    FtpCompress { zip_type: String, flags: String },
}

/// Command submission as received from a transport, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    project: String,
    branch: String,
    action: RequestedAction,
}

impl CommandRequest {
    /// Requests a generate-and-commit run on `branch`.
    #[must_use]
    pub fn generate(project: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            branch: branch.into(),
            action: RequestedAction::Generate,
        }
    }

    /// Requests a Subversion commit of `branch` with `message`.
    #[must_use]
    pub fn svn_commit(
        project: impl Into<String>,
        branch: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            branch: branch.into(),
            action: RequestedAction::SvnCommit {
                message: message.into(),
            },
        }
    }

    /// Requests an archive of `branch` uploaded to the FTP endpoint.
    #[must_use]
    pub fn ftp_compress(
        project: impl Into<String>,
        branch: impl Into<String>,
        zip_type: impl Into<String>,
        flags: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            branch: branch.into(),
            action: RequestedAction::FtpCompress {
                zip_type: zip_type.into(),
                flags: flags.into(),
            },
        }
    }

    /// Returns the requested project name.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    fn into_command(self, project: ProjectName) -> Result<Command, TaskDomainError> {
        let branch = BranchName::new(self.branch)?;
        match self.action {
            RequestedAction::Generate => Ok(Command::generate_and_commit(project, branch)),
            RequestedAction::SvnCommit { message } => {
                Command::commit_to_svn(project, branch, message)
            }
            RequestedAction::FtpCompress { zip_type, flags } => {
                let archive = ArchiveOptions::parse(&zip_type, &flags)?;
                Ok(Command::compress_and_upload(project, branch, archive))
            }
        }
    }
}

/// Entry point for transports.
///
/// Mutating commands are queued per project and return a task identifier at
/// once. Queries run on the caller's task and read backends directly, so
/// they may interleave with a running command of the same project.
pub struct Orchestrator<C>
where
    C: Clock + Send + Sync + 'static,
{
    registry: ProjectRegistry<C>,
}

impl<C> Orchestrator<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Wraps an already started registry.
    #[must_use]
    pub const fn new(registry: ProjectRegistry<C>) -> Self {
        Self { registry }
    }

    /// Starts one worker per configured project.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the project set is invalid.
    pub fn start(
        config: &OrchestratorConfig,
        provider: &impl BackendProvider,
        clock: &Arc<C>,
    ) -> Result<Self, ConfigError> {
        ProjectRegistry::start(config, provider, clock).map(Self::new)
    }

    /// Returns the managed project names in order.
    #[must_use]
    pub fn project_names(&self) -> Vec<ProjectName> {
        self.registry.names().cloned().collect()
    }

    /// Returns the current Git snapshot of every project.
    ///
    /// A project whose refresh fails falls back to its cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Backend`] when a refresh fails and no
    /// snapshot is cached for that project.
    pub async fn get_all_git_info(&self) -> OrchestratorResult<BTreeMap<ProjectName, GitInfo>> {
        let mut snapshots = BTreeMap::new();
        for handle in self.registry.handles() {
            let info = match handle.backends().git.current_info().await {
                Ok(info) => {
                    handle.git_info().store(info.clone());
                    info
                }
                Err(err) => {
                    let Some(cached) = handle.git_info().get() else {
                        return Err(err.into());
                    };
                    warn!(project = %handle.name(), error = %err, "serving cached git info");
                    cached
                }
            };
            snapshots.insert(handle.name().clone(), info);
        }
        Ok(snapshots)
    }

    /// Validates and enqueues a transport request.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::UnknownProject`] before any validation,
    /// then [`OrchestratorError::Validation`] for malformed parameters.
    pub async fn submit(&self, request: CommandRequest) -> OrchestratorResult<TaskId> {
        let handle = self.registry.resolve(request.project())?;
        let command = request.into_command(handle.name().clone())?;
        handle.submit(command).await
    }

    /// Enqueues a validated command on its project's queue.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::UnknownProject`] when the project does
    /// not resolve; no task is created and no identifier is consumed.
    pub async fn submit_async(&self, command: Command) -> OrchestratorResult<TaskId> {
        let handle = self.registry.resolve(command.project().as_str())?;
        handle.submit(command).await
    }

    /// Records `tag` as the Subversion tag of `branch`.
    ///
    /// Runs immediately rather than through the queue; concurrent calls for
    /// the same branch resolve last-writer-wins.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] for unknown projects, invalid names or
    /// backend failures.
    pub async fn set_branch_svn_tag(
        &self,
        project: &str,
        branch: &str,
        tag: &str,
    ) -> OrchestratorResult<()> {
        let handle = self.registry.resolve(project)?;
        let branch_name = BranchName::new(branch)?;
        let svn_tag = SvnTag::new(tag)?;
        handle
            .backends()
            .git
            .set_tag_for_branch(&branch_name, &svn_tag)
            .await?;
        info!(project = %handle.name(), branch = %branch_name, tag = %svn_tag, "recorded svn tag");
        handle.git_info().record_svn_tag(&branch_name, svn_tag);
        Ok(())
    }

    /// Returns at most `count` log entries, newest revision first.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Validation`] when `count` is zero.
    pub async fn svn_log(&self, project: &str, count: u32) -> OrchestratorResult<Vec<LogEntry>> {
        let handle = self.registry.resolve(project)?;
        let limit = LogLimit::new(count)?;
        let entries = handle.backends().svn.log(limit).await?;
        Ok(limit.apply(entries))
    }

    /// Lists FTP entries whose names contain `filter`, sorted by name.
    ///
    /// An empty filter or `*` lists everything.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] for unknown projects or backend
    /// failures.
    pub async fn ftp_log(&self, project: &str, filter: &str) -> OrchestratorResult<Vec<FtpEntry>> {
        let handle = self.registry.resolve(project)?;
        let name_filter = FtpFilter::new(filter);
        let mut entries = handle.backends().ftp.list(&name_filter).await?;
        entries.retain(|entry| name_filter.matches(&entry.name));
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(entries)
    }

    /// Reads a remote file.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Validation`] for unsafe names and
    /// [`OrchestratorError::Backend`] when the file is missing.
    pub async fn ftp_read_file(&self, project: &str, name: &str) -> OrchestratorResult<Vec<u8>> {
        let handle = self.registry.resolve(project)?;
        let remote_name = RemoteFileName::new(name)?;
        Ok(handle.backends().ftp.read_file(&remote_name).await?)
    }

    /// Writes a remote file, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Validation`] for unsafe names and
    /// [`OrchestratorError::Backend`] when the upload fails.
    pub async fn ftp_write_file(
        &self,
        project: &str,
        name: &str,
        content: &[u8],
    ) -> OrchestratorResult<()> {
        let handle = self.registry.resolve(project)?;
        let remote_name = RemoteFileName::new(name)?;
        handle.backends().ftp.write_file(&remote_name, content).await?;
        info!(
            project = %handle.name(),
            %remote_name,
            size = content.len(),
            "wrote remote file"
        );
        Ok(())
    }

    /// Returns a snapshot of every task of the project keyed by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] for unknown projects or ledger failures.
    pub async fn list_tasks(&self, project: &str) -> OrchestratorResult<BTreeMap<TaskId, Task>> {
        let handle = self.registry.resolve(project)?;
        Ok(handle.queue().ledger().all().await?)
    }

    /// Returns one task, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] for unknown projects or ledger failures.
    pub async fn get_task(&self, project: &str, task_id: TaskId) -> OrchestratorResult<Option<Task>> {
        let handle = self.registry.resolve(project)?;
        Ok(handle.queue().ledger().find(task_id).await?)
    }

    /// Waits for a task to reach a terminal state and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::TaskNotFound`] for identifiers never
    /// issued and [`OrchestratorError::QueueClosed`] when the worker stopped
    /// before running the task.
    pub async fn wait_for_task(&self, project: &str, task_id: TaskId) -> OrchestratorResult<Task> {
        let handle = self.registry.resolve(project)?;
        let not_found = || OrchestratorError::TaskNotFound {
            project: handle.name().clone(),
            task_id,
        };
        if handle.queue().ledger().find(task_id).await?.is_none() {
            return Err(not_found());
        }
        handle.queue().wait_for(task_id).await?;
        handle
            .queue()
            .ledger()
            .find(task_id)
            .await?
            .ok_or_else(not_found)
    }

    /// Stops accepting commands and waits for every queued task to finish.
    pub async fn shutdown(&self) {
        for handle in self.registry.handles() {
            handle.queue().shutdown().await;
        }
        info!("orchestrator stopped");
    }
}
