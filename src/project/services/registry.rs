//! Immutable project registry built at startup.

use super::{GitInfoCache, OrchestratorError, OrchestratorResult};
use crate::config::{ConfigError, OrchestratorConfig, ProjectConfig};
use crate::project::domain::{ProjectDomainError, ProjectName};
use crate::project::ports::{BackendProvider, ProjectBackends};
use crate::task::adapters::memory::InMemoryTaskLedger;
use crate::task::domain::{Command, TaskId};
use crate::task::services::{CommandExecutor, ProjectQueue};
use mockable::Clock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;

/// Everything the orchestrator holds for one project.
pub struct ProjectHandle<C>
where
    C: Clock + Send + Sync + 'static,
{
    config: ProjectConfig,
    backends: ProjectBackends,
    git_info: GitInfoCache,
    queue: ProjectQueue<C>,
}

impl<C> ProjectHandle<C>
where
    C: Clock + Send + Sync + 'static,
{
    fn start(config: ProjectConfig, backends: ProjectBackends, clock: Arc<C>) -> Self {
        let git_info = GitInfoCache::new();
        let executor = CommandExecutor::new(backends.clone(), git_info.clone());
        let queue = ProjectQueue::start(
            config.name.clone(),
            Arc::new(InMemoryTaskLedger::new()),
            executor,
            clock,
        );
        Self {
            config,
            backends,
            git_info,
            queue,
        }
    }

    /// Returns the project name.
    #[must_use]
    pub const fn name(&self) -> &ProjectName {
        &self.config.name
    }

    /// Returns the project configuration.
    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Returns the project backends.
    #[must_use]
    pub const fn backends(&self) -> &ProjectBackends {
        &self.backends
    }

    /// Returns the cached Git snapshot.
    #[must_use]
    pub const fn git_info(&self) -> &GitInfoCache {
        &self.git_info
    }

    /// Returns the project queue.
    #[must_use]
    pub const fn queue(&self) -> &ProjectQueue<C> {
        &self.queue
    }

    /// Checks the command's branch against the configured set and admits it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Validation`] for unconfigured branches
    /// and queue errors otherwise.
    pub async fn submit(&self, command: Command) -> OrchestratorResult<TaskId> {
        if !self.config.allows_branch(command.branch()) {
            return Err(ProjectDomainError::BranchNotConfigured {
                project: self.config.name.to_string(),
                branch: command.branch().to_string(),
            }
            .into());
        }
        Ok(self.queue.submit(command).await?)
    }
}

/// Static set of projects keyed by name.
pub struct ProjectRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    projects: BTreeMap<ProjectName, ProjectHandle<C>>,
}

impl<C> ProjectRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Builds one handle per configured project and starts its worker.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateProject`] when two projects share a
    /// name. No worker is started in that case.
    pub fn start(
        config: &OrchestratorConfig,
        provider: &impl BackendProvider,
        clock: &Arc<C>,
    ) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        if let Some(duplicate) = config
            .projects
            .iter()
            .find(|project| !seen.insert(&project.name))
        {
            return Err(ConfigError::DuplicateProject(duplicate.name.clone()));
        }

        let projects = config
            .projects
            .iter()
            .map(|project| {
                let backends = provider.backends_for(project);
                let handle = ProjectHandle::start(project.clone(), backends, Arc::clone(clock));
                info!(project = %project.name, "project registered");
                (project.name.clone(), handle)
            })
            .collect();
        Ok(Self { projects })
    }

    /// Resolves a project by name.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::UnknownProject`] when no project has that
    /// name.
    pub fn resolve(&self, name: &str) -> OrchestratorResult<&ProjectHandle<C>> {
        self.projects
            .get(name.trim())
            .ok_or_else(|| OrchestratorError::UnknownProject(name.to_owned()))
    }

    /// Returns the registered project names in order.
    pub fn names(&self) -> impl Iterator<Item = &ProjectName> {
        self.projects.keys()
    }

    /// Returns all project handles in name order.
    pub fn handles(&self) -> impl Iterator<Item = &ProjectHandle<C>> {
        self.projects.values()
    }
}
