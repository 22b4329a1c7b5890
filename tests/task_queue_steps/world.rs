//! Shared world state for task queue BDD scenarios.

use camino::Utf8Path;
use mockable::DefaultClock;
use rstest::fixture;
use shipyard::config::OrchestratorConfig;
use shipyard::project::adapters::memory::{InMemoryBackend, InMemoryBackendProvider};
use shipyard::project::domain::{LogEntry, ProjectName};
use shipyard::project::services::{Orchestrator, OrchestratorResult};
use shipyard::task::domain::TaskId;
use std::sync::Arc;

/// Scenario world for task queue behaviour tests.
#[derive(Default)]
pub struct QueueWorld {
    pub orchestrator: Option<Orchestrator<DefaultClock>>,
    pub provider: InMemoryBackendProvider,
    pub submitted: Vec<TaskId>,
    pub last_submission: Option<OrchestratorResult<TaskId>>,
    pub log: Option<Vec<LogEntry>>,
}

impl QueueWorld {
    /// Starts an orchestrator managing the named projects.
    pub fn start(&mut self, projects: &[&str]) -> Result<(), eyre::Report> {
        let entries: Vec<String> = projects
            .iter()
            .map(|project| {
                format!(
                    r#"{{
                        "name": "{project}",
                        "git": {{ "working_copy": "{project}/git" }},
                        "svn": {{ "working_copy": "{project}/svn", "remote": "https://svn.example.com/{project}" }},
                        "ftp": {{ "root": "{project}/ftp" }}
                    }}"#
                )
            })
            .collect();
        let json = format!(r#"{{ "projects": [{}] }}"#, entries.join(","));
        let config = OrchestratorConfig::from_json(&json, Utf8Path::new("/srv/shipyard"))?;
        self.orchestrator = Some(Orchestrator::start(
            &config,
            &self.provider,
            &Arc::new(DefaultClock),
        )?);
        Ok(())
    }

    /// Returns the running orchestrator.
    pub fn orchestrator(&self) -> Result<&Orchestrator<DefaultClock>, eyre::Report> {
        self.orchestrator
            .as_ref()
            .ok_or_else(|| eyre::eyre!("orchestrator not started in scenario world"))
    }

    /// Returns the in-memory backend of `project`.
    pub fn backend(&self, project: &str) -> Result<Arc<InMemoryBackend>, eyre::Report> {
        Ok(self.provider.backend(&ProjectName::new(project)?))
    }

    /// Drains every queue.
    pub fn shutdown(&self) {
        if let Some(orchestrator) = self.orchestrator.as_ref() {
            run_async(orchestrator.shutdown());
        }
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> QueueWorld {
    QueueWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
