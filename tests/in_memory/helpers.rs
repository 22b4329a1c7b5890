//! Shared fixtures for orchestrator integration tests.

use camino::Utf8Path;
use mockable::DefaultClock;
use rstest::fixture;
use shipyard::config::OrchestratorConfig;
use shipyard::project::adapters::memory::{InMemoryBackend, InMemoryBackendProvider};
use shipyard::project::domain::ProjectName;
use shipyard::project::services::Orchestrator;
use shipyard::task::domain::{Task, TaskId};
use std::sync::Arc;

/// Two projects: `p1` restricted to `main` and `release`, `p2` open to any
/// branch.
pub const TWO_PROJECTS: &str = r#"{
    "projects": [
        {
            "name": "p1",
            "git": { "working_copy": "p1/git", "branches": ["main", "release"] },
            "svn": { "working_copy": "p1/svn", "remote": "https://svn.example.com/p1" },
            "ftp": { "root": "p1/ftp" }
        },
        {
            "name": "p2",
            "git": { "working_copy": "p2/git" },
            "svn": { "working_copy": "p2/svn", "remote": "https://svn.example.com/p2" },
            "ftp": { "root": "p2/ftp" }
        }
    ]
}"#;

/// Running orchestrator together with the backends it drives.
pub struct Harness {
    pub orchestrator: Orchestrator<DefaultClock>,
    pub provider: InMemoryBackendProvider,
}

impl Harness {
    /// Returns the in-memory backend of `project`.
    #[must_use]
    pub fn backend(&self, project: &str) -> Arc<InMemoryBackend> {
        self.provider
            .backend(&ProjectName::new(project).expect("valid project name"))
    }

    /// Waits for a task and returns its final state.
    pub async fn finished(&self, project: &str, task_id: TaskId) -> Task {
        self.orchestrator
            .wait_for_task(project, task_id)
            .await
            .expect("task should finish")
    }
}

/// Starts an orchestrator over [`TWO_PROJECTS`].
#[fixture]
pub fn harness() -> Harness {
    let config = OrchestratorConfig::from_json(TWO_PROJECTS, Utf8Path::new("/srv/shipyard"))
        .expect("valid configuration");
    let provider = InMemoryBackendProvider::new();
    let orchestrator = Orchestrator::start(&config, &provider, &Arc::new(DefaultClock))
        .expect("orchestrator should start");
    Harness {
        orchestrator,
        provider,
    }
}
