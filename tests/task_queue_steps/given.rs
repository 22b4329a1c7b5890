//! Given steps for task queue BDD scenarios.

use super::world::QueueWorld;
use chrono::{Duration, TimeZone, Utc};
use rstest_bdd_macros::given;
use shipyard::project::adapters::memory::BackendOperation;
use shipyard::project::domain::LogEntry;
use shipyard::project::ports::BackendError;

#[given(r#"an orchestrator managing projects "{first}" and "{second}""#)]
fn orchestrator_managing(
    world: &mut QueueWorld,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    world.start(&[first.as_str(), second.as_str()])
}

#[given(r#"the git commit step of "{project}" fails with "{reason}""#)]
fn git_commit_fails(
    world: &mut QueueWorld,
    project: String,
    reason: String,
) -> Result<(), eyre::Report> {
    world
        .backend(&project)?
        .fail_on(BackendOperation::GitCommit, BackendError::rejected("git commit", reason));
    Ok(())
}

#[given(r#"project "{project}" has {count:u64} svn log entries"#)]
fn project_has_log_entries(
    world: &mut QueueWorld,
    project: String,
    count: u64,
) -> Result<(), eyre::Report> {
    let backend = world.backend(&project)?;
    let epoch = Utc
        .timestamp_opt(1_700_000_000, 0)
        .single()
        .ok_or_else(|| eyre::eyre!("invalid epoch"))?;
    for revision in 1..=count {
        backend.push_log_entry(LogEntry {
            revision,
            author: "alice".to_owned(),
            message: format!("change {revision}"),
            date: epoch + Duration::minutes(i64::try_from(revision)?),
        });
    }
    Ok(())
}
