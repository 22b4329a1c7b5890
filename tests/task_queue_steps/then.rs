//! Then steps for task queue BDD scenarios.

use super::world::{QueueWorld, run_async};
use eyre::{WrapErr, ensure};
use rstest_bdd_macros::then;
use shipyard::project::services::OrchestratorError;
use shipyard::task::domain::{Task, TaskId, TaskStatus};

fn tasks(world: &QueueWorld, project: &str) -> Result<Vec<Task>, eyre::Report> {
    let orchestrator = world.orchestrator()?;
    for task_id in &world.submitted {
        if run_async(orchestrator.get_task(project, *task_id))?.is_some() {
            run_async(orchestrator.wait_for_task(project, *task_id))
                .wrap_err("wait for submitted task")?;
        }
    }
    let listed = run_async(orchestrator.list_tasks(project)).wrap_err("list tasks")?;
    Ok(listed.into_values().collect())
}

fn task(world: &QueueWorld, project: &str, task_id: u64) -> Result<Task, eyre::Report> {
    run_async(
        world
            .orchestrator()?
            .wait_for_task(project, TaskId::from_raw(task_id)),
    )
    .wrap_err_with(|| format!("wait for task {task_id} of {project}"))
}

#[then(r#"the task identifiers of "{project}" run from {first:u64} to {last:u64}"#)]
fn identifiers_run_from(
    world: &QueueWorld,
    project: String,
    first: u64,
    last: u64,
) -> Result<(), eyre::Report> {
    let ids: Vec<u64> = tasks(world, &project)?
        .iter()
        .map(|found| found.id().value())
        .collect();
    ensure!(ids == (first..=last).collect::<Vec<_>>(), "unexpected identifiers {ids:?}");
    Ok(())
}

#[then(r#"every task of "{project}" has succeeded"#)]
fn every_task_succeeded(world: &QueueWorld, project: String) -> Result<(), eyre::Report> {
    let found = tasks(world, &project)?;
    ensure!(!found.is_empty(), "no tasks recorded for {project}");
    ensure!(
        found
            .iter()
            .all(|candidate| candidate.status() == TaskStatus::Succeeded),
        "not every task succeeded"
    );
    Ok(())
}

#[then(r#"each task of "{project}" started after the previous one completed"#)]
fn tasks_do_not_overlap(world: &QueueWorld, project: String) -> Result<(), eyre::Report> {
    let found = tasks(world, &project)?;
    for pair in found.windows(2) {
        let [previous, next] = pair else {
            continue;
        };
        let completed = previous
            .completed_at()
            .ok_or_else(|| eyre::eyre!("task {} never completed", previous.id()))?;
        let started = next
            .started_at()
            .ok_or_else(|| eyre::eyre!("task {} never started", next.id()))?;
        ensure!(completed <= started, "task {} overlapped its predecessor", next.id());
    }
    Ok(())
}

#[then(r#"task {task_id:u64} of "{project}" has failed mentioning "{detail}""#)]
fn task_failed_mentioning(
    world: &QueueWorld,
    task_id: u64,
    project: String,
    detail: String,
) -> Result<(), eyre::Report> {
    let found = task(world, &project, task_id)?;
    ensure!(found.status() == TaskStatus::Failed, "task {task_id} is {}", found.status());
    ensure!(
        found.error().is_some_and(|error| error.contains(&detail)),
        "task {task_id} error {:?} lacks {detail:?}",
        found.error()
    );
    Ok(())
}

#[then(r#"task {task_id:u64} of "{project}" has succeeded"#)]
fn task_succeeded(world: &QueueWorld, task_id: u64, project: String) -> Result<(), eyre::Report> {
    let found = task(world, &project, task_id)?;
    ensure!(found.status() == TaskStatus::Succeeded, "task {task_id} is {}", found.status());
    Ok(())
}

#[then("the submission is rejected as an unknown project")]
fn submission_rejected(world: &QueueWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_submission
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing submission result"))?;
    ensure!(
        matches!(result, Err(OrchestratorError::UnknownProject(_))),
        "expected UnknownProject, got {result:?}"
    );
    Ok(())
}

#[then(r#"project "{project}" has {count:u64} tasks"#)]
fn project_has_tasks(world: &QueueWorld, project: String, count: u64) -> Result<(), eyre::Report> {
    let found = run_async(world.orchestrator()?.list_tasks(&project)).wrap_err("list tasks")?;
    ensure!(
        u64::try_from(found.len())? == count,
        "expected {count} tasks, found {}",
        found.len()
    );
    Ok(())
}

#[then("{count:u64} log entries are returned newest first")]
fn log_entries_newest_first(world: &QueueWorld, count: u64) -> Result<(), eyre::Report> {
    let entries = world
        .log
        .as_ref()
        .ok_or_else(|| eyre::eyre!("svn log was not queried"))?;
    ensure!(
        u64::try_from(entries.len())? == count,
        "expected {count} entries, got {}",
        entries.len()
    );
    ensure!(
        entries
            .windows(2)
            .all(|pair| matches!(pair, [newer, older] if newer.revision > older.revision)),
        "entries are not newest first"
    );
    Ok(())
}

#[then(r#"reading "{name}" from the FTP endpoint of "{project}" returns "{content}""#)]
fn reading_returns(
    world: &QueueWorld,
    name: String,
    project: String,
    content: String,
) -> Result<(), eyre::Report> {
    let bytes = run_async(world.orchestrator()?.ftp_read_file(&project, &name))
        .wrap_err("read ftp file in scenario")?;
    ensure!(bytes == content.as_bytes(), "unexpected content {bytes:?}");
    Ok(())
}
