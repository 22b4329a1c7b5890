//! When steps for task queue BDD scenarios.

use super::world::{QueueWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use shipyard::project::services::CommandRequest;

fn submit(world: &mut QueueWorld, request: CommandRequest) -> Result<(), eyre::Report> {
    let result = run_async(world.orchestrator()?.submit(request));
    if let Ok(task_id) = result.as_ref() {
        world.submitted.push(*task_id);
    }
    world.last_submission = Some(result);
    Ok(())
}

#[when(r#"{count:u64} generate commands are submitted to "{project}" on branch "{branch}""#)]
fn submit_generate_commands(
    world: &mut QueueWorld,
    count: u64,
    project: String,
    branch: String,
) -> Result<(), eyre::Report> {
    for _ in 0..count {
        submit(world, CommandRequest::generate(project.as_str(), branch.as_str()))?;
    }
    Ok(())
}

#[when(r#"a generate command is submitted to "{project}" on branch "{branch}""#)]
fn submit_generate_command(
    world: &mut QueueWorld,
    project: String,
    branch: String,
) -> Result<(), eyre::Report> {
    submit(world, CommandRequest::generate(project, branch))
}

#[when(r#"an svn commit "{message}" is submitted to "{project}" on branch "{branch}""#)]
fn submit_svn_commit(
    world: &mut QueueWorld,
    message: String,
    project: String,
    branch: String,
) -> Result<(), eyre::Report> {
    submit(world, CommandRequest::svn_commit(project, branch, message))
}

#[when(r#"the svn log of "{project}" is queried for {count:u32} entries"#)]
fn query_svn_log(world: &mut QueueWorld, project: String, count: u32) -> Result<(), eyre::Report> {
    let entries = run_async(world.orchestrator()?.svn_log(&project, count))
        .wrap_err("query svn log in scenario")?;
    world.log = Some(entries);
    Ok(())
}

#[when(r#""{content}" is written to "{name}" on the FTP endpoint of "{project}""#)]
fn write_ftp_file(
    world: &mut QueueWorld,
    content: String,
    name: String,
    project: String,
) -> Result<(), eyre::Report> {
    run_async(
        world
            .orchestrator()?
            .ftp_write_file(&project, &name, content.as_bytes()),
    )
    .wrap_err("write ftp file in scenario")
}
