//! Runs one orchestrator operation from the command line.
//!
//! Usage:
//!
//! ```text
//! release_worker <config-path> <operation> [arguments...]
//! ```
//!
//! Operations:
//!
//! ```text
//! projects
//! git-info
//! generate      <project> <branch>
//! svn-commit    <project> <branch> <message>
//! ftp-compress  <project> <branch> <zip-type> [flags]
//! set-svn-tag   <project> <branch> <tag>
//! svn-log       <project> <count>
//! ftp-log       <project> [filter]
//! ftp-read      <project> <name>
//! ftp-write     <project> <name> <local-file>
//! ```
//!
//! Queued operations (`generate`, `svn-commit`, `ftp-compress`) wait for
//! their task to finish and print it as JSON; a failed task makes the
//! process exit unsuccessfully. Queries print JSON, except `ftp-read`, which
//! copies the remote file to standard output. Logs go to standard error and
//! honour `RUST_LOG`.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::DefaultClock;
use serde::Serialize;
use shipyard::config::{ConfigError, OrchestratorConfig};
use shipyard::project::adapters::cli::CliBackends;
use shipyard::project::services::{CommandRequest, Orchestrator, OrchestratorError};
use shipyard::task::domain::{TaskId, TaskStatus};
use std::env;
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::error;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: release_worker <config-path> <operation> [arguments...]";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while running an operation.
#[derive(Debug, Error)]
enum WorkerError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    #[error("failed to read {path}: {source}")]
    LocalFile {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
    #[error("task {0} failed")]
    TaskFailed(TaskId),
}

#[derive(Debug, PartialEq, Eq)]
enum Operation {
    Projects,
    GitInfo,
    Submit(CommandRequest),
    SetSvnTag {
        project: String,
        branch: String,
        tag: String,
    },
    SvnLog {
        project: String,
        count: u32,
    },
    FtpLog {
        project: String,
        filter: String,
    },
    FtpRead {
        project: String,
        name: String,
    },
    FtpWrite {
        project: String,
        name: String,
        source: Utf8PathBuf,
    },
}

impl Operation {
    fn parse(name: &str, args: &[String]) -> Result<Self, WorkerError> {
        match (name, args) {
            ("projects", []) => Ok(Self::Projects),
            ("git-info", []) => Ok(Self::GitInfo),
            ("generate", [project, branch]) => {
                Ok(Self::Submit(CommandRequest::generate(project, branch)))
            }
            ("svn-commit", [project, branch, message]) => Ok(Self::Submit(
                CommandRequest::svn_commit(project, branch, message),
            )),
            ("ftp-compress", [project, branch, zip_type]) => Ok(Self::Submit(
                CommandRequest::ftp_compress(project, branch, zip_type, ""),
            )),
            ("ftp-compress", [project, branch, zip_type, flags]) => Ok(Self::Submit(
                CommandRequest::ftp_compress(project, branch, zip_type, flags),
            )),
            ("set-svn-tag", [project, branch, tag]) => Ok(Self::SetSvnTag {
                project: project.clone(),
                branch: branch.clone(),
                tag: tag.clone(),
            }),
            ("svn-log", [project, count]) => {
                let parsed = count.parse::<u32>().map_err(|err| {
                    WorkerError::InvalidArgs(format!("count '{count}' is not a number: {err}"))
                })?;
                Ok(Self::SvnLog {
                    project: project.clone(),
                    count: parsed,
                })
            }
            ("ftp-log", [project]) => Ok(Self::FtpLog {
                project: project.clone(),
                filter: String::new(),
            }),
            ("ftp-log", [project, filter]) => Ok(Self::FtpLog {
                project: project.clone(),
                filter: filter.clone(),
            }),
            ("ftp-read", [project, file_name]) => Ok(Self::FtpRead {
                project: project.clone(),
                name: file_name.clone(),
            }),
            ("ftp-write", [project, file_name, source]) => Ok(Self::FtpWrite {
                project: project.clone(),
                name: file_name.clone(),
                source: Utf8PathBuf::from(source),
            }),
            (other, _) => Err(WorkerError::InvalidArgs(format!(
                "unknown operation '{other}' or wrong number of arguments; {USAGE}"
            ))),
        }
    }
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    let args = collect_args()?;
    let (config_path, operation) = parse_args(args.into_iter())?;
    let config = OrchestratorConfig::load(&config_path).map_err(WorkerError::from)?;
    let runtime = build_runtime()?;
    runtime.block_on(run(&config, operation)).map_err(|err| {
        error!(error = %err, "operation failed");
        err.into()
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn collect_args() -> Result<Vec<String>, WorkerError> {
    env::args_os()
        .map(|arg_os| {
            arg_os
                .into_string()
                .map_err(|_| WorkerError::InvalidArgs("argument is not valid UTF-8".into()))
        })
        .collect()
}

fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<(Utf8PathBuf, Operation), WorkerError> {
    let _program = args.next();
    let config_path = args
        .next()
        .map(Utf8PathBuf::from)
        .ok_or_else(|| WorkerError::InvalidArgs(format!("missing config path; {USAGE}")))?;
    let name = args
        .next()
        .ok_or_else(|| WorkerError::InvalidArgs(format!("missing operation; {USAGE}")))?;
    let rest: Vec<String> = args.collect();
    Ok((config_path, Operation::parse(&name, &rest)?))
}

fn build_runtime() -> Result<tokio::runtime::Runtime, WorkerError> {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(WorkerError::RuntimeInit)
}

async fn run(config: &OrchestratorConfig, operation: Operation) -> Result<(), WorkerError> {
    let provider = CliBackends::from_config(config);
    let orchestrator = Orchestrator::start(config, &provider, &Arc::new(DefaultClock))?;
    let outcome = execute(&orchestrator, operation).await;
    orchestrator.shutdown().await;
    outcome
}

async fn execute(
    orchestrator: &Orchestrator<DefaultClock>,
    operation: Operation,
) -> Result<(), WorkerError> {
    match operation {
        Operation::Projects => write_json(&orchestrator.project_names()),
        Operation::GitInfo => write_json(&orchestrator.get_all_git_info().await?),
        Operation::Submit(request) => {
            let project = request.project().to_owned();
            let task_id = orchestrator.submit(request).await?;
            let task = orchestrator.wait_for_task(&project, task_id).await?;
            write_json(&task)?;
            if task.status() == TaskStatus::Failed {
                return Err(WorkerError::TaskFailed(task_id));
            }
            Ok(())
        }
        Operation::SetSvnTag {
            project,
            branch,
            tag,
        } => Ok(orchestrator
            .set_branch_svn_tag(&project, &branch, &tag)
            .await?),
        Operation::SvnLog { project, count } => {
            write_json(&orchestrator.svn_log(&project, count).await?)
        }
        Operation::FtpLog { project, filter } => {
            write_json(&orchestrator.ftp_log(&project, &filter).await?)
        }
        Operation::FtpRead { project, name } => {
            let content = orchestrator.ftp_read_file(&project, &name).await?;
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&content)
                .and_then(|()| stdout.flush())
                .map_err(WorkerError::Output)
        }
        Operation::FtpWrite {
            project,
            name,
            source,
        } => {
            let content = read_local_file(&source)?;
            Ok(orchestrator
                .ftp_write_file(&project, &name, &content)
                .await?)
        }
    }
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<(), WorkerError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|err| WorkerError::Output(err.into()))?;
    writeln!(stdout).map_err(WorkerError::Output)
}

fn read_local_file(path: &Utf8Path) -> Result<Vec<u8>, WorkerError> {
    let local_error = |source| WorkerError::LocalFile {
        path: path.to_owned(),
        source,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| local_error(io::Error::other("path must include a file name")))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(local_error)?;
    dir.read(file_name).map_err(local_error)
}
