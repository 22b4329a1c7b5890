//! Backends that drive the `git`, `svn` and `zip` command line tools and a
//! mounted FTP endpoint.

mod archive;
mod command;
mod ftp;
mod git;
mod svn;
mod template;

pub use archive::{build_tar_gz, digest_file, hex_digest};
pub use command::{CommandRunner, render_command_line, shell_escape};
pub use ftp::MountedFtp;
pub use git::{GitCli, parse_branch_list, parse_svn_tags};
pub use svn::{
    MirrorStats, SvnCli, mirror_tree, parse_committed_revision, parse_log_xml,
    parse_missing_paths,
};
pub use template::{TemplateContext, render};

use crate::config::{OrchestratorConfig, ProjectConfig};
use crate::project::ports::{BackendProvider, ProjectBackends};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// Formats the clock's current UTC time for templates.
fn timestamp(clock: &(dyn Clock + Send + Sync)) -> String {
    clock.utc().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Builds command-line backends for every project.
#[derive(Clone)]
pub struct CliBackends {
    runner: CommandRunner,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl CliBackends {
    /// Creates a provider using the configured command timeout.
    #[must_use]
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self {
            runner: CommandRunner::new(config.command_timeout()),
            clock: Arc::new(DefaultClock),
        }
    }

    /// Replaces the clock used for template timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }
}

impl BackendProvider for CliBackends {
    fn backends_for(&self, project: &ProjectConfig) -> ProjectBackends {
        ProjectBackends::new(
            Arc::new(GitCli::new(project, self.runner, Arc::clone(&self.clock))),
            Arc::new(SvnCli::new(project, self.runner)),
            Arc::new(MountedFtp::new(project, self.runner, Arc::clone(&self.clock))),
        )
    }
}
