//! Static orchestrator configuration.
//!
//! The project set is read once from a JSON file and never changes while the
//! process runs. A representative file is:
//!
//! ```json
//! {
//!   "command_timeout_secs": 600,
//!   "projects": [
//!     {
//!       "name": "p1",
//!       "git": {
//!         "working_copy": "work/p1/git",
//!         "remote": "origin",
//!         "branches": ["main", "release"],
//!         "generator": { "program": "./generate.sh", "args": ["--all"] },
//!         "push": true
//!       },
//!       "svn": {
//!         "working_copy": "work/p1/svn",
//!         "remote": "https://svn.example.com/p1/trunk"
//!       },
//!       "ftp": { "root": "/mnt/ftp/p1" }
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use crate::project::domain::{BranchName, ProjectName};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Default time budget for one external command.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 600;

/// Default Git commit message template.
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore({{ project }}): regenerate {{ branch }}";

/// Default remote archive name template.
pub const DEFAULT_ARCHIVE_NAME: &str = "{{ project }}-{{ branch }}-{{ timestamp }}.{{ zip_type }}";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two projects share a name.
    #[error("duplicate project name: {0}")]
    DuplicateProject(ProjectName),

    /// No project is configured.
    #[error("configuration must declare at least one project")]
    NoProjects,

    /// The command timeout is zero.
    #[error("command_timeout_secs must be greater than zero")]
    InvalidTimeout,
}

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Time budget for one external command, in seconds.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Managed projects.
    pub projects: Vec<ProjectConfig>,
}

/// Configuration of one managed project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Unique project name.
    pub name: ProjectName,
    /// Git working copy and remote.
    pub git: GitSettings,
    /// Subversion working copy and remote.
    pub svn: SvnSettings,
    /// FTP endpoint.
    pub ftp: FtpSettings,
}

impl ProjectConfig {
    /// Returns whether commands may target `branch`.
    ///
    /// An empty configured branch set allows every branch.
    #[must_use]
    pub fn allows_branch(&self, branch: &BranchName) -> bool {
        self.git.branches.is_empty() || self.git.branches.contains(branch)
    }
}

/// Git settings of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitSettings {
    /// Local working copy.
    pub working_copy: Utf8PathBuf,
    /// Remote name used for fetch and push.
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Branches commands may target; empty means any.
    #[serde(default)]
    pub branches: Vec<BranchName>,
    /// Code generator run by generate-and-commit commands.
    #[serde(default)]
    pub generator: Option<GeneratorSettings>,
    /// Commit message template.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    /// Whether commits are pushed to the remote.
    #[serde(default = "default_push")]
    pub push: bool,
}

/// External code generator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    /// Program to run, resolved against the working copy when relative.
    pub program: String,
    /// Program arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Subversion settings of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SvnSettings {
    /// Local svn working copy mirrored from the Git working copy.
    pub working_copy: Utf8PathBuf,
    /// Repository URL queried for history.
    pub remote: String,
}

/// FTP settings of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FtpSettings {
    /// Mounted root directory of the FTP endpoint.
    pub root: Utf8PathBuf,
    /// Remote archive name template.
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
}

const fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_remote() -> String {
    "origin".to_owned()
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_owned()
}

const fn default_push() -> bool {
    true
}

fn default_archive_name() -> String {
    DEFAULT_ARCHIVE_NAME.to_owned()
}

impl OrchestratorConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed or
    /// validated.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let read_error = |source| ConfigError::Read {
            path: path.to_owned(),
            source,
        };
        let file_name = path
            .file_name()
            .ok_or_else(|| read_error(std::io::Error::other("path must include a file name")))?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let contents = dir.read_to_string(file_name).map_err(read_error)?;
        Self::from_json(&contents, parent)
    }

    /// Parses and validates configuration JSON.
    ///
    /// Relative paths are resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_json(json: &str, base_dir: &Utf8Path) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.validate()?;
        config.resolve_paths(base_dir);
        Ok(config)
    }

    /// Returns the time budget for one external command.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Looks up a project by name.
    #[must_use]
    pub fn project(&self, name: &ProjectName) -> Option<&ProjectConfig> {
        self.projects.iter().find(|project| &project.name == name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.projects.is_empty() {
            return Err(ConfigError::NoProjects);
        }
        let mut seen = HashSet::new();
        for project in &self.projects {
            if !seen.insert(&project.name) {
                return Err(ConfigError::DuplicateProject(project.name.clone()));
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base_dir: &Utf8Path) {
        for project in &mut self.projects {
            resolve_against(base_dir, &mut project.git.working_copy);
            resolve_against(base_dir, &mut project.svn.working_copy);
            resolve_against(base_dir, &mut project.ftp.root);
        }
    }
}

fn resolve_against(base_dir: &Utf8Path, path: &mut Utf8PathBuf) {
    if path.is_relative() {
        *path = base_dir.join(&*path);
    }
}
