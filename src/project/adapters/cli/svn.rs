//! Subversion backend driving the `svn` command line tool.
//!
//! The svn working copy mirrors the Git working copy: files are copied
//! across, files gone from Git are deleted, and `svn add`/`svn delete`
//! bring the svn metadata in line before a commit.

use super::CommandRunner;
use crate::config::{GitSettings, ProjectConfig, SvnSettings};
use crate::project::domain::{BranchName, LogEntry, LogLimit, ProjectName};
use crate::project::ports::{BackendError, BackendResult, SvnBackend};
use async_trait::async_trait;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use tracing::info;
use walkdir::WalkDir;

/// Subversion adapter bound to one project's working copies.
pub struct SvnCli {
    project: ProjectName,
    git: GitSettings,
    settings: SvnSettings,
    runner: CommandRunner,
}

impl SvnCli {
    /// Creates the adapter for `project`.
    #[must_use]
    pub fn new(project: &ProjectConfig, runner: CommandRunner) -> Self {
        Self {
            project: project.name.clone(),
            git: project.git.clone(),
            settings: project.svn.clone(),
            runner,
        }
    }

    async fn svn(&self, args: &[&str]) -> BackendResult<String> {
        self.runner
            .run(&self.settings.working_copy, "svn", args)
            .await
    }
}

#[async_trait]
impl SvnBackend for SvnCli {
    async fn sync_from_git(&self, branch: &BranchName) -> BackendResult<()> {
        self.svn(&["update", "--non-interactive"]).await?;

        let source = self.git.working_copy.clone();
        let target = self.settings.working_copy.clone();
        let stats = tokio::task::spawn_blocking(move || mirror_tree(&source, &target))
            .await
            .map_err(BackendError::io)?
            .map_err(BackendError::io)?;

        self.svn(&["add", "--force", "--non-interactive", "."]).await?;
        let status = self.svn(&["status"]).await?;
        let missing = parse_missing_paths(&status);
        if !missing.is_empty() {
            let mut args = vec!["delete", "--force", "--non-interactive"];
            args.extend(missing.iter().map(String::as_str));
            self.svn(&args).await?;
        }
        info!(
            project = %self.project,
            %branch,
            copied = stats.copied,
            removed = stats.removed,
            "svn working copy synchronised"
        );
        Ok(())
    }

    async fn commit(&self, message: &str) -> BackendResult<Option<u64>> {
        let status = self.svn(&["status"]).await?;
        if status.trim().is_empty() {
            return Ok(None);
        }
        let output = self
            .svn(&["commit", "--non-interactive", "-m", message])
            .await?;
        parse_committed_revision(&output)
            .map(Some)
            .ok_or_else(|| BackendError::Parse(format!("no revision in svn commit output: {output}")))
    }

    async fn log(&self, limit: LogLimit) -> BackendResult<Vec<LogEntry>> {
        let count = limit.value().to_string();
        let xml = self
            .svn(&[
                "log",
                "--xml",
                "--non-interactive",
                "--limit",
                &count,
                &self.settings.remote,
            ])
            .await?;
        parse_log_xml(&xml)
    }
}

/// Counts of files touched by [`mirror_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    /// Files copied from the source.
    pub copied: usize,
    /// Files and directories removed from the target.
    pub removed: usize,
}

fn is_vcs_metadata(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && matches!(entry.file_name().to_str(), Some(".git" | ".svn"))
}

/// Makes `target` hold the same files as `source`, ignoring `.git` and
/// `.svn` directories on both sides.
///
/// # Errors
///
/// Returns the first I/O error encountered.
pub fn mirror_tree(source: &Utf8Path, target: &Utf8Path) -> io::Result<MirrorStats> {
    let mut stats = MirrorStats::default();

    for entry_result in WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_vcs_metadata(entry))
    {
        let entry = entry_result.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(source).map_err(io::Error::other)?;
        let destination = target.as_std_path().join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
            stats.copied += 1;
        }
    }

    for entry_result in WalkDir::new(target)
        .follow_links(false)
        .contents_first(true)
        .into_iter()
        .filter_entry(|entry| !is_vcs_metadata(entry))
    {
        let entry = entry_result.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(target).map_err(io::Error::other)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        if fs::symlink_metadata(source.as_std_path().join(relative)).is_ok() {
            continue;
        }
        if entry.file_type().is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
        stats.removed += 1;
    }

    Ok(stats)
}

/// Extracts paths reported missing (`!`) by `svn status`.
#[must_use]
pub fn parse_missing_paths(status: &str) -> Vec<String> {
    status
        .lines()
        .filter_map(|line| line.strip_prefix('!'))
        .map(|rest| rest.trim().to_owned())
        .filter(|path| !path.is_empty())
        .collect()
}

/// Extracts the revision from `svn commit` output.
#[must_use]
pub fn parse_committed_revision(output: &str) -> Option<u64> {
    output.lines().find_map(|line| {
        line.trim()
            .strip_prefix("Committed revision ")?
            .trim_end_matches('.')
            .parse()
            .ok()
    })
}

/// Parses `svn log --xml` output.
///
/// Entries without an author or message get empty strings.
///
/// # Errors
///
/// Returns [`BackendError::Parse`] for malformed XML, revisions or dates.
pub fn parse_log_xml(xml: &str) -> BackendResult<Vec<LogEntry>> {
    let doc = roxmltree::Document::parse(xml.trim())
        .map_err(|err| BackendError::Parse(format!("svn log xml: {err}")))?;

    doc.descendants()
        .filter(|node| node.has_tag_name("logentry"))
        .map(|node| -> BackendResult<LogEntry> {
            let revision = node
                .attribute("revision")
                .and_then(|value| value.parse::<u64>().ok())
                .ok_or_else(|| BackendError::Parse("svn log entry without revision".to_owned()))?;
            let child_text = |tag: &str| {
                node.children()
                    .find(|child| child.has_tag_name(tag))
                    .and_then(|child| child.text())
                    .unwrap_or_default()
                    .to_owned()
            };
            let raw_date = child_text("date");
            let date = DateTime::parse_from_rfc3339(raw_date.trim())
                .map_err(|err| BackendError::Parse(format!("svn log date `{raw_date}`: {err}")))?
                .with_timezone(&Utc);
            Ok(LogEntry {
                revision,
                author: child_text("author"),
                message: child_text("msg"),
                date,
            })
        })
        .collect()
}
