//! Git backend driving the `git` command line tool.

use super::template::{TemplateContext, render};
use super::{CommandRunner, timestamp};
use crate::config::{GitSettings, ProjectConfig};
use crate::project::domain::{BranchInfo, BranchName, GitInfo, ProjectName, SvnTag};
use crate::project::ports::{BackendError, BackendResult, GitBackend};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Git configuration key suffix holding a branch's svn tag.
const SVN_TAG_KEY: &str = "svntag";

/// Git adapter bound to one project's working copy.
pub struct GitCli {
    project: ProjectName,
    settings: GitSettings,
    runner: CommandRunner,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl GitCli {
    /// Creates the adapter for `project`.
    #[must_use]
    pub fn new(
        project: &ProjectConfig,
        runner: CommandRunner,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            project: project.name.clone(),
            settings: project.git.clone(),
            runner,
            clock,
        }
    }

    async fn git(&self, args: &[&str]) -> BackendResult<String> {
        self.runner
            .run(&self.settings.working_copy, "git", args)
            .await
    }

    fn remote_ref(&self, branch: &BranchName) -> String {
        format!("{}/{branch}", self.settings.remote)
    }

    fn generator_program(&self, program: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from(program);
        if path.is_relative() && program.contains('/') {
            self.settings.working_copy.join(path)
        } else {
            path
        }
    }

    async fn svn_tags(&self) -> BackendResult<BTreeMap<String, String>> {
        let pattern = format!(r"^branch\..*\.{SVN_TAG_KEY}$");
        match self.git(&["config", "--local", "--get-regexp", &pattern]).await {
            Ok(output) => Ok(parse_svn_tags(&output)),
            Err(BackendError::CommandFailed { exit_code: 1, .. }) => Ok(BTreeMap::new()),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl GitBackend for GitCli {
    async fn checkout_or_update(&self, branch: &BranchName) -> BackendResult<()> {
        let remote_ref = self.remote_ref(branch);
        self.git(&["fetch", "--prune", &self.settings.remote]).await?;
        self.git(&["checkout", "-B", branch.as_str(), &remote_ref]).await?;
        self.git(&["reset", "--hard", &remote_ref]).await?;
        self.git(&["clean", "-fd"]).await?;
        info!(project = %self.project, %branch, "working copy updated");
        Ok(())
    }

    async fn generate(&self) -> BackendResult<()> {
        let Some(generator) = &self.settings.generator else {
            return Err(BackendError::rejected(
                "generate",
                format!("project {} has no generator configured", self.project),
            ));
        };
        let program = self.generator_program(&generator.program);
        let args: Vec<&str> = generator.args.iter().map(String::as_str).collect();
        self.runner
            .run(&self.settings.working_copy, program.as_str(), &args)
            .await?;
        info!(project = %self.project, program = %program, "generator finished");
        Ok(())
    }

    async fn commit(&self, branch: &BranchName) -> BackendResult<()> {
        self.git(&["add", "-A"]).await?;
        let status = self.git(&["status", "--porcelain"]).await?;
        if status.trim().is_empty() {
            info!(project = %self.project, %branch, "nothing to commit");
            return Ok(());
        }

        let context = TemplateContext {
            project: self.project.as_str(),
            branch: branch.as_str(),
            timestamp: timestamp(&*self.clock),
            zip_type: "",
        };
        let message = render("commit", &self.settings.commit_message, &context)?;
        self.git(&["commit", "-m", &message]).await?;
        if self.settings.push {
            let refspec = format!("HEAD:refs/heads/{branch}");
            self.git(&["push", &self.settings.remote, &refspec]).await?;
        }
        info!(project = %self.project, %branch, pushed = self.settings.push, "committed generated changes");
        Ok(())
    }

    async fn discard_local_changes(&self, branch: &BranchName) -> BackendResult<()> {
        let remote_ref = self.remote_ref(branch);
        self.git(&["reset", "--hard", &remote_ref]).await?;
        self.git(&["clean", "-fd"]).await?;
        info!(project = %self.project, %branch, reset_to = %remote_ref, "local changes discarded");
        Ok(())
    }

    async fn current_info(&self) -> BackendResult<GitInfo> {
        let current_branch = self.git(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        let latest_commit = self.git(&["rev-parse", "HEAD"]).await?;
        let remote_refs = format!("refs/remotes/{}", self.settings.remote);
        let refs = self
            .git(&[
                "for-each-ref",
                "--format=%(refname:short)",
                "refs/heads",
                &remote_refs,
            ])
            .await?;
        let tags = self.svn_tags().await?;
        let branches = parse_branch_list(&refs, &self.settings.remote)
            .into_iter()
            .map(|name| BranchInfo {
                svn_tag: tags
                    .get(name.as_str())
                    .and_then(|value| SvnTag::new(value.as_str()).ok()),
                ..BranchInfo::new(name)
            })
            .collect();
        Ok(GitInfo::new(
            current_branch.trim(),
            latest_commit.trim(),
            branches,
        ))
    }

    async fn set_tag_for_branch(&self, branch: &BranchName, tag: &SvnTag) -> BackendResult<()> {
        let key = format!("branch.{branch}.{SVN_TAG_KEY}");
        self.git(&["config", "--local", &key, tag.as_str()]).await?;
        Ok(())
    }
}

/// Parses `git for-each-ref --format=%(refname:short)` output into branch
/// names, folding `<remote>/<branch>` onto `<branch>`.
#[must_use]
pub fn parse_branch_list(output: &str, remote: &str) -> Vec<BranchName> {
    let remote_prefix = format!("{remote}/");
    let mut names: Vec<BranchName> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != remote)
        .map(|line| line.strip_prefix(&remote_prefix).unwrap_or(line))
        .filter(|name| *name != "HEAD")
        .filter_map(|name| BranchName::new(name).ok())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Parses `git config --get-regexp` output of svn tag keys into a map from
/// branch name to tag.
#[must_use]
pub fn parse_svn_tags(output: &str) -> BTreeMap<String, String> {
    let suffix = format!(".{SVN_TAG_KEY}");
    output
        .lines()
        .filter_map(|line| line.trim().split_once(' '))
        .filter_map(|(key, value)| {
            let branch = key.strip_prefix("branch.")?.strip_suffix(suffix.as_str())?;
            Some((branch.to_owned(), value.trim().to_owned()))
        })
        .collect()
}
