//! Git working-copy snapshots.

use super::{BranchName, SvnTag};
use serde::{Deserialize, Serialize};

/// One branch known to a project's Git remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// Branch name without the remote prefix.
    pub name: BranchName,
    /// Svn tag pointer recorded against the branch, if any.
    pub svn_tag: Option<SvnTag>,
}

impl BranchInfo {
    /// Creates branch information without a recorded svn tag.
    #[must_use]
    pub const fn new(name: BranchName) -> Self {
        Self {
            name,
            svn_tag: None,
        }
    }

    /// Sets the recorded svn tag.
    #[must_use]
    pub fn with_svn_tag(mut self, svn_tag: SvnTag) -> Self {
        self.svn_tag = Some(svn_tag);
        self
    }
}

/// Snapshot of a project's Git working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    current_branch: String,
    latest_commit: String,
    branches: Vec<BranchInfo>,
}

impl GitInfo {
    /// Creates a snapshot.
    ///
    /// Branches are kept sorted by name.
    #[must_use]
    pub fn new(
        current_branch: impl Into<String>,
        latest_commit: impl Into<String>,
        mut branches: Vec<BranchInfo>,
    ) -> Self {
        branches.sort_by(|left, right| left.name.cmp(&right.name));
        branches.dedup_by(|left, right| left.name == right.name);
        Self {
            current_branch: current_branch.into(),
            latest_commit: latest_commit.into(),
            branches,
        }
    }

    /// Returns the checked-out branch, or `HEAD` when detached.
    #[must_use]
    pub fn current_branch(&self) -> &str {
        &self.current_branch
    }

    /// Returns the commit the working copy points at.
    #[must_use]
    pub fn latest_commit(&self) -> &str {
        &self.latest_commit
    }

    /// Returns the known branches, sorted by name.
    #[must_use]
    pub fn branches(&self) -> &[BranchInfo] {
        &self.branches
    }

    /// Looks up a branch by name.
    #[must_use]
    pub fn branch(&self, name: &BranchName) -> Option<&BranchInfo> {
        self.branches.iter().find(|branch| &branch.name == name)
    }

    /// Records an svn tag against a branch, adding the branch when unknown.
    pub fn record_svn_tag(&mut self, name: &BranchName, svn_tag: SvnTag) {
        if let Some(branch) = self.branches.iter_mut().find(|branch| &branch.name == name) {
            branch.svn_tag = Some(svn_tag);
            return;
        }
        self.branches
            .push(BranchInfo::new(name.clone()).with_svn_tag(svn_tag));
        self.branches.sort_by(|left, right| left.name.cmp(&right.name));
    }
}
