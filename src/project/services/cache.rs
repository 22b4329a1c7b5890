//! Cached Git snapshot shared between a project's worker and its readers.

use crate::project::domain::{BranchName, GitInfo, SvnTag};
use std::sync::{Arc, PoisonError, RwLock};

/// Last known [`GitInfo`] of one project.
///
/// The worker refreshes it after each successful task; synchronous queries
/// refresh or patch it in place.
#[derive(Debug, Clone, Default)]
pub struct GitInfoCache {
    snapshot: Arc<RwLock<Option<GitInfo>>>,
}

impl GitInfoCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot, if any.
    #[must_use]
    pub fn get(&self) -> Option<GitInfo> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the cached snapshot.
    pub fn store(&self, info: GitInfo) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(info);
    }

    /// Drops the cached snapshot so the next read goes to the backend.
    pub fn invalidate(&self) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Patches the svn tag of `branch` in the cached snapshot, if one exists.
    pub fn record_svn_tag(&self, branch: &BranchName, tag: SvnTag) {
        let mut snapshot = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(info) = snapshot.as_mut() {
            info.record_svn_tag(branch, tag);
        }
    }
}
