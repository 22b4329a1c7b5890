//! Subversion history records.

use super::ProjectDomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One Subversion history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Committed revision number.
    pub revision: u64,
    /// Commit author; empty for anonymous commits.
    pub author: String,
    /// Commit message.
    pub message: String,
    /// Commit timestamp.
    pub date: DateTime<Utc>,
}

/// Upper bound on the number of log entries a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLimit(u32);

impl LogLimit {
    /// Creates a validated limit.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidLogLimit`] when the value is zero.
    pub const fn new(value: u32) -> Result<Self, ProjectDomainError> {
        if value == 0 {
            return Err(ProjectDomainError::InvalidLogLimit(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric limit.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Orders entries most recent first and truncates them to the limit.
    #[must_use]
    pub fn apply(self, mut entries: Vec<LogEntry>) -> Vec<LogEntry> {
        entries.sort_by(|left, right| right.revision.cmp(&left.revision));
        entries.truncate(usize::try_from(self.0).unwrap_or(usize::MAX));
        entries
    }
}
