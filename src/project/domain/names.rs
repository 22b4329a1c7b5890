//! Validated names used to address projects, branches, tags and remote files.

use super::ProjectDomainError;
use camino::{Utf8Component, Utf8Path};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Maximum length for a validated branch name.
const MAX_BRANCH_NAME_LENGTH: usize = 200;

/// Characters `git check-ref-format` rejects anywhere in a ref name.
const FORBIDDEN_REF_CHARS: [char; 8] = [':', '~', '^', '?', '*', '[', '\\', '\u{7f}'];

/// Unique key of a managed project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ProjectName(String);

impl ProjectName {
    /// Creates a validated project name.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyProjectName`] for blank input and
    /// [`ProjectDomainError::InvalidProjectName`] when the name contains
    /// whitespace or a `/`.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(ProjectDomainError::EmptyProjectName);
        }
        if normalized.contains('/') || normalized.chars().any(char::is_whitespace) {
            return Err(ProjectDomainError::InvalidProjectName(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the project name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ProjectName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for ProjectName {
    type Error = ProjectDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated Git branch name.
///
/// Branch names must be non-empty after trimming, must not contain
/// whitespace, `..` or characters Git forbids in ref names, must not start
/// with `-` or end with `/` or `.lock`, and must not exceed
/// `MAX_BRANCH_NAME_LENGTH` characters.
///
/// # Examples
///
///     use shipyard::project::domain::BranchName;
///
///     let name = BranchName::new("release/1.4").expect("valid");
///     assert_eq!(name.as_str(), "release/1.4");
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Creates a validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidBranchName`] when the value is not
    /// a usable Git branch name.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if Self::is_invalid_branch_name(normalized) {
            return Err(ProjectDomainError::InvalidBranchName(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    fn is_invalid_branch_name(name: &str) -> bool {
        name.is_empty()
            || name.len() > MAX_BRANCH_NAME_LENGTH
            || name.starts_with('-')
            || name.ends_with('/')
            || name.ends_with(".lock")
            || name.contains("..")
            || name.contains("@{")
            || name
                .chars()
                .any(|ch| ch.is_whitespace() || ch.is_control() || FORBIDDEN_REF_CHARS.contains(&ch))
    }

    /// Returns the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for BranchName {
    type Error = ProjectDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subversion tag recorded against a Git branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct SvnTag(String);

impl SvnTag {
    /// Creates a validated svn tag.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidSvnTag`] when the tag is blank or
    /// contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(ProjectDomainError::InvalidSvnTag(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SvnTag {
    type Error = ProjectDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for SvnTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relative file name on an FTP endpoint.
///
/// Only plain relative components are accepted so a name can never address
/// anything outside the endpoint root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct RemoteFileName(String);

impl RemoteFileName {
    /// Creates a validated remote file name.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidFileName`] for empty names,
    /// absolute paths, and names containing `.` or `..` components.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let path = Utf8Path::new(raw.as_str());
        let has_only_normal_components = path
            .components()
            .all(|component| matches!(component, Utf8Component::Normal(_)));

        if raw.is_empty() || raw.contains('\\') || !has_only_normal_components {
            return Err(ProjectDomainError::InvalidFileName(raw));
        }
        Ok(Self(raw))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name as a relative UTF-8 path.
    #[must_use]
    pub fn as_path(&self) -> &Utf8Path {
        Utf8Path::new(self.0.as_str())
    }
}

impl TryFrom<String> for RemoteFileName {
    type Error = ProjectDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RemoteFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
