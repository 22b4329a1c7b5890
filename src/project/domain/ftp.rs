//! FTP listing records and archive parameters.

use super::{ArchiveOptionsError, ParseZipTypeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an FTP listing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FtpEntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// One FTP directory listing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtpEntry {
    /// Entry name relative to the endpoint root.
    pub name: String,
    /// Size in bytes; zero for directories.
    pub size: u64,
    /// Last modification time, when the endpoint reports one.
    pub modified: Option<DateTime<Utc>>,
    /// Entry kind.
    pub kind: FtpEntryKind,
}

/// Name filter applied to FTP listings.
///
/// An empty filter or `*` matches every entry; anything else is a
/// case-sensitive substring match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FtpFilter(Option<String>);

impl FtpFilter {
    /// Creates a filter from raw input.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Self(None);
        }
        Self(Some(trimmed.to_owned()))
    }

    /// Returns a filter that matches everything.
    #[must_use]
    pub const fn all() -> Self {
        Self(None)
    }

    /// Returns whether the entry name passes the filter.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.0
            .as_deref()
            .is_none_or(|pattern| name.contains(pattern))
    }
}

/// Archive format produced before an FTP upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZipType {
    /// Zip archive built by the external `zip` tool.
    Zip,
    /// Gzip-compressed tarball built in process.
    TarGz,
}

impl ZipType {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }

    /// Returns the file extension used for archives of this type.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        self.as_str()
    }

    /// Returns whether the archiver for this type accepts `flag`.
    ///
    /// Both types take a compression level `-0` to `-9`. Zip additionally
    /// takes `-q`, `-y`, `-X` and `-D`; flags that move, test or redirect
    /// files are never accepted.
    #[must_use]
    pub fn accepts_flag(self, flag: &str) -> bool {
        let is_level = matches!(flag.as_bytes(), [b'-', digit] if digit.is_ascii_digit());
        is_level || matches!((self, flag), (Self::Zip, "-q" | "-y" | "-X" | "-D"))
    }
}

impl TryFrom<&str> for ZipType {
    type Error = ParseZipTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar.gz" | "tgz" | "targz" => Ok(Self::TarGz),
            _ => Err(ParseZipTypeError(value.to_owned())),
        }
    }
}

impl fmt::Display for ZipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for packaging a working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveOptions {
    zip_type: ZipType,
    flags: Vec<String>,
}

impl ArchiveOptions {
    /// Parses archive options from raw zip type and flag strings.
    ///
    /// Flags are split on whitespace; an empty flag string yields no flags.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveOptionsError::ZipType`] when the zip type is
    /// unsupported and [`ArchiveOptionsError::UnsupportedFlag`] for any flag
    /// the archiver does not accept.
    pub fn parse(zip_type: &str, flags: &str) -> Result<Self, ArchiveOptionsError> {
        let options = Self {
            zip_type: ZipType::try_from(zip_type)?,
            flags: flags.split_whitespace().map(str::to_owned).collect(),
        };
        options.validate()?;
        Ok(options)
    }

    /// Checks every flag against the allow-list of the archive type.
    ///
    /// Options that arrive through deserialization bypass [`Self::parse`],
    /// so adapters call this again before running the archiver.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveOptionsError::UnsupportedFlag`] for the first flag
    /// that is not accepted.
    pub fn validate(&self) -> Result<(), ArchiveOptionsError> {
        self.flags
            .iter()
            .find(|flag| !self.zip_type.accepts_flag(flag))
            .map_or(Ok(()), |flag| {
                Err(ArchiveOptionsError::UnsupportedFlag {
                    zip_type: self.zip_type,
                    flag: flag.clone(),
                })
            })
    }

    /// Returns the archive type.
    #[must_use]
    pub const fn zip_type(&self) -> ZipType {
        self.zip_type
    }

    /// Returns the archiver flags.
    #[must_use]
    pub fn flags(&self) -> &[String] {
        &self.flags
    }
}

/// Outcome of a successful archive upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Final remote file name.
    pub remote_name: String,
    /// Uploaded size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 digest of the uploaded archive.
    pub sha256: String,
}
