//! Packaging of a Git working copy before upload.

use super::CommandRunner;
use crate::project::domain::{ArchiveOptions, ZipType};
use crate::project::ports::{BackendError, BackendResult};
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use tar::Builder;
use tracing::warn;
use walkdir::WalkDir;

/// Version-control metadata never shipped in archives.
const SKIPPED_DIRS: [&str; 2] = [".git", ".svn"];

/// Builds an archive of `source` at `destination` in the requested format.
///
/// # Errors
///
/// Returns [`BackendError::Rejected`] when a flag is not on the allow-list
/// and other [`BackendError`] values when the source cannot be read or the
/// archiver fails.
pub async fn build_archive(
    runner: &CommandRunner,
    source: &Utf8Path,
    destination: &Utf8Path,
    options: &ArchiveOptions,
) -> BackendResult<()> {
    options
        .validate()
        .map_err(|err| BackendError::rejected("archive", err.to_string()))?;
    match options.zip_type() {
        ZipType::TarGz => {
            let level = compression_level(options.flags())?;
            let source_dir = source.to_owned();
            let target = destination.to_owned();
            tokio::task::spawn_blocking(move || build_tar_gz(&source_dir, &target, level))
                .await
                .map_err(BackendError::io)?
        }
        ZipType::Zip => {
            let mut args: Vec<&str> = vec!["-r", "-q"];
            args.extend(options.flags().iter().map(String::as_str));
            args.extend([destination.as_str(), ".", "-x", ".git/*", ".svn/*"]);
            runner.run(source, "zip", &args).await.map(|_| ())
        }
    }
}

/// Reads `-0` to `-9` from tar.gz flags; no flag means the default level.
fn compression_level(flags: &[String]) -> BackendResult<Compression> {
    let mut level = Compression::default();
    for flag in flags {
        let parsed = flag
            .strip_prefix('-')
            .and_then(|digits| digits.parse::<u32>().ok())
            .filter(|value| *value <= 9);
        let Some(value) = parsed else {
            return Err(BackendError::rejected(
                "archive",
                format!("unsupported tar.gz flag `{flag}`"),
            ));
        };
        level = Compression::new(value);
    }
    Ok(level)
}

/// Writes a gzip-compressed tarball of `source` to `destination`.
///
/// Paths in the archive are relative to `source`. Symlinks are stored as
/// links and `.git`/`.svn` directories are left out.
///
/// # Errors
///
/// Returns [`BackendError::Io`] on any read or write failure.
pub fn build_tar_gz(
    source: &Utf8Path,
    destination: &Utf8Path,
    level: Compression,
) -> BackendResult<()> {
    let file = File::create(destination).map_err(BackendError::io)?;
    let encoder = GzEncoder::new(BufWriter::new(file), level);
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);

    let walker = WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !SKIPPED_DIRS
                    .iter()
                    .any(|skipped| entry.file_name() == *skipped)
        });
    for entry_result in walker {
        let entry = entry_result.map_err(|err| BackendError::io(io::Error::from(err)))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|err| BackendError::io(io::Error::other(err)))?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let file_type = entry.file_type();
        if file_type.is_dir() {
            builder
                .append_dir(relative, entry.path())
                .map_err(BackendError::io)?;
        } else if file_type.is_file() || file_type.is_symlink() {
            builder
                .append_path_with_name(entry.path(), relative)
                .map_err(BackendError::io)?;
        } else {
            warn!(path = %entry.path().display(), "skipping special file");
        }
    }

    let gzip = builder.into_inner().map_err(BackendError::io)?;
    gzip.finish()
        .and_then(|mut writer| io::Write::flush(&mut writer))
        .map_err(BackendError::io)
}

/// Returns the size and hex-encoded SHA-256 digest of a file.
///
/// # Errors
///
/// Returns [`BackendError::Io`] when the file cannot be read.
pub fn digest_file(path: &Utf8Path) -> BackendResult<(u64, String)> {
    let mut reader = BufReader::new(File::open(path).map_err(BackendError::io)?);
    let mut hasher = Sha256::new();
    let size = io::copy(&mut reader, &mut hasher).map_err(BackendError::io)?;
    Ok((size, hex_digest(&hasher.finalize())))
}

/// Hex-encodes a digest.
#[must_use]
pub fn hex_digest(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Returns the system temporary directory used for scratch archives.
#[must_use]
pub fn default_scratch_dir() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(std::env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

/// Returns a unique scratch path under `dir` for an archive built outside
/// the FTP root.
#[must_use]
pub fn scratch_path(dir: &Utf8Path, extension: &str) -> Utf8PathBuf {
    dir.join(format!("shipyard-{}.{extension}", uuid::Uuid::new_v4()))
}
