//! Scriptable in-memory Git, Subversion and FTP backend.

use crate::config::ProjectConfig;
use crate::project::adapters::cli::hex_digest;
use crate::project::domain::{
    ArchiveOptions, BranchInfo, BranchName, FtpEntry, FtpEntryKind, FtpFilter, GitInfo, LogEntry,
    LogLimit, ProjectName, RemoteFileName, SvnTag, UploadReceipt,
};
use crate::project::ports::{
    BackendError, BackendProvider, BackendResult, FtpBackend, GitBackend, ProjectBackends,
    SvnBackend,
};
use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Backend calls that can be scripted to fail or panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendOperation {
    /// [`GitBackend::checkout_or_update`].
    Checkout,
    /// [`GitBackend::generate`].
    Generate,
    /// [`GitBackend::commit`].
    GitCommit,
    /// [`GitBackend::discard_local_changes`].
    Discard,
    /// [`GitBackend::current_info`].
    CurrentInfo,
    /// [`GitBackend::set_tag_for_branch`].
    SetSvnTag,
    /// [`SvnBackend::sync_from_git`].
    SvnSync,
    /// [`SvnBackend::commit`].
    SvnCommit,
    /// [`SvnBackend::log`].
    SvnLog,
    /// [`FtpBackend::list`].
    FtpList,
    /// [`FtpBackend::read_file`].
    FtpRead,
    /// [`FtpBackend::write_file`].
    FtpWrite,
    /// [`FtpBackend::archive_and_upload`].
    ArchiveUpload,
}

impl BackendOperation {
    /// Returns the operation name used in journals and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checkout => "git checkout",
            Self::Generate => "git generate",
            Self::GitCommit => "git commit",
            Self::Discard => "git discard",
            Self::CurrentInfo => "git info",
            Self::SetSvnTag => "git svntag",
            Self::SvnSync => "svn sync",
            Self::SvnCommit => "svn commit",
            Self::SvnLog => "svn log",
            Self::FtpList => "ftp list",
            Self::FtpRead => "ftp read",
            Self::FtpWrite => "ftp write",
            Self::ArchiveUpload => "ftp upload",
        }
    }
}

impl fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks how many backend calls overlap.
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    /// Returns the highest number of overlapping calls observed.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ProbeGuard<'_> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.peak.fetch_max(current, Ordering::SeqCst);
        ProbeGuard(self)
    }
}

struct ProbeGuard<'a>(&'a ConcurrencyProbe);

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct BackendState {
    journal: Vec<String>,
    failures: HashMap<BackendOperation, BackendError>,
    panics: HashSet<BackendOperation>,
    delay: Duration,
    current_branch: String,
    commits: u64,
    dirty: bool,
    branches: BTreeMap<BranchName, Option<SvnTag>>,
    svn_revision: u64,
    svn_log: Vec<LogEntry>,
    files: BTreeMap<String, Vec<u8>>,
}

impl Default for BackendState {
    fn default() -> Self {
        let mut branches = BTreeMap::new();
        if let Ok(main) = BranchName::new("main") {
            branches.insert(main, None);
        }
        Self {
            journal: Vec::new(),
            failures: HashMap::new(),
            panics: HashSet::new(),
            delay: Duration::ZERO,
            current_branch: "main".to_owned(),
            commits: 1,
            dirty: false,
            branches,
            svn_revision: 0,
            svn_log: Vec::new(),
            files: BTreeMap::new(),
        }
    }
}

/// Git, Subversion and FTP backend held entirely in memory.
///
/// Every call is appended to a journal, can be delayed, and can be scripted
/// to fail or panic per [`BackendOperation`].
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
    probe: ConcurrencyProbe,
    shared_probe: Option<Arc<ConcurrencyProbe>>,
}

fn raise_scripted_panic(operation: BackendOperation) {
    panic!("scripted panic in {operation}");
}

impl InMemoryBackend {
    /// Creates a backend with a single `main` branch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that also reports into a probe shared across
    /// backends.
    #[must_use]
    pub fn with_shared_probe(shared_probe: Arc<ConcurrencyProbe>) -> Self {
        Self {
            shared_probe: Some(shared_probe),
            ..Self::default()
        }
    }

    /// Returns port handles backed by this instance.
    #[must_use]
    pub fn backends(self: &Arc<Self>) -> ProjectBackends {
        ProjectBackends::new(
            Arc::clone(self) as Arc<dyn GitBackend>,
            Arc::clone(self) as Arc<dyn SvnBackend>,
            Arc::clone(self) as Arc<dyn FtpBackend>,
        )
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every later call of `operation` fail with `error`.
    pub fn fail_on(&self, operation: BackendOperation, error: BackendError) {
        self.lock().failures.insert(operation, error);
    }

    /// Removes a scripted failure.
    pub fn clear_failure(&self, operation: BackendOperation) {
        self.lock().failures.remove(&operation);
    }

    /// Makes every later call of `operation` panic.
    pub fn panic_on(&self, operation: BackendOperation) {
        self.lock().panics.insert(operation);
    }

    /// Delays every call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    /// Returns the calls made so far, oldest first.
    #[must_use]
    pub fn journal(&self) -> Vec<String> {
        self.lock().journal.clone()
    }

    /// Returns the highest number of overlapping calls on this backend.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.probe.peak()
    }

    /// Returns whether generated changes are waiting to be committed.
    #[must_use]
    pub fn has_local_changes(&self) -> bool {
        self.lock().dirty
    }

    /// Returns the number of commits on the working copy.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.lock().commits
    }

    /// Returns a stored remote file.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().files.get(name).cloned()
    }

    /// Adds an svn log entry.
    pub fn push_log_entry(&self, entry: LogEntry) {
        let mut state = self.lock();
        state.svn_revision = state.svn_revision.max(entry.revision);
        state.svn_log.push(entry);
    }

    async fn step(&self, operation: BackendOperation, detail: String) -> BackendResult<()> {
        let (delay, failure, panics) = {
            let mut state = self.lock();
            state.journal.push(detail);
            (
                state.delay,
                state.failures.get(&operation).cloned(),
                state.panics.contains(&operation),
            )
        };
        let _own = self.probe.enter();
        let _shared = self.shared_probe.as_deref().map(ConcurrencyProbe::enter);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if panics {
            raise_scripted_panic(operation);
        }
        failure.map_or(Ok(()), Err)
    }

    fn git_info(state: &BackendState) -> GitInfo {
        let branches = state
            .branches
            .iter()
            .map(|(name, svn_tag)| BranchInfo {
                svn_tag: svn_tag.clone(),
                ..BranchInfo::new(name.clone())
            })
            .collect();
        GitInfo::new(
            state.current_branch.clone(),
            format!("{:040x}", state.commits),
            branches,
        )
    }
}

#[async_trait]
impl GitBackend for InMemoryBackend {
    async fn checkout_or_update(&self, branch: &BranchName) -> BackendResult<()> {
        self.step(BackendOperation::Checkout, format!("git checkout {branch}"))
            .await?;
        let mut state = self.lock();
        state.current_branch = branch.to_string();
        state.branches.entry(branch.clone()).or_insert(None);
        state.dirty = false;
        Ok(())
    }

    async fn generate(&self) -> BackendResult<()> {
        self.step(BackendOperation::Generate, "git generate".to_owned())
            .await?;
        self.lock().dirty = true;
        Ok(())
    }

    async fn commit(&self, branch: &BranchName) -> BackendResult<()> {
        self.step(BackendOperation::GitCommit, format!("git commit {branch}"))
            .await?;
        let mut state = self.lock();
        if state.dirty {
            state.commits = state.commits.saturating_add(1);
            state.dirty = false;
        }
        Ok(())
    }

    async fn discard_local_changes(&self, branch: &BranchName) -> BackendResult<()> {
        self.step(BackendOperation::Discard, format!("git discard {branch}"))
            .await?;
        self.lock().dirty = false;
        Ok(())
    }

    async fn current_info(&self) -> BackendResult<GitInfo> {
        self.step(BackendOperation::CurrentInfo, "git info".to_owned())
            .await?;
        Ok(Self::git_info(&self.lock()))
    }

    async fn set_tag_for_branch(&self, branch: &BranchName, tag: &SvnTag) -> BackendResult<()> {
        self.step(BackendOperation::SetSvnTag, format!("git svntag {branch} {tag}"))
            .await?;
        self.lock()
            .branches
            .insert(branch.clone(), Some(tag.clone()));
        Ok(())
    }
}

#[async_trait]
impl SvnBackend for InMemoryBackend {
    async fn sync_from_git(&self, branch: &BranchName) -> BackendResult<()> {
        self.step(BackendOperation::SvnSync, format!("svn sync {branch}"))
            .await
    }

    async fn commit(&self, message: &str) -> BackendResult<Option<u64>> {
        self.step(BackendOperation::SvnCommit, format!("svn commit {message}"))
            .await?;
        let mut state = self.lock();
        let revision = state.svn_revision.saturating_add(1);
        state.svn_revision = revision;
        state.svn_log.push(LogEntry {
            revision,
            author: "shipyard".to_owned(),
            message: message.to_owned(),
            date: DefaultClock.utc(),
        });
        Ok(Some(revision))
    }

    async fn log(&self, limit: LogLimit) -> BackendResult<Vec<LogEntry>> {
        self.step(BackendOperation::SvnLog, format!("svn log {}", limit.value()))
            .await?;
        let entries = self.lock().svn_log.clone();
        Ok(limit.apply(entries))
    }
}

#[async_trait]
impl FtpBackend for InMemoryBackend {
    async fn list(&self, filter: &FtpFilter) -> BackendResult<Vec<FtpEntry>> {
        self.step(BackendOperation::FtpList, "ftp list".to_owned())
            .await?;
        Ok(self
            .lock()
            .files
            .iter()
            .filter(|(name, _)| filter.matches(name))
            .map(|(name, content)| FtpEntry {
                name: name.clone(),
                size: u64::try_from(content.len()).unwrap_or(u64::MAX),
                modified: None,
                kind: FtpEntryKind::File,
            })
            .collect())
    }

    async fn read_file(&self, name: &RemoteFileName) -> BackendResult<Vec<u8>> {
        self.step(BackendOperation::FtpRead, format!("ftp read {name}"))
            .await?;
        self.lock()
            .files
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| BackendError::NotFound(name.to_string()))
    }

    async fn write_file(&self, name: &RemoteFileName, content: &[u8]) -> BackendResult<()> {
        self.step(BackendOperation::FtpWrite, format!("ftp write {name}"))
            .await?;
        self.lock()
            .files
            .insert(name.to_string(), content.to_vec());
        Ok(())
    }

    async fn archive_and_upload(
        &self,
        branch: &BranchName,
        options: &ArchiveOptions,
    ) -> BackendResult<UploadReceipt> {
        let extension = options.zip_type().extension();
        self.step(
            BackendOperation::ArchiveUpload,
            format!("ftp upload {branch} {extension}"),
        )
        .await?;
        let mut state = self.lock();
        let remote_name = format!("{}.{extension}", branch.as_str().replace('/', "-"));
        let content = format!("archive of {branch} at {:040x}", state.commits).into_bytes();
        let receipt = UploadReceipt {
            remote_name: remote_name.clone(),
            size: u64::try_from(content.len()).unwrap_or(u64::MAX),
            sha256: hex_digest(&Sha256::digest(&content)),
        };
        state.files.insert(remote_name, content);
        Ok(receipt)
    }
}

/// Hands out one [`InMemoryBackend`] per project, created on first use.
#[derive(Debug, Default)]
pub struct InMemoryBackendProvider {
    backends: Mutex<BTreeMap<ProjectName, Arc<InMemoryBackend>>>,
    probe: Arc<ConcurrencyProbe>,
}

impl InMemoryBackendProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the backend of `project`, creating it if needed.
    #[must_use]
    pub fn backend(&self, project: &ProjectName) -> Arc<InMemoryBackend> {
        let mut backends = self
            .backends
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(backends.entry(project.clone()).or_insert_with(|| {
            Arc::new(InMemoryBackend::with_shared_probe(Arc::clone(&self.probe)))
        }))
    }

    /// Returns the highest number of overlapping calls across all projects.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.probe.peak()
    }
}

impl BackendProvider for InMemoryBackendProvider {
    fn backends_for(&self, project: &ProjectConfig) -> ProjectBackends {
        self.backend(&project.name).backends()
    }
}
