//! Synchronous queries against Git, Subversion and FTP backends.

use super::helpers::{Harness, harness};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use shipyard::project::adapters::memory::BackendOperation;
use shipyard::project::domain::{BranchName, LogEntry, SvnTag};
use shipyard::project::ports::BackendError;
use shipyard::project::services::{CommandRequest, OrchestratorError};

fn log_entry(revision: u64) -> LogEntry {
    LogEntry {
        revision,
        author: "alice".to_owned(),
        message: format!("change {revision}"),
        date: Utc
            .timestamp_opt(1_700_000_000 + i64::try_from(revision).expect("small revision"), 0)
            .single()
            .expect("valid timestamp"),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ftp_file_round_trips(harness: Harness) {
    harness
        .orchestrator
        .ftp_write_file("p1", "a.txt", b"hello")
        .await
        .expect("write should succeed");

    let content = harness
        .orchestrator
        .ftp_read_file("p1", "a.txt")
        .await
        .expect("read should succeed");

    assert_eq!(content, b"hello");
    assert!(harness.backend("p2").file("a.txt").is_none());
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reading_missing_ftp_file_is_a_backend_error(harness: Harness) {
    let result = harness.orchestrator.ftp_read_file("p1", "absent.bin").await;

    assert!(matches!(
        result,
        Err(OrchestratorError::Backend(BackendError::NotFound(name))) if name == "absent.bin"
    ));
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[case("../outside.txt")]
#[case("/etc/passwd")]
#[case("")]
#[tokio::test(flavor = "multi_thread")]
async fn unsafe_ftp_names_are_rejected(harness: Harness, #[case] name: &str) {
    let written = harness.orchestrator.ftp_write_file("p1", name, b"x").await;
    let read = harness.orchestrator.ftp_read_file("p1", name).await;

    assert!(matches!(written, Err(OrchestratorError::Validation(_))));
    assert!(matches!(read, Err(OrchestratorError::Validation(_))));
    assert!(harness.backend("p1").journal().is_empty());
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ftp_log_filters_by_substring(harness: Harness) {
    for name in ["p1-main.zip", "p1-release.tar.gz", "readme.txt"] {
        harness
            .orchestrator
            .ftp_write_file("p1", name, name.as_bytes())
            .await
            .expect("write should succeed");
    }

    let archives = harness
        .orchestrator
        .ftp_log("p1", "p1-")
        .await
        .expect("listing should succeed");
    let everything = harness
        .orchestrator
        .ftp_log("p1", "")
        .await
        .expect("listing should succeed");

    let names: Vec<&str> = archives.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["p1-main.zip", "p1-release.tar.gz"]);
    assert_eq!(everything.len(), 3);
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uploaded_archive_appears_in_ftp_log(harness: Harness) {
    let id = harness
        .orchestrator
        .submit(CommandRequest::ftp_compress("p2", "release/2.0", "tar.gz", ""))
        .await
        .expect("admission should succeed");
    harness.finished("p2", id).await;

    let entries = harness
        .orchestrator
        .ftp_log("p2", "tar.gz")
        .await
        .expect("listing should succeed");

    let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["release-2.0.tar.gz"]);
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn svn_log_returns_newest_first_up_to_count(harness: Harness) {
    let backend = harness.backend("p1");
    for revision in [3, 8, 1, 5, 2, 7, 4, 6] {
        backend.push_log_entry(log_entry(revision));
    }

    let entries = harness
        .orchestrator
        .svn_log("p1", 5)
        .await
        .expect("log should succeed");

    let revisions: Vec<u64> = entries.iter().map(|entry| entry.revision).collect();
    assert_eq!(revisions, vec![8, 7, 6, 5, 4]);
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn svn_log_with_short_history_returns_everything(harness: Harness) {
    let id = harness
        .orchestrator
        .submit(CommandRequest::svn_commit("p1", "main", "only commit"))
        .await
        .expect("admission should succeed");
    harness.finished("p1", id).await;

    let entries = harness
        .orchestrator
        .svn_log("p1", 5)
        .await
        .expect("log should succeed");

    assert_eq!(entries.len(), 1);
    assert_eq!(entries.first().map(|entry| entry.message.as_str()), Some("only commit"));
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn svn_log_count_must_be_positive(harness: Harness) {
    let result = harness.orchestrator.svn_log("p1", 0).await;

    assert!(matches!(result, Err(OrchestratorError::Validation(_))));
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn git_info_covers_every_project(harness: Harness) {
    let snapshots = harness
        .orchestrator
        .get_all_git_info()
        .await
        .expect("git info should succeed");

    let projects: Vec<&str> = snapshots.keys().map(|name| name.as_str()).collect();
    assert_eq!(projects, vec!["p1", "p2"]);
    assert!(snapshots.values().all(|info| info.current_branch() == "main"));
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn git_info_falls_back_to_cached_snapshot(harness: Harness) {
    let id = harness
        .orchestrator
        .submit(CommandRequest::generate("p1", "release"))
        .await
        .expect("admission should succeed");
    harness.finished("p1", id).await;
    harness.backend("p1").fail_on(
        BackendOperation::CurrentInfo,
        BackendError::rejected("git info", "index.lock exists"),
    );

    let snapshots = harness
        .orchestrator
        .get_all_git_info()
        .await
        .expect("cached snapshot should be served");

    let p1 = snapshots
        .iter()
        .find(|(name, _)| name.as_str() == "p1")
        .map(|(_, info)| info)
        .expect("p1 snapshot");
    assert_eq!(p1.current_branch(), "release");
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn svn_tag_is_recorded_and_visible(harness: Harness) {
    harness
        .orchestrator
        .get_all_git_info()
        .await
        .expect("initial git info should succeed");

    harness
        .orchestrator
        .set_branch_svn_tag("p1", "main", "tags/1.0")
        .await
        .expect("tag should be recorded");
    harness.backend("p1").fail_on(
        BackendOperation::CurrentInfo,
        BackendError::rejected("git info", "offline"),
    );
    let snapshots = harness
        .orchestrator
        .get_all_git_info()
        .await
        .expect("cached snapshot should be served");

    let main = BranchName::new("main").expect("valid branch name");
    let tag = snapshots
        .values()
        .next()
        .and_then(|info| info.branch(&main))
        .and_then(|branch| branch.svn_tag.clone());
    assert_eq!(tag, SvnTag::new("tags/1.0").ok());
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[case("p1", "main", "has space")]
#[case("p1", "bad..branch", "v1")]
#[tokio::test(flavor = "multi_thread")]
async fn svn_tag_validation_happens_before_backend(
    harness: Harness,
    #[case] project: &str,
    #[case] branch: &str,
    #[case] tag: &str,
) {
    let result = harness
        .orchestrator
        .set_branch_svn_tag(project, branch, tag)
        .await;

    assert!(matches!(result, Err(OrchestratorError::Validation(_))));
    assert!(harness.backend("p1").journal().is_empty());
    harness.orchestrator.shutdown().await;
}
