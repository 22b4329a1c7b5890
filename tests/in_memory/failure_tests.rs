//! Task failure handling, panic containment and project resolution.

use super::helpers::{Harness, harness};
use rstest::rstest;
use shipyard::project::adapters::memory::BackendOperation;
use shipyard::project::ports::BackendError;
use shipyard::project::services::{CommandRequest, OrchestratorError};
use shipyard::task::domain::TaskStatus;

fn push_rejected() -> BackendError {
    BackendError::CommandFailed {
        command: "git push origin HEAD:refs/heads/main".to_owned(),
        exit_code: 1,
        stderr: "rejected: non-fast-forward".to_owned(),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_task_records_detail_and_completion(harness: Harness) {
    harness
        .backend("p1")
        .fail_on(BackendOperation::GitCommit, push_rejected());

    let id = harness
        .orchestrator
        .submit(CommandRequest::generate("p1", "main"))
        .await
        .expect("admission should succeed");
    let task = harness.finished("p1", id).await;

    assert_eq!(task.status(), TaskStatus::Failed);
    assert!(
        task.error()
            .is_some_and(|detail| detail.contains("non-fast-forward"))
    );
    assert!(task.started_at().is_some());
    assert!(task.completed_at().is_some());
    assert!(!harness.backend("p1").has_local_changes());
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn queue_keeps_going_after_a_failure(harness: Harness) {
    harness.backend("p1").fail_on(
        BackendOperation::SvnSync,
        BackendError::rejected("svn sync", "working copy locked"),
    );

    let failed = harness
        .orchestrator
        .submit(CommandRequest::svn_commit("p1", "main", "first"))
        .await
        .expect("admission should succeed");
    let next = harness
        .orchestrator
        .submit(CommandRequest::generate("p1", "release"))
        .await
        .expect("admission should succeed");

    assert_eq!(harness.finished("p1", failed).await.status(), TaskStatus::Failed);
    assert_eq!(harness.finished("p1", next).await.status(), TaskStatus::Succeeded);
    let journal = harness.backend("p1").journal();
    assert!(!journal.iter().any(|entry| entry.starts_with("svn commit")));
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backend_panic_fails_the_task_not_the_worker(harness: Harness) {
    harness.backend("p2").panic_on(BackendOperation::ArchiveUpload);

    let crashed = harness
        .orchestrator
        .submit(CommandRequest::ftp_compress("p2", "main", "zip", ""))
        .await
        .expect("admission should succeed");
    let next = harness
        .orchestrator
        .submit(CommandRequest::generate("p2", "main"))
        .await
        .expect("admission should succeed");

    let crashed_task = harness.finished("p2", crashed).await;
    assert_eq!(crashed_task.status(), TaskStatus::Failed);
    assert!(crashed_task.error().is_some());
    assert_eq!(harness.finished("p2", next).await.status(), TaskStatus::Succeeded);
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_project_leaves_no_trace(harness: Harness) {
    let result = harness
        .orchestrator
        .submit(CommandRequest::generate("p9", "main"))
        .await;
    let first = harness
        .orchestrator
        .submit(CommandRequest::generate("p1", "main"))
        .await
        .expect("admission should succeed");

    assert!(matches!(result, Err(OrchestratorError::UnknownProject(name)) if name == "p9"));
    assert_eq!(first.value(), 1);
    for project in ["p1", "p2"] {
        let tasks = harness
            .orchestrator
            .list_tasks(project)
            .await
            .expect("listing should succeed");
        assert!(tasks.len() <= 1);
    }
    assert!(matches!(
        harness.orchestrator.list_tasks("p9").await,
        Err(OrchestratorError::UnknownProject(_))
    ));
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failure_in_one_project_does_not_touch_another(harness: Harness) {
    harness
        .backend("p1")
        .fail_on(BackendOperation::Checkout, push_rejected());

    let broken = harness
        .orchestrator
        .submit(CommandRequest::generate("p1", "main"))
        .await
        .expect("admission should succeed");
    let healthy = harness
        .orchestrator
        .submit(CommandRequest::generate("p2", "main"))
        .await
        .expect("admission should succeed");

    assert_eq!(harness.finished("p1", broken).await.status(), TaskStatus::Failed);
    assert_eq!(harness.finished("p2", healthy).await.status(), TaskStatus::Succeeded);
    harness.orchestrator.shutdown().await;
}
