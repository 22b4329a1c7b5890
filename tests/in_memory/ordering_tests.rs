//! Identifier allocation and per-project FIFO execution.

use super::helpers::{Harness, harness};
use rstest::rstest;
use shipyard::project::services::CommandRequest;
use shipyard::task::domain::{CommandKind, TaskId, TaskStatus};
use std::time::Duration;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn identifiers_are_sequential_per_project(harness: Harness) {
    let mut p1_ids = Vec::new();
    let mut p2_ids = Vec::new();
    for _ in 0..3 {
        p1_ids.push(
            harness
                .orchestrator
                .submit(CommandRequest::generate("p1", "main"))
                .await
                .expect("p1 admission should succeed")
                .value(),
        );
        p2_ids.push(
            harness
                .orchestrator
                .submit(CommandRequest::generate("p2", "main"))
                .await
                .expect("p2 admission should succeed")
                .value(),
        );
    }

    assert_eq!(p1_ids, vec![1, 2, 3]);
    assert_eq!(p2_ids, vec![1, 2, 3]);
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submitted_task_is_visible_at_once(harness: Harness) {
    harness.backend("p1").set_delay(Duration::from_millis(50));

    let id = harness
        .orchestrator
        .submit(CommandRequest::svn_commit("p1", "release", "release 2.0"))
        .await
        .expect("admission should succeed");
    let task = harness
        .orchestrator
        .get_task("p1", id)
        .await
        .expect("lookup should succeed")
        .expect("task should be recorded");

    assert!(matches!(task.status(), TaskStatus::Pending | TaskStatus::Running));
    assert_eq!(task.command().kind(), CommandKind::CommitToSvn);
    assert_eq!(task.command().message(), Some("release 2.0"));
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_run_strictly_one_after_another(harness: Harness) {
    harness.backend("p1").set_delay(Duration::from_millis(10));

    let first = harness
        .orchestrator
        .submit(CommandRequest::generate("p1", "main"))
        .await
        .expect("admission should succeed");
    let second = harness
        .orchestrator
        .submit(CommandRequest::ftp_compress("p1", "release", "zip", ""))
        .await
        .expect("admission should succeed");
    let first_task = harness.finished("p1", first).await;
    let second_task = harness.finished("p1", second).await;

    let first_done = first_task.completed_at().expect("first completion time");
    let second_start = second_task.started_at().expect("second start time");
    assert!(first_done <= second_start);
    assert_eq!(harness.backend("p1").max_concurrency(), 1);
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backend_calls_follow_submission_order(harness: Harness) {
    let requests = [
        CommandRequest::generate("p1", "main"),
        CommandRequest::svn_commit("p1", "release", "sync release"),
        CommandRequest::ftp_compress("p1", "main", "tar.gz", "-9"),
    ];
    let mut last = TaskId::FIRST;
    for request in requests {
        last = harness
            .orchestrator
            .submit(request)
            .await
            .expect("admission should succeed");
    }
    harness.finished("p1", last).await;

    let journal: Vec<String> = harness
        .backend("p1")
        .journal()
        .into_iter()
        .filter(|entry| entry != "git info")
        .collect();
    assert_eq!(
        journal,
        vec![
            "git checkout main",
            "git generate",
            "git commit main",
            "git checkout release",
            "svn sync release",
            "svn commit sync release",
            "git checkout main",
            "ftp upload main tar.gz",
        ]
    );
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listed_tasks_are_keyed_in_admission_order(harness: Harness) {
    for branch in ["main", "release", "main"] {
        harness
            .orchestrator
            .submit(CommandRequest::generate("p1", branch))
            .await
            .expect("admission should succeed");
    }
    harness.orchestrator.shutdown().await;

    let tasks = harness
        .orchestrator
        .list_tasks("p1")
        .await
        .expect("listing should succeed");

    let branches: Vec<&str> = tasks
        .values()
        .map(|task| task.command().branch().as_str())
        .collect();
    assert_eq!(branches, vec!["main", "release", "main"]);
    assert!(tasks.values().all(|task| task.status() == TaskStatus::Succeeded));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_generate_creates_a_commit(harness: Harness) {
    let before = harness.backend("p1").commit_count();

    let id = harness
        .orchestrator
        .submit(CommandRequest::generate("p1", "main"))
        .await
        .expect("admission should succeed");
    let task = harness.finished("p1", id).await;

    assert_eq!(task.status(), TaskStatus::Succeeded);
    assert!(task.error().is_none());
    assert_eq!(harness.backend("p1").commit_count(), before + 1);
    harness.orchestrator.shutdown().await;
}
