//! Isolation between projects and concurrent submission.

use super::helpers::{Harness, harness};
use rstest::rstest;
use shipyard::project::services::CommandRequest;
use shipyard::task::domain::{TaskId, TaskStatus};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_projects_run_in_parallel(harness: Harness) {
    for project in ["p1", "p2"] {
        harness.backend(project).set_delay(Duration::from_millis(40));
    }

    let p1 = harness
        .orchestrator
        .submit(CommandRequest::generate("p1", "main"))
        .await
        .expect("p1 admission should succeed");
    let p2 = harness
        .orchestrator
        .submit(CommandRequest::generate("p2", "main"))
        .await
        .expect("p2 admission should succeed");
    harness.finished("p1", p1).await;
    harness.finished("p2", p2).await;

    assert!(harness.provider.max_concurrency() >= 2);
    assert_eq!(harness.backend("p1").max_concurrency(), 1);
    assert_eq!(harness.backend("p2").max_concurrency(), 1);
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submitters_get_distinct_contiguous_ids(harness: Harness) {
    let shared = Arc::new(harness);
    let mut submitters = Vec::new();
    for branch in ["main", "release"].into_iter().cycle().take(16) {
        let handle = Arc::clone(&shared);
        submitters.push(tokio::spawn(async move {
            handle
                .orchestrator
                .submit(CommandRequest::generate("p1", branch))
                .await
                .expect("admission should succeed")
        }));
    }

    let mut ids = BTreeSet::new();
    for submitter in submitters {
        ids.insert(submitter.await.expect("submitter should finish").value());
    }
    shared.orchestrator.shutdown().await;

    assert_eq!(ids, (1..=16).collect::<BTreeSet<u64>>());
    let tasks = shared
        .orchestrator
        .list_tasks("p1")
        .await
        .expect("listing should succeed");
    assert!(tasks.values().all(|task| task.status() == TaskStatus::Succeeded));
    assert_eq!(shared.backend("p1").max_concurrency(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queries_run_while_a_command_is_in_flight(harness: Harness) {
    harness.backend("p1").set_delay(Duration::from_millis(30));

    let id = harness
        .orchestrator
        .submit(CommandRequest::generate("p1", "main"))
        .await
        .expect("admission should succeed");
    let names = harness.orchestrator.project_names();
    let listed = harness
        .orchestrator
        .list_tasks("p1")
        .await
        .expect("listing should succeed");
    let task = harness.finished("p1", id).await;

    assert_eq!(names.len(), 2);
    assert!(listed.contains_key(&TaskId::FIRST));
    assert_eq!(task.status(), TaskStatus::Succeeded);
    harness.orchestrator.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shutdown_finishes_queued_work(harness: Harness) {
    harness.backend("p2").set_delay(Duration::from_millis(5));
    for _ in 0..5 {
        harness
            .orchestrator
            .submit(CommandRequest::ftp_compress("p2", "main", "zip", ""))
            .await
            .expect("admission should succeed");
    }

    harness.orchestrator.shutdown().await;

    let tasks = harness
        .orchestrator
        .list_tasks("p2")
        .await
        .expect("listing should succeed");
    assert_eq!(tasks.len(), 5);
    assert!(tasks.values().all(|task| task.status().is_terminal()));
}
