//! Degrading to the local collections when the remote table store fails.

use suitedeck_lib::error::AppError;
use suitedeck_lib::models::RunStatus;

use super::mock_postgrest::{Failures, MockPostgrest};
use super::test_helpers::*;

#[actix_rt::test]
async fn test_reads_fall_back_to_local() {
    let mock = MockPostgrest::start().await;
    let dir = tempfile::TempDir::new().unwrap();

    // Seed the local collection directly, then point a remote store at it
    let local_only = suitedeck_lib::store::Datastore::new(
        suitedeck_lib::store::LocalStore::open(dir.path()).await.unwrap(),
        None,
    );
    let project = seed_project(&local_only, "Offline").await;

    let store = remote_datastore_in(&mock, &dir).await;
    mock.set_failures(Failures {
        reads: true,
        ..Failures::default()
    });

    let listed = store.projects().list(None).await.unwrap();
    assert_eq!(listed, vec![project.clone()]);
    let fetched = store.projects().get(&project.id).await.unwrap();
    assert_eq!(fetched, Some(project));
    assert_eq!(mock.request_count("GET", "projects"), 2);
}

#[actix_rt::test]
async fn test_insert_falls_back_to_local() {
    let mock = MockPostgrest::start().await;
    let (_dir, store) = remote_datastore(&mock).await;
    mock.set_failures(Failures {
        inserts: true,
        ..Failures::default()
    });

    let project = seed_project(&store, "Shop").await;

    assert!(mock.rows("projects").is_empty());
    let local = store.local().snapshot("projects").await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0]["id"], project.id.as_str());

    // No reconciliation: once reads recover, the remote does not know the row
    mock.set_failures(Failures::default());
    assert!(store.projects().get(&project.id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_delete_falls_back_to_local() {
    let mock = MockPostgrest::start().await;
    let (_dir, store) = remote_datastore(&mock).await;
    mock.fail_everything();

    let project = seed_project(&store, "Shop").await;
    store.projects().delete(&project.id).await.unwrap();

    assert!(store.local().snapshot("projects").await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_update_of_remote_only_row_returns_remote_error() {
    let mock = MockPostgrest::start().await;
    let (_dir, store) = remote_datastore(&mock).await;
    let project = seed_project(&store, "Shop").await;

    mock.set_failures(Failures {
        updates: true,
        ..Failures::default()
    });
    let err = store
        .projects()
        .update(&project.id, &serde_json::json!({ "name": "Renamed" }))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Remote(_)));
}

/// Remote down for every write: the run is created and completed locally,
/// and exactly one notification fires.
#[actix_rt::test]
async fn test_run_completes_locally_when_remote_writes_fail() {
    let mock = MockPostgrest::start().await;
    let (_dir, store) = remote_datastore(&mock).await;
    mock.fail_everything();
    let (engine, published) = engine_with(&store, FixedOutcome::new(RunStatus::Passed), false);

    let run = engine.create_run("s1", "Checkout", None).await.unwrap();

    let local = store.local().snapshot("test_runs").await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0]["status"], "running");

    engine.wait_idle().await;

    let done = store.runs().get(&run.id).await.unwrap().unwrap();
    assert_eq!(done.status, RunStatus::Passed);
    assert!(done.completed_at.is_some());
    assert_eq!(published.ids(), vec![run.id]);
    assert!(mock.rows("test_runs").is_empty());
}

/// The run was created remotely and every completion write fails: after
/// the retry budget is spent the run stays `running` and nothing is
/// published.
#[actix_rt::test]
async fn test_exhausted_completion_retries_leave_run_running() {
    let mock = MockPostgrest::start().await;
    let (_dir, store) = remote_datastore(&mock).await;
    mock.set_failures(Failures {
        updates: true,
        ..Failures::default()
    });
    let (engine, published) = engine_with(&store, FixedOutcome::new(RunStatus::Failed), true);

    let run = engine.create_run("s1", "Checkout", None).await.unwrap();
    engine.wait_idle().await;

    assert_eq!(
        mock.request_count("PATCH", "test_runs"),
        quick_retry().attempts as usize
    );
    assert!(published.ids().is_empty());

    let stuck = store.runs().get(&run.id).await.unwrap().unwrap();
    assert_eq!(stuck.status, RunStatus::Running);
    assert!(stuck.completed_at.is_none());
    assert!(stuck.diagnosis.is_none());
}

/// A write failure that clears up within the retry budget still lands.
#[actix_rt::test]
async fn test_completion_retry_recovers() {
    let mock = MockPostgrest::start().await;
    let (_dir, store) = remote_datastore(&mock).await;
    let producer = std::sync::Arc::new(FixedOutcome {
        status: RunStatus::Passed,
        delay: std::time::Duration::from_millis(5),
        seen: Default::default(),
    });
    let (engine, published) = engine_with(&store, producer, false);

    mock.set_failures(Failures {
        updates: true,
        ..Failures::default()
    });
    let run = engine.create_run("s1", "Checkout", None).await.unwrap();

    // First attempt fails after ~5ms; the second is 10ms later
    tokio::time::sleep(std::time::Duration::from_millis(12)).await;
    mock.set_failures(Failures::default());
    engine.wait_idle().await;

    let done = store.runs().get(&run.id).await.unwrap().unwrap();
    assert_eq!(done.status, RunStatus::Passed);
    assert_eq!(published.ids(), vec![run.id]);
}
