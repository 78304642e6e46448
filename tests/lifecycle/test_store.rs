//! Entity store behaviour on both backends.

use suitedeck_lib::models::{RunStatus, TestRun};
use suitedeck_lib::store::{Datastore, Filter};

use super::mock_postgrest::MockPostgrest;
use super::test_helpers::*;

async fn check_insert_get_delete(store: &Datastore) {
    let project = seed_project(store, "Shop").await;

    let fetched = store.projects().get(&project.id).await.unwrap();
    assert_eq!(fetched.as_ref(), Some(&project));

    store.projects().delete(&project.id).await.unwrap();
    assert!(store.projects().get(&project.id).await.unwrap().is_none());

    // Unknown ids delete without error
    store.projects().delete("no-such-project").await.unwrap();
    assert!(store.projects().get("no-such-project").await.unwrap().is_none());
}

async fn check_filtered_list(store: &Datastore) {
    let project = seed_project(store, "Shop").await;
    let checkout = seed_suite(store, &project.id, "Checkout").await;
    let search = seed_suite(store, &project.id, "Search").await;

    for suite in [&checkout, &search, &checkout, &search, &checkout] {
        let run = suitedeck_lib::models::NewTestRun::running(&suite.id, &suite.name, "Manual");
        store.runs().insert(&run).await.unwrap();
    }

    let all = store.runs().list(None).await.unwrap();
    let filtered = store
        .runs()
        .list(Some(Filter::eq(TestRun::SUITE_ID, checkout.id.clone())))
        .await
        .unwrap();

    let expected: Vec<TestRun> = all
        .iter()
        .filter(|r| r.test_suite_id == checkout.id)
        .cloned()
        .collect();
    assert_eq!(filtered.len(), 3);
    assert_eq!(filtered, expected);

    for pair in all.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[actix_rt::test]
async fn test_local_insert_get_delete() {
    let (_dir, store) = local_datastore().await;
    check_insert_get_delete(&store).await;
}

#[actix_rt::test]
async fn test_remote_insert_get_delete() {
    let mock = MockPostgrest::start().await;
    let (_dir, store) = remote_datastore(&mock).await;

    check_insert_get_delete(&store).await;
    assert_eq!(mock.request_count("POST", "projects"), 1);
    assert!(mock.rows("projects").is_empty());
}

#[actix_rt::test]
async fn test_local_filtered_list_is_subset_in_order() {
    let (_dir, store) = local_datastore().await;
    check_filtered_list(&store).await;
}

#[actix_rt::test]
async fn test_remote_filtered_list_is_subset_in_order() {
    let mock = MockPostgrest::start().await;
    let (_dir, store) = remote_datastore(&mock).await;
    check_filtered_list(&store).await;
}

#[actix_rt::test]
async fn test_remote_update_unknown_id_is_absent() {
    let mock = MockPostgrest::start().await;
    let (_dir, store) = remote_datastore(&mock).await;

    let updated = store
        .runs()
        .update("missing", &serde_json::json!({ "status": "passed" }))
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[actix_rt::test]
async fn test_projects_listed_by_last_update() {
    let (_dir, store) = local_datastore().await;
    let older = seed_project(&store, "Older").await;
    let newer = seed_project(&store, "Newer").await;

    let names: Vec<String> = store
        .projects()
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Newer", "Older"]);

    // Touching the older project moves it to the front
    let touched = store
        .projects()
        .update(&older.id, &serde_json::json!({ "description": "rewritten" }))
        .await
        .unwrap()
        .unwrap();
    assert!(touched.updated_at > newer.updated_at);

    let first = store.projects().list(None).await.unwrap().remove(0);
    assert_eq!(first.id, older.id);
}

#[actix_rt::test]
async fn test_status_filter_matches_serialized_value() {
    let (_dir, store) = local_datastore().await;
    let run = suitedeck_lib::models::NewTestRun::running("s1", "Checkout", "Manual");
    store.runs().insert(&run).await.unwrap();

    let running = store
        .runs()
        .list(Some(Filter::eq(TestRun::STATUS, RunStatus::Running.as_str())))
        .await
        .unwrap();
    let passed = store
        .runs()
        .list(Some(Filter::eq(TestRun::STATUS, RunStatus::Passed.as_str())))
        .await
        .unwrap();

    assert_eq!(running.len(), 1);
    assert!(passed.is_empty());
}
