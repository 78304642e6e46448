//! HTTP API surface.

use actix_web::test;
use serde_json::json;

use suitedeck_lib::models::RunStatus;

use super::mock_postgrest::MockPostgrest;
use super::test_helpers::*;

#[actix_rt::test]
async fn test_health_reports_backend_mode() {
    let (_dir, store) = local_datastore().await;
    let (engine, _) = engine_with(&store, FixedOutcome::new(RunStatus::Passed), false);
    let app = create_test_app(&store, &engine).await;

    let (status, body) = send_json(&app, test::TestRequest::get().uri("/api/v1/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "local");

    let mock = MockPostgrest::start().await;
    let (_remote_dir, remote) = remote_datastore(&mock).await;
    let app = create_test_app(&remote, &engine).await;
    let (_, body) = send_json(&app, test::TestRequest::get().uri("/api/v1/health")).await;
    assert_eq!(body["backend"], "remote");
}

#[actix_rt::test]
async fn test_project_crud() {
    let (_dir, store) = local_datastore().await;
    let (engine, _) = engine_with(&store, FixedOutcome::new(RunStatus::Passed), false);
    let app = create_test_app(&store, &engine).await;

    let (status, created) = send_json(
        &app,
        test::TestRequest::post().uri("/api/v1/projects").set_json(json!({
            "name": "  Shop ",
            "base_url": "https://shop.test"
        })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["name"], "Shop");
    assert_eq!(created["user_id"], TEST_OWNER);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, patched) = send_json(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/v1/projects/{}", id))
            .set_json(json!({ "description": "Storefront" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(patched["description"], "Storefront");
    assert_eq!(patched["name"], "Shop");

    let (status, listed) = send_json(&app, test::TestRequest::get().uri("/api/v1/projects")).await;
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/projects/{}", id);
    let (status, _) = send_json(&app, test::TestRequest::delete().uri(&uri)).await;
    assert_eq!(status, 204);
    // Deleting again is still fine
    let (status, _) = send_json(&app, test::TestRequest::delete().uri(&uri)).await;
    assert_eq!(status, 204);

    let (status, body) = send_json(&app, test::TestRequest::get().uri(&uri)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_project_create_rejects_blank_name() {
    let (_dir, store) = local_datastore().await;
    let (engine, _) = engine_with(&store, FixedOutcome::new(RunStatus::Passed), false);
    let app = create_test_app(&store, &engine).await;

    let (status, body) = send_json(
        &app,
        test::TestRequest::post().uri("/api/v1/projects").set_json(json!({
            "name": "   ",
            "base_url": "https://shop.test"
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_suite_creation_checks_project_and_config() {
    let (_dir, store) = local_datastore().await;
    let (engine, _) = engine_with(&store, FixedOutcome::new(RunStatus::Passed), false);
    let app = create_test_app(&store, &engine).await;
    let project = seed_project(&store, "Shop").await;

    let (status, _) = send_json(
        &app,
        test::TestRequest::post().uri("/api/v1/test-suites").set_json(json!({
            "project_id": "missing",
            "name": "Checkout"
        })),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = send_json(
        &app,
        test::TestRequest::post().uri("/api/v1/test-suites").set_json(json!({
            "project_id": project.id,
            "name": "Checkout",
            "config": "{not json"
        })),
    )
    .await;
    assert_eq!(status, 400);

    let (status, suite) = send_json(
        &app,
        test::TestRequest::post().uri("/api/v1/test-suites").set_json(json!({
            "project_id": project.id,
            "name": "Checkout",
            "config": "{\"browser\": \"firefox\"}"
        })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(suite["config"]["browser"], "firefox");

    let (status, listed) = send_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/test-suites?project_id={}", project.id)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_create_run_returns_running_record() {
    let (_dir, store) = local_datastore().await;
    let (engine, published) = engine_with(&store, FixedOutcome::new(RunStatus::Passed), false);
    let app = create_test_app(&store, &engine).await;

    let (status, run) = send_json(
        &app,
        test::TestRequest::post().uri("/api/v1/test-runs").set_json(json!({
            "suite_id": "s1",
            "suite_name": "Checkout"
        })),
    )
    .await;
    assert_eq!(status, 202);
    assert_eq!(run["status"], "running");
    assert_eq!(run["triggered_by"], "Manual");
    assert_eq!(run["total_count"], 0);
    assert!(run.get("completed_at").is_none());

    engine.wait_idle().await;

    let id = run["id"].as_str().unwrap();
    let (status, done) = send_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/test-runs/{}", id)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(done["status"], "passed");
    assert_eq!(published.ids(), vec![id.to_string()]);
}

#[actix_rt::test]
async fn test_create_run_rejects_missing_suite() {
    let (_dir, store) = local_datastore().await;
    let (engine, _) = engine_with(&store, FixedOutcome::new(RunStatus::Passed), false);
    let app = create_test_app(&store, &engine).await;

    let (status, _) = send_json(
        &app,
        test::TestRequest::post().uri("/api/v1/test-runs").set_json(json!({
            "suite_id": "",
            "suite_name": "Checkout"
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(engine.in_flight(), 0);
}

#[actix_rt::test]
async fn test_run_all_and_list_runs() {
    let (_dir, store) = local_datastore().await;
    let project = seed_project(&store, "Shop").await;
    let checkout = seed_suite(&store, &project.id, "Checkout").await;
    seed_suite(&store, &project.id, "Search").await;
    let (engine, _) = engine_with(&store, FixedOutcome::new(RunStatus::Failed), false);
    let app = create_test_app(&store, &engine).await;

    let (status, body) = send_json(&app, test::TestRequest::post().uri("/api/v1/test-runs/run-all")).await;
    assert_eq!(status, 202);
    assert_eq!(body["started"], 2);
    engine.wait_idle().await;

    let (_, all) = send_json(&app, test::TestRequest::get().uri("/api/v1/test-runs")).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, limited) = send_json(&app, test::TestRequest::get().uri("/api/v1/test-runs?limit=1")).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);

    let (_, scoped) = send_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/test-runs?suite_id={}", checkout.id)),
    )
    .await;
    let scoped = scoped.as_array().unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0]["status"], "failed");
    assert_eq!(scoped[0]["triggered_by"], "Stress Test");
}

#[actix_rt::test]
async fn test_results_recorded_for_existing_run_only() {
    let (_dir, store) = local_datastore().await;
    let (engine, _) = engine_with(&store, FixedOutcome::new(RunStatus::Passed), false);
    let app = create_test_app(&store, &engine).await;
    let run = engine.create_run("s1", "Checkout", None).await.unwrap();

    let result = json!({
        "test_name": "adds item to cart",
        "status": "failed",
        "duration": 1.25,
        "error_message": "timeout",
        "browser": "webkit"
    });

    let (status, _) = send_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/test-runs/missing/results")
            .set_json(result.clone()),
    )
    .await;
    assert_eq!(status, 404);

    let uri = format!("/api/v1/test-runs/{}/results", run.id);
    let (status, recorded) =
        send_json(&app, test::TestRequest::post().uri(&uri).set_json(result)).await;
    assert_eq!(status, 201);
    assert_eq!(recorded["test_run_id"], run.id.as_str());

    let (status, listed) = send_json(&app, test::TestRequest::get().uri(&uri)).await;
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["browser"], "webkit");

    engine.wait_idle().await;
}

#[actix_rt::test]
async fn test_dashboard_and_project_health() {
    let (_dir, store) = local_datastore().await;
    let project = seed_project(&store, "Shop").await;
    let suite = seed_suite(&store, &project.id, "Checkout").await;
    let (engine, _) = engine_with(&store, FixedOutcome::new(RunStatus::Passed), false);
    let app = create_test_app(&store, &engine).await;

    for _ in 0..3 {
        engine.create_run(&suite.id, &suite.name, None).await.unwrap();
    }
    engine.wait_idle().await;

    let (status, summary) = send_json(&app, test::TestRequest::get().uri("/api/v1/stats/dashboard")).await;
    assert_eq!(status, 200);
    assert_eq!(summary["total_projects"], 1);
    assert_eq!(summary["total_suites"], 1);
    assert_eq!(summary["runs_last_30_days"], 3);
    assert_eq!(summary["success_rate"], 100);
    assert_eq!(summary["running"], 0);
    assert_eq!(summary["daily"].as_array().unwrap().len(), 7);
    assert_eq!(summary["recent_runs"].as_array().unwrap().len(), 3);

    let (status, health) = send_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/projects/{}/health", project.id)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(health["health_score"], 100);
    assert_eq!(health["suite_count"], 1);

    let (status, _) = send_json(&app, test::TestRequest::get().uri("/api/v1/projects/missing/health")).await;
    assert_eq!(status, 404);
}
