//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SuiteDeck Server",
        version = "0.1.0",
        description = "Projects, test suites and simulated test runs over a remote table store with local fallback"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health
        api::health::health,
        // Projects
        api::projects::list_projects,
        api::projects::create_project,
        api::projects::get_project,
        api::projects::update_project,
        api::projects::delete_project,
        api::projects::project_health,
        // Test suites
        api::test_suites::list_suites,
        api::test_suites::create_suite,
        api::test_suites::get_suite,
        api::test_suites::update_suite,
        api::test_suites::delete_suite,
        // Test runs
        api::test_runs::list_runs,
        api::test_runs::create_run,
        api::test_runs::run_all,
        api::test_runs::get_run,
        api::test_runs::list_results,
        api::test_runs::record_result,
        // Stats
        api::stats::dashboard,
    ),
    components(
        schemas(
            error::ErrorResponse,
            api::health::HealthResponse,
            api::test_runs::RunAllResponse,
            models::Project,
            models::CreateProjectRequest,
            models::ProjectPatch,
            models::ProjectHealth,
            models::TestSuite,
            models::CreateTestSuiteRequest,
            models::SuitePatch,
            models::RunStatus,
            models::TestRun,
            models::CreateRunRequest,
            models::TestStatus,
            models::Browser,
            models::TestResult,
            models::RecordResultRequest,
            models::DailyRate,
            models::DashboardSummary,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Projects", description = "Systems under test"),
        (name = "Test Suites", description = "Configured test scenarios"),
        (name = "Test Runs", description = "Run lifecycle and results"),
        (name = "Stats", description = "Dashboard aggregations")
    )
)]
pub struct ApiDoc;
