//! Test run API handlers: triggering runs and reading their results.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppResult;
use crate::models::{CreateRunRequest, RecordResultRequest, TestRun};
use crate::services::{Catalog, RunEngine};

/// Query parameters for listing runs.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRunsQuery {
    /// Only runs of this suite
    pub suite_id: Option<String>,
    /// Maximum number of runs returned
    pub limit: Option<usize>,
}

/// Response for a stress invocation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunAllResponse {
    /// Number of runs started
    pub started: usize,
    pub runs: Vec<TestRun>,
}

#[utoipa::path(
    get,
    path = "/api/v1/test-runs",
    tag = "Test Runs",
    params(ListRunsQuery),
    responses(
        (status = 200, description = "Runs, newest first", body = Vec<TestRun>),
    )
)]
pub async fn list_runs(
    catalog: web::Data<Catalog>,
    query: web::Query<ListRunsQuery>,
) -> AppResult<HttpResponse> {
    let runs = catalog
        .list_runs(query.suite_id.as_deref(), query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(runs))
}

/// Start a run. Returns the `running` record; completion happens in the
/// background and is announced on the WebSocket.
#[utoipa::path(
    post,
    path = "/api/v1/test-runs",
    tag = "Test Runs",
    request_body = CreateRunRequest,
    responses(
        (status = 202, description = "Run started", body = TestRun),
        (status = 400, description = "Suite id or name missing", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_run(
    engine: web::Data<RunEngine>,
    body: web::Json<CreateRunRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let run = engine
        .create_run(
            &request.suite_id,
            &request.suite_name,
            request.triggered_by.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Accepted().json(run))
}

/// Start a stress run for every suite at once.
#[utoipa::path(
    post,
    path = "/api/v1/test-runs/run-all",
    tag = "Test Runs",
    responses(
        (status = 202, description = "Runs started", body = RunAllResponse),
    )
)]
pub async fn run_all(engine: web::Data<RunEngine>) -> AppResult<HttpResponse> {
    let runs = engine.run_all_suites().await?;
    Ok(HttpResponse::Accepted().json(RunAllResponse {
        started: runs.len(),
        runs,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/test-runs/{run_id}",
    tag = "Test Runs",
    params(("run_id" = String, Path, description = "Run ID")),
    responses(
        (status = 200, description = "Run", body = TestRun),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_run(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let run = catalog.get_run(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(run))
}

#[utoipa::path(
    get,
    path = "/api/v1/test-runs/{run_id}/results",
    tag = "Test Runs",
    params(("run_id" = String, Path, description = "Run ID")),
    responses(
        (status = 200, description = "Results of the run", body = Vec<crate::models::TestResult>),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_results(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let results = catalog.list_results(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// Record one test case outcome, as reported by an external executor.
#[utoipa::path(
    post,
    path = "/api/v1/test-runs/{run_id}/results",
    tag = "Test Runs",
    params(("run_id" = String, Path, description = "Run ID")),
    request_body = RecordResultRequest,
    responses(
        (status = 201, description = "Result recorded", body = crate::models::TestResult),
        (status = 400, description = "Invalid result", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn record_result(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
    body: web::Json<RecordResultRequest>,
) -> AppResult<HttpResponse> {
    let result = catalog
        .record_result(&path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}

/// Configure test run routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/test-runs")
            .route(web::get().to(list_runs))
            .route(web::post().to(create_run)),
    )
    // Registered before /test-runs/{run_id} so "run-all" is not taken as an id
    .service(web::resource("/test-runs/run-all").route(web::post().to(run_all)))
    .service(web::resource("/test-runs/{run_id}").route(web::get().to(get_run)))
    .service(
        web::resource("/test-runs/{run_id}/results")
            .route(web::get().to(list_results))
            .route(web::post().to(record_result)),
    );
}
