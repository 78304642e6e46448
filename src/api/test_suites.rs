//! Test suite API handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppResult;
use crate::models::{CreateTestSuiteRequest, SuitePatch};
use crate::services::Catalog;

/// Query parameters for listing suites.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListSuitesQuery {
    /// Only suites of this project
    pub project_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/test-suites",
    tag = "Test Suites",
    params(ListSuitesQuery),
    responses(
        (status = 200, description = "Suites, newest first", body = Vec<crate::models::TestSuite>),
    )
)]
pub async fn list_suites(
    catalog: web::Data<Catalog>,
    query: web::Query<ListSuitesQuery>,
) -> AppResult<HttpResponse> {
    let suites = catalog.list_suites(query.project_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(suites))
}

/// Create a suite under an existing project.
///
/// `config` may be a JSON object or a string holding one.
#[utoipa::path(
    post,
    path = "/api/v1/test-suites",
    tag = "Test Suites",
    request_body = CreateTestSuiteRequest,
    responses(
        (status = 201, description = "Suite created", body = crate::models::TestSuite),
        (status = 400, description = "Invalid config or unknown project", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_suite(
    catalog: web::Data<Catalog>,
    body: web::Json<CreateTestSuiteRequest>,
) -> AppResult<HttpResponse> {
    let suite = catalog.create_suite(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(suite))
}

#[utoipa::path(
    get,
    path = "/api/v1/test-suites/{suite_id}",
    tag = "Test Suites",
    params(("suite_id" = String, Path, description = "Suite ID")),
    responses(
        (status = 200, description = "Suite", body = crate::models::TestSuite),
        (status = 404, description = "Suite not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_suite(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let suite = catalog.get_suite(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(suite))
}

#[utoipa::path(
    patch,
    path = "/api/v1/test-suites/{suite_id}",
    tag = "Test Suites",
    params(("suite_id" = String, Path, description = "Suite ID")),
    request_body = SuitePatch,
    responses(
        (status = 200, description = "Updated suite", body = crate::models::TestSuite),
        (status = 400, description = "Invalid field", body = crate::error::ErrorResponse),
        (status = 404, description = "Suite not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_suite(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
    body: web::Json<SuitePatch>,
) -> AppResult<HttpResponse> {
    let suite = catalog
        .update_suite(&path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(suite))
}

#[utoipa::path(
    delete,
    path = "/api/v1/test-suites/{suite_id}",
    tag = "Test Suites",
    params(("suite_id" = String, Path, description = "Suite ID")),
    responses(
        (status = 204, description = "Suite deleted"),
    )
)]
pub async fn delete_suite(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    catalog.delete_suite(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure test suite routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/test-suites")
            .route(web::get().to(list_suites))
            .route(web::post().to(create_suite)),
    )
    .service(
        web::resource("/test-suites/{suite_id}")
            .route(web::get().to(get_suite))
            .route(web::patch().to(update_suite))
            .route(web::delete().to(delete_suite)),
    );
}
