//! Project API handlers.

use actix_web::{HttpResponse, web};

use crate::error::AppResult;
use crate::models::{CreateProjectRequest, ProjectPatch};
use crate::services::Catalog;

/// List projects, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "Projects",
    responses(
        (status = 200, description = "Projects", body = Vec<crate::models::Project>),
    )
)]
pub async fn list_projects(catalog: web::Data<Catalog>) -> AppResult<HttpResponse> {
    let projects = catalog.list_projects().await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// Create a project owned by the configured user.
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "Projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = crate::models::Project),
        (status = 400, description = "Name or base URL missing", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_project(
    catalog: web::Data<Catalog>,
    body: web::Json<CreateProjectRequest>,
) -> AppResult<HttpResponse> {
    let project = catalog.create_project(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(project))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = crate::models::Project),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_project(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let project = catalog.get_project(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Update some fields of a project.
#[utoipa::path(
    patch,
    path = "/api/v1/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = String, Path, description = "Project ID")),
    request_body = ProjectPatch,
    responses(
        (status = 200, description = "Updated project", body = crate::models::Project),
        (status = 400, description = "Invalid field", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_project(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
    body: web::Json<ProjectPatch>,
) -> AppResult<HttpResponse> {
    let project = catalog
        .update_project(&path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Delete a project. Unknown ids succeed too.
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = String, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
    )
)]
pub async fn delete_project(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    catalog.delete_project(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Success rate over the runs of the project's suites.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/health",
    tag = "Projects",
    params(("project_id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project health", body = crate::models::ProjectHealth),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn project_health(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let health = catalog.project_health(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(health))
}

/// Configure project routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects")
            .route(web::get().to(list_projects))
            .route(web::post().to(create_project)),
    )
    .service(
        web::resource("/projects/{project_id}")
            .route(web::get().to(get_project))
            .route(web::patch().to(update_project))
            .route(web::delete().to(delete_project)),
    )
    .service(web::resource("/projects/{project_id}/health").route(web::get().to(project_health)));
}
