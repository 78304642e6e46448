//! Dashboard statistics endpoint.

use actix_web::{HttpResponse, web};

use crate::error::AppResult;
use crate::services::Catalog;

/// Totals, success rate over the latest runs, and a 7-day series.
#[utoipa::path(
    get,
    path = "/api/v1/stats/dashboard",
    tag = "Stats",
    responses(
        (status = 200, description = "Dashboard summary", body = crate::models::DashboardSummary),
    )
)]
pub async fn dashboard(catalog: web::Data<Catalog>) -> AppResult<HttpResponse> {
    let summary = catalog.dashboard().await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Configure stats routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/stats/dashboard").route(web::get().to(dashboard)));
}
