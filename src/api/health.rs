//! Health check endpoint.

use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::{BackendMode, Datastore};

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Primary backend: `remote` or `local`
    pub backend: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint.
///
/// Returns 200 if the service is running. Reports which backend answers first;
/// remote reachability is not probed.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health(store: web::Data<Datastore>) -> HttpResponse {
    let backend = match store.mode() {
        BackendMode::Remote => "remote",
        BackendMode::Local => "local",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        backend: backend.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Configure health routes.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health);
}
