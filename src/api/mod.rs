//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod projects;
pub mod stats;
pub mod test_runs;
pub mod test_suites;
pub mod websocket;

use actix_web::web;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use projects::configure_routes as configure_project_routes;
pub use stats::configure_routes as configure_stats_routes;
pub use test_runs::configure_routes as configure_run_routes;
pub use test_suites::configure_routes as configure_suite_routes;
pub use websocket::configure_routes as configure_websocket_routes;

/// Register every `/api/v1` route.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_project_routes)
        .configure(configure_suite_routes)
        .configure(configure_run_routes)
        .configure(configure_stats_routes)
        .configure(configure_websocket_routes);
}
