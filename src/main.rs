//! SuiteDeck server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use suitedeck_lib::api::{self, ApiDoc};
use suitedeck_lib::config::Config;
use suitedeck_lib::middleware::RequestLogger;
use suitedeck_lib::services::{
    Catalog, ChangeBus, EngineOptions, EventBroadcaster, RunEngine, SimulatedOutcome,
};
use suitedeck_lib::store::Datastore;

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir = req
        .app_data::<web::Data<PathBuf>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static dir not configured"))?;
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - DECK_REMOTE_URL and DECK_REMOTE_KEY must be set together");
            error!("  - In production, a remote store is required");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  SuiteDeck Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let store = match Datastore::from_config(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open datastore: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Local collections at {} (primary backend: {:?})",
        store.local().root().display(),
        store.mode()
    );

    if config.analysis.is_configured() {
        info!("Failure analysis configured, failed runs get a diagnosis");
    }

    // Run changes flow bus -> broadcaster -> WebSocket clients
    let bus = ChangeBus::new();
    let broadcaster = EventBroadcaster::new();
    broadcaster.bridge(&bus);

    let engine = RunEngine::new(
        store.clone(),
        bus,
        Arc::new(SimulatedOutcome::default()),
        EngineOptions::from_config(&config),
    );
    let catalog = Catalog::new(store.clone(), config.owner_id.clone());

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!("Starting server at http://{} ({} workers)", bind_address, cpus);
        cpus
    };

    let app_engine = engine.clone();
    let server = HttpServer::new(move || {
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        let mut app = App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(catalog.clone()))
            .app_data(web::Data::new(app_engine.clone()))
            .app_data(web::Data::new(broadcaster.clone()))
            .service(web::scope("/api/v1").configure(api::configure_api))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            );

        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await?;

    // Let scheduled completions land before exiting
    let pending = engine.in_flight();
    if pending > 0 {
        info!("Waiting for {} in-flight run completion(s)", pending);
    }
    engine.wait_idle().await;
    info!("Server stopped");

    Ok(())
}
