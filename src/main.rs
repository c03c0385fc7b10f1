//! Scuba Dive Log Backend
//!
//! A REST backend for a personal dive log with SQLite persistence, attribute
//! tagging, search and log statistics.

mod api;
mod config;
mod db;
mod errors;
mod models;
mod query;
mod stats;
mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use models::FieldCatalog;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub fields: Arc<FieldCatalog>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Scuba Dive Log Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Units: depth {:?}, temperature {:?}",
        config.units.depth_units,
        config.units.temp_units
    );

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let logged = repo.count_dives().await?;
    tracing::info!("Dive log holds {} dives", logged);

    // Create application state
    let state = AppState {
        repo,
        fields: Arc::new(FieldCatalog::dive_fields()),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Attribute catalog
        .route(
            "/attributes",
            get(api::list_attributes).post(api::create_attribute),
        )
        .route("/attributes/lookup", get(api::lookup_attribute))
        .route("/attributes/{id}", get(api::get_attribute))
        // Dives
        .route("/dives", get(api::list_dives).post(api::create_dive))
        .route("/dives/next-number", get(api::next_dive_number))
        .route("/dives/summaries", get(api::dive_summaries))
        .route("/dives/search", post(api::search_dives))
        .route(
            "/dives/{number}",
            get(api::get_dive)
                .put(api::update_dive)
                .delete(api::delete_dive),
        )
        .route(
            "/dives/{number}/attributes/{id}",
            get(api::dive_has_attribute),
        )
        .route("/dives/{number}/detail/{field}", get(api::dive_detail))
        // Statistics
        .route("/stats", get(api::get_stats))
        .route("/stats/{detail}", get(api::get_statistic))
        // Settings
        .route("/settings", get(api::get_settings));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
