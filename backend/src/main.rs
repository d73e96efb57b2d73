//! CRM Billing Server
//!
//! Runs the quotation → work order → invoice pipeline of a small-business CRM
//! over PostgreSQL:
//! - `/api/v1/quotations`: versioned quotations; approving one version rejects
//!   and locks the rest of its chain
//! - `/api/v1/work-orders`: one work order per approved quotation, with item
//!   and party snapshots frozen at conversion
//! - `/api/v1/invoices`: GST invoices (CGST/SGST or IGST) issued manually or
//!   from a work order
//! - `/api/v1/public/orders`: storefront checkout creating a work order and
//!   its invoice in one transaction
//! - `/api/v1/settings`: company GST registration and document numbering
//!
//! GST and totals arithmetic lives in the `shared` crate so the browser
//! preview (`wasm`) prices lines exactly as the server stores them.

use axum::{routing::get, Json, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod models;
mod routes;
mod services;

pub use config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crm_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!(
        "Starting CRM Billing Server v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    // Create database connection pool
    tracing::info!(
        "Connecting to database (pool {}..{} connections)",
        config.database.min_connections,
        config.database.max_connections
    );
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Schema changes are applied by the deploy pipeline outside development
    if config.is_development() {
        tracing::info!("Applying billing pipeline migrations");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config),
    };

    // Build application
    let app = create_app(state);

    tracing::info!("Billing API listening on http://{}/api/v1", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint: service name and the resource roots it serves
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "crm-billing",
        "version": env!("CARGO_PKG_VERSION"),
        "api": "/api/v1",
        "resources": ["quotations", "work-orders", "invoices", "public/orders", "settings"],
    }))
}
