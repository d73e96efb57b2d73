//! Route definitions for the CRM billing server

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check with a database ping
        .route("/health", get(handlers::health_check))
        .nest("/quotations", quotation_routes())
        .nest("/work-orders", work_order_routes())
        .nest("/invoices", invoice_routes())
        // Storefront checkout (public)
        .nest("/public", public_routes())
        .nest("/settings", settings_routes())
}

/// Quotation and version chain routes
fn quotation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_quotations).post(handlers::create_quotation))
        .route(
            "/:quotation_id",
            get(handlers::get_quotation)
                .put(handlers::update_quotation)
                .delete(handlers::delete_quotation),
        )
        .route("/:quotation_id/items", put(handlers::update_quotation_items))
        .route("/:quotation_id/status", put(handlers::update_quotation_status))
        .route("/:quotation_id/versions", get(handlers::list_quotation_versions))
}

/// Work order routes
fn work_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_work_orders))
        .route(
            "/from-quotation/:quotation_id",
            post(handlers::create_work_order_from_quotation),
        )
        .route("/:work_order_id", get(handlers::get_work_order))
        .route("/:work_order_id/status", put(handlers::update_work_order_status))
}

/// Invoice routes
fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices).post(handlers::create_invoice))
        .route(
            "/from-work-order/:work_order_id",
            post(handlers::create_invoice_from_work_order),
        )
        .route("/:invoice_id", get(handlers::get_invoice))
        .route("/:invoice_id/status", put(handlers::update_invoice_status))
}

/// Public storefront routes
fn public_routes() -> Router<AppState> {
    Router::new().route("/orders", post(handlers::create_storefront_order))
}

/// Settings routes
fn settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/company",
            get(handlers::get_company_settings).put(handlers::update_company_settings),
        )
        .route(
            "/quotation",
            get(handlers::get_quotation_settings).put(handlers::update_quotation_settings),
        )
        .route(
            "/invoice",
            get(handlers::get_invoice_settings).put(handlers::update_invoice_settings),
        )
}
