//! Invoice HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::Pagination;
use uuid::Uuid;

use crate::services::invoice::{CreateInvoiceInput, InvoiceFilter, InvoiceService, UpdateInvoiceStatusInput};
use crate::AppState;

/// List invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<InvoiceFilter>,
) -> impl IntoResponse {
    let service = InvoiceService::new(state.db.clone());

    match service.list_invoices(filter, pagination).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get an invoice with its items and snapshots
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = InvoiceService::new(state.db.clone());

    match service.get_invoice(invoice_id).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a manual or storefront invoice
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(input): Json<CreateInvoiceInput>,
) -> impl IntoResponse {
    let service = InvoiceService::new(state.db.clone());

    match service.create_invoice(input).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Invoice a work order
pub async fn create_invoice_from_work_order(
    State(state): State<AppState>,
    Path(work_order_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = InvoiceService::new(state.db.clone());

    match service.create_from_work_order(work_order_id).await {
        Ok(created) if created.already_existed => (StatusCode::OK, Json(created)).into_response(),
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Change the status of an invoice
pub async fn update_invoice_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<UpdateInvoiceStatusInput>,
) -> impl IntoResponse {
    let service = InvoiceService::new(state.db.clone());

    match service.update_status(invoice_id, input.status).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => e.into_response(),
    }
}
