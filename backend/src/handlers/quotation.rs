//! Quotation HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::Pagination;
use uuid::Uuid;

use crate::models::QuotationHeaderPatch;
use crate::services::quotation::{
    CreateQuotationInput, QuotationFilter, QuotationService, UpdateQuotationItemsInput, UpdateQuotationStatusInput,
};
use crate::AppState;

/// List quotations with their lead names
pub async fn list_quotations(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<QuotationFilter>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.db.clone());

    match service.list_quotations(filter, pagination).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a quotation with its items
pub async fn get_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.db.clone());

    match service.get_quotation(quotation_id).await {
        Ok(quotation) => (StatusCode::OK, Json(quotation)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a quotation, or a new version when `parent_id` is set
pub async fn create_quotation(
    State(state): State<AppState>,
    Json(input): Json<CreateQuotationInput>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.db.clone());

    match service.create_quotation(input).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update quotation header fields and recompute totals
pub async fn update_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
    Json(patch): Json<QuotationHeaderPatch>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.db.clone());

    match service.update_header(quotation_id, patch).await {
        Ok(totals) => (StatusCode::OK, Json(totals)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Replace the items of a quotation
pub async fn update_quotation_items(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
    Json(input): Json<UpdateQuotationItemsInput>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.db.clone());

    match service.update_items(quotation_id, input).await {
        Ok(totals) => (StatusCode::OK, Json(totals)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Change the status of a quotation across its version chain
pub async fn update_quotation_status(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
    Json(input): Json<UpdateQuotationStatusInput>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.db.clone());

    match service.update_status(quotation_id, input.status).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List every version in the chain of a quotation
pub async fn list_quotation_versions(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.db.clone());

    match service.list_versions(quotation_id).await {
        Ok(versions) => (StatusCode::OK, Json(serde_json::json!({ "versions": versions }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete an unlocked quotation
pub async fn delete_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.db.clone());

    match service.delete_quotation(quotation_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
