//! Work order HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::Pagination;
use uuid::Uuid;

use crate::services::work_order::{UpdateWorkOrderStatusInput, WorkOrderFilter, WorkOrderService};
use crate::AppState;

/// Convert an approved quotation into a work order
pub async fn create_work_order_from_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = WorkOrderService::new(state.db.clone());

    match service.create_from_quotation(quotation_id).await {
        Ok(conversion) if conversion.already_existed => (StatusCode::OK, Json(conversion)).into_response(),
        Ok(conversion) => (StatusCode::CREATED, Json(conversion)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List work orders
pub async fn list_work_orders(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<WorkOrderFilter>,
) -> impl IntoResponse {
    let service = WorkOrderService::new(state.db.clone());

    match service.list_work_orders(filter, pagination).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a work order with its items
pub async fn get_work_order(
    State(state): State<AppState>,
    Path(work_order_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = WorkOrderService::new(state.db.clone());

    match service.get_work_order(work_order_id).await {
        Ok(work_order) => (StatusCode::OK, Json(work_order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Change the status of a work order
pub async fn update_work_order_status(
    State(state): State<AppState>,
    Path(work_order_id): Path<Uuid>,
    Json(input): Json<UpdateWorkOrderStatusInput>,
) -> impl IntoResponse {
    let service = WorkOrderService::new(state.db.clone());

    match service.update_status(work_order_id, input.status).await {
        Ok(work_order) => (StatusCode::OK, Json(work_order)).into_response(),
        Err(e) => e.into_response(),
    }
}
