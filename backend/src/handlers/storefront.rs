//! Public storefront handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::services::storefront::{CheckoutInput, StorefrontService};
use crate::AppState;

/// Place a storefront order (public endpoint)
pub async fn create_storefront_order(
    State(state): State<AppState>,
    Json(input): Json<CheckoutInput>,
) -> impl IntoResponse {
    let service = StorefrontService::new(state.db.clone());

    match service.checkout(input).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}
