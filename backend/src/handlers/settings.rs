//! Settings HTTP handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::models::{CompanySettings, InvoiceSettings, QuotationSettings};
use crate::services::SettingsService;
use crate::AppState;

pub async fn get_company_settings(State(state): State<AppState>) -> impl IntoResponse {
    let service = SettingsService::new(state.db.clone());

    match service.get_company_settings().await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_company_settings(
    State(state): State<AppState>,
    Json(input): Json<CompanySettings>,
) -> impl IntoResponse {
    let service = SettingsService::new(state.db.clone());

    match service.update_company_settings(input).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_quotation_settings(State(state): State<AppState>) -> impl IntoResponse {
    let service = SettingsService::new(state.db.clone());

    match service.get_quotation_settings().await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_quotation_settings(
    State(state): State<AppState>,
    Json(input): Json<QuotationSettings>,
) -> impl IntoResponse {
    let service = SettingsService::new(state.db.clone());

    match service.update_quotation_settings(input).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_invoice_settings(State(state): State<AppState>) -> impl IntoResponse {
    let service = SettingsService::new(state.db.clone());

    match service.get_invoice_settings().await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_invoice_settings(
    State(state): State<AppState>,
    Json(input): Json<InvoiceSettings>,
) -> impl IntoResponse {
    let service = SettingsService::new(state.db.clone());

    match service.update_invoice_settings(input).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => e.into_response(),
    }
}
