//! WebAssembly module for the CRM billing pipeline
//!
//! Provides client-side previews for:
//! - GST line calculations
//! - Quotation totals while the editor is open
//! - Document numbers from a numbering template
//! - GSTIN format checks
//!
//! The server recomputes everything on save; these are previews only.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use shared::numbering::format_document_number;
use shared::tax::{LineTax, TaxContext};
use shared::totals::{aggregate_quotation, quotation_line_total, DocumentDiscount, PricedLine, QuotationTotals};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("crm billing preview loaded"));
}

#[derive(Debug, Deserialize)]
struct GstLineRequest {
    quantity: Decimal,
    #[serde(alias = "selling_price")]
    unit_price: Decimal,
    #[serde(default)]
    discount: Decimal,
    #[serde(default)]
    gst_rate: Decimal,
    #[serde(default = "default_pricing_mode")]
    pricing_mode: PricingMode,
    #[serde(default)]
    company_state: String,
    #[serde(default)]
    billing_state: String,
    #[serde(default = "default_gst_enabled")]
    gst_enabled: bool,
}

fn default_pricing_mode() -> PricingMode {
    PricingMode::Inclusive
}

fn default_gst_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PreviewItem {
    quantity: Decimal,
    #[serde(alias = "unit_price")]
    selling_price: Decimal,
    #[serde(default)]
    discount: Decimal,
    #[serde(default)]
    tax: Decimal,
    #[serde(default)]
    gst_rate: Decimal,
}

#[derive(Debug, Deserialize)]
struct QuotationPreviewRequest {
    items: Vec<PreviewItem>,
    #[serde(default)]
    quotation_mode: QuotationMode,
    pax: Option<i32>,
    quotation_discount_type: Option<DiscountType>,
    #[serde(default)]
    quotation_discount_value: Decimal,
    #[serde(default = "default_quotation_pricing_mode")]
    gst_pricing_mode: PricingMode,
}

fn default_quotation_pricing_mode() -> PricingMode {
    PricingMode::Exclusive
}

#[derive(Debug, Serialize)]
struct QuotationPreview {
    line_totals: Vec<Decimal>,
    #[serde(flatten)]
    totals: QuotationTotals,
}

fn gst_line(input: &str) -> Result<LineTax, String> {
    let req: GstLineRequest = serde_json::from_str(input).map_err(|e| format!("Invalid line JSON: {}", e))?;
    validate_line_amounts(req.quantity, req.unit_price, req.discount).map_err(|e| e.to_string())?;
    validate_gst_rate(req.gst_rate).map_err(|e| e.to_string())?;

    let settings = CompanySettings {
        company_state: req.company_state,
        gst_enabled: req.gst_enabled,
        gst_pricing_mode: req.pricing_mode,
        ..CompanySettings::default()
    };
    let ctx = TaxContext::new(&settings, &req.billing_state);
    Ok(ctx.price(req.quantity, req.unit_price, req.discount, req.gst_rate))
}

fn quotation_preview(input: &str) -> Result<QuotationPreview, String> {
    let req: QuotationPreviewRequest =
        serde_json::from_str(input).map_err(|e| format!("Invalid quotation JSON: {}", e))?;

    let mut lines = Vec::with_capacity(req.items.len());
    for item in &req.items {
        validate_line_amounts(item.quantity, item.selling_price, item.discount).map_err(|e| e.to_string())?;
        lines.push(PricedLine {
            selling_price: item.selling_price,
            quantity: item.quantity,
            discount: item.discount,
            line_total: quotation_line_total(item.selling_price, item.quantity, item.discount, item.tax),
            gst_rate: item.gst_rate,
        });
    }

    let discount = req.quotation_discount_type.map(|kind| DocumentDiscount {
        kind,
        value: req.quotation_discount_value,
    });
    let totals = aggregate_quotation(
        &lines,
        req.quotation_mode,
        req.pax,
        discount.as_ref(),
        req.gst_pricing_mode,
    )
    .map_err(|e| e.to_string())?;

    Ok(QuotationPreview {
        line_totals: lines.iter().map(|l| l.line_total).collect(),
        totals,
    })
}

fn document_number(template: &str, prefix: &str, date: &str, sequence: i32) -> Result<String, String> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| format!("Invalid date: {}", e))?;
    if sequence < 1 {
        return Err("Sequence must be at least 1".to_string());
    }
    Ok(format_document_number(template, prefix, date, sequence))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

/// Calculate the GST breakdown of one line; returns the breakdown as JSON
#[wasm_bindgen]
pub fn calculate_gst_line(line_json: &str) -> Result<String, JsValue> {
    gst_line(line_json)
        .and_then(|tax| to_json(&tax))
        .map_err(|e| JsValue::from_str(&e))
}

/// Preview quotation totals for the editor; returns totals and line totals as JSON
#[wasm_bindgen]
pub fn preview_quotation_totals(quotation_json: &str) -> Result<String, JsValue> {
    quotation_preview(quotation_json)
        .and_then(|preview| to_json(&preview))
        .map_err(|e| JsValue::from_str(&e))
}

/// Render a document number from a template; `date` is `YYYY-MM-DD`
#[wasm_bindgen]
pub fn preview_document_number(template: &str, prefix: &str, date: &str, sequence: i32) -> Result<String, JsValue> {
    document_number(template, prefix, date, sequence).map_err(|e| JsValue::from_str(&e))
}

/// Check a GSTIN including its check character
#[wasm_bindgen]
pub fn validate_gstin_format(gstin: &str) -> bool {
    validate_gstin(gstin).is_ok()
}
