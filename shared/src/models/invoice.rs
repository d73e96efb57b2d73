//! Invoice models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PartySnapshot;
use crate::tax::LineTax;
use crate::totals::InvoiceTotals;

/// Where an invoice originated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceSourceType {
    Manual,
    WorkOrder,
    FrontendOrder,
}

impl InvoiceSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceSourceType::Manual => "MANUAL",
            InvoiceSourceType::WorkOrder => "WORK_ORDER",
            InvoiceSourceType::FrontendOrder => "FRONTEND_ORDER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MANUAL" => Some(InvoiceSourceType::Manual),
            "WORK_ORDER" => Some(InvoiceSourceType::WorkOrder),
            "FRONTEND_ORDER" => Some(InvoiceSourceType::FrontendOrder),
            _ => None,
        }
    }
}

/// Invoice payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(InvoiceStatus::Draft),
            "issued" => Some(InvoiceStatus::Issued),
            "paid" => Some(InvoiceStatus::Paid),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub invoice_sequence: i32,
    pub source_type: InvoiceSourceType,
    pub source_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub billing_snapshot: Option<PartySnapshot>,
    pub shipping_snapshot: Option<PartySnapshot>,
    #[serde(flatten)]
    pub totals: InvoiceTotals,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invoice line as submitted or derived from a work order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineInput {
    pub product_id: Option<Uuid>,
    #[serde(alias = "product_name")]
    pub description: Option<String>,
    pub quantity: Decimal,
    #[serde(alias = "selling_price")]
    pub unit_price: Decimal,
    /// Flat amount taken off the line before tax
    #[serde(default)]
    pub discount: Decimal,
    pub gst_rate: Option<Decimal>,
    pub hsn_sac: Option<String>,
}

/// Priced invoice line before it is stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLine {
    pub product_id: Option<Uuid>,
    pub description: String,
    pub hsn_sac: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub gst_rate: Decimal,
    #[serde(flatten)]
    pub tax: LineTax,
}

/// Stored invoice line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    #[serde(flatten)]
    pub line: InvoiceLine,
}

/// Invoice header with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}
