//! Quotation models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::totals::{DocumentDiscount, PricedLine, QuotationTotals};
use crate::types::{double_option, CostPricingMode, DiscountType, QuotationMode};

/// Quotation lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Pending,
    Approved,
    Rejected,
    Converted,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Approved => "approved",
            QuotationStatus::Rejected => "rejected",
            QuotationStatus::Converted => "converted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(QuotationStatus::Pending),
            "approved" => Some(QuotationStatus::Approved),
            "rejected" => Some(QuotationStatus::Rejected),
            "converted" => Some(QuotationStatus::Converted),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quotation header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotation {
    pub id: Uuid,
    pub lead_id: Uuid,
    /// Formatted number, e.g. "QT/2024/0007"
    pub quotation_number: String,
    pub quotation_sequence: i32,
    /// Root of the version chain this quotation revises, None for a root
    pub parent_id: Option<Uuid>,
    pub version: i32,
    pub status: QuotationStatus,
    pub is_locked: bool,
    pub quotation_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub quotation_mode: QuotationMode,
    pub pax: Option<i32>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    pub quotation_discount_type: Option<DiscountType>,
    pub quotation_discount_value: Decimal,
    #[serde(flatten)]
    pub totals: QuotationTotals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quotation {
    pub fn document_discount(&self) -> Option<DocumentDiscount> {
        self.quotation_discount_type.map(|kind| DocumentDiscount {
            kind,
            value: self.quotation_discount_value,
        })
    }

    /// Merge a header patch into this quotation.
    ///
    /// Absent fields keep their current value; explicit nulls clear
    /// nullable fields.
    pub fn apply_patch(&mut self, patch: QuotationHeaderPatch) {
        if let Some(lead_id) = patch.lead_id {
            self.lead_id = lead_id;
        }
        if let Some(date) = patch.quotation_date {
            self.quotation_date = date;
        }
        if let Some(valid_until) = patch.valid_until {
            self.valid_until = valid_until;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(pax) = patch.pax {
            self.pax = pax;
        }
        if let Some(event_name) = patch.event_name {
            self.event_name = event_name;
        }
        if let Some(event_date) = patch.event_date {
            self.event_date = event_date;
        }
        if let Some(event_time) = patch.event_time {
            self.event_time = event_time;
        }
        if let Some(event_location) = patch.event_location {
            self.event_location = event_location;
        }
        if let Some(kind) = patch.quotation_discount_type {
            self.quotation_discount_type = kind;
        }
        if let Some(value) = patch.quotation_discount_value {
            self.quotation_discount_value = value;
        }
    }
}

/// Partial update of a quotation header
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuotationHeaderPatch {
    pub lead_id: Option<Uuid>,
    pub quotation_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub valid_until: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pax: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub event_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub event_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub event_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub event_location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub quotation_discount_type: Option<Option<DiscountType>>,
    pub quotation_discount_value: Option<Decimal>,
}

/// Line item as submitted by the quotation editor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationItemInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: Decimal,
    #[serde(alias = "selling_price")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    /// Flat per-line tax adjustment added to the line total
    #[serde(default)]
    pub tax: Decimal,
    /// Used only when the product carries no GST rate
    pub gst_rate: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub cost_price_unit: Option<String>,
    pub cost_price_qty: Option<Decimal>,
    pub cost_pricing_mode: Option<String>,
    pub cost_discount_percent: Option<Decimal>,
    pub attributes_json: Option<serde_json::Value>,
    pub packaging_json: Option<serde_json::Value>,
}

/// Fully resolved line ready to be stored; never re-reads the product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotationItemSnapshot {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub variant_sku: Option<String>,
    pub quantity: Decimal,
    pub selling_price: Decimal,
    pub selling_price_unit: String,
    pub selling_price_qty: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub gst_rate: Decimal,
    pub hsn_sac: Option<String>,
    pub cost_price: Decimal,
    pub cost_price_unit: String,
    pub cost_price_qty: Decimal,
    pub cost_pricing_mode: CostPricingMode,
    pub cost_discount_percent: Decimal,
    pub attributes_json: serde_json::Value,
    pub packaging_json: serde_json::Value,
    pub line_total: Decimal,
}

/// Stored quotation line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotationItem {
    pub id: Uuid,
    pub quotation_id: Uuid,
    #[serde(flatten)]
    pub snapshot: QuotationItemSnapshot,
}

impl From<&QuotationItemSnapshot> for PricedLine {
    fn from(item: &QuotationItemSnapshot) -> Self {
        PricedLine {
            selling_price: item.selling_price,
            quantity: item.quantity,
            discount: item.discount,
            line_total: item.line_total,
            gst_rate: item.gst_rate,
        }
    }
}

impl From<&QuotationItem> for PricedLine {
    fn from(item: &QuotationItem) -> Self {
        PricedLine::from(&item.snapshot)
    }
}

/// Quotation header with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationWithItems {
    #[serde(flatten)]
    pub quotation: Quotation,
    pub items: Vec<QuotationItem>,
}
