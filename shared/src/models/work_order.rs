//! Work order models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PartySnapshot;
use crate::types::QuotationMode;

/// Work order fulfilment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Issued,
    InProgress,
    Completed,
    Cancelled,
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Issued => "issued",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "issued" => Some(WorkOrderStatus::Issued),
            "in_progress" => Some(WorkOrderStatus::InProgress),
            "completed" => Some(WorkOrderStatus::Completed),
            "cancelled" => Some(WorkOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }
}

impl std::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work order header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: Uuid,
    /// Formatted number, e.g. "WO/2024/0003"
    pub work_order_number: String,
    pub work_order_sequence: i32,
    /// None for storefront orders
    pub quotation_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub status: WorkOrderStatus,
    pub issue_date: NaiveDate,
    pub customer_name: String,
    pub notes: Option<String>,
    pub quotation_mode: QuotationMode,
    pub pax: Option<i32>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    pub billing_snapshot: Option<PartySnapshot>,
    pub shipping_snapshot: Option<PartySnapshot>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Work order line before it is stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkOrderLine {
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub description: String,
    pub variant_sku: Option<String>,
    /// Already scaled by pax for catering quotations
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub gst_rate: Decimal,
    pub hsn_sac: Option<String>,
    pub line_total: Decimal,
}

/// Stored work order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkOrderItem {
    pub id: Uuid,
    pub work_order_id: Uuid,
    #[serde(flatten)]
    pub line: WorkOrderLine,
}

/// Work order header with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderWithItems {
    #[serde(flatten)]
    pub work_order: WorkOrder,
    pub items: Vec<WorkOrderItem>,
}
