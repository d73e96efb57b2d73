//! Catalog product as read for snapshotting

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product fields copied into document lines at creation time
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub cost_price: Option<Decimal>,
    pub cost_price_unit: Option<String>,
    pub cost_price_qty: Option<Decimal>,
    pub cost_pricing_mode: Option<String>,
    pub cost_discount_percent: Option<Decimal>,
    pub gst_rate: Option<Decimal>,
    pub hsn_sac: Option<String>,
}
