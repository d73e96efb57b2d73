//! Storefront checkout: lead, work order and invoice in one transaction

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::snapshot::work_order_line_from_invoice_line;
use shared::totals::InvoiceTotals;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::directory::upsert_lead_by_email;
use super::invoice::{insert_invoice, price_lines, tax_context, InvoiceDraft};
use super::settings::load_company_settings;
use super::work_order::{insert_work_order, NewWorkOrder};
use crate::error::AppResult;
use crate::models::{InvoiceLineInput, InvoiceSourceType, InvoiceStatus, PartySnapshot};
use shared::QuotationMode;

/// Storefront checkout service
#[derive(Clone)]
pub struct StorefrontService {
    db: PgPool,
}

/// Customer block of a checkout; its address is the shipping address
#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutCustomer {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub gst: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub landmark: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
}

/// Billing address block of a checkout
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutAddress {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub landmark: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
}

/// Cart line as posted by the storefront
#[derive(Debug, Deserialize, Serialize)]
pub struct CheckoutItem {
    #[serde(alias = "id")]
    pub product_id: Option<Uuid>,
    #[serde(alias = "name")]
    pub description: Option<String>,
    #[serde(alias = "qty")]
    pub quantity: Decimal,
    #[serde(alias = "selling_price")]
    pub unit_price: Decimal,
    pub gst_rate: Option<Decimal>,
    pub hsn_sac: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutInput {
    pub customer: CheckoutCustomer,
    #[serde(default)]
    pub billing: CheckoutAddress,
    #[validate(length(min = 1, message = "Cart is empty"))]
    pub items: Vec<CheckoutItem>,
}

/// Documents created by a checkout
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub lead_id: Uuid,
    pub work_order_id: Uuid,
    pub work_order_number: String,
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub totals: InvoiceTotals,
}

impl CheckoutInput {
    /// Billing and shipping snapshots for the order.
    ///
    /// Billing falls back to the customer's own address when the billing
    /// block is left empty.
    fn party_snapshots(&self) -> (PartySnapshot, PartySnapshot) {
        let c = &self.customer;
        let name = format!("{} {}", c.first_name.trim(), c.last_name.trim()).trim().to_string();

        let shipping = PartySnapshot {
            name: name.clone(),
            company: c.company.clone(),
            phone: c.phone.clone(),
            email: c.email.trim().to_lowercase(),
            gst: c.gst.clone(),
            address: c.address.clone(),
            landmark: c.landmark.clone(),
            city: c.city.clone(),
            state: c.state.clone(),
            pincode: c.pincode.clone(),
            ..PartySnapshot::default()
        };

        let b = &self.billing;
        let billing = if b.address.trim().is_empty() && b.state.trim().is_empty() {
            shipping.clone()
        } else {
            PartySnapshot {
                address: b.address.clone(),
                landmark: b.landmark.clone(),
                city: b.city.clone(),
                state: b.state.clone(),
                pincode: b.pincode.clone(),
                ..shipping.clone()
            }
        };

        (billing, shipping)
    }

    fn line_inputs(&self) -> Vec<InvoiceLineInput> {
        self.items
            .iter()
            .map(|item| InvoiceLineInput {
                product_id: item.product_id,
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount: Decimal::ZERO,
                gst_rate: item.gst_rate,
                hsn_sac: item.hsn_sac.clone(),
            })
            .collect()
    }
}

impl StorefrontService {
    /// Create a new StorefrontService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Place a storefront order
    pub async fn checkout(&self, input: CheckoutInput) -> AppResult<CheckoutResponse> {
        input.customer.validate()?;
        input.validate()?;

        let (billing, shipping) = input.party_snapshots();
        let today = Utc::now().date_naive();

        let mut tx = self.db.begin().await?;

        let lead = upsert_lead_by_email(&mut tx, &billing, &shipping).await?;

        let company = load_company_settings(&mut tx).await?;
        let ctx = tax_context(&company, Some(&billing));
        let lines = price_lines(&mut tx, &input.line_inputs(), &ctx).await?;

        let work_order_lines: Vec<_> = lines.iter().map(work_order_line_from_invoice_line).collect();
        let header = NewWorkOrder {
            quotation_id: None,
            lead_id: Some(lead.id),
            issue_date: today,
            customer_name: lead.display_name(),
            notes: None,
            quotation_mode: QuotationMode::General,
            pax: None,
            event_name: None,
            event_date: None,
            event_time: None,
            event_location: None,
            billing_snapshot: Some(billing.clone()),
            shipping_snapshot: Some(shipping.clone()),
        };
        let (work_order_id, work_order_number) = insert_work_order(&mut tx, &header, &work_order_lines).await?;

        let draft = InvoiceDraft {
            source_type: InvoiceSourceType::FrontendOrder,
            source_id: Some(work_order_id),
            lead_id: Some(lead.id),
            issue_date: today,
            due_date: None,
            status: InvoiceStatus::Issued,
            notes: None,
            billing_snapshot: Some(billing),
            shipping_snapshot: Some(shipping),
            lines,
        };
        let invoice = insert_invoice(&mut tx, &draft).await?;

        tx.commit().await?;

        tracing::info!(
            "Storefront order for lead {}: work order {}, invoice {}",
            lead.id,
            work_order_number,
            invoice.invoice_number
        );

        Ok(CheckoutResponse {
            lead_id: lead.id,
            work_order_id,
            work_order_number,
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number,
            totals: invoice.totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn checkout(json: serde_json::Value) -> CheckoutInput {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_checkout_requires_valid_email() {
        let input = checkout(serde_json::json!({
            "customer": { "first_name": "Asha", "email": "not-an-email" },
            "items": [{ "name": "Ginger tea", "qty": "1", "selling_price": "120" }]
        }));
        let errors = input.customer.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(matches!(
            AppError::from(errors),
            AppError::Validation { ref field, .. } if field == "email"
        ));
    }

    #[test]
    fn test_checkout_requires_items() {
        let input = checkout(serde_json::json!({
            "customer": { "first_name": "Asha", "email": "asha@example.com" },
            "items": []
        }));
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_billing_block_overrides_customer_address() {
        let input = checkout(serde_json::json!({
            "customer": {
                "first_name": "Asha", "last_name": "Rao", "email": "Asha@Example.com",
                "address": "12 MG Road", "city": "Bengaluru", "state": "Karnataka"
            },
            "billing": { "address": "4 Park Street", "city": "Kolkata", "state": "West Bengal" },
            "items": [{ "id": null, "name": "Cold brew", "qty": "2", "selling_price": "150", "gst_rate": "5" }]
        }));

        let (billing, shipping) = input.party_snapshots();
        assert_eq!(billing.name, "Asha Rao");
        assert_eq!(billing.email, "asha@example.com");
        assert_eq!(billing.state, "West Bengal");
        assert_eq!(shipping.state, "Karnataka");
        assert_eq!(shipping.country, "India");

        let lines = input.line_inputs();
        assert_eq!(lines[0].description.as_deref(), Some("Cold brew"));
        assert_eq!(lines[0].quantity, Decimal::from(2));
        assert_eq!(lines[0].discount, Decimal::ZERO);
    }

    #[test]
    fn test_empty_billing_block_uses_customer_address() {
        let input = checkout(serde_json::json!({
            "customer": { "first_name": "Asha", "email": "asha@example.com", "state": "Goa" },
            "items": [{ "qty": "1", "selling_price": "10" }]
        }));
        let (billing, shipping) = input.party_snapshots();
        assert_eq!(billing, shipping);
    }
}
