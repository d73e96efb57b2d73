//! Invoice service: GST invoices from manual input, work orders and storefront orders
//!
//! Lines are priced once at creation with the company's pricing convention
//! and jurisdiction; stored amounts are never recomputed.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::lifecycle::ensure_invoice_transition;
use shared::numbering::DocumentKind;
use shared::snapshot::{invoice_inputs_from_work_order, party_snapshots, price_invoice_line};
use shared::tax::{LineTax, TaxContext};
use shared::totals::InvoiceTotals;
use shared::{CompanySettings, DomainError, PaginatedResponse, Pagination};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use super::directory::{find_lead, find_optional_product};
use super::sequence;
use super::settings::{load_company_settings, load_invoice_settings};
use super::work_order::{load_work_order, load_work_order_items};
use crate::error::{AppError, AppResult};
use crate::models::{
    Invoice, InvoiceItem, InvoiceLine, InvoiceLineInput, InvoiceSourceType, InvoiceStatus, InvoiceWithItems,
    PartySnapshot, WorkOrderStatus,
};

/// Invoice service for issuing invoices and tracking their status
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
}

/// Input for creating a manual or storefront invoice
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceInput {
    pub lead_id: Option<Uuid>,
    pub source_type: InvoiceSourceType,
    pub source_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
    pub billing: Option<PartySnapshot>,
    pub shipping: Option<PartySnapshot>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<InvoiceLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceStatusInput {
    pub status: InvoiceStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub source_type: Option<InvoiceSourceType>,
}

/// Result of an invoice creation request
#[derive(Debug, Serialize)]
pub struct InvoiceCreated {
    pub id: Uuid,
    pub invoice_number: String,
    pub totals: InvoiceTotals,
    pub already_existed: bool,
}

/// An invoice about to be numbered and written
pub(crate) struct InvoiceDraft {
    pub source_type: InvoiceSourceType,
    pub source_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub billing_snapshot: Option<PartySnapshot>,
    pub shipping_snapshot: Option<PartySnapshot>,
    pub lines: Vec<InvoiceLine>,
}

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, invoice_sequence, source_type, source_id, lead_id, issue_date, due_date,
    status, billing_snapshot, shipping_snapshot, subtotal, cgst_total, sgst_total, igst_total,
    grand_total, notes, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    invoice_number: String,
    invoice_sequence: i32,
    source_type: String,
    source_id: Option<Uuid>,
    lead_id: Option<Uuid>,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    status: String,
    billing_snapshot: Option<Json<PartySnapshot>>,
    shipping_snapshot: Option<Json<PartySnapshot>>,
    subtotal: Decimal,
    cgst_total: Decimal,
    sgst_total: Decimal,
    igst_total: Decimal,
    grand_total: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DomainError;

    fn try_from(row: InvoiceRow) -> Result<Self, DomainError> {
        Ok(Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            invoice_sequence: row.invoice_sequence,
            source_type: InvoiceSourceType::from_str(&row.source_type)
                .ok_or_else(|| DomainError::unknown("invoice source type", &row.source_type))?,
            source_id: row.source_id,
            lead_id: row.lead_id,
            issue_date: row.issue_date,
            due_date: row.due_date,
            status: InvoiceStatus::from_str(&row.status)
                .ok_or_else(|| DomainError::unknown("invoice status", &row.status))?,
            billing_snapshot: row.billing_snapshot.map(|s| s.0),
            shipping_snapshot: row.shipping_snapshot.map(|s| s.0),
            totals: InvoiceTotals {
                subtotal: row.subtotal,
                cgst_total: row.cgst_total,
                sgst_total: row.sgst_total,
                igst_total: row.igst_total,
                grand_total: row.grand_total,
            },
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceItemRow {
    id: Uuid,
    invoice_id: Uuid,
    product_id: Option<Uuid>,
    description: String,
    hsn_sac: Option<String>,
    quantity: Decimal,
    unit_price: Decimal,
    discount: Decimal,
    gst_rate: Decimal,
    taxable_amount: Decimal,
    cgst_amount: Decimal,
    sgst_amount: Decimal,
    igst_amount: Decimal,
    line_total: Decimal,
}

impl From<InvoiceItemRow> for InvoiceItem {
    fn from(row: InvoiceItemRow) -> Self {
        InvoiceItem {
            id: row.id,
            invoice_id: row.invoice_id,
            line: InvoiceLine {
                product_id: row.product_id,
                description: row.description,
                hsn_sac: row.hsn_sac,
                quantity: row.quantity,
                unit_price: row.unit_price,
                discount: row.discount,
                gst_rate: row.gst_rate,
                tax: LineTax {
                    taxable_amount: row.taxable_amount,
                    cgst_amount: row.cgst_amount,
                    sgst_amount: row.sgst_amount,
                    igst_amount: row.igst_amount,
                    line_total: row.line_total,
                },
            },
        }
    }
}

/// Price invoice inputs under one tax context, reading products when referenced
pub(crate) async fn price_lines(
    conn: &mut PgConnection,
    inputs: &[InvoiceLineInput],
    ctx: &TaxContext,
) -> AppResult<Vec<InvoiceLine>> {
    let mut lines = Vec::with_capacity(inputs.len());
    for input in inputs {
        let product = find_optional_product(conn, input.product_id).await?;
        lines.push(price_invoice_line(input, product.as_ref(), ctx)?);
    }
    Ok(lines)
}

/// Tax context for a billing party under the company's settings
pub(crate) fn tax_context(company: &CompanySettings, billing: Option<&PartySnapshot>) -> TaxContext {
    TaxContext::new(company, billing.map(|b| b.state.as_str()).unwrap_or(""))
}

/// Number and insert an invoice with its lines
pub(crate) async fn insert_invoice(conn: &mut PgConnection, draft: &InvoiceDraft) -> AppResult<InvoiceCreated> {
    let settings = load_invoice_settings(conn).await?;
    let sequence = sequence::allocate(
        conn,
        DocumentKind::Invoice,
        settings.numbering.numbering_mode,
        settings.numbering.sequence_start,
        draft.issue_date,
    )
    .await?;
    let invoice_number = settings.numbering.format(draft.issue_date, sequence);
    let totals = InvoiceTotals::from_lines(draft.lines.iter().map(|l| &l.tax));

    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO invoices (
            invoice_number, invoice_sequence, source_type, source_id, lead_id, issue_date, due_date,
            status, billing_snapshot, shipping_snapshot, subtotal, cgst_total, sgst_total, igst_total,
            grand_total, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING id
        "#,
    )
    .bind(&invoice_number)
    .bind(sequence)
    .bind(draft.source_type.as_str())
    .bind(draft.source_id)
    .bind(draft.lead_id)
    .bind(draft.issue_date)
    .bind(draft.due_date)
    .bind(draft.status.as_str())
    .bind(draft.billing_snapshot.clone().map(Json))
    .bind(draft.shipping_snapshot.clone().map(Json))
    .bind(totals.subtotal)
    .bind(totals.cgst_total)
    .bind(totals.sgst_total)
    .bind(totals.igst_total)
    .bind(totals.grand_total)
    .bind(&draft.notes)
    .fetch_one(&mut *conn)
    .await?;

    for (position, line) in draft.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                invoice_id, position, product_id, description, hsn_sac, quantity, unit_price, discount,
                gst_rate, taxable_amount, cgst_amount, sgst_amount, igst_amount, line_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(id)
        .bind(position as i32)
        .bind(line.product_id)
        .bind(&line.description)
        .bind(&line.hsn_sac)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.discount)
        .bind(line.gst_rate)
        .bind(line.tax.taxable_amount)
        .bind(line.tax.cgst_amount)
        .bind(line.tax.sgst_amount)
        .bind(line.tax.igst_amount)
        .bind(line.tax.line_total)
        .execute(&mut *conn)
        .await?;
    }

    tracing::info!(
        "Invoice {} issued from {} (grand total {})",
        invoice_number,
        draft.source_type.as_str(),
        totals.grand_total
    );

    Ok(InvoiceCreated {
        id,
        invoice_number,
        totals,
        already_existed: false,
    })
}

async fn load_invoice(conn: &mut PgConnection, id: Uuid, for_update: bool) -> AppResult<Invoice> {
    let sql = format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1{}",
        if for_update { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query_as::<_, InvoiceRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

    Ok(Invoice::try_from(row)?)
}

/// Reject source types that have a dedicated creation path
fn ensure_direct_source(input: &CreateInvoiceInput) -> AppResult<()> {
    match input.source_type {
        InvoiceSourceType::WorkOrder => Err(AppError::Validation {
            field: "source_type".to_string(),
            message: "Work order invoices are created from the work order".to_string(),
        }),
        InvoiceSourceType::FrontendOrder if input.billing.is_none() => Err(AppError::Validation {
            field: "billing".to_string(),
            message: "Billing details are required for storefront orders".to_string(),
        }),
        _ => Ok(()),
    }
}

impl InvoiceService {
    /// Create a new InvoiceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a manual or storefront invoice
    pub async fn create_invoice(&self, input: CreateInvoiceInput) -> AppResult<InvoiceCreated> {
        input.validate()?;
        ensure_direct_source(&input)?;

        let mut tx = self.db.begin().await?;

        let company = load_company_settings(&mut tx).await?;

        let (lead_billing, lead_shipping) = match input.lead_id {
            Some(lead_id) => {
                let (billing, shipping) = party_snapshots(&find_lead(&mut tx, lead_id).await?);
                (Some(billing), Some(shipping))
            }
            None => (None, None),
        };
        let billing = input.billing.clone().or(lead_billing);
        let shipping = input.shipping.clone().or(lead_shipping).or_else(|| billing.clone());

        let ctx = tax_context(&company, billing.as_ref());
        let lines = price_lines(&mut tx, &input.items, &ctx).await?;

        let draft = InvoiceDraft {
            source_type: input.source_type,
            source_id: input.source_id,
            lead_id: input.lead_id,
            issue_date: input.issue_date.unwrap_or_else(|| Utc::now().date_naive()),
            due_date: input.due_date,
            status: input.status.unwrap_or(InvoiceStatus::Issued),
            notes: input.notes,
            billing_snapshot: billing,
            shipping_snapshot: shipping,
            lines,
        };
        let created = insert_invoice(&mut tx, &draft).await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Invoice a work order; repeated calls return the first invoice
    pub async fn create_from_work_order(&self, work_order_id: Uuid) -> AppResult<InvoiceCreated> {
        let mut tx = self.db.begin().await?;

        // Locking the work order serializes concurrent invoicing
        let work_order = load_work_order(&mut tx, work_order_id, true).await?;

        // Storefront work orders are invoiced at checkout under FRONTEND_ORDER
        let sql = format!(
            r#"
            SELECT {INVOICE_COLUMNS} FROM invoices
            WHERE source_type IN ('WORK_ORDER', 'FRONTEND_ORDER') AND source_id = $1
            ORDER BY created_at
            LIMIT 1
            "#
        );
        let existing = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(work_order_id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(row) = existing {
            let invoice = Invoice::try_from(row)?;
            tracing::info!(
                "Work order {} already invoiced as {}",
                work_order.work_order_number,
                invoice.invoice_number
            );
            return Ok(InvoiceCreated {
                id: invoice.id,
                invoice_number: invoice.invoice_number,
                totals: invoice.totals,
                already_existed: true,
            });
        }

        if work_order.status == WorkOrderStatus::Cancelled {
            return Err(DomainError::InvalidTransition {
                from: work_order.status.to_string(),
                to: "invoiced".to_string(),
            }
            .into());
        }

        let items = load_work_order_items(&mut tx, work_order_id).await?;
        if items.is_empty() {
            return Err(DomainError::NoItems("Work order".to_string()).into());
        }

        let (billing, shipping) = match (&work_order.billing_snapshot, work_order.lead_id) {
            (Some(billing), _) => (
                Some(billing.clone()),
                work_order.shipping_snapshot.clone().or_else(|| Some(billing.clone())),
            ),
            (None, Some(lead_id)) => {
                let (billing, shipping) = party_snapshots(&find_lead(&mut tx, lead_id).await?);
                (Some(billing), Some(shipping))
            }
            (None, None) => (None, None),
        };

        let company = load_company_settings(&mut tx).await?;
        let ctx = tax_context(&company, billing.as_ref());
        let lines = invoice_inputs_from_work_order(&items)
            .iter()
            .map(|input| price_invoice_line(input, None, &ctx))
            .collect::<Result<Vec<_>, _>>()?;

        let draft = InvoiceDraft {
            source_type: InvoiceSourceType::WorkOrder,
            source_id: Some(work_order_id),
            lead_id: work_order.lead_id,
            issue_date: Utc::now().date_naive(),
            due_date: None,
            status: InvoiceStatus::Issued,
            notes: work_order.notes.clone(),
            billing_snapshot: billing,
            shipping_snapshot: shipping,
            lines,
        };
        let created = insert_invoice(&mut tx, &draft).await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Get an invoice with its lines and parsed snapshots
    pub async fn get_invoice(&self, id: Uuid) -> AppResult<InvoiceWithItems> {
        let mut conn = self.db.acquire().await?;
        let invoice = load_invoice(&mut conn, id, false).await?;

        let rows = sqlx::query_as::<_, InvoiceItemRow>(
            r#"
            SELECT id, invoice_id, product_id, description, hsn_sac, quantity, unit_price, discount,
                   gst_rate, taxable_amount, cgst_amount, sgst_amount, igst_amount, line_total
            FROM invoice_items
            WHERE invoice_id = $1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(InvoiceWithItems {
            invoice,
            items: rows.into_iter().map(InvoiceItem::from).collect(),
        })
    }

    /// List invoices, newest first
    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Invoice>> {
        let (limit, offset) = pagination.limit_offset();
        let status = filter.status.map(|s| s.as_str());
        let source_type = filter.source_type.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM invoices
            WHERE ($1::VARCHAR IS NULL OR status = $1)
              AND ($2::VARCHAR IS NULL OR source_type = $2)
            "#,
        )
        .bind(status)
        .bind(source_type)
        .fetch_one(&self.db)
        .await?;

        let sql = format!(
            r#"
            SELECT {INVOICE_COLUMNS} FROM invoices
            WHERE ($1::VARCHAR IS NULL OR status = $1)
              AND ($2::VARCHAR IS NULL OR source_type = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(status)
            .bind(source_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        let data = rows
            .into_iter()
            .map(Invoice::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse::new(data, &pagination, total.max(0) as u64))
    }

    /// Change the status of an invoice; cancelled invoices are final
    pub async fn update_status(&self, id: Uuid, status: InvoiceStatus) -> AppResult<Invoice> {
        let mut tx = self.db.begin().await?;

        let invoice = load_invoice(&mut tx, id, true).await?;
        ensure_invoice_transition(invoice.status, status)?;

        sqlx::query("UPDATE invoices SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        let updated = load_invoice(&mut tx, id, false).await?;
        tx.commit().await?;

        tracing::info!("Invoice {} moved from {} to {}", updated.invoice_number, invoice.status, status);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn input(json: serde_json::Value) -> CreateInvoiceInput {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_work_order_source_is_rejected() {
        let input = input(serde_json::json!({
            "source_type": "WORK_ORDER",
            "source_id": Uuid::new_v4(),
            "items": [{ "quantity": "1", "unit_price": "100" }]
        }));
        assert!(matches!(
            ensure_direct_source(&input),
            Err(AppError::Validation { ref field, .. }) if field == "source_type"
        ));
    }

    #[test]
    fn test_storefront_source_requires_billing() {
        let mut input = input(serde_json::json!({
            "source_type": "FRONTEND_ORDER",
            "items": [{ "product_name": "Cold brew", "quantity": "2", "selling_price": "150" }]
        }));
        assert!(ensure_direct_source(&input).is_err());

        input.billing = Some(PartySnapshot::default());
        assert!(ensure_direct_source(&input).is_ok());
        assert_eq!(input.items[0].unit_price, dec("150"));
        assert_eq!(input.items[0].description.as_deref(), Some("Cold brew"));
    }

    #[test]
    fn test_manual_invoice_needs_items() {
        let input = input(serde_json::json!({ "source_type": "MANUAL", "items": [] }));
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_tax_context_uses_billing_state() {
        let company = CompanySettings {
            company_state: "Karnataka".to_string(),
            ..CompanySettings::default()
        };
        let billing = PartySnapshot {
            state: "Maharashtra".to_string(),
            ..PartySnapshot::default()
        };
        assert!(tax_context(&company, Some(&billing)).inter_state);
        assert!(!tax_context(&company, None).inter_state);
    }

    mod persistence {
        use super::*;
        use crate::models::QuotationStatus;
        use crate::services::fixtures::{seed_lead, seed_product, two_line_quotation};
        use crate::services::storefront::{CheckoutInput, StorefrontService};
        use crate::services::{QuotationService, WorkOrderService};

        async fn invoice_count(pool: &PgPool) -> i64 {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices")
                .fetch_one(pool)
                .await
                .unwrap()
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn test_repeated_invoicing_returns_first_invoice(pool: PgPool) {
            let lead_id = seed_lead(&pool).await;
            let biryani = seed_product(&pool, "Veg Biryani", "5").await;
            let raita = seed_product(&pool, "Raita", "12").await;
            let quotations = QuotationService::new(pool.clone());
            let quotation = quotations
                .create_quotation(two_line_quotation(lead_id, biryani, raita))
                .await
                .unwrap();
            quotations.update_status(quotation.id, QuotationStatus::Approved).await.unwrap();
            let work_order = WorkOrderService::new(pool.clone())
                .create_from_quotation(quotation.id)
                .await
                .unwrap();

            let service = InvoiceService::new(pool.clone());
            let first = service.create_from_work_order(work_order.work_order_id).await.unwrap();
            assert!(!first.already_existed);

            let second = service.create_from_work_order(work_order.work_order_id).await.unwrap();
            assert!(second.already_existed);
            assert_eq!(second.id, first.id);
            assert_eq!(second.invoice_number, first.invoice_number);
            assert_eq!(invoice_count(&pool).await, 1);

            let stored = service.get_invoice(first.id).await.unwrap();
            assert_eq!(stored.items.len(), 2);
            assert_eq!(stored.invoice.source_type, InvoiceSourceType::WorkOrder);
            assert_eq!(stored.invoice.totals, first.totals);
            // Default company settings price inclusively, so the line totals carry through
            assert_eq!(first.totals.grand_total, dec("450"));
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn test_storefront_work_order_is_not_invoiced_twice(pool: PgPool) {
            let checkout: CheckoutInput = serde_json::from_value(serde_json::json!({
                "customer": { "first_name": "Asha", "email": "asha@example.com", "state": "Karnataka" },
                "items": [{ "name": "Ginger tea", "qty": "2", "selling_price": "120", "gst_rate": "5" }]
            }))
            .unwrap();
            let order = StorefrontService::new(pool.clone()).checkout(checkout).await.unwrap();

            let replay = InvoiceService::new(pool.clone())
                .create_from_work_order(order.work_order_id)
                .await
                .unwrap();
            assert!(replay.already_existed);
            assert_eq!(replay.id, order.invoice_id);
            assert_eq!(invoice_count(&pool).await, 1);
        }
    }
}
