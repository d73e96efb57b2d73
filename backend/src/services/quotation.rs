//! Quotation service: versioned quotations with frozen item snapshots
//!
//! Every write runs in one transaction. Chain operations lock the rows of the
//! whole version chain before deciding anything.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::lifecycle::{ensure_deletable, ensure_editable, plan_status_change, StatusChange};
use shared::numbering::DocumentKind;
use shared::snapshot::resolve_quotation_item;
use shared::totals::{aggregate_quotation, DocumentDiscount, PricedLine, QuotationTotals};
use shared::versioning::{ensure_revisable, next_version, resolve_root, ChainNode, MAX_CHAIN_DEPTH};
use shared::{
    validate_quotation_header, CostPricingMode, DiscountType, DomainError, PaginatedResponse, Pagination, PricingMode,
    QuotationMode,
};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::directory::{find_lead, find_product};
use super::sequence;
use super::settings::load_quotation_settings;
use crate::error::{AppError, AppResult};
use crate::models::{
    Quotation, QuotationHeaderPatch, QuotationItem, QuotationItemInput, QuotationItemSnapshot, QuotationStatus,
    QuotationWithItems,
};

/// Quotation service for creating, revising and approving quotations
#[derive(Clone)]
pub struct QuotationService {
    db: PgPool,
}

// ============================================================================
// Inputs and responses
// ============================================================================

/// Input for creating a quotation or a new version of one
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuotationInput {
    pub lead_id: Uuid,
    /// Any quotation of an existing chain; the new row becomes its next version
    pub parent_id: Option<Uuid>,
    pub quotation_date: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub quotation_mode: Option<QuotationMode>,
    #[validate(range(min = 1, message = "PAX must be at least 1"))]
    pub pax: Option<i32>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    pub quotation_discount_type: Option<DiscountType>,
    #[serde(default)]
    pub quotation_discount_value: Decimal,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<QuotationItemInput>,
}

/// Input for replacing the items of a quotation
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuotationItemsInput {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<QuotationItemInput>,
}

/// Input for changing the status of a quotation
#[derive(Debug, Deserialize)]
pub struct UpdateQuotationStatusInput {
    pub status: QuotationStatus,
}

/// List filters
#[derive(Debug, Default, Deserialize)]
pub struct QuotationFilter {
    pub status: Option<QuotationStatus>,
    pub lead_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct QuotationCreated {
    pub id: Uuid,
    pub quotation_number: String,
    pub version: i32,
    pub totals: QuotationTotals,
}

#[derive(Debug, Serialize)]
pub struct QuotationTotalsResponse {
    pub id: Uuid,
    pub totals: QuotationTotals,
}

#[derive(Debug, Serialize)]
pub struct QuotationStatusResponse {
    pub id: Uuid,
    pub status: QuotationStatus,
    pub changes: Vec<StatusChange>,
}

/// Quotation list entry with the lead's display name
#[derive(Debug, Clone, Serialize)]
pub struct QuotationSummary {
    pub id: Uuid,
    pub quotation_number: String,
    pub version: i32,
    pub parent_id: Option<Uuid>,
    pub status: QuotationStatus,
    pub is_locked: bool,
    pub lead_id: Uuid,
    pub lead_name: String,
    pub quotation_date: NaiveDate,
    pub quotation_mode: QuotationMode,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Rows
// ============================================================================

const QUOTATION_COLUMNS: &str = r#"
    id, lead_id, quotation_number, quotation_sequence, parent_id, version, status, is_locked,
    quotation_date, valid_until, notes, quotation_mode, pax,
    event_name, event_date, event_time, event_location,
    quotation_discount_type, quotation_discount_value,
    subtotal, item_discount_total, base_amount, total_tax,
    quotation_discount_amount, total_discount, total_amount,
    created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, quotation_id, product_id, variant_id, product_name, variant_sku,
    quantity, selling_price, selling_price_unit, selling_price_qty, discount, tax,
    gst_rate, hsn_sac, cost_price, cost_price_unit, cost_price_qty, cost_pricing_mode,
    cost_discount_percent, attributes_json, packaging_json, line_total
"#;

#[derive(Debug, sqlx::FromRow)]
struct QuotationRow {
    id: Uuid,
    lead_id: Uuid,
    quotation_number: String,
    quotation_sequence: i32,
    parent_id: Option<Uuid>,
    version: i32,
    status: String,
    is_locked: bool,
    quotation_date: NaiveDate,
    valid_until: Option<NaiveDate>,
    notes: Option<String>,
    quotation_mode: String,
    pax: Option<i32>,
    event_name: Option<String>,
    event_date: Option<NaiveDate>,
    event_time: Option<String>,
    event_location: Option<String>,
    quotation_discount_type: Option<String>,
    quotation_discount_value: Decimal,
    subtotal: Decimal,
    item_discount_total: Decimal,
    base_amount: Decimal,
    total_tax: Decimal,
    quotation_discount_amount: Decimal,
    total_discount: Decimal,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn quotation_status(value: &str) -> Result<QuotationStatus, DomainError> {
    QuotationStatus::from_str(value).ok_or_else(|| DomainError::unknown("quotation status", value))
}

fn quotation_mode(value: &str) -> Result<QuotationMode, DomainError> {
    QuotationMode::from_str(value).ok_or_else(|| DomainError::unknown("quotation mode", value))
}

impl TryFrom<QuotationRow> for Quotation {
    type Error = DomainError;

    fn try_from(row: QuotationRow) -> Result<Self, DomainError> {
        let quotation_discount_type = match row.quotation_discount_type.as_deref() {
            Some(value) => {
                Some(DiscountType::from_str(value).ok_or_else(|| DomainError::unknown("discount type", value))?)
            }
            None => None,
        };

        Ok(Quotation {
            id: row.id,
            lead_id: row.lead_id,
            quotation_number: row.quotation_number,
            quotation_sequence: row.quotation_sequence,
            parent_id: row.parent_id,
            version: row.version,
            status: quotation_status(&row.status)?,
            is_locked: row.is_locked,
            quotation_date: row.quotation_date,
            valid_until: row.valid_until,
            notes: row.notes,
            quotation_mode: quotation_mode(&row.quotation_mode)?,
            pax: row.pax,
            event_name: row.event_name,
            event_date: row.event_date,
            event_time: row.event_time,
            event_location: row.event_location,
            quotation_discount_type,
            quotation_discount_value: row.quotation_discount_value,
            totals: QuotationTotals {
                subtotal: row.subtotal,
                item_discount_total: row.item_discount_total,
                base_amount: row.base_amount,
                total_tax: row.total_tax,
                quotation_discount_amount: row.quotation_discount_amount,
                total_discount: row.total_discount,
                total_amount: row.total_amount,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QuotationItemRow {
    id: Uuid,
    quotation_id: Uuid,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    product_name: String,
    variant_sku: Option<String>,
    quantity: Decimal,
    selling_price: Decimal,
    selling_price_unit: String,
    selling_price_qty: Decimal,
    discount: Decimal,
    tax: Decimal,
    gst_rate: Decimal,
    hsn_sac: Option<String>,
    cost_price: Decimal,
    cost_price_unit: String,
    cost_price_qty: Decimal,
    cost_pricing_mode: String,
    cost_discount_percent: Decimal,
    attributes_json: serde_json::Value,
    packaging_json: serde_json::Value,
    line_total: Decimal,
}

impl From<QuotationItemRow> for QuotationItem {
    fn from(row: QuotationItemRow) -> Self {
        QuotationItem {
            id: row.id,
            quotation_id: row.quotation_id,
            snapshot: QuotationItemSnapshot {
                product_id: row.product_id,
                variant_id: row.variant_id,
                product_name: row.product_name,
                variant_sku: row.variant_sku,
                quantity: row.quantity,
                selling_price: row.selling_price,
                selling_price_unit: row.selling_price_unit,
                selling_price_qty: row.selling_price_qty,
                discount: row.discount,
                tax: row.tax,
                gst_rate: row.gst_rate,
                hsn_sac: row.hsn_sac,
                cost_price: row.cost_price,
                cost_price_unit: row.cost_price_unit,
                cost_price_qty: row.cost_price_qty,
                cost_pricing_mode: CostPricingMode::from_str_lossy(&row.cost_pricing_mode),
                cost_discount_percent: row.cost_discount_percent,
                attributes_json: row.attributes_json,
                packaging_json: row.packaging_json,
                line_total: row.line_total,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChainRow {
    id: Uuid,
    parent_id: Option<Uuid>,
    version: i32,
    status: String,
    is_locked: bool,
}

impl TryFrom<ChainRow> for ChainNode {
    type Error = DomainError;

    fn try_from(row: ChainRow) -> Result<Self, DomainError> {
        Ok(ChainNode {
            id: row.id,
            parent_id: row.parent_id,
            version: row.version,
            status: quotation_status(&row.status)?,
            is_locked: row.is_locked,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QuotationSummaryRow {
    id: Uuid,
    quotation_number: String,
    version: i32,
    parent_id: Option<Uuid>,
    status: String,
    is_locked: bool,
    lead_id: Uuid,
    lead_name: Option<String>,
    quotation_date: NaiveDate,
    quotation_mode: String,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuotationSummaryRow> for QuotationSummary {
    type Error = DomainError;

    fn try_from(row: QuotationSummaryRow) -> Result<Self, DomainError> {
        Ok(QuotationSummary {
            id: row.id,
            quotation_number: row.quotation_number,
            version: row.version,
            parent_id: row.parent_id,
            status: quotation_status(&row.status)?,
            is_locked: row.is_locked,
            lead_id: row.lead_id,
            lead_name: row.lead_name.unwrap_or_default().trim().to_string(),
            quotation_date: row.quotation_date,
            quotation_mode: quotation_mode(&row.quotation_mode)?,
            total_amount: row.total_amount,
            created_at: row.created_at,
        })
    }
}

// ============================================================================
// Connection-level helpers shared with work order conversion
// ============================================================================

/// Load one quotation, optionally locking its row for the transaction
pub(crate) async fn load_quotation(conn: &mut PgConnection, id: Uuid, for_update: bool) -> AppResult<Quotation> {
    let sql = format!(
        "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = $1{}",
        if for_update { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query_as::<_, QuotationRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Quotation".to_string()))?;

    Ok(Quotation::try_from(row)?)
}

/// Load the items of a quotation in their stored order
pub(crate) async fn load_items(conn: &mut PgConnection, quotation_id: Uuid) -> AppResult<Vec<QuotationItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM quotation_items WHERE quotation_id = $1 ORDER BY position");
    let rows = sqlx::query_as::<_, QuotationItemRow>(&sql)
        .bind(quotation_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(QuotationItem::from).collect())
}

/// Resolve the root of the chain `id` belongs to
async fn chain_root(conn: &mut PgConnection, id: Uuid) -> AppResult<Uuid> {
    let links = sqlx::query_as::<_, (Uuid, Option<Uuid>)>(
        r#"
        WITH RECURSIVE ancestry AS (
            SELECT id, parent_id, 1 AS depth FROM quotations WHERE id = $1
            UNION ALL
            SELECT q.id, q.parent_id, a.depth + 1
            FROM quotations q
            JOIN ancestry a ON q.id = a.parent_id
            WHERE a.depth <= $2
        )
        SELECT id, parent_id FROM ancestry
        "#,
    )
    .bind(id)
    .bind(MAX_CHAIN_DEPTH as i32)
    .fetch_all(&mut *conn)
    .await?;

    if links.is_empty() {
        return Err(AppError::NotFound("Quotation".to_string()));
    }

    let links: HashMap<Uuid, Option<Uuid>> = links.into_iter().collect();
    Ok(resolve_root(id, &links)?)
}

/// Lock every row of the chain `id` belongs to; returns the root and nodes
async fn lock_chain(conn: &mut PgConnection, id: Uuid) -> AppResult<(Uuid, Vec<ChainNode>)> {
    let root = chain_root(conn, id).await?;

    let rows = sqlx::query_as::<_, ChainRow>(
        r#"
        SELECT id, parent_id, version, status, is_locked
        FROM quotations
        WHERE id = $1 OR parent_id = $1 OR id = $2
        ORDER BY version
        FOR UPDATE
        "#,
    )
    .bind(root)
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let nodes = rows
        .into_iter()
        .map(ChainNode::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((root, nodes))
}

/// Freeze the editor items against the catalog
async fn resolve_items(conn: &mut PgConnection, inputs: &[QuotationItemInput]) -> AppResult<Vec<QuotationItemSnapshot>> {
    let mut items = Vec::with_capacity(inputs.len());
    for input in inputs {
        let product = find_product(conn, input.product_id).await?;
        items.push(resolve_quotation_item(input, &product)?);
    }
    Ok(items)
}

async fn insert_items(conn: &mut PgConnection, quotation_id: Uuid, items: &[QuotationItemSnapshot]) -> AppResult<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO quotation_items (
                quotation_id, position, product_id, variant_id, product_name, variant_sku,
                quantity, selling_price, selling_price_unit, selling_price_qty, discount, tax,
                gst_rate, hsn_sac, cost_price, cost_price_unit, cost_price_qty, cost_pricing_mode,
                cost_discount_percent, attributes_json, packaging_json, line_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                    $19, $20, $21, $22)
            "#,
        )
        .bind(quotation_id)
        .bind(position as i32)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(&item.product_name)
        .bind(&item.variant_sku)
        .bind(item.quantity)
        .bind(item.selling_price)
        .bind(&item.selling_price_unit)
        .bind(item.selling_price_qty)
        .bind(item.discount)
        .bind(item.tax)
        .bind(item.gst_rate)
        .bind(&item.hsn_sac)
        .bind(item.cost_price)
        .bind(&item.cost_price_unit)
        .bind(item.cost_price_qty)
        .bind(item.cost_pricing_mode.as_str())
        .bind(item.cost_discount_percent)
        .bind(&item.attributes_json)
        .bind(&item.packaging_json)
        .bind(item.line_total)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn store_totals(conn: &mut PgConnection, id: Uuid, totals: &QuotationTotals) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE quotations SET
            subtotal = $2, item_discount_total = $3, base_amount = $4, total_tax = $5,
            quotation_discount_amount = $6, total_discount = $7, total_amount = $8,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(totals.subtotal)
    .bind(totals.item_discount_total)
    .bind(totals.base_amount)
    .bind(totals.total_tax)
    .bind(totals.quotation_discount_amount)
    .bind(totals.total_discount)
    .bind(totals.total_amount)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Totals of a quotation header over a set of item snapshots
fn quotation_totals<'a>(
    quotation: &Quotation,
    items: impl IntoIterator<Item = &'a QuotationItemSnapshot>,
    pricing_mode: PricingMode,
) -> AppResult<QuotationTotals> {
    let lines: Vec<PricedLine> = items.into_iter().map(PricedLine::from).collect();
    Ok(aggregate_quotation(
        &lines,
        quotation.quotation_mode,
        quotation.pax,
        quotation.document_discount().as_ref(),
        pricing_mode,
    )?)
}

impl QuotationService {
    /// Create a new QuotationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a quotation, or a new version when `parent_id` is given
    pub async fn create_quotation(&self, input: CreateQuotationInput) -> AppResult<QuotationCreated> {
        input.validate()?;
        validate_quotation_header(input.pax, input.quotation_discount_value)?;

        let mut tx = self.db.begin().await?;

        let settings = load_quotation_settings(&mut tx).await?;
        find_lead(&mut tx, input.lead_id).await?;

        let (parent_id, version) = match input.parent_id {
            Some(parent_id) => {
                let (root, chain) = lock_chain(&mut tx, parent_id).await?;
                ensure_revisable(&chain)?;
                (Some(root), next_version(chain.iter().map(|n| n.version)))
            }
            None => (None, 1),
        };

        let items = resolve_items(&mut tx, &input.items).await?;

        let mode = input.quotation_mode.unwrap_or(settings.quotation_mode);
        let discount = input.quotation_discount_type.map(|kind| DocumentDiscount {
            kind,
            value: input.quotation_discount_value,
        });
        let lines: Vec<PricedLine> = items.iter().map(PricedLine::from).collect();
        let totals = aggregate_quotation(&lines, mode, input.pax, discount.as_ref(), settings.gst_pricing_mode)?;

        let quotation_date = input.quotation_date.unwrap_or_else(|| Utc::now().date_naive());
        let sequence = sequence::allocate(
            &mut tx,
            DocumentKind::Quotation,
            settings.numbering.numbering_mode,
            settings.numbering.sequence_start,
            quotation_date,
        )
        .await?;
        let quotation_number = settings.numbering.format(quotation_date, sequence);

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO quotations (
                lead_id, quotation_number, quotation_sequence, parent_id, version, status, is_locked,
                quotation_date, valid_until, notes, quotation_mode, pax,
                event_name, event_date, event_time, event_location,
                quotation_discount_type, quotation_discount_value,
                subtotal, item_discount_total, base_amount, total_tax,
                quotation_discount_amount, total_discount, total_amount
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', FALSE, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23)
            RETURNING id
            "#,
        )
        .bind(input.lead_id)
        .bind(&quotation_number)
        .bind(sequence)
        .bind(parent_id)
        .bind(version)
        .bind(quotation_date)
        .bind(input.valid_until)
        .bind(&input.notes)
        .bind(mode.as_str())
        .bind(input.pax)
        .bind(&input.event_name)
        .bind(input.event_date)
        .bind(&input.event_time)
        .bind(&input.event_location)
        .bind(input.quotation_discount_type.map(|d| d.as_str()))
        .bind(input.quotation_discount_value)
        .bind(totals.subtotal)
        .bind(totals.item_discount_total)
        .bind(totals.base_amount)
        .bind(totals.total_tax)
        .bind(totals.quotation_discount_amount)
        .bind(totals.total_discount)
        .bind(totals.total_amount)
        .fetch_one(&mut *tx)
        .await?;

        insert_items(&mut tx, id, &items).await?;

        tx.commit().await?;

        tracing::info!(
            "Quotation {} created (version {}, {} items, total {})",
            quotation_number,
            version,
            items.len(),
            totals.total_amount
        );

        Ok(QuotationCreated {
            id,
            quotation_number,
            version,
            totals,
        })
    }

    /// Get a quotation with its items
    pub async fn get_quotation(&self, id: Uuid) -> AppResult<QuotationWithItems> {
        let mut conn = self.db.acquire().await?;
        let quotation = load_quotation(&mut conn, id, false).await?;
        let items = load_items(&mut conn, id).await?;
        Ok(QuotationWithItems { quotation, items })
    }

    /// List quotations, newest first
    pub async fn list_quotations(
        &self,
        filter: QuotationFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<QuotationSummary>> {
        let (limit, offset) = pagination.limit_offset();
        let status = filter.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM quotations
            WHERE ($1::VARCHAR IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR lead_id = $2)
            "#,
        )
        .bind(status)
        .bind(filter.lead_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, QuotationSummaryRow>(
            r#"
            SELECT q.id, q.quotation_number, q.version, q.parent_id, q.status, q.is_locked, q.lead_id,
                   CONCAT_WS(' ', l.first_name, l.last_name) AS lead_name,
                   q.quotation_date, q.quotation_mode, q.total_amount, q.created_at
            FROM quotations q
            LEFT JOIN leads l ON l.id = q.lead_id
            WHERE ($1::VARCHAR IS NULL OR q.status = $1)
              AND ($2::UUID IS NULL OR q.lead_id = $2)
            ORDER BY q.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(filter.lead_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let data = rows
            .into_iter()
            .map(QuotationSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse::new(data, &pagination, total.max(0) as u64))
    }

    /// Every version of the chain `id` belongs to, oldest first
    pub async fn list_versions(&self, id: Uuid) -> AppResult<Vec<Quotation>> {
        let mut conn = self.db.acquire().await?;
        let root = chain_root(&mut conn, id).await?;

        let sql = format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = $1 OR parent_id = $1 ORDER BY version, created_at"
        );
        let rows = sqlx::query_as::<_, QuotationRow>(&sql)
            .bind(root)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(Quotation::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Merge a header patch and recompute totals
    pub async fn update_header(&self, id: Uuid, patch: QuotationHeaderPatch) -> AppResult<QuotationTotalsResponse> {
        let mut tx = self.db.begin().await?;

        let mut quotation = load_quotation(&mut tx, id, true).await?;
        ensure_editable(quotation.is_locked)?;

        let lead_changed = patch.lead_id.is_some_and(|lead_id| lead_id != quotation.lead_id);
        quotation.apply_patch(patch);
        validate_quotation_header(quotation.pax, quotation.quotation_discount_value)?;
        if lead_changed {
            find_lead(&mut tx, quotation.lead_id).await?;
        }

        let settings = load_quotation_settings(&mut tx).await?;
        let items = load_items(&mut tx, id).await?;
        let totals = quotation_totals(&quotation, items.iter().map(|i| &i.snapshot), settings.gst_pricing_mode)?;

        sqlx::query(
            r#"
            UPDATE quotations SET
                lead_id = $2, quotation_date = $3, valid_until = $4, notes = $5, pax = $6,
                event_name = $7, event_date = $8, event_time = $9, event_location = $10,
                quotation_discount_type = $11, quotation_discount_value = $12,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(quotation.lead_id)
        .bind(quotation.quotation_date)
        .bind(quotation.valid_until)
        .bind(&quotation.notes)
        .bind(quotation.pax)
        .bind(&quotation.event_name)
        .bind(quotation.event_date)
        .bind(&quotation.event_time)
        .bind(&quotation.event_location)
        .bind(quotation.quotation_discount_type.map(|d| d.as_str()))
        .bind(quotation.quotation_discount_value)
        .execute(&mut *tx)
        .await?;

        store_totals(&mut tx, id, &totals).await?;

        tx.commit().await?;

        tracing::info!("Quotation {} header updated", quotation.quotation_number);
        Ok(QuotationTotalsResponse { id, totals })
    }

    /// Replace all items of an unlocked quotation
    pub async fn update_items(&self, id: Uuid, input: UpdateQuotationItemsInput) -> AppResult<QuotationTotalsResponse> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let quotation = load_quotation(&mut tx, id, true).await?;
        ensure_editable(quotation.is_locked)?;

        let items = resolve_items(&mut tx, &input.items).await?;
        let settings = load_quotation_settings(&mut tx).await?;
        let totals = quotation_totals(&quotation, &items, settings.gst_pricing_mode)?;

        sqlx::query("DELETE FROM quotation_items WHERE quotation_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, id, &items).await?;
        store_totals(&mut tx, id, &totals).await?;

        tx.commit().await?;

        tracing::info!("Quotation {} items replaced ({} items)", quotation.quotation_number, items.len());
        Ok(QuotationTotalsResponse { id, totals })
    }

    /// Move a quotation to a new status; approval settles the whole chain
    pub async fn update_status(&self, id: Uuid, status: QuotationStatus) -> AppResult<QuotationStatusResponse> {
        let mut tx = self.db.begin().await?;

        let (_, chain) = lock_chain(&mut tx, id).await?;
        let changes = plan_status_change(id, &chain, status)?;

        for change in &changes {
            sqlx::query("UPDATE quotations SET status = $2, is_locked = $3, updated_at = NOW() WHERE id = $1")
                .bind(change.id)
                .bind(change.status.as_str())
                .bind(change.is_locked)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        if status == QuotationStatus::Approved {
            tracing::info!(
                "Quotation {} approved; {} other versions rejected",
                id,
                changes.len().saturating_sub(1)
            );
        } else {
            tracing::info!("Quotation {} set to {}", id, status);
        }

        Ok(QuotationStatusResponse { id, status, changes })
    }

    /// Delete an unlocked quotation and its items
    pub async fn delete_quotation(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let quotation = load_quotation(&mut tx, id, true).await?;
        ensure_deletable(quotation.is_locked)?;

        let revisions = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quotations WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if revisions > 0 {
            return Err(AppError::Conflict {
                resource: "quotation".to_string(),
                message: "Quotation has later versions and cannot be deleted".to_string(),
            });
        }

        sqlx::query("DELETE FROM quotation_items WHERE quotation_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM quotations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Quotation {} deleted", quotation.quotation_number);
        Ok(())
    }
}
