//! Work order service: conversion of approved quotations
//!
//! A quotation converts at most once. Work order lines and party snapshots
//! are frozen copies; nothing here reads the catalog.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::lifecycle::{conversion_decision, ensure_work_order_transition, ConversionDecision};
use shared::numbering::{work_order_number, DocumentKind};
use shared::snapshot::{party_snapshots, work_order_lines, work_order_total};
use shared::{DomainError, NumberingMode, PaginatedResponse, Pagination, QuotationMode};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::directory::find_lead;
use super::quotation::{load_items, load_quotation};
use super::sequence;
use crate::error::{AppError, AppResult};
use crate::models::{PartySnapshot, WorkOrder, WorkOrderItem, WorkOrderLine, WorkOrderStatus, WorkOrderWithItems};

/// Work order service for conversions and status tracking
#[derive(Clone)]
pub struct WorkOrderService {
    db: PgPool,
}

/// Result of a conversion request
#[derive(Debug, Serialize)]
pub struct WorkOrderConversion {
    pub work_order_id: Uuid,
    pub work_order_number: String,
    pub already_existed: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkOrderStatusInput {
    pub status: WorkOrderStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
}

/// Header values of a work order about to be written
pub(crate) struct NewWorkOrder {
    pub quotation_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
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
}

const WORK_ORDER_COLUMNS: &str = r#"
    id, work_order_number, work_order_sequence, quotation_id, lead_id, status, issue_date,
    customer_name, notes, quotation_mode, pax, event_name, event_date, event_time, event_location,
    billing_snapshot, shipping_snapshot, total_amount, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct WorkOrderRow {
    id: Uuid,
    work_order_number: String,
    work_order_sequence: i32,
    quotation_id: Option<Uuid>,
    lead_id: Option<Uuid>,
    status: String,
    issue_date: NaiveDate,
    customer_name: String,
    notes: Option<String>,
    quotation_mode: String,
    pax: Option<i32>,
    event_name: Option<String>,
    event_date: Option<NaiveDate>,
    event_time: Option<String>,
    event_location: Option<String>,
    billing_snapshot: Option<Json<PartySnapshot>>,
    shipping_snapshot: Option<Json<PartySnapshot>>,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WorkOrderRow> for WorkOrder {
    type Error = DomainError;

    fn try_from(row: WorkOrderRow) -> Result<Self, DomainError> {
        Ok(WorkOrder {
            id: row.id,
            work_order_number: row.work_order_number,
            work_order_sequence: row.work_order_sequence,
            quotation_id: row.quotation_id,
            lead_id: row.lead_id,
            status: WorkOrderStatus::from_str(&row.status)
                .ok_or_else(|| DomainError::unknown("work order status", &row.status))?,
            issue_date: row.issue_date,
            customer_name: row.customer_name,
            notes: row.notes,
            quotation_mode: QuotationMode::from_str(&row.quotation_mode)
                .ok_or_else(|| DomainError::unknown("quotation mode", &row.quotation_mode))?,
            pax: row.pax,
            event_name: row.event_name,
            event_date: row.event_date,
            event_time: row.event_time,
            event_location: row.event_location,
            billing_snapshot: row.billing_snapshot.map(|s| s.0),
            shipping_snapshot: row.shipping_snapshot.map(|s| s.0),
            total_amount: row.total_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WorkOrderItemRow {
    id: Uuid,
    work_order_id: Uuid,
    product_id: Option<Uuid>,
    variant_id: Option<Uuid>,
    description: String,
    variant_sku: Option<String>,
    quantity: Decimal,
    unit_price: Decimal,
    discount: Decimal,
    tax: Decimal,
    gst_rate: Decimal,
    hsn_sac: Option<String>,
    line_total: Decimal,
}

impl From<WorkOrderItemRow> for WorkOrderItem {
    fn from(row: WorkOrderItemRow) -> Self {
        WorkOrderItem {
            id: row.id,
            work_order_id: row.work_order_id,
            line: WorkOrderLine {
                product_id: row.product_id,
                variant_id: row.variant_id,
                description: row.description,
                variant_sku: row.variant_sku,
                quantity: row.quantity,
                unit_price: row.unit_price,
                discount: row.discount,
                tax: row.tax,
                gst_rate: row.gst_rate,
                hsn_sac: row.hsn_sac,
                line_total: row.line_total,
            },
        }
    }
}

/// Load one work order, optionally locking its row
pub(crate) async fn load_work_order(conn: &mut PgConnection, id: Uuid, for_update: bool) -> AppResult<WorkOrder> {
    let sql = format!(
        "SELECT {WORK_ORDER_COLUMNS} FROM work_orders WHERE id = $1{}",
        if for_update { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Work order".to_string()))?;

    Ok(WorkOrder::try_from(row)?)
}

/// Load the lines of a work order in their stored order
pub(crate) async fn load_work_order_items(conn: &mut PgConnection, work_order_id: Uuid) -> AppResult<Vec<WorkOrderItem>> {
    let rows = sqlx::query_as::<_, WorkOrderItemRow>(
        r#"
        SELECT id, work_order_id, product_id, variant_id, description, variant_sku,
               quantity, unit_price, discount, tax, gst_rate, hsn_sac, line_total
        FROM work_order_items
        WHERE work_order_id = $1
        ORDER BY position
        "#,
    )
    .bind(work_order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(WorkOrderItem::from).collect())
}

/// Number and insert a work order with its lines; returns its id and number
pub(crate) async fn insert_work_order(
    conn: &mut PgConnection,
    header: &NewWorkOrder,
    lines: &[WorkOrderLine],
) -> AppResult<(Uuid, String)> {
    let sequence = sequence::allocate(conn, DocumentKind::WorkOrder, NumberingMode::Continuous, 1, header.issue_date).await?;
    let number = work_order_number(header.issue_date, sequence);

    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO work_orders (
            work_order_number, work_order_sequence, quotation_id, lead_id, status, issue_date,
            customer_name, notes, quotation_mode, pax, event_name, event_date, event_time,
            event_location, billing_snapshot, shipping_snapshot, total_amount
        )
        VALUES ($1, $2, $3, $4, 'issued', $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING id
        "#,
    )
    .bind(&number)
    .bind(sequence)
    .bind(header.quotation_id)
    .bind(header.lead_id)
    .bind(header.issue_date)
    .bind(&header.customer_name)
    .bind(&header.notes)
    .bind(header.quotation_mode.as_str())
    .bind(header.pax)
    .bind(&header.event_name)
    .bind(header.event_date)
    .bind(&header.event_time)
    .bind(&header.event_location)
    .bind(header.billing_snapshot.clone().map(Json))
    .bind(header.shipping_snapshot.clone().map(Json))
    .bind(work_order_total(lines))
    .fetch_one(&mut *conn)
    .await?;

    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO work_order_items (
                work_order_id, position, product_id, variant_id, description, variant_sku,
                quantity, unit_price, discount, tax, gst_rate, hsn_sac, line_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(id)
        .bind(position as i32)
        .bind(line.product_id)
        .bind(line.variant_id)
        .bind(&line.description)
        .bind(&line.variant_sku)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.discount)
        .bind(line.tax)
        .bind(line.gst_rate)
        .bind(&line.hsn_sac)
        .bind(line.line_total)
        .execute(&mut *conn)
        .await?;
    }

    Ok((id, number))
}

impl WorkOrderService {
    /// Create a new WorkOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Convert an approved quotation into a work order.
    ///
    /// Repeated calls return the work order created by the first one.
    pub async fn create_from_quotation(&self, quotation_id: Uuid) -> AppResult<WorkOrderConversion> {
        let mut tx = self.db.begin().await?;

        // Locking the quotation serializes concurrent conversions
        let quotation = load_quotation(&mut tx, quotation_id, true).await?;

        let existing = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, work_order_number FROM work_orders WHERE quotation_id = $1",
        )
        .bind(quotation_id)
        .fetch_optional(&mut *tx)
        .await?;

        let items = load_items(&mut tx, quotation_id).await?;

        match conversion_decision(existing, quotation.status, items.len())? {
            ConversionDecision::Existing {
                work_order_id,
                work_order_number,
            } => {
                tracing::info!(
                    "Quotation {} already converted to {}",
                    quotation.quotation_number,
                    work_order_number
                );
                return Ok(WorkOrderConversion {
                    work_order_id,
                    work_order_number,
                    already_existed: true,
                });
            }
            ConversionDecision::Create => {}
        }

        let lead = find_lead(&mut tx, quotation.lead_id).await?;
        let (billing, shipping) = party_snapshots(&lead);
        let lines = work_order_lines(&items, quotation.quotation_mode, quotation.pax)?;

        let customer_name = if billing.name.is_empty() {
            billing.company.clone()
        } else {
            billing.name.clone()
        };

        let header = NewWorkOrder {
            quotation_id: Some(quotation.id),
            lead_id: Some(quotation.lead_id),
            issue_date: Utc::now().date_naive(),
            customer_name,
            notes: quotation.notes.clone(),
            quotation_mode: quotation.quotation_mode,
            pax: quotation.pax,
            event_name: quotation.event_name.clone(),
            event_date: quotation.event_date,
            event_time: quotation.event_time.clone(),
            event_location: quotation.event_location.clone(),
            billing_snapshot: Some(billing),
            shipping_snapshot: Some(shipping),
        };

        let (work_order_id, work_order_number) = insert_work_order(&mut tx, &header, &lines).await?;

        sqlx::query("UPDATE quotations SET status = 'converted', is_locked = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(quotation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Quotation {} converted to work order {} ({} lines)",
            quotation.quotation_number,
            work_order_number,
            lines.len()
        );

        Ok(WorkOrderConversion {
            work_order_id,
            work_order_number,
            already_existed: false,
        })
    }

    /// Get a work order with its lines
    pub async fn get_work_order(&self, id: Uuid) -> AppResult<WorkOrderWithItems> {
        let mut conn = self.db.acquire().await?;
        let work_order = load_work_order(&mut conn, id, false).await?;
        let items = load_work_order_items(&mut conn, id).await?;
        Ok(WorkOrderWithItems { work_order, items })
    }

    /// List work orders, newest first
    pub async fn list_work_orders(
        &self,
        filter: WorkOrderFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<WorkOrder>> {
        let (limit, offset) = pagination.limit_offset();
        let status = filter.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM work_orders WHERE ($1::VARCHAR IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let sql = format!(
            r#"
            SELECT {WORK_ORDER_COLUMNS} FROM work_orders
            WHERE ($1::VARCHAR IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        let data = rows
            .into_iter()
            .map(WorkOrder::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse::new(data, &pagination, total.max(0) as u64))
    }

    /// Move a work order to a new status; completed and cancelled are final
    pub async fn update_status(&self, id: Uuid, status: WorkOrderStatus) -> AppResult<WorkOrder> {
        let mut tx = self.db.begin().await?;

        let work_order = load_work_order(&mut tx, id, true).await?;
        ensure_work_order_transition(work_order.status, status)?;

        sqlx::query("UPDATE work_orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        let updated = load_work_order(&mut tx, id, false).await?;
        tx.commit().await?;

        tracing::info!(
            "Work order {} moved from {} to {}",
            updated.work_order_number,
            work_order.status,
            status
        );
        Ok(updated)
    }
}
