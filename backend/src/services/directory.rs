//! Catalog and lead lookups
//!
//! Products and leads are owned by other modules; the billing pipeline only
//! reads them to take snapshots, and upserts leads for storefront orders.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Lead, PartySnapshot, Product};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    sku: Option<String>,
    cost_price: Option<Decimal>,
    cost_price_unit: Option<String>,
    cost_price_qty: Option<Decimal>,
    cost_pricing_mode: Option<String>,
    cost_discount_percent: Option<Decimal>,
    gst_rate: Option<Decimal>,
    hsn_sac: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            sku: row.sku,
            cost_price: row.cost_price,
            cost_price_unit: row.cost_price_unit,
            cost_price_qty: row.cost_price_qty,
            cost_pricing_mode: row.cost_pricing_mode,
            cost_discount_percent: row.cost_discount_percent,
            gst_rate: row.gst_rate,
            hsn_sac: row.hsn_sac,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    company_name: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
    gst_number: Option<String>,
    billing_address: Option<String>,
    billing_landmark: Option<String>,
    billing_city: Option<String>,
    billing_state: Option<String>,
    billing_pincode: Option<String>,
    shipping_address: Option<String>,
    shipping_landmark: Option<String>,
    shipping_city: Option<String>,
    shipping_state: Option<String>,
    shipping_pincode: Option<String>,
}

impl From<LeadRow> for Lead {
    fn from(row: LeadRow) -> Self {
        Lead {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            company_name: row.company_name,
            email: row.email,
            phone_number: row.phone_number,
            gst_number: row.gst_number,
            billing_address: row.billing_address,
            billing_landmark: row.billing_landmark,
            billing_city: row.billing_city,
            billing_state: row.billing_state,
            billing_pincode: row.billing_pincode,
            shipping_address: row.shipping_address,
            shipping_landmark: row.shipping_landmark,
            shipping_city: row.shipping_city,
            shipping_state: row.shipping_state,
            shipping_pincode: row.shipping_pincode,
        }
    }
}

const LEAD_COLUMNS: &str = r#"
    id, first_name, last_name, company_name, email, phone_number, gst_number,
    billing_address, billing_landmark, billing_city, billing_state, billing_pincode,
    shipping_address, shipping_landmark, shipping_city, shipping_state, shipping_pincode
"#;

/// Read a product for snapshotting
pub async fn find_product(conn: &mut PgConnection, product_id: Uuid) -> AppResult<Product> {
    sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, sku, cost_price, cost_price_unit, cost_price_qty,
               cost_pricing_mode, cost_discount_percent, gst_rate, hsn_sac
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .map(Product::from)
    .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))
}

/// Read a product when a line references one
pub async fn find_optional_product(conn: &mut PgConnection, product_id: Option<Uuid>) -> AppResult<Option<Product>> {
    match product_id {
        Some(id) => find_product(conn, id).await.map(Some),
        None => Ok(None),
    }
}

/// Read a lead by id
pub async fn find_lead(conn: &mut PgConnection, lead_id: Uuid) -> AppResult<Lead> {
    let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1");
    sqlx::query_as::<_, LeadRow>(&sql)
        .bind(lead_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Lead::from)
        .ok_or_else(|| AppError::NotFound("Lead".to_string()))
}

/// Create or refresh a lead from storefront billing and shipping blocks, keyed by email
pub async fn upsert_lead_by_email(
    conn: &mut PgConnection,
    billing: &PartySnapshot,
    shipping: &PartySnapshot,
) -> AppResult<Lead> {
    let email = billing.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::Validation {
            field: "email".to_string(),
            message: "Customer email is required".to_string(),
        });
    }

    let (first_name, last_name) = match billing.name.trim().split_once(' ') {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (billing.name.trim().to_string(), String::new()),
    };

    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM leads WHERE LOWER(email) = $1 FOR UPDATE")
        .bind(&email)
        .fetch_optional(&mut *conn)
        .await?;

    let lead_id = match existing {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE leads SET
                    first_name = $2, last_name = NULLIF($3, ''), company_name = NULLIF($4, ''),
                    phone_number = NULLIF($5, ''), gst_number = NULLIF($6, ''),
                    billing_address = $7, billing_landmark = $8, billing_city = $9,
                    billing_state = $10, billing_pincode = $11,
                    shipping_address = $12, shipping_landmark = $13, shipping_city = $14,
                    shipping_state = $15, shipping_pincode = $16, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&first_name)
            .bind(&last_name)
            .bind(&billing.company)
            .bind(&billing.phone)
            .bind(&billing.gst)
            .bind(&billing.address)
            .bind(&billing.landmark)
            .bind(&billing.city)
            .bind(&billing.state)
            .bind(&billing.pincode)
            .bind(&shipping.address)
            .bind(&shipping.landmark)
            .bind(&shipping.city)
            .bind(&shipping.state)
            .bind(&shipping.pincode)
            .execute(&mut *conn)
            .await?;
            id
        }
        None => {
            sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO leads (first_name, last_name, company_name, email, phone_number, gst_number,
                                   billing_address, billing_landmark, billing_city, billing_state,
                                   billing_pincode, shipping_address, shipping_landmark, shipping_city,
                                   shipping_state, shipping_pincode, source)
                VALUES ($1, NULLIF($2, ''), NULLIF($3, ''), $4, NULLIF($5, ''), NULLIF($6, ''),
                        $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 'storefront')
                RETURNING id
                "#,
            )
            .bind(&first_name)
            .bind(&last_name)
            .bind(&billing.company)
            .bind(&email)
            .bind(&billing.phone)
            .bind(&billing.gst)
            .bind(&billing.address)
            .bind(&billing.landmark)
            .bind(&billing.city)
            .bind(&billing.state)
            .bind(&billing.pincode)
            .bind(&shipping.address)
            .bind(&shipping.landmark)
            .bind(&shipping.city)
            .bind(&shipping.state)
            .bind(&shipping.pincode)
            .fetch_one(&mut *conn)
            .await?
        }
    };

    find_lead(conn, lead_id).await
}
