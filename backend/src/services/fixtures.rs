//! Seed rows for database-backed service tests

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use super::quotation::CreateQuotationInput;

pub(crate) async fn seed_lead(pool: &PgPool) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO leads (first_name, last_name, email, billing_address, billing_city, billing_state)
        VALUES ('Asha', 'Rao', 'asha@example.com', '12 MG Road', 'Bengaluru', 'Karnataka')
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

pub(crate) async fn seed_product(pool: &PgPool, name: &str, gst_rate: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO products (name, sku, gst_rate, hsn_sac) VALUES ($1, $2, $3, '996331') RETURNING id",
    )
    .bind(name)
    .bind(name.to_uppercase().replace(' ', "-"))
    .bind(Decimal::from_str(gst_rate).unwrap())
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Two-line general quotation for `lead_id`
pub(crate) fn two_line_quotation(lead_id: Uuid, biryani: Uuid, raita: Uuid) -> CreateQuotationInput {
    serde_json::from_value(serde_json::json!({
        "lead_id": lead_id,
        "items": [
            { "product_id": biryani, "quantity": "2", "unit_price": "150", "discount": "10" },
            { "product_id": raita, "quantity": "4", "unit_price": "40" }
        ]
    }))
    .unwrap()
}
