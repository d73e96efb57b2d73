//! Document sequence allocation
//!
//! Sequences live in `document_sequences`, one counter per document type and
//! scope. Allocation is a single upsert so concurrent writers never receive
//! the same value; the unique document number columns back it up.

use chrono::NaiveDate;
use shared::numbering::{scope_bounds, sequence_scope, DocumentKind};
use shared::NumberingMode;
use sqlx::PgConnection;

use crate::error::AppResult;

/// Table, sequence column and date column that hold issued numbers of a kind
fn issued_numbers(kind: DocumentKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        DocumentKind::Quotation => ("quotations", "quotation_sequence", "quotation_date"),
        DocumentKind::WorkOrder => ("work_orders", "work_order_sequence", "issue_date"),
        DocumentKind::Invoice => ("invoices", "invoice_sequence", "issue_date"),
    }
}

/// Highest sequence already issued within the scope of `date`
async fn max_issued(
    conn: &mut PgConnection,
    kind: DocumentKind,
    mode: NumberingMode,
    date: NaiveDate,
) -> AppResult<Option<i32>> {
    let (table, sequence_column, date_column) = issued_numbers(kind);

    let max = match scope_bounds(mode, date) {
        None => {
            let sql = format!("SELECT MAX({sequence_column}) FROM {table}");
            sqlx::query_scalar::<_, Option<i32>>(&sql)
                .fetch_one(&mut *conn)
                .await?
        }
        Some((start, end)) => {
            let sql = format!(
                "SELECT MAX({sequence_column}) FROM {table} WHERE {date_column} BETWEEN $1 AND $2"
            );
            sqlx::query_scalar::<_, Option<i32>>(&sql)
                .bind(start)
                .bind(end)
                .fetch_one(&mut *conn)
                .await?
        }
    };

    Ok(max)
}

/// Allocate the next sequence value for `kind` in the scope of `date`.
///
/// A fresh counter is seeded from the documents already issued in scope, or
/// from `sequence_start` when there are none.
pub async fn allocate(
    conn: &mut PgConnection,
    kind: DocumentKind,
    mode: NumberingMode,
    sequence_start: i32,
    date: NaiveDate,
) -> AppResult<i32> {
    let scope = sequence_scope(mode, date);
    let seed = shared::numbering::next_sequence(max_issued(conn, kind, mode, date).await?, sequence_start);

    let value = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO document_sequences (document_type, scope, last_value)
        VALUES ($1, $2, $3)
        ON CONFLICT (document_type, scope) DO UPDATE SET
            last_value = GREATEST(document_sequences.last_value + 1, EXCLUDED.last_value),
            updated_at = NOW()
        RETURNING last_value
        "#,
    )
    .bind(kind.as_str())
    .bind(&scope)
    .bind(seed)
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!("Allocated {} sequence {} in scope {}", kind.as_str(), value, scope);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_kind_reads_its_own_table() {
        assert_eq!(issued_numbers(DocumentKind::Quotation).0, "quotations");
        assert_eq!(issued_numbers(DocumentKind::WorkOrder).1, "work_order_sequence");
        assert_eq!(issued_numbers(DocumentKind::Invoice).2, "issue_date");
    }
}
