//! Company, quotation and invoice settings
//!
//! Each settings table holds at most one row. Reads fall back to the defaults
//! of the shared models when the row has not been written yet.

use shared::{validate_gstin, DomainError, NumberingMode, PricingMode, QuotationMode};
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult};
use crate::models::{CompanySettings, InvoiceSettings, NumberingConfig, QuotationSettings};

/// Settings service for reading and upserting business settings
#[derive(Clone)]
pub struct SettingsService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct CompanySettingsRow {
    company_name: String,
    company_state: String,
    gst_number: Option<String>,
    gst_enabled: bool,
    gst_pricing_mode: String,
    currency_code: String,
}

#[derive(Debug, sqlx::FromRow)]
struct QuotationSettingsRow {
    prefix: String,
    sequence_start: i32,
    number_format: String,
    numbering_mode: String,
    quotation_mode: String,
    gst_pricing_mode: String,
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceSettingsRow {
    prefix: String,
    sequence_start: i32,
    number_format: String,
    numbering_mode: String,
}

fn pricing_mode(value: &str) -> AppResult<PricingMode> {
    PricingMode::from_str(value).ok_or_else(|| DomainError::unknown("gst_pricing_mode", value).into())
}

fn numbering_mode(value: &str) -> AppResult<NumberingMode> {
    NumberingMode::from_str(value).ok_or_else(|| DomainError::unknown("numbering_mode", value).into())
}

impl TryFrom<CompanySettingsRow> for CompanySettings {
    type Error = AppError;

    fn try_from(row: CompanySettingsRow) -> AppResult<Self> {
        Ok(CompanySettings {
            gst_pricing_mode: pricing_mode(&row.gst_pricing_mode)?,
            company_name: row.company_name,
            company_state: row.company_state,
            gst_number: row.gst_number,
            gst_enabled: row.gst_enabled,
            currency_code: row.currency_code,
        })
    }
}

impl TryFrom<QuotationSettingsRow> for QuotationSettings {
    type Error = AppError;

    fn try_from(row: QuotationSettingsRow) -> AppResult<Self> {
        let quotation_mode = QuotationMode::from_str(&row.quotation_mode)
            .ok_or_else(|| DomainError::unknown("quotation_mode", &row.quotation_mode))?;
        Ok(QuotationSettings {
            numbering: NumberingConfig {
                numbering_mode: numbering_mode(&row.numbering_mode)?,
                prefix: row.prefix,
                sequence_start: row.sequence_start,
                number_format: row.number_format,
            },
            quotation_mode,
            gst_pricing_mode: pricing_mode(&row.gst_pricing_mode)?,
        })
    }
}

impl TryFrom<InvoiceSettingsRow> for InvoiceSettings {
    type Error = AppError;

    fn try_from(row: InvoiceSettingsRow) -> AppResult<Self> {
        Ok(InvoiceSettings {
            numbering: NumberingConfig {
                numbering_mode: numbering_mode(&row.numbering_mode)?,
                prefix: row.prefix,
                sequence_start: row.sequence_start,
                number_format: row.number_format,
            },
        })
    }
}

/// Read company settings on an open connection
pub async fn load_company_settings(conn: &mut PgConnection) -> AppResult<CompanySettings> {
    let row = sqlx::query_as::<_, CompanySettingsRow>(
        r#"
        SELECT company_name, company_state, gst_number, gst_enabled, gst_pricing_mode, currency_code
        FROM company_settings
        WHERE id = 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => row.try_into(),
        None => Ok(CompanySettings::default()),
    }
}

/// Read quotation settings on an open connection
pub async fn load_quotation_settings(conn: &mut PgConnection) -> AppResult<QuotationSettings> {
    let row = sqlx::query_as::<_, QuotationSettingsRow>(
        r#"
        SELECT prefix, sequence_start, number_format, numbering_mode, quotation_mode, gst_pricing_mode
        FROM quotation_settings
        WHERE id = 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => row.try_into(),
        None => Ok(QuotationSettings::default()),
    }
}

/// Read invoice settings on an open connection
pub async fn load_invoice_settings(conn: &mut PgConnection) -> AppResult<InvoiceSettings> {
    let row = sqlx::query_as::<_, InvoiceSettingsRow>(
        r#"
        SELECT prefix, sequence_start, number_format, numbering_mode
        FROM invoice_settings
        WHERE id = 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => row.try_into(),
        None => Ok(InvoiceSettings::default()),
    }
}

fn validate_numbering(numbering: &NumberingConfig) -> AppResult<()> {
    if numbering.prefix.trim().is_empty() {
        return Err(AppError::Validation {
            field: "prefix".to_string(),
            message: "Prefix cannot be empty".to_string(),
        });
    }
    if numbering.sequence_start < 1 {
        return Err(AppError::Validation {
            field: "sequence_start".to_string(),
            message: "Sequence start must be at least 1".to_string(),
        });
    }
    if !numbering.number_format.contains("{seq}") {
        return Err(AppError::Validation {
            field: "number_format".to_string(),
            message: "Number format must contain {seq}".to_string(),
        });
    }
    Ok(())
}

impl SettingsService {
    /// Create a new SettingsService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_company_settings(&self) -> AppResult<CompanySettings> {
        let mut conn = self.db.acquire().await?;
        load_company_settings(&mut conn).await
    }

    pub async fn get_quotation_settings(&self) -> AppResult<QuotationSettings> {
        let mut conn = self.db.acquire().await?;
        load_quotation_settings(&mut conn).await
    }

    pub async fn get_invoice_settings(&self) -> AppResult<InvoiceSettings> {
        let mut conn = self.db.acquire().await?;
        load_invoice_settings(&mut conn).await
    }

    /// Replace company settings
    pub async fn update_company_settings(&self, input: CompanySettings) -> AppResult<CompanySettings> {
        if let Some(gst_number) = input.gst_number.as_deref().filter(|g| !g.trim().is_empty()) {
            validate_gstin(gst_number).map_err(|m| AppError::Validation {
                field: "gst_number".to_string(),
                message: m.to_string(),
            })?;
        }

        sqlx::query(
            r#"
            INSERT INTO company_settings
                (id, company_name, company_state, gst_number, gst_enabled, gst_pricing_mode, currency_code)
            VALUES (1, $1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                company_name = EXCLUDED.company_name,
                company_state = EXCLUDED.company_state,
                gst_number = EXCLUDED.gst_number,
                gst_enabled = EXCLUDED.gst_enabled,
                gst_pricing_mode = EXCLUDED.gst_pricing_mode,
                currency_code = EXCLUDED.currency_code,
                updated_at = NOW()
            "#,
        )
        .bind(input.company_name.trim())
        .bind(input.company_state.trim())
        .bind(input.gst_number.as_deref().map(|g| g.trim().to_ascii_uppercase()))
        .bind(input.gst_enabled)
        .bind(input.gst_pricing_mode.as_str())
        .bind(&input.currency_code)
        .execute(&self.db)
        .await?;

        tracing::info!("Company settings updated");
        self.get_company_settings().await
    }

    /// Replace quotation settings
    pub async fn update_quotation_settings(&self, input: QuotationSettings) -> AppResult<QuotationSettings> {
        validate_numbering(&input.numbering)?;

        sqlx::query(
            r#"
            INSERT INTO quotation_settings
                (id, prefix, sequence_start, number_format, numbering_mode, quotation_mode, gst_pricing_mode)
            VALUES (1, $1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                prefix = EXCLUDED.prefix,
                sequence_start = EXCLUDED.sequence_start,
                number_format = EXCLUDED.number_format,
                numbering_mode = EXCLUDED.numbering_mode,
                quotation_mode = EXCLUDED.quotation_mode,
                gst_pricing_mode = EXCLUDED.gst_pricing_mode,
                updated_at = NOW()
            "#,
        )
        .bind(input.numbering.prefix.trim())
        .bind(input.numbering.sequence_start)
        .bind(&input.numbering.number_format)
        .bind(input.numbering.numbering_mode.as_str())
        .bind(input.quotation_mode.as_str())
        .bind(input.gst_pricing_mode.as_str())
        .execute(&self.db)
        .await?;

        tracing::info!("Quotation settings updated");
        self.get_quotation_settings().await
    }

    /// Replace invoice settings
    pub async fn update_invoice_settings(&self, input: InvoiceSettings) -> AppResult<InvoiceSettings> {
        validate_numbering(&input.numbering)?;

        sqlx::query(
            r#"
            INSERT INTO invoice_settings (id, prefix, sequence_start, number_format, numbering_mode)
            VALUES (1, $1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                prefix = EXCLUDED.prefix,
                sequence_start = EXCLUDED.sequence_start,
                number_format = EXCLUDED.number_format,
                numbering_mode = EXCLUDED.numbering_mode,
                updated_at = NOW()
            "#,
        )
        .bind(input.numbering.prefix.trim())
        .bind(input.numbering.sequence_start)
        .bind(&input.numbering.number_format)
        .bind(input.numbering.numbering_mode.as_str())
        .execute(&self.db)
        .await?;

        tracing::info!("Invoice settings updated");
        self.get_invoice_settings().await
    }
}
