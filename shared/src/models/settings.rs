//! Company, quotation and invoice settings read by the pipeline

use serde::{Deserialize, Serialize};

use crate::types::{NumberingMode, PricingMode, QuotationMode};

/// Document numbering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumberingConfig {
    pub prefix: String,
    pub sequence_start: i32,
    /// Template with `{prefix}`, `{year}`, `{month}` and `{seq}` placeholders
    pub number_format: String,
    pub numbering_mode: NumberingMode,
}

impl NumberingConfig {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            sequence_start: 1,
            number_format: crate::numbering::DEFAULT_NUMBER_FORMAT.to_string(),
            numbering_mode: NumberingMode::Continuous,
        }
    }
}

/// Company-wide tax settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanySettings {
    pub company_name: String,
    /// State of registration, compared case-insensitively with billing states
    pub company_state: String,
    pub gst_number: Option<String>,
    /// When false every line is priced at a 0% rate
    pub gst_enabled: bool,
    pub gst_pricing_mode: PricingMode,
    pub currency_code: String,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            company_state: String::new(),
            gst_number: None,
            gst_enabled: true,
            gst_pricing_mode: PricingMode::Inclusive,
            currency_code: "INR".to_string(),
        }
    }
}

/// Quotation numbering and pricing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotationSettings {
    #[serde(flatten)]
    pub numbering: NumberingConfig,
    pub quotation_mode: QuotationMode,
    pub gst_pricing_mode: PricingMode,
}

impl Default for QuotationSettings {
    fn default() -> Self {
        Self {
            numbering: NumberingConfig::with_prefix("QT"),
            quotation_mode: QuotationMode::General,
            gst_pricing_mode: PricingMode::Exclusive,
        }
    }
}

/// Invoice numbering settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvoiceSettings {
    #[serde(flatten)]
    pub numbering: NumberingConfig,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            numbering: NumberingConfig::with_prefix("INV"),
        }
    }
}
