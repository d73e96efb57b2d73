//! Common types used across the billing pipeline

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;

/// Round a money amount to 2 decimal places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// How a selling price relates to GST
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PricingMode {
    /// Price already contains GST; tax is backed out of the gross amount
    Inclusive,
    /// GST is added on top of the price
    Exclusive,
}

impl PricingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingMode::Inclusive => "INCLUSIVE",
            PricingMode::Exclusive => "EXCLUSIVE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCLUSIVE" => Some(PricingMode::Inclusive),
            "EXCLUSIVE" => Some(PricingMode::Exclusive),
            _ => None,
        }
    }
}

impl std::fmt::Display for PricingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quotation pricing convention
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuotationMode {
    #[default]
    General,
    /// Per-head pricing; every aggregate is multiplied by pax
    Catering,
}

impl QuotationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationMode::General => "GENERAL",
            QuotationMode::Catering => "CATERING",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GENERAL" => Some(QuotationMode::General),
            "CATERING" => Some(QuotationMode::Catering),
            _ => None,
        }
    }

    /// Multiplier applied to line quantities and totals
    pub fn pax_factor(&self, pax: Option<i32>) -> Result<Decimal, DomainError> {
        match self {
            QuotationMode::General => Ok(Decimal::ONE),
            QuotationMode::Catering => match pax {
                Some(p) if p >= 1 => Ok(Decimal::from(p)),
                _ => Err(DomainError::validation(
                    "pax",
                    "PAX of at least 1 is required for catering quotations",
                )),
            },
        }
    }
}

/// Document-level discount kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountType {
    Percent,
    Flat,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percent => "PERCENT",
            DiscountType::Flat => "FLAT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERCENT" => Some(DiscountType::Percent),
            "FLAT" => Some(DiscountType::Flat),
            _ => None,
        }
    }
}

/// Scope in which document sequence numbers restart
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumberingMode {
    #[default]
    Continuous,
    Yearly,
    Monthly,
}

impl NumberingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberingMode::Continuous => "continuous",
            NumberingMode::Yearly => "yearly",
            NumberingMode::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Some(NumberingMode::Continuous),
            "yearly" => Some(NumberingMode::Yearly),
            "monthly" => Some(NumberingMode::Monthly),
            _ => None,
        }
    }
}

/// How a catalog cost price is expressed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CostPricingMode {
    #[default]
    Absolute,
    Percentage,
}

impl CostPricingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostPricingMode::Absolute => "absolute",
            CostPricingMode::Percentage => "percentage",
        }
    }

    /// Anything other than `percentage` is treated as absolute
    pub fn from_str_lossy(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("percentage") {
            CostPricingMode::Percentage
        } else {
            CostPricingMode::Absolute
        }
    }
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    /// Clamp to sane bounds and return (limit, offset)
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.clamp(1, 100) as i64;
        let page = self.page.max(1) as i64;
        (per_page, (page - 1) * per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, pagination: &Pagination, total_items: u64) -> Self {
        let (per_page, _) = pagination.limit_offset();
        let total_pages = ((total_items as i64 + per_page - 1) / per_page) as u32;
        Self {
            data,
            pagination: PaginationMeta {
                page: pagination.page.max(1),
                per_page: per_page as u32,
                total_items,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(Decimal::from_str("2.345").unwrap()), Decimal::from_str("2.35").unwrap());
        assert_eq!(round_money(Decimal::from_str("2.344").unwrap()), Decimal::from_str("2.34").unwrap());
        assert_eq!(round_money(Decimal::from_str("-2.345").unwrap()), Decimal::from_str("-2.35").unwrap());
    }

    #[test]
    fn test_pricing_mode_parsing_is_case_insensitive() {
        assert_eq!(PricingMode::from_str("inclusive"), Some(PricingMode::Inclusive));
        assert_eq!(PricingMode::from_str(" EXCLUSIVE "), Some(PricingMode::Exclusive));
        assert_eq!(PricingMode::from_str("gross"), None);
    }

    #[test]
    fn test_pax_factor() {
        assert_eq!(QuotationMode::General.pax_factor(None).unwrap(), Decimal::ONE);
        assert_eq!(QuotationMode::General.pax_factor(Some(30)).unwrap(), Decimal::ONE);
        assert_eq!(QuotationMode::Catering.pax_factor(Some(50)).unwrap(), Decimal::from(50));
        assert!(QuotationMode::Catering.pax_factor(Some(0)).is_err());
        assert!(QuotationMode::Catering.pax_factor(None).is_err());
    }

    #[test]
    fn test_cost_pricing_mode_lossy() {
        assert_eq!(CostPricingMode::from_str_lossy("PERCENTAGE"), CostPricingMode::Percentage);
        assert_eq!(CostPricingMode::from_str_lossy("whatever"), CostPricingMode::Absolute);
    }

    #[test]
    fn test_pagination_limit_offset() {
        let p = Pagination { page: 3, per_page: 10 };
        assert_eq!(p.limit_offset(), (10, 20));
        let p = Pagination { page: 0, per_page: 1000 };
        assert_eq!(p.limit_offset(), (100, 0));
    }

    #[test]
    fn test_double_option_distinguishes_null() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            notes: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.notes, None);
        let null: Patch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(null.notes, Some(None));
        let set: Patch = serde_json::from_str(r#"{"notes": "x"}"#).unwrap();
        assert_eq!(set.notes, Some(Some("x".to_string())));
    }
}
