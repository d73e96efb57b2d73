//! GST line calculator
//!
//! Computes taxable value and the CGST/SGST or IGST split for a single line
//! under either pricing convention. Intermediate arithmetic is exact; money
//! values are rounded half-up to 2 decimal places only on output.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::CompanySettings;
use crate::types::{round_money, PricingMode};

/// Tax breakdown of a single document line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LineTax {
    pub taxable_amount: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_amount: Decimal,
    pub igst_amount: Decimal,
    pub line_total: Decimal,
}

impl LineTax {
    /// Total GST on the line regardless of jurisdiction
    pub fn tax_amount(&self) -> Decimal {
        self.cgst_amount + self.sgst_amount + self.igst_amount
    }
}

/// Whether a sale crosses a state boundary.
///
/// States are compared trimmed and case-insensitively. A missing state on
/// either side is treated as intra-state.
pub fn is_inter_state(company_state: &str, billing_state: &str) -> bool {
    let company = company_state.trim();
    let billing = billing_state.trim();
    if company.is_empty() || billing.is_empty() {
        return false;
    }
    company.to_lowercase() != billing.to_lowercase()
}

/// Split a gross amount into (taxable, tax) without rounding
pub fn split_gross(gross: Decimal, gst_rate: Decimal, mode: PricingMode) -> (Decimal, Decimal) {
    if gst_rate.is_zero() {
        return (gross, Decimal::ZERO);
    }
    let rate = gst_rate / Decimal::ONE_HUNDRED;
    match mode {
        PricingMode::Inclusive => {
            let taxable = gross / (Decimal::ONE + rate);
            (taxable, gross - taxable)
        }
        PricingMode::Exclusive => (gross, gross * rate),
    }
}

/// Calculate GST for `quantity × unit_price` at `gst_rate` percent.
///
/// Callers validate `quantity > 0` and `unit_price >= 0` beforehand.
pub fn calculate_line(
    quantity: Decimal,
    unit_price: Decimal,
    gst_rate: Decimal,
    mode: PricingMode,
    inter_state: bool,
) -> LineTax {
    calculate_amount(quantity * unit_price, gst_rate, mode, inter_state)
}

/// Calculate GST for a gross line amount
pub fn calculate_amount(gross: Decimal, gst_rate: Decimal, mode: PricingMode, inter_state: bool) -> LineTax {
    let (taxable_raw, tax_raw) = split_gross(gross, gst_rate, mode);

    // Rounded components always reconstruct the rounded line total
    let (taxable_amount, tax, line_total) = match mode {
        PricingMode::Inclusive => {
            let line_total = round_money(gross);
            let taxable = round_money(taxable_raw);
            (taxable, line_total - taxable, line_total)
        }
        PricingMode::Exclusive => {
            let taxable = round_money(taxable_raw);
            let tax = round_money(tax_raw);
            (taxable, tax, taxable + tax)
        }
    };

    let (cgst_amount, sgst_amount, igst_amount) = if inter_state {
        (Decimal::ZERO, Decimal::ZERO, tax)
    } else {
        let cgst = round_money(tax / Decimal::TWO);
        (cgst, tax - cgst, Decimal::ZERO)
    };

    LineTax {
        taxable_amount,
        cgst_amount,
        sgst_amount,
        igst_amount,
        line_total,
    }
}

/// Pricing context of one document: convention, jurisdiction and GST switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxContext {
    pub pricing_mode: PricingMode,
    pub inter_state: bool,
    pub gst_enabled: bool,
}

impl TaxContext {
    pub fn new(settings: &CompanySettings, billing_state: &str) -> Self {
        Self {
            pricing_mode: settings.gst_pricing_mode,
            inter_state: is_inter_state(&settings.company_state, billing_state),
            gst_enabled: settings.gst_enabled,
        }
    }

    /// Rate actually charged; zero while GST is switched off
    pub fn effective_rate(&self, gst_rate: Decimal) -> Decimal {
        if self.gst_enabled {
            gst_rate
        } else {
            Decimal::ZERO
        }
    }

    /// Price `quantity × unit_price − discount` at `gst_rate`
    pub fn price(&self, quantity: Decimal, unit_price: Decimal, discount: Decimal, gst_rate: Decimal) -> LineTax {
        calculate_amount(
            quantity * unit_price - discount,
            self.effective_rate(gst_rate),
            self.pricing_mode,
            self.inter_state,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_exclusive_intra_state() {
        let line = calculate_line(dec("2"), dec("100"), dec("18"), PricingMode::Exclusive, false);
        assert_eq!(line.taxable_amount, dec("200"));
        assert_eq!(line.cgst_amount, dec("18"));
        assert_eq!(line.sgst_amount, dec("18"));
        assert_eq!(line.igst_amount, Decimal::ZERO);
        assert_eq!(line.line_total, dec("236"));
    }

    #[test]
    fn test_inclusive_inter_state() {
        let line = calculate_line(dec("1"), dec("118"), dec("18"), PricingMode::Inclusive, true);
        assert_eq!(line.taxable_amount, dec("100.00"));
        assert_eq!(line.igst_amount, dec("18.00"));
        assert_eq!(line.cgst_amount, Decimal::ZERO);
        assert_eq!(line.sgst_amount, Decimal::ZERO);
        assert_eq!(line.line_total, dec("118"));
    }

    #[test]
    fn test_zero_rate_has_no_tax() {
        for mode in [PricingMode::Inclusive, PricingMode::Exclusive] {
            let line = calculate_line(dec("3"), dec("9.99"), Decimal::ZERO, mode, false);
            assert_eq!(line.taxable_amount, dec("29.97"));
            assert_eq!(line.tax_amount(), Decimal::ZERO);
            assert_eq!(line.line_total, dec("29.97"));
        }
    }

    #[test]
    fn test_odd_cent_split_reconstructs_tax() {
        let line = calculate_line(dec("1"), dec("10.10"), dec("5"), PricingMode::Exclusive, false);
        // tax = 0.505 -> 0.51, split 0.26 + 0.25
        assert_eq!(line.tax_amount(), dec("0.51"));
        assert_eq!(line.cgst_amount, dec("0.26"));
        assert_eq!(line.sgst_amount, dec("0.25"));
        assert_eq!(line.line_total, dec("10.61"));
    }

    #[test]
    fn test_is_inter_state() {
        assert!(!is_inter_state("Karnataka", "karnataka"));
        assert!(!is_inter_state("  Karnataka ", "KARNATAKA"));
        assert!(is_inter_state("Karnataka", "Maharashtra"));
        assert!(!is_inter_state("", "Maharashtra"));
        assert!(!is_inter_state("Karnataka", "   "));
    }

    #[test]
    fn test_context_follows_settings() {
        let settings = CompanySettings {
            company_state: "Karnataka".to_string(),
            gst_pricing_mode: PricingMode::Exclusive,
            ..CompanySettings::default()
        };
        let ctx = TaxContext::new(&settings, "Kerala");
        assert!(ctx.inter_state);
        let line = ctx.price(dec("2"), dec("50"), dec("10"), dec("12"));
        assert_eq!(line.taxable_amount, dec("90"));
        assert_eq!(line.igst_amount, dec("10.80"));
        assert_eq!(line.line_total, dec("100.80"));
    }

    #[test]
    fn test_disabled_gst_prices_at_zero() {
        let settings = CompanySettings {
            gst_enabled: false,
            ..CompanySettings::default()
        };
        let line = TaxContext::new(&settings, "").price(dec("1"), dec("118"), Decimal::ZERO, dec("18"));
        assert_eq!(line.taxable_amount, dec("118"));
        assert_eq!(line.tax_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_split_gross_inclusive_is_exact_before_rounding() {
        let (taxable, tax) = split_gross(dec("118"), dec("18"), PricingMode::Inclusive);
        assert_eq!(taxable, dec("100"));
        assert_eq!(tax, dec("18"));
    }
}
