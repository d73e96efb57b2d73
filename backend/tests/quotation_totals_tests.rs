//! Quotation totals tests
//!
//! Tests for quotation aggregation including:
//! - Catering totals scale linearly with pax
//! - Document discounts never push the total below zero
//! - Total discount is item discounts plus the document discount

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::totals::{aggregate_quotation, quotation_line_total, DocumentDiscount, PricedLine};
use shared::{DiscountType, DomainError, PricingMode, QuotationMode};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn line(price: &str, quantity: &str, discount: &str, gst_rate: &str) -> PricedLine {
    let (price, quantity, discount) = (dec(price), dec(quantity), dec(discount));
    PricedLine {
        selling_price: price,
        quantity,
        discount,
        line_total: quotation_line_total(price, quantity, discount, Decimal::ZERO),
        gst_rate: dec(gst_rate),
    }
}

fn sample_lines() -> Vec<PricedLine> {
    vec![line("100", "2", "10", "18"), line("50", "1", "0", "0")]
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn test_line_total_includes_flat_tax_adjustment() {
        assert_eq!(quotation_line_total(dec("100"), dec("2"), dec("10"), dec("5")), dec("195"));
        assert_eq!(quotation_line_total(dec("19.99"), dec("3"), Decimal::ZERO, Decimal::ZERO), dec("59.97"));
    }

    #[test]
    fn test_general_quotation_without_discount() {
        let totals =
            aggregate_quotation(&sample_lines(), QuotationMode::General, None, None, PricingMode::Exclusive).unwrap();

        assert_eq!(totals.subtotal, dec("250"));
        assert_eq!(totals.item_discount_total, dec("10"));
        assert_eq!(totals.base_amount, dec("240"));
        assert_eq!(totals.total_tax, dec("34.2"));
        assert_eq!(totals.quotation_discount_amount, Decimal::ZERO);
        assert_eq!(totals.total_discount, dec("10"));
        assert_eq!(totals.total_amount, dec("240"));
    }

    #[test]
    fn test_inclusive_tax_is_backed_out_of_line_totals() {
        let totals =
            aggregate_quotation(&sample_lines(), QuotationMode::General, None, None, PricingMode::Inclusive).unwrap();

        // 190 - 190 / 1.18
        assert_eq!(totals.total_tax, dec("28.98"));
        assert_eq!(totals.total_amount, dec("240"));
    }

    #[test]
    fn test_percent_discount_applies_to_base_amount() {
        let discount = DocumentDiscount {
            kind: DiscountType::Percent,
            value: dec("10"),
        };
        let totals = aggregate_quotation(
            &sample_lines(),
            QuotationMode::General,
            None,
            Some(&discount),
            PricingMode::Exclusive,
        )
        .unwrap();

        assert_eq!(totals.quotation_discount_amount, dec("24"));
        assert_eq!(totals.total_discount, dec("34"));
        assert_eq!(totals.total_amount, dec("216"));
    }

    #[test]
    fn test_flat_discount_larger_than_base_floors_at_zero() {
        let discount = DocumentDiscount {
            kind: DiscountType::Flat,
            value: dec("500"),
        };
        let totals = aggregate_quotation(
            &sample_lines(),
            QuotationMode::General,
            None,
            Some(&discount),
            PricingMode::Exclusive,
        )
        .unwrap();

        assert_eq!(totals.quotation_discount_amount, dec("500"));
        assert_eq!(totals.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_percent_discount_above_hundred_is_rejected() {
        let discount = DocumentDiscount {
            kind: DiscountType::Percent,
            value: dec("120"),
        };
        let result = aggregate_quotation(
            &sample_lines(),
            QuotationMode::General,
            None,
            Some(&discount),
            PricingMode::Exclusive,
        );

        assert!(matches!(result, Err(DomainError::Validation { ref field, .. }) if field == "quotation_discount_value"));
    }

    #[test]
    fn test_catering_multiplies_every_aggregate_by_pax() {
        let totals =
            aggregate_quotation(&sample_lines(), QuotationMode::Catering, Some(3), None, PricingMode::Exclusive)
                .unwrap();

        assert_eq!(totals.subtotal, dec("750"));
        assert_eq!(totals.item_discount_total, dec("30"));
        assert_eq!(totals.base_amount, dec("720"));
        assert_eq!(totals.total_tax, dec("102.6"));
        assert_eq!(totals.total_amount, dec("720"));
    }

    #[test]
    fn test_catering_requires_pax() {
        let result = aggregate_quotation(&sample_lines(), QuotationMode::Catering, None, None, PricingMode::Exclusive);
        assert!(matches!(result, Err(DomainError::Validation { ref field, .. }) if field == "pax"));
    }

    #[test]
    fn test_general_mode_ignores_pax() {
        let with_pax =
            aggregate_quotation(&sample_lines(), QuotationMode::General, Some(50), None, PricingMode::Exclusive)
                .unwrap();
        assert_eq!(with_pax.total_amount, dec("240"));
    }

    #[test]
    fn test_empty_quotation_totals_are_zero() {
        let totals = aggregate_quotation(&[], QuotationMode::General, None, None, PricingMode::Exclusive).unwrap();
        assert_eq!(totals.total_amount, Decimal::ZERO);
        assert_eq!(totals.total_tax, Decimal::ZERO);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn line_strategy() -> impl Strategy<Value = PricedLine> {
    (
        0i64..1_000_000,
        1i64..50,
        prop::sample::select(vec![0i64, 5, 12, 18, 28]),
    )
        .prop_map(|(price, quantity, rate)| {
            let price = Decimal::new(price, 2);
            let quantity = Decimal::from(quantity);
            PricedLine {
                selling_price: price,
                quantity,
                discount: Decimal::ZERO,
                line_total: quotation_line_total(price, quantity, Decimal::ZERO, Decimal::ZERO),
                gst_rate: Decimal::from(rate),
            }
        })
}

mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Catering base amount is the general base amount times pax
        #[test]
        fn prop_pax_linearity(
            lines in prop::collection::vec(line_strategy(), 1..8),
            pax in 1i32..500,
        ) {
            let general = aggregate_quotation(&lines, QuotationMode::General, None, None, PricingMode::Exclusive).unwrap();
            let catering = aggregate_quotation(&lines, QuotationMode::Catering, Some(pax), None, PricingMode::Exclusive).unwrap();

            prop_assert_eq!(catering.base_amount, general.base_amount * Decimal::from(pax));
            prop_assert_eq!(catering.subtotal, general.subtotal * Decimal::from(pax));
        }

        /// Flat discounts of any size never produce a negative total
        #[test]
        fn prop_discount_floor(
            lines in prop::collection::vec(line_strategy(), 0..8),
            flat in 0i64..100_000_000,
        ) {
            let discount = DocumentDiscount { kind: DiscountType::Flat, value: Decimal::new(flat, 2) };
            let totals = aggregate_quotation(&lines, QuotationMode::General, None, Some(&discount), PricingMode::Exclusive).unwrap();

            prop_assert!(totals.total_amount >= Decimal::ZERO);
            prop_assert!(totals.total_amount <= totals.base_amount);
        }

        /// Total discount always combines item and document discounts
        #[test]
        fn prop_total_discount_is_sum(
            lines in prop::collection::vec(line_strategy(), 1..8),
            percent in 0i64..=100,
        ) {
            let discount = DocumentDiscount { kind: DiscountType::Percent, value: Decimal::from(percent) };
            let totals = aggregate_quotation(&lines, QuotationMode::General, None, Some(&discount), PricingMode::Inclusive).unwrap();

            prop_assert_eq!(totals.total_discount, totals.item_discount_total + totals.quotation_discount_amount);
            prop_assert_eq!(totals.total_amount, totals.base_amount - totals.quotation_discount_amount);
        }
    }
}
