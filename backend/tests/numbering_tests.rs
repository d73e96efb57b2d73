//! Document numbering tests
//!
//! Tests for number templates and sequence scopes including:
//! - Every placeholder occurrence is substituted
//! - Scopes restart yearly or monthly as configured

use chrono::NaiveDate;
use proptest::prelude::*;
use shared::numbering::{
    format_document_number, next_sequence, scope_bounds, sequence_scope, work_order_number, DEFAULT_NUMBER_FORMAT,
};
use shared::{InvoiceSettings, NumberingConfig, NumberingMode, QuotationSettings};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn test_default_quotation_number() {
        let number = QuotationSettings::default().numbering.format(date(2024, 3, 5), 7);
        assert_eq!(number, "QT/2024/0007");
    }

    #[test]
    fn test_default_invoice_number() {
        let number = InvoiceSettings::default().numbering.format(date(2025, 1, 31), 1);
        assert_eq!(number, "INV/2025/0001");
    }

    #[test]
    fn test_month_placeholder() {
        let number = format_document_number("{prefix}-{year}{month}-{seq}", "INV", date(2024, 3, 5), 42);
        assert_eq!(number, "INV-202403-0042");
    }

    #[test]
    fn test_repeated_placeholders_are_all_replaced() {
        let number = format_document_number("{seq}/{prefix}/{seq}", "QT", date(2024, 3, 5), 7);
        assert_eq!(number, "0007/QT/0007");
    }

    #[test]
    fn test_blank_template_uses_default() {
        assert_eq!(
            format_document_number("  ", "QT", date(2024, 3, 5), 7),
            format_document_number(DEFAULT_NUMBER_FORMAT, "QT", date(2024, 3, 5), 7)
        );
    }

    #[test]
    fn test_sequence_wider_than_padding_is_kept() {
        assert_eq!(format_document_number("{seq}", "", date(2024, 1, 1), 12345), "12345");
    }

    #[test]
    fn test_work_order_number_is_fixed() {
        assert_eq!(work_order_number(date(2024, 12, 31), 12), "WO/2024/0012");
    }

    #[test]
    fn test_scope_keys() {
        let d = date(2024, 3, 5);
        assert_eq!(sequence_scope(NumberingMode::Continuous, d), "all");
        assert_eq!(sequence_scope(NumberingMode::Yearly, d), "2024");
        assert_eq!(sequence_scope(NumberingMode::Monthly, d), "2024-03");
    }

    #[test]
    fn test_scope_bounds() {
        assert_eq!(scope_bounds(NumberingMode::Continuous, date(2024, 2, 10)), None);
        assert_eq!(
            scope_bounds(NumberingMode::Yearly, date(2024, 2, 10)),
            Some((date(2024, 1, 1), date(2024, 12, 31)))
        );
        assert_eq!(
            scope_bounds(NumberingMode::Monthly, date(2024, 2, 10)),
            Some((date(2024, 2, 1), date(2024, 2, 29)))
        );
        assert_eq!(
            scope_bounds(NumberingMode::Monthly, date(2023, 12, 25)),
            Some((date(2023, 12, 1), date(2023, 12, 31)))
        );
    }

    #[test]
    fn test_next_sequence_seeds_from_start() {
        assert_eq!(next_sequence(None, 100), 100);
        assert_eq!(next_sequence(Some(7), 100), 8);
        assert_eq!(next_sequence(None, 0), 1);
    }

    #[test]
    fn test_custom_prefix_config() {
        let config = NumberingConfig {
            prefix: "EST".to_string(),
            sequence_start: 500,
            number_format: "{prefix}{year}-{seq}".to_string(),
            numbering_mode: NumberingMode::Yearly,
        };
        assert_eq!(config.format(date(2024, 6, 1), 500), "EST2024-0500");
        assert_eq!(config.scope(date(2024, 6, 1)), "2024");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| date(y, m, d))
}

fn mode_strategy() -> impl Strategy<Value = NumberingMode> {
    prop_oneof![
        Just(NumberingMode::Continuous),
        Just(NumberingMode::Yearly),
        Just(NumberingMode::Monthly),
    ]
}

mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Default numbers are prefix, year and a zero-padded sequence
        #[test]
        fn prop_default_format_shape(
            prefix in "[A-Z]{2,5}",
            d in date_strategy(),
            seq in 1i32..10_000,
        ) {
            let number = format_document_number(DEFAULT_NUMBER_FORMAT, &prefix, d, seq);
            let parts: Vec<&str> = number.split('/').collect();

            prop_assert_eq!(parts.len(), 3);
            prop_assert_eq!(parts[0], prefix.as_str());
            prop_assert_eq!(parts[1], d.format("%Y").to_string());
            prop_assert_eq!(parts[2].len(), 4);
            prop_assert_eq!(parts[2].parse::<i32>().unwrap(), seq);
        }

        /// A date always falls inside the bounds of its own scope
        #[test]
        fn prop_scope_contains_date(d in date_strategy(), mode in mode_strategy()) {
            if let Some((start, end)) = scope_bounds(mode, d) {
                prop_assert!(start <= d && d <= end);
                prop_assert_eq!(sequence_scope(mode, start), sequence_scope(mode, end));
            }
        }

        /// The next sequence is always past the highest issued one
        #[test]
        fn prop_next_sequence_advances(max in 0i32..1_000_000, start in 1i32..1_000) {
            prop_assert!(next_sequence(Some(max), start) > max);
            prop_assert!(next_sequence(None, start) >= 1);
        }
    }
}
