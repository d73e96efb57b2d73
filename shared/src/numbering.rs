//! Document number formatting and sequence scoping

use chrono::{Datelike, NaiveDate};

use crate::models::NumberingConfig;
use crate::types::NumberingMode;

pub const DEFAULT_NUMBER_FORMAT: &str = "{prefix}/{year}/{seq}";

/// Work orders always number continuously with this template
pub const WORK_ORDER_NUMBER_FORMAT: &str = "WO/{year}/{seq}";

/// Document kinds that own an independent sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Quotation,
    WorkOrder,
    Invoice,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "quotation",
            DocumentKind::WorkOrder => "work_order",
            DocumentKind::Invoice => "invoice",
        }
    }
}

/// Key of the bucket a sequence counts within: `all`, `YYYY` or `YYYY-MM`
pub fn sequence_scope(mode: NumberingMode, date: NaiveDate) -> String {
    match mode {
        NumberingMode::Continuous => "all".to_string(),
        NumberingMode::Yearly => format!("{:04}", date.year()),
        NumberingMode::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
    }
}

/// Inclusive date bounds of a scope, None for continuous numbering
pub fn scope_bounds(mode: NumberingMode, date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match mode {
        NumberingMode::Continuous => None,
        NumberingMode::Yearly => {
            let start = NaiveDate::from_ymd_opt(date.year(), 1, 1)?;
            let end = NaiveDate::from_ymd_opt(date.year(), 12, 31)?;
            Some((start, end))
        }
        NumberingMode::Monthly => {
            let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?;
            let next = if date.month() == 12 {
                NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)?
            };
            Some((start, next.pred_opt()?))
        }
    }
}

/// Next sequence: one past the highest in scope, else the configured start
pub fn next_sequence(current_max: Option<i32>, sequence_start: i32) -> i32 {
    match current_max {
        Some(max) => max + 1,
        None => sequence_start.max(1),
    }
}

/// Substitute `{prefix}`, `{year}`, `{month}` and `{seq}` in `template`
pub fn format_document_number(template: &str, prefix: &str, date: NaiveDate, sequence: i32) -> String {
    let template = if template.trim().is_empty() {
        DEFAULT_NUMBER_FORMAT
    } else {
        template
    };
    template
        .replace("{prefix}", prefix)
        .replace("{year}", &format!("{:04}", date.year()))
        .replace("{month}", &format!("{:02}", date.month()))
        .replace("{seq}", &format!("{:04}", sequence))
}

impl NumberingConfig {
    pub fn format(&self, date: NaiveDate, sequence: i32) -> String {
        format_document_number(&self.number_format, &self.prefix, date, sequence)
    }

    pub fn scope(&self, date: NaiveDate) -> String {
        sequence_scope(self.numbering_mode, date)
    }
}

/// Format a work order number
pub fn work_order_number(date: NaiveDate, sequence: i32) -> String {
    format_document_number(WORK_ORDER_NUMBER_FORMAT, "WO", date, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_format() {
        assert_eq!(format_document_number(DEFAULT_NUMBER_FORMAT, "QT", date(2024, 3, 5), 7), "QT/2024/0007");
    }

    #[test]
    fn test_month_placeholder_and_long_sequence() {
        assert_eq!(
            format_document_number("{prefix}-{year}{month}-{seq}", "INV", date(2025, 11, 30), 12345),
            "INV-202511-12345"
        );
    }

    #[test]
    fn test_blank_template_falls_back_to_default() {
        assert_eq!(format_document_number("  ", "INV", date(2024, 1, 1), 1), "INV/2024/0001");
    }

    #[test]
    fn test_work_order_number() {
        assert_eq!(work_order_number(date(2024, 6, 1), 3), "WO/2024/0003");
    }

    #[test]
    fn test_sequence_scope() {
        let d = date(2024, 2, 29);
        assert_eq!(sequence_scope(NumberingMode::Continuous, d), "all");
        assert_eq!(sequence_scope(NumberingMode::Yearly, d), "2024");
        assert_eq!(sequence_scope(NumberingMode::Monthly, d), "2024-02");
    }

    #[test]
    fn test_scope_bounds() {
        assert_eq!(scope_bounds(NumberingMode::Continuous, date(2024, 5, 5)), None);
        assert_eq!(
            scope_bounds(NumberingMode::Yearly, date(2024, 5, 5)),
            Some((date(2024, 1, 1), date(2024, 12, 31)))
        );
        assert_eq!(
            scope_bounds(NumberingMode::Monthly, date(2024, 2, 10)),
            Some((date(2024, 2, 1), date(2024, 2, 29)))
        );
        assert_eq!(
            scope_bounds(NumberingMode::Monthly, date(2024, 12, 10)),
            Some((date(2024, 12, 1), date(2024, 12, 31)))
        );
    }

    #[test]
    fn test_next_sequence() {
        assert_eq!(next_sequence(None, 100), 100);
        assert_eq!(next_sequence(None, 0), 1);
        assert_eq!(next_sequence(Some(41), 100), 42);
    }
}
