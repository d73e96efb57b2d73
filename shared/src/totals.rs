//! Document totals aggregation
//!
//! Quotation totals are derived from stored line totals; the document-level
//! discount is applied after line aggregation. Invoice totals are sums of
//! already priced lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::tax::{split_gross, LineTax};
use crate::types::{round_money, DiscountType, PricingMode, QuotationMode};
use crate::validation::{amount_fits, validate_discount_value};

/// The parts of a quotation line that feed its totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub selling_price: Decimal,
    pub quantity: Decimal,
    pub discount: Decimal,
    pub line_total: Decimal,
    pub gst_rate: Decimal,
}

/// Quotation-level discount
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentDiscount {
    pub kind: DiscountType,
    pub value: Decimal,
}

/// Derived quotation totals
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QuotationTotals {
    pub subtotal: Decimal,
    pub item_discount_total: Decimal,
    pub base_amount: Decimal,
    pub total_tax: Decimal,
    pub quotation_discount_amount: Decimal,
    pub total_discount: Decimal,
    pub total_amount: Decimal,
}

/// Derived invoice totals
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub cgst_total: Decimal,
    pub sgst_total: Decimal,
    pub igst_total: Decimal,
    pub grand_total: Decimal,
}

/// Stored total of a quotation line: `price × qty − discount + tax`
pub fn quotation_line_total(
    selling_price: Decimal,
    quantity: Decimal,
    discount: Decimal,
    tax: Decimal,
) -> Decimal {
    round_money(selling_price * quantity - discount + tax)
}

/// Amount taken off by a document discount applied to `base_amount`
pub fn document_discount_amount(
    base_amount: Decimal,
    discount: Option<&DocumentDiscount>,
) -> DomainResult<Decimal> {
    let amount = match discount {
        None => Decimal::ZERO,
        Some(d) => {
            validate_discount_value(d.value).map_err(|m| DomainError::validation("quotation_discount_value", m))?;
            match d.kind {
                DiscountType::Percent => {
                    if d.value > Decimal::ONE_HUNDRED {
                        return Err(DomainError::validation(
                            "quotation_discount_value",
                            "Percent discount must be between 0 and 100",
                        ));
                    }
                    base_amount * d.value / Decimal::ONE_HUNDRED
                }
                DiscountType::Flat => d.value,
            }
        }
    };
    Ok(round_money(amount.max(Decimal::ZERO)))
}

/// Aggregate quotation totals.
///
/// `pricing_mode` is the currently configured GST convention; per-line tax is
/// recomputed from each stored line total. In catering mode every aggregate
/// is multiplied by pax before the document discount is applied.
pub fn aggregate_quotation(
    lines: &[PricedLine],
    mode: QuotationMode,
    pax: Option<i32>,
    discount: Option<&DocumentDiscount>,
    pricing_mode: PricingMode,
) -> DomainResult<QuotationTotals> {
    let factor = mode.pax_factor(pax)?;

    let mut subtotal = Decimal::ZERO;
    let mut item_discount_total = Decimal::ZERO;
    let mut base_amount = Decimal::ZERO;
    let mut total_tax = Decimal::ZERO;

    for line in lines {
        subtotal += line.selling_price * line.quantity;
        item_discount_total += line.discount;
        base_amount += line.line_total;
        total_tax += split_gross(line.line_total, line.gst_rate, pricing_mode).1;
    }

    let field = if mode == QuotationMode::Catering { "pax" } else { "items" };
    let scale = |amount: Decimal| {
        amount
            .checked_mul(factor)
            .map(round_money)
            .filter(|scaled| amount_fits(*scaled))
            .ok_or_else(|| DomainError::validation(field, "Quotation totals are too large"))
    };
    let subtotal = scale(subtotal)?;
    let item_discount_total = scale(item_discount_total)?;
    let base_amount = scale(base_amount)?;
    let total_tax = scale(total_tax)?;

    let quotation_discount_amount = document_discount_amount(base_amount, discount)?;

    Ok(QuotationTotals {
        subtotal,
        item_discount_total,
        base_amount,
        total_tax,
        quotation_discount_amount,
        total_discount: item_discount_total + quotation_discount_amount,
        total_amount: (base_amount - quotation_discount_amount).max(Decimal::ZERO),
    })
}

impl InvoiceTotals {
    /// Sum priced lines into invoice totals
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LineTax>) -> Self {
        let mut totals = InvoiceTotals::default();
        for line in lines {
            totals.subtotal += line.taxable_amount;
            totals.cgst_total += line.cgst_amount;
            totals.sgst_total += line.sgst_amount;
            totals.igst_total += line.igst_amount;
            totals.grand_total += line.line_total;
        }
        InvoiceTotals {
            subtotal: round_money(totals.subtotal),
            cgst_total: round_money(totals.cgst_total),
            sgst_total: round_money(totals.sgst_total),
            igst_total: round_money(totals.igst_total),
            grand_total: round_money(totals.grand_total),
        }
    }

    pub fn tax_total(&self) -> Decimal {
        self.cgst_total + self.sgst_total + self.igst_total
    }
}
