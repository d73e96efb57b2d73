//! Snapshot propagation between documents
//!
//! Product → quotation item, lead → party snapshots, quotation item → work
//! order line, work order line → invoice line. Every function copies values;
//! nothing here reads back from the source after the snapshot is taken.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};
use crate::models::{
    InvoiceLine, InvoiceLineInput, Lead, PartySnapshot, Product, QuotationItem, QuotationItemInput,
    QuotationItemSnapshot, WorkOrderItem, WorkOrderLine, DEFAULT_COUNTRY,
};
use crate::tax::TaxContext;
use crate::totals::quotation_line_total;
use crate::types::{round_money, CostPricingMode, QuotationMode};
use crate::validation::{
    amount_fits, line_gross, quantity_fits, validate_gst_rate, validate_line_amounts, validate_money,
};

const DEFAULT_UNIT: &str = "unit";

/// Freeze a quotation line from the editor input and the catalog product.
///
/// Cost fields resolve editor override, then product, then fallback. GST rate
/// and HSN/SAC come from the product; the editor rate is used only when the
/// product has none.
pub fn resolve_quotation_item(input: &QuotationItemInput, product: &Product) -> DomainResult<QuotationItemSnapshot> {
    validate_line_amounts(input.quantity, input.unit_price, input.discount)?;
    validate_money(input.tax).map_err(|m| DomainError::validation("tax", m))?;

    let gst_rate = product.gst_rate.or(input.gst_rate).unwrap_or(Decimal::ZERO);
    validate_gst_rate(gst_rate)?;

    let line_total = quotation_line_total(input.unit_price, input.quantity, input.discount, input.tax);
    if !amount_fits(line_total) {
        return Err(DomainError::validation("tax", "Line amount is too large"));
    }

    let cost_price_qty = input
        .cost_price_qty
        .or(product.cost_price_qty)
        .filter(|q| *q > Decimal::ZERO)
        .unwrap_or(Decimal::ONE);

    let cost_pricing_mode = input
        .cost_pricing_mode
        .as_deref()
        .or(product.cost_pricing_mode.as_deref())
        .map(CostPricingMode::from_str_lossy)
        .unwrap_or_default();

    Ok(QuotationItemSnapshot {
        product_id: product.id,
        variant_id: input.variant_id,
        product_name: product.name.clone(),
        variant_sku: product.sku.clone(),
        quantity: input.quantity,
        selling_price: input.unit_price,
        selling_price_unit: DEFAULT_UNIT.to_string(),
        selling_price_qty: Decimal::ONE,
        discount: input.discount,
        tax: input.tax,
        gst_rate,
        hsn_sac: product.hsn_sac.clone(),
        cost_price: input.cost_price.or(product.cost_price).unwrap_or(Decimal::ZERO),
        cost_price_unit: input
            .cost_price_unit
            .clone()
            .or_else(|| product.cost_price_unit.clone())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        cost_price_qty,
        cost_pricing_mode,
        cost_discount_percent: input
            .cost_discount_percent
            .or(product.cost_discount_percent)
            .unwrap_or(Decimal::ZERO),
        attributes_json: input.attributes_json.clone().unwrap_or_else(empty_object),
        packaging_json: input.packaging_json.clone().unwrap_or_else(empty_object),
        line_total,
    })
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn text(value: &Option<String>) -> String {
    value.as_deref().unwrap_or("").trim().to_string()
}

/// First non-blank of `primary` and `fallback`
fn text_or(primary: &Option<String>, fallback: &Option<String>) -> String {
    let value = text(primary);
    if value.is_empty() {
        text(fallback)
    } else {
        value
    }
}

/// Billing and shipping snapshots of a lead.
///
/// Shipping address fields fall back to the billing address one by one.
pub fn party_snapshots(lead: &Lead) -> (PartySnapshot, PartySnapshot) {
    let billing = PartySnapshot {
        name: lead.display_name(),
        company: text(&lead.company_name),
        phone: text(&lead.phone_number),
        email: text(&lead.email),
        gst: text(&lead.gst_number),
        address: text(&lead.billing_address),
        landmark: text(&lead.billing_landmark),
        city: text(&lead.billing_city),
        state: text(&lead.billing_state),
        pincode: text(&lead.billing_pincode),
        country: DEFAULT_COUNTRY.to_string(),
    };

    let shipping = PartySnapshot {
        address: text_or(&lead.shipping_address, &lead.billing_address),
        landmark: text_or(&lead.shipping_landmark, &lead.billing_landmark),
        city: text_or(&lead.shipping_city, &lead.billing_city),
        state: text_or(&lead.shipping_state, &lead.billing_state),
        pincode: text_or(&lead.shipping_pincode, &lead.billing_pincode),
        ..billing.clone()
    };

    (billing, shipping)
}

/// Copy quotation items into work order lines.
///
/// Catering quantities are multiplied by pax; each line total is recomputed
/// as `quantity × unit_price − discount + tax`. A pax large enough to push a
/// line out of the stored range is rejected.
pub fn work_order_lines(items: &[QuotationItem], mode: QuotationMode, pax: Option<i32>) -> DomainResult<Vec<WorkOrderLine>> {
    let factor = mode.pax_factor(pax)?;
    let too_large = || DomainError::validation("pax", "Work order quantities are too large for this PAX");

    items
        .iter()
        .map(|item| -> DomainResult<WorkOrderLine> {
            let s = &item.snapshot;
            let quantity = s
                .quantity
                .checked_mul(factor)
                .filter(|q| quantity_fits(*q))
                .ok_or_else(too_large)?;
            let gross = line_gross(quantity, s.selling_price).map_err(|_| too_large())?;
            let line_total = round_money(gross - s.discount + s.tax);
            if !amount_fits(line_total) {
                return Err(too_large());
            }

            Ok(WorkOrderLine {
                product_id: Some(s.product_id),
                variant_id: s.variant_id,
                description: s.product_name.clone(),
                variant_sku: s.variant_sku.clone(),
                quantity,
                unit_price: s.selling_price,
                discount: s.discount,
                tax: s.tax,
                gst_rate: s.gst_rate,
                hsn_sac: s.hsn_sac.clone(),
                line_total,
            })
        })
        .collect()
}

/// Work order total: sum of its line totals
pub fn work_order_total(lines: &[WorkOrderLine]) -> Decimal {
    round_money(lines.iter().map(|l| l.line_total).sum())
}

/// Invoice inputs derived from stored work order lines
///
/// The line's flat `tax` adjustment is not carried: the invoice recomputes GST
/// from `gst_rate`, and storefront lines already hold that GST in `tax`.
pub fn invoice_inputs_from_work_order(items: &[WorkOrderItem]) -> Vec<InvoiceLineInput> {
    items
        .iter()
        .map(|item| InvoiceLineInput {
            product_id: item.line.product_id,
            description: Some(item.line.description.clone()),
            quantity: item.line.quantity,
            unit_price: item.line.unit_price,
            discount: item.line.discount,
            gst_rate: Some(item.line.gst_rate),
            hsn_sac: item.line.hsn_sac.clone(),
        })
        .collect()
}

/// Price one invoice line.
///
/// The line's own GST rate wins, then the product's, then zero.
pub fn price_invoice_line(input: &InvoiceLineInput, product: Option<&Product>, ctx: &TaxContext) -> DomainResult<InvoiceLine> {
    validate_line_amounts(input.quantity, input.unit_price, input.discount)?;

    let gst_rate = input
        .gst_rate
        .or_else(|| product.and_then(|p| p.gst_rate))
        .unwrap_or(Decimal::ZERO);
    validate_gst_rate(gst_rate)?;

    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| product.map(|p| p.name.clone()))
        .unwrap_or_else(|| "Item".to_string());

    let gst_rate = ctx.effective_rate(gst_rate);

    Ok(InvoiceLine {
        product_id: input.product_id,
        description,
        hsn_sac: input.hsn_sac.clone().or_else(|| product.and_then(|p| p.hsn_sac.clone())),
        quantity: input.quantity,
        unit_price: input.unit_price,
        discount: input.discount,
        gst_rate,
        tax: ctx.price(input.quantity, input.unit_price, input.discount, gst_rate),
    })
}

/// Work order line mirroring an already priced invoice line.
///
/// `tax` carries whatever the line adds on top of `quantity × unit_price −
/// discount`, so the work order line formula reproduces the invoice total.
pub fn work_order_line_from_invoice_line(line: &InvoiceLine) -> WorkOrderLine {
    let net = round_money(line.quantity * line.unit_price - line.discount);
    WorkOrderLine {
        product_id: line.product_id,
        variant_id: None,
        description: line.description.clone(),
        variant_sku: None,
        quantity: line.quantity,
        unit_price: line.unit_price,
        discount: line.discount,
        tax: line.tax.line_total - net,
        gst_rate: line.gst_rate,
        hsn_sac: line.hsn_sac.clone(),
        line_total: line.tax.line_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompanySettings;
    use crate::types::PricingMode;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn product() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Paneer Tikka".to_string(),
            sku: Some("PT-01".to_string()),
            cost_price: Some(dec("40")),
            cost_price_unit: Some("plate".to_string()),
            cost_price_qty: Some(dec("2")),
            cost_pricing_mode: Some("percentage".to_string()),
            cost_discount_percent: Some(dec("5")),
            gst_rate: Some(dec("5")),
            hsn_sac: Some("996331".to_string()),
        }
    }

    fn input(product_id: Uuid) -> QuotationItemInput {
        QuotationItemInput {
            product_id,
            variant_id: None,
            quantity: dec("2"),
            unit_price: dec("120"),
            discount: dec("10"),
            tax: Decimal::ZERO,
            gst_rate: Some(dec("18")),
            cost_price: None,
            cost_price_unit: None,
            cost_price_qty: None,
            cost_pricing_mode: None,
            cost_discount_percent: None,
            attributes_json: None,
            packaging_json: None,
        }
    }

    #[test]
    fn test_product_values_are_copied() {
        let p = product();
        let item = resolve_quotation_item(&input(p.id), &p).unwrap();
        assert_eq!(item.product_name, "Paneer Tikka");
        assert_eq!(item.variant_sku.as_deref(), Some("PT-01"));
        assert_eq!(item.gst_rate, dec("5"));
        assert_eq!(item.hsn_sac.as_deref(), Some("996331"));
        assert_eq!(item.cost_price, dec("40"));
        assert_eq!(item.cost_price_unit, "plate");
        assert_eq!(item.cost_pricing_mode, CostPricingMode::Percentage);
        assert_eq!(item.line_total, dec("230"));
    }

    #[test]
    fn test_overrides_win_over_product() {
        let p = product();
        let mut i = input(p.id);
        i.cost_price = Some(dec("55"));
        i.cost_price_unit = Some("kg".to_string());
        i.cost_pricing_mode = Some("absolute".to_string());
        i.cost_discount_percent = Some(dec("0"));
        let item = resolve_quotation_item(&i, &p).unwrap();
        assert_eq!(item.cost_price, dec("55"));
        assert_eq!(item.cost_price_unit, "kg");
        assert_eq!(item.cost_pricing_mode, CostPricingMode::Absolute);
        assert_eq!(item.cost_discount_percent, Decimal::ZERO);
    }

    #[test]
    fn test_fallbacks_when_product_is_bare() {
        let p = Product {
            id: Uuid::new_v4(),
            name: "Custom".to_string(),
            cost_price_qty: Some(Decimal::ZERO),
            ..Product::default()
        };
        let item = resolve_quotation_item(&input(p.id), &p).unwrap();
        assert_eq!(item.cost_price, Decimal::ZERO);
        assert_eq!(item.cost_price_qty, Decimal::ONE);
        assert_eq!(item.cost_price_unit, "unit");
        assert_eq!(item.cost_pricing_mode, CostPricingMode::Absolute);
        // editor rate applies when the product has none
        assert_eq!(item.gst_rate, dec("18"));
        assert_eq!(item.attributes_json, serde_json::json!({}));
    }

    #[test]
    fn test_invalid_quantity_rejected() {
        let p = product();
        let mut i = input(p.id);
        i.quantity = Decimal::ZERO;
        assert!(resolve_quotation_item(&i, &p).is_err());
    }

    #[test]
    fn test_party_snapshots_shipping_falls_back() {
        let lead = Lead {
            id: Uuid::new_v4(),
            first_name: Some("Asha".to_string()),
            last_name: Some("Rao".to_string()),
            company_name: Some("Rao Foods".to_string()),
            billing_address: Some("12 MG Road".to_string()),
            billing_city: Some("Bengaluru".to_string()),
            billing_state: Some("Karnataka".to_string()),
            shipping_city: Some("Mysuru".to_string()),
            shipping_address: Some("   ".to_string()),
            ..Lead::default()
        };
        let (billing, shipping) = party_snapshots(&lead);
        assert_eq!(billing.name, "Asha Rao");
        assert_eq!(billing.country, "India");
        assert_eq!(shipping.name, "Asha Rao");
        assert_eq!(shipping.address, "12 MG Road");
        assert_eq!(shipping.city, "Mysuru");
        assert_eq!(shipping.state, "Karnataka");
    }

    #[test]
    fn test_work_order_lines_scale_by_pax() {
        let p = product();
        let snapshot = resolve_quotation_item(&input(p.id), &p).unwrap();
        let items = vec![QuotationItem { id: Uuid::new_v4(), quotation_id: Uuid::new_v4(), snapshot }];

        let general = work_order_lines(&items, QuotationMode::General, Some(10)).unwrap();
        assert_eq!(general[0].quantity, dec("2"));
        assert_eq!(general[0].line_total, dec("230"));

        let catering = work_order_lines(&items, QuotationMode::Catering, Some(10)).unwrap();
        assert_eq!(catering[0].quantity, dec("20"));
        // discount is not scaled
        assert_eq!(catering[0].line_total, dec("2390"));
        assert_eq!(work_order_total(&catering), dec("2390"));
    }

    #[test]
    fn test_excess_precision_is_rejected_before_snapshot() {
        let p = product();
        let mut i = input(p.id);
        i.quantity = dec("1.0005");
        i.unit_price = dec("100");
        i.discount = Decimal::ZERO;
        let err = resolve_quotation_item(&i, &p).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "quantity"));

        let mut i = input(p.id);
        i.tax = dec("1.005");
        let err = resolve_quotation_item(&i, &p).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "tax"));
    }

    #[test]
    fn test_work_order_line_total_matches_quotation_line_total() {
        let p = product();
        let mut i = input(p.id);
        i.quantity = dec("1.125");
        i.unit_price = dec("99.99");
        i.discount = dec("0.01");
        i.tax = dec("2.50");
        let snapshot = resolve_quotation_item(&i, &p).unwrap();
        let expected = snapshot.line_total;
        let items = vec![QuotationItem { id: Uuid::new_v4(), quotation_id: Uuid::new_v4(), snapshot }];

        let lines = work_order_lines(&items, QuotationMode::General, None).unwrap();
        assert_eq!(lines[0].line_total, expected);
    }

    #[test]
    fn test_work_order_lines_reject_overflowing_pax() {
        let p = product();
        let mut i = input(p.id);
        i.quantity = dec("99999999999");
        i.unit_price = dec("10");
        i.discount = Decimal::ZERO;
        let snapshot = resolve_quotation_item(&i, &p).unwrap();
        let items = vec![QuotationItem { id: Uuid::new_v4(), quotation_id: Uuid::new_v4(), snapshot }];

        let err = work_order_lines(&items, QuotationMode::Catering, Some(i32::MAX)).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "pax"));
    }

    #[test]
    fn test_invoice_line_rate_precedence() {
        let settings = CompanySettings {
            gst_pricing_mode: PricingMode::Exclusive,
            ..CompanySettings::default()
        };
        let ctx = TaxContext::new(&settings, "");
        let p = product();
        let mut line = InvoiceLineInput {
            product_id: Some(p.id),
            description: None,
            quantity: dec("1"),
            unit_price: dec("100"),
            discount: Decimal::ZERO,
            gst_rate: None,
            hsn_sac: None,
        };

        let priced = price_invoice_line(&line, Some(&p), &ctx).unwrap();
        assert_eq!(priced.gst_rate, dec("5"));
        assert_eq!(priced.description, "Paneer Tikka");
        assert_eq!(priced.tax.line_total, dec("105"));

        line.gst_rate = Some(dec("12"));
        let priced = price_invoice_line(&line, Some(&p), &ctx).unwrap();
        assert_eq!(priced.gst_rate, dec("12"));

        line.gst_rate = None;
        let priced = price_invoice_line(&line, None, &ctx).unwrap();
        assert_eq!(priced.gst_rate, Decimal::ZERO);
        assert_eq!(priced.description, "Item");
    }

    #[test]
    fn test_work_order_line_mirrors_invoice_total() {
        let line = InvoiceLineInput {
            product_id: None,
            description: Some("Ginger tea".to_string()),
            quantity: dec("2"),
            unit_price: dec("100"),
            discount: Decimal::ZERO,
            gst_rate: Some(dec("18")),
            hsn_sac: None,
        };

        let exclusive = CompanySettings {
            gst_pricing_mode: PricingMode::Exclusive,
            ..CompanySettings::default()
        };
        let priced = price_invoice_line(&line, None, &TaxContext::new(&exclusive, "")).unwrap();
        let wo = work_order_line_from_invoice_line(&priced);
        assert_eq!(wo.line_total, dec("236"));
        assert_eq!(wo.tax, dec("36"));
        assert_eq!(wo.quantity * wo.unit_price - wo.discount + wo.tax, wo.line_total);

        let inclusive = CompanySettings::default();
        let priced = price_invoice_line(&line, None, &TaxContext::new(&inclusive, "")).unwrap();
        let wo = work_order_line_from_invoice_line(&priced);
        assert_eq!(wo.line_total, dec("200"));
        assert_eq!(wo.tax, Decimal::ZERO);
    }
}
