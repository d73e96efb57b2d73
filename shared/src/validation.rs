//! Validation utilities for the billing pipeline
//!
//! Includes India-specific checks for GST registration data.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

// ============================================================================
// Line Amount Validations
// ============================================================================

/// Largest quantity a document line can hold: NUMERIC(14, 3)
const QUANTITY_LIMIT: i64 = 100_000_000_000;
/// Largest money amount a document can hold: NUMERIC(14, 2)
const AMOUNT_LIMIT: i64 = 1_000_000_000_000;

pub const QUANTITY_SCALE: u32 = 3;
pub const MONEY_SCALE: u32 = 2;

/// Number of significant decimal places, ignoring trailing zeros
fn decimal_places(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// Whether a money amount fits the stored column range
pub fn amount_fits(amount: Decimal) -> bool {
    amount.abs() < Decimal::from(AMOUNT_LIMIT)
}

/// Whether a quantity fits the stored column range
pub fn quantity_fits(quantity: Decimal) -> bool {
    quantity.abs() < Decimal::from(QUANTITY_LIMIT)
}

/// Validate a line quantity (positive, at most 3 decimal places)
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    if decimal_places(quantity) > QUANTITY_SCALE {
        return Err("Quantity can have at most 3 decimal places");
    }
    if !quantity_fits(quantity) {
        return Err("Quantity is too large");
    }
    Ok(())
}

/// Validate a money amount (at most 2 decimal places, within range)
pub fn validate_money(amount: Decimal) -> Result<(), &'static str> {
    if decimal_places(amount) > MONEY_SCALE {
        return Err("Amounts can have at most 2 decimal places");
    }
    if !amount_fits(amount) {
        return Err("Amount is too large");
    }
    Ok(())
}

/// Validate a unit price (cannot be negative)
pub fn validate_unit_price(unit_price: Decimal) -> Result<(), &'static str> {
    if unit_price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    validate_money(unit_price)
}

/// Validate a line discount against the line's gross amount
pub fn validate_line_discount(discount: Decimal, gross: Decimal) -> Result<(), &'static str> {
    if discount < Decimal::ZERO {
        return Err("Discount cannot be negative");
    }
    validate_money(discount)?;
    if discount > gross {
        return Err("Discount cannot exceed the line amount");
    }
    Ok(())
}

/// Validate a GST rate percentage
pub fn validate_gst_rate_percent(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err("GST rate must be between 0 and 100");
    }
    if decimal_places(rate) > MONEY_SCALE {
        return Err("GST rate can have at most 2 decimal places");
    }
    Ok(())
}

/// `quantity × unit_price`, or a validation error when it leaves the stored range
pub fn line_gross(quantity: Decimal, unit_price: Decimal) -> DomainResult<Decimal> {
    quantity
        .checked_mul(unit_price)
        .filter(|gross| amount_fits(*gross))
        .ok_or_else(|| DomainError::validation("quantity", "Line amount is too large"))
}

/// Check the amounts of one document line
pub fn validate_line_amounts(quantity: Decimal, unit_price: Decimal, discount: Decimal) -> DomainResult<()> {
    validate_quantity(quantity).map_err(|m| DomainError::validation("quantity", m))?;
    validate_unit_price(unit_price).map_err(|m| DomainError::validation("unit_price", m))?;
    let gross = line_gross(quantity, unit_price)?;
    validate_line_discount(discount, gross).map_err(|m| DomainError::validation("discount", m))?;
    Ok(())
}

pub fn validate_gst_rate(rate: Decimal) -> DomainResult<()> {
    validate_gst_rate_percent(rate).map_err(|m| DomainError::validation("gst_rate", m))
}

// ============================================================================
// Quotation Header Validations
// ============================================================================

/// Validate a head count when one is given
pub fn validate_pax(pax: Option<i32>) -> Result<(), &'static str> {
    match pax {
        Some(p) if p < 1 => Err("PAX must be at least 1"),
        _ => Ok(()),
    }
}

/// Validate a document discount value (cannot be negative)
pub fn validate_discount_value(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Discount value cannot be negative");
    }
    validate_money(value)
}

/// Check the pricing fields of a quotation header
pub fn validate_quotation_header(pax: Option<i32>, discount_value: Decimal) -> DomainResult<()> {
    validate_pax(pax).map_err(|m| DomainError::validation("pax", m))?;
    validate_discount_value(discount_value).map_err(|m| DomainError::validation("quotation_discount_value", m))?;
    Ok(())
}

// ============================================================================
// India-Specific Validations
// ============================================================================

const GSTIN_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Validate a GSTIN (15 characters with a mod-36 check character).
///
/// Layout: 2-digit state code, 10-character PAN, entity code, `Z`, check.
pub fn validate_gstin(gstin: &str) -> Result<(), &'static str> {
    let gstin = gstin.trim().to_ascii_uppercase();
    let chars: Vec<char> = gstin.chars().collect();

    if chars.len() != 15 {
        return Err("GSTIN must be 15 characters");
    }
    if !chars[0..2].iter().all(|c| c.is_ascii_digit()) {
        return Err("GSTIN must start with a 2-digit state code");
    }
    let pan_ok = chars[2..7].iter().all(|c| c.is_ascii_uppercase())
        && chars[7..11].iter().all(|c| c.is_ascii_digit())
        && chars[11].is_ascii_uppercase();
    if !pan_ok {
        return Err("GSTIN must embed a valid PAN");
    }
    if !chars[12].is_ascii_alphanumeric() || chars[12] == '0' {
        return Err("GSTIN entity code must be 1-9 or A-Z");
    }
    if chars[13] != 'Z' {
        return Err("GSTIN 14th character must be Z");
    }

    let mut sum = 0u32;
    for (i, c) in chars[..14].iter().enumerate() {
        let value = GSTIN_CHARSET.find(*c).ok_or("GSTIN contains invalid characters")? as u32;
        let product = value * if i % 2 == 0 { 1 } else { 2 };
        sum += product / 36 + product % 36;
    }
    let check = ((36 - sum % 36) % 36) as usize;
    if GSTIN_CHARSET.chars().nth(check) != Some(chars[14]) {
        return Err("GSTIN check character does not match");
    }
    Ok(())
}

/// Validate an Indian PIN code (6 digits, no leading zero)
pub fn validate_pincode(pincode: &str) -> Result<(), &'static str> {
    let pincode = pincode.trim();
    if pincode.len() != 6 || !pincode.chars().all(|c| c.is_ascii_digit()) {
        return Err("PIN code must be 6 digits");
    }
    if pincode.starts_with('0') {
        return Err("PIN code cannot start with 0");
    }
    Ok(())
}

/// Validate an Indian mobile number.
/// Accepts: 9876543210, 09876543210, +91 98765 43210
pub fn validate_indian_mobile(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    let local = match digits.len() {
        10 => digits.as_str(),
        11 if digits.starts_with('0') => &digits[1..],
        12 if digits.starts_with("91") => &digits[2..],
        _ => return Err("Invalid Indian mobile number format"),
    };

    match local.chars().next() {
        Some('6'..='9') => Ok(()),
        _ => Err("Indian mobile numbers start with 6, 7, 8 or 9"),
    }
}
