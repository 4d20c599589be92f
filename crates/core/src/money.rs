//! Money helpers shared by the ledger crates.
//!
//! Amounts are `rust_decimal::Decimal`; no floating point anywhere.

use rust_decimal::Decimal;

use crate::error::{BankError, BankResult};

/// Day-count basis for converting annual rates into daily ones.
pub const DAYS_IN_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);

/// Reject negative amounts (transaction amounts, rates, limits).
pub fn ensure_non_negative(value: Decimal, what: &str) -> BankResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(BankError::validation(format!(
            "{what} must not be negative (got {value})"
        )));
    }
    Ok(value)
}

/// Reject positive amounts (credit floors live at or below zero).
pub fn ensure_non_positive(value: Decimal, what: &str) -> BankResult<Decimal> {
    if value > Decimal::ZERO {
        return Err(BankError::validation(format!(
            "{what} must not be positive (got {value})"
        )));
    }
    Ok(value)
}

/// `a + b`, or a validation error when the sum leaves the decimal range.
pub fn checked_sum(a: Decimal, b: Decimal, what: &str) -> BankResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| BankError::validation(format!("{what} is out of range ({a} + {b})")))
}

/// `a * b`, or a validation error when the product leaves the decimal range.
pub fn checked_product(a: Decimal, b: Decimal, what: &str) -> BankResult<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| BankError::validation(format!("{what} is out of range ({a} * {b})")))
}

/// Convert an annual rate into the per-day multiplier.
pub fn daily_rate(annual: Decimal) -> Decimal {
    annual / DAYS_IN_YEAR
}
