//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// `price * quantity`, rounded
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// `total * percent / 100`, rounded
pub fn percent_of(total: f64, percent: f64) -> f64 {
    to_f64(to_decimal(total) * to_decimal(percent) / Decimal::ONE_HUNDRED)
}

/// `max(0, total - discount)`, rounded
pub fn subtract_clamped(total: f64, discount: f64) -> f64 {
    to_f64((to_decimal(total) - to_decimal(discount)).max(Decimal::ZERO))
}
