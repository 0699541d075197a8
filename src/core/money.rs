//! Money arithmetic using `rust_decimal` for precision.
//!
//! All calculations happen on `Decimal` at full precision. Values are rounded to two decimal
//! places (midpoint away from zero) only when they leave the calculation: when stored, shown,
//! or emitted in a report. Storage uses `f64`, converted at the boundary with [`to_f64`].
//!
//! Tax-inclusive ("final") prices are what customers see; base prices exclude tax.

use crate::errors::{Error, Result};
use rust_decimal::prelude::*;

/// Rounding for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Rates are kept to 4 decimal places (13.5% = 0.1350)
const RATE_DECIMAL_PLACES: u32 = 4;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert a stored f64 to Decimal for calculation
#[inline]
#[must_use]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert a Decimal back to f64 for storage, rounding to 2 decimal places.
///
/// Goes through the decimal text so the result is the f64 nearest to the rounded value
/// (`11.49` is stored as the literal `11.49`).
#[inline]
#[must_use]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_string().parse().unwrap_or_default()
}

/// Round a monetary value to 2 decimal places
#[inline]
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Parses a non-negative, finite amount coming from configuration or user input.
///
/// # Errors
/// Returns `InvalidAmount` for negative, NaN or infinite values.
pub fn amount_from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(Error::InvalidAmount {
            amount: Decimal::ZERO,
        });
    }
    let amount = to_decimal(value);
    validate_amount(amount)?;
    Ok(amount)
}

/// Parses a tax rate given as a fraction (0.135 = 13.5%).
///
/// # Errors
/// Returns `InvalidRate` unless `0 <= rate < 1`.
pub fn rate_from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(Error::InvalidRate {
            rate: Decimal::ZERO,
        });
    }
    let rate = to_decimal(value).round_dp(RATE_DECIMAL_PLACES);
    validate_rate(rate)?;
    Ok(rate)
}

/// Reads a stored rate without validation (stored rates were validated on write).
#[must_use]
pub fn stored_rate(value: f64) -> Decimal {
    to_decimal(value).round_dp(RATE_DECIMAL_PLACES)
}

/// Rejects negative amounts.
///
/// # Errors
/// Returns `InvalidAmount` if `amount < 0`.
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Rejects rates outside `0 <= rate < 1`.
///
/// # Errors
/// Returns `InvalidRate` for out-of-range rates.
pub fn validate_rate(rate: Decimal) -> Result<()> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(Error::InvalidRate { rate });
    }
    Ok(())
}

/// `base_price × (1 + rate)`
#[must_use]
pub fn to_tax_inclusive(base_price: Decimal, rate: Decimal) -> Decimal {
    base_price * (Decimal::ONE + rate)
}

/// `final_price / (1 + rate)`
#[must_use]
pub fn to_base_price(final_price: Decimal, rate: Decimal) -> Decimal {
    final_price / (Decimal::ONE + rate)
}

/// `base_price × rate`
#[must_use]
pub fn tax_from_base_price(base_price: Decimal, rate: Decimal) -> Decimal {
    base_price * rate
}

/// `final_price × rate / (1 + rate)`
///
/// Computed as `final_price - to_base_price(final_price, rate)` so that the tax and the base
/// price always add back up to the final price, before and after rounding.
#[must_use]
pub fn tax_from_final_price(final_price: Decimal, rate: Decimal) -> Decimal {
    final_price - to_base_price(final_price, rate)
}

/// Splits a tax-inclusive amount into rounded `(base, tax)` parts that sum exactly to the
/// rounded input.
#[must_use]
pub fn split_final_price(final_price: Decimal, rate: Decimal) -> (Decimal, Decimal) {
    let total = round_money(final_price);
    let base = round_money(to_base_price(final_price, rate));
    (base, total - base)
}

/// Formats a rate as the breakdown key used in stored reports: one decimal place and a
/// percent sign (`0.135` -> `"13.5%"`, `0.2` -> `"20.0%"`).
#[must_use]
pub fn rate_label(rate: Decimal) -> String {
    let percent = (rate * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{percent:.1}%")
}

/// Formats an amount as euros for display (`12.5` -> `"€12.50"`)
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("€{:.2}", round_money(amount))
}
