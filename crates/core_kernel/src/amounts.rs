//! Monetary rounding rules and tax rates
//!
//! All document amounts in the engine are `rust_decimal::Decimal` values
//! rounded to two decimal places with the HALF_UP rule (midpoint rounds away
//! from zero). Rounding happens at every step of a calculation, never once at
//! the end, so that stored per-line amounts and header totals agree exactly.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places for all document amounts
pub const AMOUNT_SCALE: u32 = 2;

/// Rounds a raw amount to two decimal places, HALF_UP
///
/// HALF_UP here means the commercial rule: a midpoint rounds away from zero,
/// so `2.345` becomes `2.35` and `-2.345` becomes `-2.35`. Negative amounts
/// occur on correction documents and must round symmetrically.
///
/// # Example
///
/// ```
/// use core_kernel::round_half_up;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_half_up(dec!(25.025)), dec!(25.03));
/// assert_eq!(round_half_up(dec!(4.7557)), dec!(4.76));
/// ```
pub fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// A tax rate expressed as a decimal fraction (e.g. 0.19 for 19%)
///
/// Rates are snapshots: a line carries the rate that applied when it was
/// created, independent of later master-data changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a rate from a decimal fraction (e.g. 0.19 for 19%)
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Creates a rate from a percentage (e.g. 19.0 for 19%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self(percentage / dec!(100))
    }

    /// A zero rate
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the rate as a decimal fraction
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.0 * dec!(100)
    }

    /// Applies this rate to an already-rounded net amount, HALF_UP
    pub fn tax_on(&self, net: Decimal) -> Decimal {
        round_half_up(net * self.0)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}
