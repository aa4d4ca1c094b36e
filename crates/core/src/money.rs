//! Fixed-point monetary arithmetic.
//!
//! RVUs, hospital factors and calculated values are all kept at two fractional digits and
//! rounded half-up (away from zero at the midpoint) whenever a value is persisted.

use crate::constants::MONEY_SCALE;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds half-up to two fractional digits and pins the scale, so `15` renders as `15.00`.
pub fn to_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Value of a procedure line: `rvu × factor`, rounded for persistence.
///
/// `None` when the product does not fit a `Decimal`.
pub fn line_value(rvu: Decimal, factor: Decimal) -> Option<Decimal> {
    rvu.checked_mul(factor).map(to_money)
}
