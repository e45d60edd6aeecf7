//! Fixed-point rounding rules shared by the derived-value formulas
//!
//! Every money/quantity column has a fixed NUMERIC scale in the schema; the
//! compute functions round to the same scale so recomputing an aggregate twice
//! yields the same stored value. Rounding is half-away-from-zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary amounts (NUMERIC(18,2))
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Quantities of work/material (NUMERIC(18,3))
pub fn round_qty(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
}

/// Weights in kilograms (NUMERIC(18,2))
pub fn round_weight(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rebar unit weights in kg/m (NUMERIC(8,3))
pub fn round_unit_weight(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
}

/// Percentages (NUMERIC(7,2))
pub fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Performance and price indices (NUMERIC(10,4))
pub fn round_index(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Hours worked (NUMERIC(10,2))
pub fn round_hours(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn money_rounds_half_away_from_zero() {
        assert_eq!(round_money(dec("1.005")), dec("1.01"));
        assert_eq!(round_money(dec("-1.005")), dec("-1.01"));
        assert_eq!(round_money(dec("2.004")), dec("2.00"));
    }

    #[test]
    fn rounding_is_idempotent() {
        let once = round_index(dec("0.66666666"));
        assert_eq!(once, round_index(once));
    }
}
