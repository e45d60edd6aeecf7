use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::numeric::{round_index, round_money};

/// Earned-value measurement for one project period
///
/// The `total_*` columns and the indices cache sums over the measurement's
/// detail rows and are re-derived whenever a detail is saved or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmMeasurement {
    pub id: Uuid,
    pub project_id: Uuid,
    pub period_end: NaiveDate,
    pub total_planned_value: Decimal,
    pub total_earned_value: Decimal,
    pub total_actual_cost: Decimal,
    pub schedule_variance: Decimal,
    pub cost_variance: Decimal,
    pub spi: Decimal,
    pub cpi: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvmMeasurementRequest {
    pub period_end: NaiveDate,
}

/// Per-WBS-node earned-value detail row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmDetail {
    pub id: Uuid,
    pub measurement_id: Uuid,
    pub wbs_node_id: Uuid,
    pub planned_value: Decimal,
    pub earned_value: Decimal,
    pub actual_cost: Decimal,
    pub schedule_variance: Decimal,
    pub cost_variance: Decimal,
    pub spi: Decimal,
    pub cpi: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvmDetailRequest {
    pub wbs_node_id: Uuid,
    pub planned_value: Decimal,
    pub earned_value: Decimal,
    pub actual_cost: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEvmDetailRequest {
    #[serde(default)]
    pub planned_value: Option<Decimal>,
    #[serde(default)]
    pub earned_value: Option<Decimal>,
    #[serde(default)]
    pub actual_cost: Option<Decimal>,
}

/// Variances and performance indices derived from PV/EV/AC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmFigures {
    pub schedule_variance: Decimal,
    pub cost_variance: Decimal,
    pub spi: Decimal,
    pub cpi: Decimal,
}

/// `SV = EV − PV`, `CV = EV − AC`, `SPI = EV/PV`, `CPI = EV/AC`.
///
/// An index whose denominator is zero defaults to 1 (no measurable
/// deviation rather than a division error).
pub fn derive_evm_figures(
    planned_value: Decimal,
    earned_value: Decimal,
    actual_cost: Decimal,
) -> EvmFigures {
    let schedule_variance = round_money(earned_value - planned_value);
    let cost_variance = round_money(earned_value - actual_cost);

    let spi = if planned_value.is_zero() {
        Decimal::ONE
    } else {
        round_index(earned_value / planned_value)
    };
    let cpi = if actual_cost.is_zero() {
        Decimal::ONE
    } else {
        round_index(earned_value / actual_cost)
    };

    EvmFigures {
        schedule_variance,
        cost_variance,
        spi,
        cpi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn variances_and_indices() {
        let figures = derive_evm_figures(dec("100000"), dec("90000"), dec("95000"));
        assert_eq!(figures.schedule_variance, dec("-10000.00"));
        assert_eq!(figures.cost_variance, dec("-5000.00"));
        assert_eq!(figures.spi, dec("0.9000"));
        assert_eq!(figures.cpi, dec("0.9474"));
    }

    #[test]
    fn zero_denominators_default_indices_to_one() {
        let no_plan = derive_evm_figures(Decimal::ZERO, dec("500"), dec("400"));
        assert_eq!(no_plan.spi, Decimal::ONE);
        assert_eq!(no_plan.cpi, dec("1.2500"));

        let no_cost = derive_evm_figures(dec("500"), dec("500"), Decimal::ZERO);
        assert_eq!(no_cost.cpi, Decimal::ONE);
        assert_eq!(no_cost.spi, dec("1.0000"));
    }

    #[test]
    fn ahead_of_schedule_under_budget() {
        let figures = derive_evm_figures(dec("80000"), dec("90000"), dec("85000"));
        assert_eq!(figures.schedule_variance, dec("10000.00"));
        assert_eq!(figures.cost_variance, dec("5000.00"));
        assert_eq!(figures.spi, dec("1.1250"));
        assert_eq!(figures.cpi, dec("1.0588"));
    }

    #[test]
    fn derivation_is_idempotent() {
        let a = derive_evm_figures(dec("1234.56"), dec("1111.11"), dec("999.99"));
        let b = derive_evm_figures(dec("1234.56"), dec("1111.11"), dec("999.99"));
        assert_eq!(a, b);
    }
}
