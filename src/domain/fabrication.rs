use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::numeric::{round_unit_weight, round_weight};

/// Steel fabrication order status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FabricationStatus {
    #[default]
    Open,
    InProgress,
    Fabricated,
    Delivered,
    Cancelled,
}

impl FabricationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Fabricated => "fabricated",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "in_progress" => Self::InProgress,
            "fabricated" => Self::Fabricated,
            "delivered" => Self::Delivered,
            "cancelled" => Self::Cancelled,
            _ => Self::Open,
        }
    }
}

/// Steel fabrication order (soft-deleted)
///
/// `total_weight` caches the sum over the order's bar schedules and is
/// re-derived whenever a bar schedule is saved or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricationOrder {
    pub id: Uuid,
    pub project_id: Uuid,
    pub order_no: String,
    pub drawing_ref: Option<String>,
    pub status: FabricationStatus,
    pub total_weight: Decimal,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFabricationOrderRequest {
    pub order_no: String,
    #[serde(default)]
    pub drawing_ref: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFabricationOrderRequest {
    #[serde(default)]
    pub drawing_ref: Option<String>,
    #[serde(default)]
    pub status: Option<FabricationStatus>,
}

/// Bar bending schedule line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSchedule {
    pub id: Uuid,
    pub order_id: Uuid,
    pub bar_mark: String,
    /// Bar diameter, mm
    pub diameter: i32,
    /// Cut length per bar, m
    pub length: Decimal,
    pub count: i32,
    /// kg per metre; defaulted from the rebar table when not supplied
    pub unit_weight: Decimal,
    pub total_weight: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBarScheduleRequest {
    pub bar_mark: String,
    pub diameter: i32,
    pub length: Decimal,
    pub count: i32,
    #[serde(default)]
    pub unit_weight: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBarScheduleRequest {
    #[serde(default)]
    pub bar_mark: Option<String>,
    #[serde(default)]
    pub diameter: Option<i32>,
    #[serde(default)]
    pub length: Option<Decimal>,
    #[serde(default)]
    pub count: Option<i32>,
    #[serde(default)]
    pub unit_weight: Option<Decimal>,
}

/// Nominal rebar unit weight (kg/m) by diameter (mm)
pub fn rebar_unit_weight(diameter: i32) -> Option<Decimal> {
    let milligrams_per_metre = match diameter {
        8 => 395,
        10 => 617,
        12 => 888,
        14 => 1_208,
        16 => 1_578,
        18 => 1_998,
        20 => 2_466,
        22 => 2_984,
        25 => 3_853,
        28 => 4_834,
        32 => 6_313,
        _ => return None,
    };
    Some(Decimal::new(milligrams_per_metre, 3))
}

/// Resolve a bar schedule's unit weight: explicit value wins, otherwise the
/// rebar table; an unknown diameter with no explicit weight is rejected.
pub fn resolve_unit_weight(diameter: i32, explicit: Option<Decimal>) -> Result<Decimal, String> {
    if let Some(weight) = explicit {
        if weight <= Decimal::ZERO {
            return Err("unit_weight must be positive".to_string());
        }
        return Ok(round_unit_weight(weight));
    }
    rebar_unit_weight(diameter)
        .ok_or_else(|| format!("no standard unit weight for diameter {diameter}mm"))
}

/// `total_weight = length × count × unit_weight`, kg
pub fn bar_total_weight(length: Decimal, count: i32, unit_weight: Decimal) -> Decimal {
    round_weight(length * Decimal::from(count) * unit_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rebar_table_covers_standard_diameters() {
        assert_eq!(rebar_unit_weight(8), Some(dec("0.395")));
        assert_eq!(rebar_unit_weight(16), Some(dec("1.578")));
        assert_eq!(rebar_unit_weight(32), Some(dec("6.313")));
        assert_eq!(rebar_unit_weight(15), None);
    }

    #[test]
    fn worked_example_d16_l6_n10() {
        // diameter=16, length=6, count=10 -> unit 1.578, total 94.68
        let unit = resolve_unit_weight(16, None).unwrap();
        assert_eq!(unit, dec("1.578"));
        assert_eq!(bar_total_weight(dec("6"), 10, unit), dec("94.68"));
    }

    #[test]
    fn explicit_unit_weight_overrides_table() {
        let unit = resolve_unit_weight(16, Some(dec("1.6"))).unwrap();
        assert_eq!(unit, dec("1.600"));
    }

    #[test]
    fn unknown_diameter_without_weight_is_rejected() {
        assert!(resolve_unit_weight(15, None).is_err());
        assert!(resolve_unit_weight(16, Some(Decimal::ZERO)).is_err());
    }

    #[test]
    fn order_weight_is_sum_of_schedules() {
        let lines = [
            bar_total_weight(dec("6"), 10, dec("1.578")), // 94.68
            bar_total_weight(dec("3.2"), 24, dec("0.617")), // 47.39
            bar_total_weight(dec("12"), 8, dec("2.466")), // 236.74
        ];
        let total: Decimal = lines.iter().copied().sum();
        assert_eq!(round_weight(total), dec("378.81"));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let first = bar_total_weight(dec("5.55"), 7, dec("0.888"));
        let second = bar_total_weight(dec("5.55"), 7, dec("0.888"));
        assert_eq!(first, second);
    }
}
