use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::locale::{Locale, LocalizedText};
use super::numeric::round_qty;

/// Warehouse entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    pub code: String,
    pub name: LocalizedText,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWarehouseRequest {
    pub code: String,
    pub name_en: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWarehouseRequest {
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Material master record (soft-deleted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub code: String,
    pub name: LocalizedText,
    pub unit: String,
    pub unit_cost: Decimal,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMaterialRequest {
    pub code: String,
    pub name_en: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMaterialRequest {
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub unit: String,
    pub unit_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaterialResponse {
    pub fn from_material(m: Material, locale: Locale) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name.name(locale).to_string(),
            name_en: m.name.en.clone(),
            name_ar: m.name.ar.clone(),
            unit: m.unit,
            unit_cost: m.unit_cost,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Stock movement direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Receipt,
    Issue,
    Adjustment,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Issue => "issue",
            Self::Adjustment => "adjustment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "receipt" => Some(Self::Receipt),
            "issue" => Some(Self::Issue),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// One stock movement of a material in a warehouse
///
/// `balance_after = balance_before ± quantity`; the stock-level row for the
/// (warehouse, material) pair caches the running balance and is re-derived
/// from the surviving movement history on every movement insert or delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub material_id: Uuid,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub movement_date: NaiveDate,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStockMovementRequest {
    pub material_id: Uuid,
    pub kind: MovementKind,
    /// Positive quantity; `issue` subtracts, `adjustment` may be signed
    pub quantity: Decimal,
    pub movement_date: NaiveDate,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Signed effect of a movement on the balance
pub fn signed_quantity(kind: MovementKind, quantity: Decimal) -> Decimal {
    match kind {
        MovementKind::Receipt => quantity,
        MovementKind::Issue => -quantity,
        MovementKind::Adjustment => quantity,
    }
}

/// `balance_after = balance_before ± quantity`
pub fn movement_balance_after(
    balance_before: Decimal,
    kind: MovementKind,
    quantity: Decimal,
) -> Decimal {
    round_qty(balance_before + signed_quantity(kind, quantity))
}

/// Re-derive the cached stock balance from the full movement history
pub fn derive_stock_balance(movements: &[(MovementKind, Decimal)]) -> Decimal {
    round_qty(
        movements
            .iter()
            .map(|(kind, quantity)| signed_quantity(*kind, *quantity))
            .sum(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn receipts_add_and_issues_subtract() {
        assert_eq!(
            movement_balance_after(dec("100"), MovementKind::Receipt, dec("25.5")),
            dec("125.500")
        );
        assert_eq!(
            movement_balance_after(dec("100"), MovementKind::Issue, dec("30")),
            dec("70.000")
        );
        assert_eq!(
            movement_balance_after(dec("100"), MovementKind::Adjustment, dec("-2.75")),
            dec("97.250")
        );
    }

    #[test]
    fn balance_derives_from_full_history() {
        let history = vec![
            (MovementKind::Receipt, dec("500")),
            (MovementKind::Issue, dec("120.25")),
            (MovementKind::Receipt, dec("60")),
            (MovementKind::Adjustment, dec("-4.75")),
        ];
        assert_eq!(derive_stock_balance(&history), dec("435.000"));
    }

    #[test]
    fn deleting_a_movement_resums_the_rest() {
        let mut history = vec![
            (MovementKind::Receipt, dec("200")),
            (MovementKind::Issue, dec("50")),
        ];
        assert_eq!(derive_stock_balance(&history), dec("150.000"));
        history.remove(1);
        assert_eq!(derive_stock_balance(&history), dec("200.000"));
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(derive_stock_balance(&[]), dec("0.000"));
    }
}
