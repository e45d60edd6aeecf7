use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::locale::{Locale, LocalizedText};
use super::numeric::{round_index, round_money};

/// Contract status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    #[default]
    Draft,
    Signed,
    Active,
    Suspended,
    Completed,
    Terminated,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Signed => "signed",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "signed" => Self::Signed,
            "active" => Self::Active,
            "suspended" => Self::Suspended,
            "completed" => Self::Completed,
            "terminated" => Self::Terminated,
            _ => Self::Draft,
        }
    }
}

/// Construction contract entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub project_id: Uuid,
    pub contract_no: String,
    pub title: String,
    pub status: ContractStatus,
    pub contract_sum: Decimal,
    /// Percentage withheld from each payment certificate
    pub retention_percent: Decimal,
    /// Advance payment percentage of the contract sum
    pub advance_percent: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContractRequest {
    pub contract_no: String,
    pub title: String,
    pub contract_sum: Decimal,
    #[serde(default)]
    pub retention_percent: Option<Decimal>,
    #[serde(default)]
    pub advance_percent: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContractRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<ContractStatus>,
    #[serde(default)]
    pub contract_sum: Option<Decimal>,
    #[serde(default)]
    pub retention_percent: Option<Decimal>,
    #[serde(default)]
    pub advance_percent: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Bill-of-quantities item
///
/// `line_total = quantity × unit_rate`. The `analysis_*` columns cache the
/// cost breakdown summed from the item's child cost lines and are re-derived
/// whenever a cost line is saved or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoqItem {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub item_no: String,
    pub description: LocalizedText,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_rate: Decimal,
    pub line_total: Decimal,
    pub analysis_material_cost: Decimal,
    pub analysis_labor_cost: Decimal,
    pub analysis_equipment_cost: Decimal,
    pub analysis_subcontractor_cost: Decimal,
    pub analysis_total_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBoqItemRequest {
    pub item_no: String,
    pub description_en: String,
    #[serde(default)]
    pub description_ar: Option<String>,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_rate: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBoqItemRequest {
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub description_ar: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoqItemResponse {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub item_no: String,
    pub description: String,
    pub description_en: String,
    pub description_ar: Option<String>,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_rate: Decimal,
    pub line_total: Decimal,
    pub analysis_material_cost: Decimal,
    pub analysis_labor_cost: Decimal,
    pub analysis_equipment_cost: Decimal,
    pub analysis_subcontractor_cost: Decimal,
    pub analysis_total_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoqItemResponse {
    pub fn from_item(i: BoqItem, locale: Locale) -> Self {
        Self {
            id: i.id,
            contract_id: i.contract_id,
            item_no: i.item_no,
            description: i.description.name(locale).to_string(),
            description_en: i.description.en.clone(),
            description_ar: i.description.ar.clone(),
            unit: i.unit,
            quantity: i.quantity,
            unit_rate: i.unit_rate,
            line_total: i.line_total,
            analysis_material_cost: i.analysis_material_cost,
            analysis_labor_cost: i.analysis_labor_cost,
            analysis_equipment_cost: i.analysis_equipment_cost,
            analysis_subcontractor_cost: i.analysis_subcontractor_cost,
            analysis_total_cost: i.analysis_total_cost,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

/// Cost-analysis resource classes under a BOQ item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostLineKind {
    Material,
    Labor,
    Equipment,
    Subcontractor,
}

impl CostLineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Labor => "labor",
            Self::Equipment => "equipment",
            Self::Subcontractor => "subcontractor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "material" => Some(Self::Material),
            "labor" => Some(Self::Labor),
            "equipment" => Some(Self::Equipment),
            "subcontractor" => Some(Self::Subcontractor),
            _ => None,
        }
    }
}

/// Cost-analysis line under a BOQ item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoqCostLine {
    pub id: Uuid,
    pub boq_item_id: Uuid,
    pub kind: CostLineKind,
    pub description: String,
    pub quantity: Decimal,
    pub unit_rate: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBoqCostLineRequest {
    pub kind: CostLineKind,
    pub description: String,
    pub quantity: Decimal,
    pub unit_rate: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBoqCostLineRequest {
    #[serde(default)]
    pub kind: Option<CostLineKind>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_rate: Option<Decimal>,
}

/// `total = quantity × unit_rate` for a BOQ item or cost line, money scale
pub fn boq_line_total(quantity: Decimal, unit_rate: Decimal) -> Decimal {
    round_money(quantity * unit_rate)
}

/// Per-kind cost sums over the current child cost lines of one BOQ item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostSummary {
    pub material: Decimal,
    pub labor: Decimal,
    pub equipment: Decimal,
    pub subcontractor: Decimal,
    pub total: Decimal,
}

pub fn summarize_cost_lines(lines: &[(CostLineKind, Decimal)]) -> CostSummary {
    let mut summary = CostSummary {
        material: Decimal::ZERO,
        labor: Decimal::ZERO,
        equipment: Decimal::ZERO,
        subcontractor: Decimal::ZERO,
        total: Decimal::ZERO,
    };

    for (kind, total) in lines {
        match kind {
            CostLineKind::Material => summary.material += *total,
            CostLineKind::Labor => summary.labor += *total,
            CostLineKind::Equipment => summary.equipment += *total,
            CostLineKind::Subcontractor => summary.subcontractor += *total,
        }
        summary.total += *total;
    }

    summary.material = round_money(summary.material);
    summary.labor = round_money(summary.labor);
    summary.equipment = round_money(summary.equipment);
    summary.subcontractor = round_money(summary.subcontractor);
    summary.total = round_money(summary.total);
    summary
}

/// Monthly commodity price index value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceIndex {
    pub id: Uuid,
    pub commodity: String,
    pub period: NaiveDate,
    pub index_value: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePriceIndexRequest {
    pub commodity: String,
    pub period: NaiveDate,
    pub index_value: Decimal,
}

/// Commodity and period identify the index; only the value is correctable
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePriceIndexRequest {
    pub index_value: Decimal,
}

/// One commodity's share in a price-adjustment formula
#[derive(Debug, Clone, Deserialize)]
pub struct IndexationInput {
    pub commodity: String,
    /// Fractional weight of the commodity in the work (weights should sum to 1)
    pub weight: Decimal,
    pub base_index: Decimal,
    pub current_index: Decimal,
}

/// BOQ price-adjustment indexation.
///
/// `factor = Σ(weight × current / base)`; the adjustment payable on an
/// eligible amount is `amount × (factor − 1)`.
pub fn price_adjustment_factor(inputs: &[IndexationInput]) -> Result<Decimal, String> {
    let mut factor = Decimal::ZERO;
    for input in inputs {
        if input.base_index.is_zero() {
            return Err(format!(
                "base index for '{}' must be non-zero",
                input.commodity
            ));
        }
        factor += input.weight * (input.current_index / input.base_index);
    }
    Ok(round_index(factor))
}

pub fn price_adjustment_amount(eligible_amount: Decimal, factor: Decimal) -> Decimal {
    round_money(eligible_amount * (factor - Decimal::ONE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn cost_summary_sums_per_kind() {
        let lines = vec![
            (CostLineKind::Material, dec("1000.00")),
            (CostLineKind::Material, dec("250.50")),
            (CostLineKind::Labor, dec("400.00")),
            (CostLineKind::Equipment, dec("120.00")),
            (CostLineKind::Subcontractor, dec("79.50")),
        ];
        let summary = summarize_cost_lines(&lines);
        assert_eq!(summary.material, dec("1250.50"));
        assert_eq!(summary.labor, dec("400.00"));
        assert_eq!(summary.equipment, dec("120.00"));
        assert_eq!(summary.subcontractor, dec("79.50"));
        assert_eq!(summary.total, dec("1850.00"));
    }

    #[test]
    fn cost_summary_of_no_lines_is_zero() {
        let summary = summarize_cost_lines(&[]);
        assert_eq!(summary.total, dec("0.00"));
        assert_eq!(summary.material, dec("0.00"));
    }

    #[test]
    fn cost_summary_is_idempotent() {
        let lines = vec![
            (CostLineKind::Labor, dec("33.33")),
            (CostLineKind::Labor, dec("66.67")),
        ];
        assert_eq!(summarize_cost_lines(&lines), summarize_cost_lines(&lines));
    }

    #[test]
    fn boq_item_total_matches_cost_line_sum_after_mutation() {
        // Simulate insert, update, delete against the same item
        let mut lines = vec![
            (CostLineKind::Material, boq_line_total(dec("10"), dec("50"))),
            (CostLineKind::Labor, boq_line_total(dec("8"), dec("25"))),
        ];
        assert_eq!(summarize_cost_lines(&lines).total, dec("700.00"));

        lines.push((CostLineKind::Equipment, boq_line_total(dec("2"), dec("75"))));
        assert_eq!(summarize_cost_lines(&lines).total, dec("850.00"));

        lines.remove(0);
        assert_eq!(summarize_cost_lines(&lines).total, dec("350.00"));
    }

    #[test]
    fn adjustment_factor_weights_index_ratios() {
        let inputs = vec![
            IndexationInput {
                commodity: "steel".into(),
                weight: dec("0.6"),
                base_index: dec("100"),
                current_index: dec("110"),
            },
            IndexationInput {
                commodity: "cement".into(),
                weight: dec("0.4"),
                base_index: dec("100"),
                current_index: dec("105"),
            },
        ];
        let factor = price_adjustment_factor(&inputs).unwrap();
        assert_eq!(factor, dec("1.0800"));
        assert_eq!(price_adjustment_amount(dec("100000"), factor), dec("8000.00"));
    }

    #[test]
    fn adjustment_rejects_zero_base_index() {
        let inputs = vec![IndexationInput {
            commodity: "steel".into(),
            weight: Decimal::ONE,
            base_index: Decimal::ZERO,
            current_index: dec("110"),
        }];
        assert!(price_adjustment_factor(&inputs).is_err());
    }
}
