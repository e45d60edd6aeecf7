use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::locale::{Locale, LocalizedText};
use super::numeric::{round_hours, round_money};

/// Ownership model for a piece of equipment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    #[default]
    Owned,
    Rented,
}

impl Ownership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owned => "owned",
            Self::Rented => "rented",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "rented" => Self::Rented,
            _ => Self::Owned,
        }
    }
}

/// Construction equipment entity
///
/// `total_usage_hours` and `total_usage_cost` cache sums over the equipment's
/// usage logs and are re-derived whenever a log is saved or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Uuid,
    pub code: String,
    pub name: LocalizedText,
    pub ownership: Ownership,
    pub hourly_rate: Decimal,
    pub total_usage_hours: Decimal,
    pub total_usage_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEquipmentRequest {
    pub code: String,
    pub name_en: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub ownership: Ownership,
    pub hourly_rate: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEquipmentRequest {
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub ownership: Option<Ownership>,
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EquipmentResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub ownership: Ownership,
    pub hourly_rate: Decimal,
    pub total_usage_hours: Decimal,
    pub total_usage_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EquipmentResponse {
    pub fn from_equipment(e: Equipment, locale: Locale) -> Self {
        Self {
            id: e.id,
            code: e.code,
            name: e.name.name(locale).to_string(),
            name_en: e.name.en.clone(),
            name_ar: e.name.ar.clone(),
            ownership: e.ownership,
            hourly_rate: e.hourly_rate,
            total_usage_hours: e.total_usage_hours,
            total_usage_cost: e.total_usage_cost,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// One day's usage of a piece of equipment on a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentUsageLog {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub project_id: Uuid,
    pub usage_date: NaiveDate,
    pub hours: Decimal,
    /// `cost = hours × hourly_rate` as of the log's save
    pub cost: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUsageLogRequest {
    pub project_id: Uuid,
    pub usage_date: NaiveDate,
    pub hours: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUsageLogRequest {
    #[serde(default)]
    pub usage_date: Option<NaiveDate>,
    #[serde(default)]
    pub hours: Option<Decimal>,
}

/// `cost = hours × hourly_rate`, money scale
pub fn usage_cost(hours: Decimal, hourly_rate: Decimal) -> Decimal {
    round_money(hours * hourly_rate)
}

/// Re-derive the cached usage totals from the current logs
pub fn derive_usage_totals(logs: &[(Decimal, Decimal)]) -> (Decimal, Decimal) {
    let hours: Decimal = logs.iter().map(|(h, _)| *h).sum();
    let cost: Decimal = logs.iter().map(|(_, c)| *c).sum();
    (round_hours(hours), round_money(cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn cost_is_hours_times_rate() {
        assert_eq!(usage_cost(dec("7.5"), dec("250")), dec("1875.00"));
    }

    #[test]
    fn totals_sum_over_logs() {
        let logs = vec![
            (dec("8"), usage_cost(dec("8"), dec("250"))),
            (dec("6.5"), usage_cost(dec("6.5"), dec("250"))),
        ];
        let (hours, cost) = derive_usage_totals(&logs);
        assert_eq!(hours, dec("14.50"));
        assert_eq!(cost, dec("3625.00"));
    }

    #[test]
    fn totals_of_no_logs_are_zero() {
        let (hours, cost) = derive_usage_totals(&[]);
        assert_eq!(hours, dec("0.00"));
        assert_eq!(cost, dec("0.00"));
    }
}
