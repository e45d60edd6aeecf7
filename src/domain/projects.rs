use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::locale::{Locale, LocalizedText};
use super::numeric::round_percent;

/// Project lifecycle status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
    Closed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "on_hold" => Self::OnHold,
            "completed" => Self::Completed,
            "closed" => Self::Closed,
            _ => Self::Planning,
        }
    }
}

/// Project entity (soft-deleted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub code: String,
    pub name: LocalizedText,
    pub client_name: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub contract_sum: Decimal,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub code: String,
    pub name_en: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub contract_sum: Option<Decimal>,
}

/// Request DTO for updating a project
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub contract_sum: Option<Decimal>,
}

/// Response DTO for project
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub code: String,
    /// Label resolved against the requested locale
    pub name: String,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub client_name: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub contract_sum: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectResponse {
    pub fn from_project(p: Project, locale: Locale) -> Self {
        Self {
            id: p.id,
            code: p.code,
            name: p.name.name(locale).to_string(),
            name_en: p.name.en.clone(),
            name_ar: p.name.ar.clone(),
            client_name: p.client_name,
            status: p.status,
            start_date: p.start_date,
            end_date: p.end_date,
            contract_sum: p.contract_sum,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Work-breakdown-structure node
///
/// `progress_percent` of a parent node is a cached roll-up over its direct
/// children and is re-derived whenever a child node is saved or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WbsNode {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub code: String,
    pub name: LocalizedText,
    /// Relative weight of this node within its parent, percent
    pub weight_percent: Decimal,
    pub progress_percent: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWbsNodeRequest {
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub code: String,
    pub name_en: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    pub weight_percent: Decimal,
    #[serde(default)]
    pub progress_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWbsNodeRequest {
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub weight_percent: Option<Decimal>,
    #[serde(default)]
    pub progress_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WbsNodeResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub weight_percent: Decimal,
    pub progress_percent: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WbsNodeResponse {
    pub fn from_node(n: WbsNode, locale: Locale) -> Self {
        Self {
            id: n.id,
            project_id: n.project_id,
            parent_id: n.parent_id,
            code: n.code,
            name: n.name.name(locale).to_string(),
            name_en: n.name.en.clone(),
            name_ar: n.name.ar.clone(),
            weight_percent: n.weight_percent,
            progress_percent: n.progress_percent,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

/// Weighted progress roll-up over a node's direct children.
///
/// Returns Σ(progress × weight) / Σ(weight); a parent with no weighted
/// children keeps zero progress.
pub fn rollup_progress(children: &[(Decimal, Decimal)]) -> Decimal {
    let total_weight: Decimal = children.iter().map(|(weight, _)| *weight).sum();
    if total_weight.is_zero() {
        return Decimal::ZERO;
    }

    let weighted: Decimal = children
        .iter()
        .map(|(weight, progress)| *weight * *progress)
        .sum();

    round_percent(weighted / total_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn progress_rollup_is_weight_averaged() {
        // 60% weight at 50% done, 40% weight at 100% done -> 70%
        let children = vec![(dec("60"), dec("50")), (dec("40"), dec("100"))];
        assert_eq!(rollup_progress(&children), dec("70.00"));
    }

    #[test]
    fn progress_rollup_without_children_is_zero() {
        assert_eq!(rollup_progress(&[]), Decimal::ZERO);
        assert_eq!(rollup_progress(&[(Decimal::ZERO, dec("80"))]), Decimal::ZERO);
    }

    #[test]
    fn progress_rollup_is_idempotent() {
        let children = vec![(dec("33.3"), dec("10")), (dec("66.7"), dec("90"))];
        let first = rollup_progress(&children);
        let second = rollup_progress(&children);
        assert_eq!(first, second);
    }
}
