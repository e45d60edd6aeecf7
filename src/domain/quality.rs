use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inspection type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InspectionType {
    #[default]
    Material,
    Workmanship,
    Dimensional,
    Handover,
}

impl InspectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Workmanship => "workmanship",
            Self::Dimensional => "dimensional",
            Self::Handover => "handover",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "workmanship" => Self::Workmanship,
            "dimensional" => Self::Dimensional,
            "handover" => Self::Handover,
            _ => Self::Material,
        }
    }
}

/// Inspection result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InspectionResult {
    #[default]
    Pending,
    Passed,
    Failed,
    ConditionallyPassed,
}

impl InspectionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::ConditionallyPassed => "conditionally_passed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "conditionally_passed" => Self::ConditionallyPassed,
            _ => Self::Pending,
        }
    }
}

/// Quality inspection record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub id: Uuid,
    pub project_id: Uuid,
    pub inspection_no: String,
    pub inspection_type: InspectionType,
    pub result: InspectionResult,
    pub inspection_date: NaiveDate,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInspectionRequest {
    pub inspection_no: String,
    #[serde(default)]
    pub inspection_type: InspectionType,
    pub inspection_date: NaiveDate,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInspectionRequest {
    #[serde(default)]
    pub inspection_type: Option<InspectionType>,
    #[serde(default)]
    pub result: Option<InspectionResult>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// HSE incident severity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    #[default]
    NearMiss,
    FirstAid,
    MedicalTreatment,
    LostTime,
    Fatality,
}

impl IncidentSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearMiss => "near_miss",
            Self::FirstAid => "first_aid",
            Self::MedicalTreatment => "medical_treatment",
            Self::LostTime => "lost_time",
            Self::Fatality => "fatality",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "first_aid" => Self::FirstAid,
            "medical_treatment" => Self::MedicalTreatment,
            "lost_time" => Self::LostTime,
            "fatality" => Self::Fatality,
            _ => Self::NearMiss,
        }
    }
}

/// Health/safety/environment incident record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HseIncident {
    pub id: Uuid,
    pub project_id: Uuid,
    pub incident_no: String,
    pub severity: IncidentSeverity,
    pub description: String,
    pub incident_date: NaiveDate,
    pub lost_days: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHseIncidentRequest {
    pub incident_no: String,
    #[serde(default)]
    pub severity: IncidentSeverity,
    pub description: String,
    pub incident_date: NaiveDate,
    #[serde(default)]
    pub lost_days: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateHseIncidentRequest {
    #[serde(default)]
    pub severity: Option<IncidentSeverity>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lost_days: Option<i32>,
}
