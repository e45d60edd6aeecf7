//! Quality inspection and HSE incident routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::quality::{
    CreateHseIncidentRequest, CreateInspectionRequest, HseIncident, IncidentSeverity, Inspection,
    InspectionResult, InspectionType, UpdateHseIncidentRequest, UpdateInspectionRequest,
};
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct InspectionRow {
    id: Uuid,
    project_id: Uuid,
    inspection_no: String,
    inspection_type: String,
    result: String,
    inspection_date: NaiveDate,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InspectionRow> for Inspection {
    fn from(row: InspectionRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            inspection_no: row.inspection_no,
            inspection_type: InspectionType::parse(&row.inspection_type),
            result: InspectionResult::parse(&row.result),
            inspection_date: row.inspection_date,
            remarks: row.remarks,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IncidentRow {
    id: Uuid,
    project_id: Uuid,
    incident_no: String,
    severity: String,
    description: String,
    incident_date: NaiveDate,
    lost_days: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IncidentRow> for HseIncident {
    fn from(row: IncidentRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            incident_no: row.incident_no,
            severity: IncidentSeverity::parse(&row.severity),
            description: row.description,
            incident_date: row.incident_date,
            lost_days: row.lost_days,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const INSPECTION_COLUMNS: &str = "id, project_id, inspection_no, inspection_type, result, \
     inspection_date, remarks, created_at, updated_at";

const INCIDENT_COLUMNS: &str = "id, project_id, incident_no, severity, description, \
     incident_date, lost_days, created_at, updated_at";

/// POST /projects/:project_id/inspections
pub async fn create_inspection(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateInspectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND deleted_at IS NULL)",
    )
    .bind(project_id)
    .fetch_one(&state.db)
    .await?;
    if !project_exists {
        return Err(ApiError::not_found("Project not found"));
    }

    let row = sqlx::query_as::<_, InspectionRow>(&format!(
        r#"
        INSERT INTO inspections (project_id, inspection_no, inspection_type, result,
                                 inspection_date, remarks, created_at, updated_at)
        VALUES ($1, $2, $3, 'pending', $4, $5, NOW(), NOW())
        RETURNING {INSPECTION_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(&req.inspection_no)
    .bind(req.inspection_type.as_str())
    .bind(req.inspection_date)
    .bind(&req.remarks)
    .fetch_one(&state.db)
    .await?;

    let inspection: Inspection = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(inspection))))
}

/// GET /projects/:project_id/inspections
pub async fn list_inspections(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, InspectionRow>(&format!(
        "SELECT {INSPECTION_COLUMNS} FROM inspections WHERE project_id = $1 \
         ORDER BY inspection_date DESC"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Inspection> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /inspections/:inspection_id
pub async fn update_inspection(
    State(state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
    Json(req): Json<UpdateInspectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let inspection_type = req.inspection_type.map(|t| t.as_str());
    let result = req.result.map(|r| r.as_str());

    let row = sqlx::query_as::<_, InspectionRow>(&format!(
        r#"
        UPDATE inspections SET
            inspection_type = COALESCE($2, inspection_type),
            result = COALESCE($3, result),
            remarks = COALESCE($4, remarks),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {INSPECTION_COLUMNS}
        "#
    ))
    .bind(inspection_id)
    .bind(inspection_type)
    .bind(result)
    .bind(&req.remarks)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Inspection not found"))?;

    let inspection: Inspection = row.into();
    Ok(Json(DataResponse::new(inspection)))
}

/// DELETE /inspections/:inspection_id
pub async fn delete_inspection(
    State(state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM inspections WHERE id = $1")
        .bind(inspection_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Inspection not found"));
    }

    Ok(Json(MessageResponse::new("Inspection deleted")))
}

/// POST /projects/:project_id/incidents
pub async fn create_incident(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateHseIncidentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND deleted_at IS NULL)",
    )
    .bind(project_id)
    .fetch_one(&state.db)
    .await?;
    if !project_exists {
        return Err(ApiError::not_found("Project not found"));
    }

    let row = sqlx::query_as::<_, IncidentRow>(&format!(
        r#"
        INSERT INTO hse_incidents (project_id, incident_no, severity, description,
                                   incident_date, lost_days, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0), NOW(), NOW())
        RETURNING {INCIDENT_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(&req.incident_no)
    .bind(req.severity.as_str())
    .bind(&req.description)
    .bind(req.incident_date)
    .bind(req.lost_days)
    .fetch_one(&state.db)
    .await?;

    tracing::warn!(incident_no = %req.incident_no, severity = %req.severity.as_str(), "HSE incident recorded");

    let incident: HseIncident = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(incident))))
}

/// GET /projects/:project_id/incidents
pub async fn list_incidents(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, IncidentRow>(&format!(
        "SELECT {INCIDENT_COLUMNS} FROM hse_incidents WHERE project_id = $1 \
         ORDER BY incident_date DESC"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<HseIncident> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /incidents/:incident_id
pub async fn update_incident(
    State(state): State<Arc<AppState>>,
    Path(incident_id): Path<Uuid>,
    Json(req): Json<UpdateHseIncidentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let severity = req.severity.map(|s| s.as_str());

    let row = sqlx::query_as::<_, IncidentRow>(&format!(
        r#"
        UPDATE hse_incidents SET
            severity = COALESCE($2, severity),
            description = COALESCE($3, description),
            lost_days = COALESCE($4, lost_days),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {INCIDENT_COLUMNS}
        "#
    ))
    .bind(incident_id)
    .bind(severity)
    .bind(&req.description)
    .bind(req.lost_days)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("HSE incident not found"))?;

    let incident: HseIncident = row.into();
    Ok(Json(DataResponse::new(incident)))
}

/// DELETE /incidents/:incident_id
pub async fn delete_incident(
    State(state): State<Arc<AppState>>,
    Path(incident_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM hse_incidents WHERE id = $1")
        .bind(incident_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("HSE incident not found"));
    }

    Ok(Json(MessageResponse::new("HSE incident deleted")))
}
