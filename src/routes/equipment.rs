//! Equipment and usage log routes
//!
//! Usage totals on the equipment record cache sums over its logs and are
//! re-summed inside the same transaction as any log save or delete.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::equipment::{
    usage_cost, CreateEquipmentRequest, CreateUsageLogRequest, Equipment, EquipmentResponse,
    EquipmentUsageLog, Ownership, UpdateEquipmentRequest, UpdateUsageLogRequest,
};
use crate::domain::locale::{Locale, LocaleParams, LocalizedText};
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct EquipmentRow {
    id: Uuid,
    code: String,
    name_en: String,
    name_ar: Option<String>,
    ownership: String,
    hourly_rate: Decimal,
    total_usage_hours: Decimal,
    total_usage_cost: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EquipmentRow> for Equipment {
    fn from(row: EquipmentRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: LocalizedText::new(row.name_en, row.name_ar),
            ownership: Ownership::parse(&row.ownership),
            hourly_rate: row.hourly_rate,
            total_usage_hours: row.total_usage_hours,
            total_usage_cost: row.total_usage_cost,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UsageLogRow {
    id: Uuid,
    equipment_id: Uuid,
    project_id: Uuid,
    usage_date: NaiveDate,
    hours: Decimal,
    cost: Decimal,
    created_at: DateTime<Utc>,
}

impl From<UsageLogRow> for EquipmentUsageLog {
    fn from(row: UsageLogRow) -> Self {
        Self {
            id: row.id,
            equipment_id: row.equipment_id,
            project_id: row.project_id,
            usage_date: row.usage_date,
            hours: row.hours,
            cost: row.cost,
            created_at: row.created_at,
        }
    }
}

const EQUIPMENT_COLUMNS: &str = "id, code, name_en, name_ar, ownership, hourly_rate, \
     total_usage_hours, total_usage_cost, created_at, updated_at";

const USAGE_LOG_COLUMNS: &str =
    "id, equipment_id, project_id, usage_date, hours, cost, created_at";

fn resolve_locale(state: &AppState, params: &LocaleParams) -> Locale {
    params.locale.unwrap_or(state.settings.default_locale)
}

/// Re-sum the equipment's usage totals from its logs
async fn recompute_usage_totals(
    tx: &mut Transaction<'_, Postgres>,
    equipment_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE equipment SET
            total_usage_hours = COALESCE((SELECT ROUND(SUM(hours), 2)
                FROM equipment_usage_logs WHERE equipment_id = $1), 0),
            total_usage_cost = COALESCE((SELECT SUM(cost)
                FROM equipment_usage_logs WHERE equipment_id = $1), 0),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(equipment_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// POST /equipment
pub async fn create_equipment(
    State(state): State<Arc<AppState>>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<CreateEquipmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.hourly_rate < Decimal::ZERO {
        return Err(ApiError::bad_request("hourly_rate must not be negative"));
    }

    let row = sqlx::query_as::<_, EquipmentRow>(&format!(
        r#"
        INSERT INTO equipment (code, name_en, name_ar, ownership, hourly_rate,
                               total_usage_hours, total_usage_cost, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 0, 0, NOW(), NOW())
        RETURNING {EQUIPMENT_COLUMNS}
        "#
    ))
    .bind(&req.code)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(req.ownership.as_str())
    .bind(req.hourly_rate)
    .fetch_one(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let response = EquipmentResponse::from_equipment(row.into(), locale);
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /equipment
pub async fn list_equipment(
    State(state): State<Arc<AppState>>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, EquipmentRow>(&format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment ORDER BY code"
    ))
    .fetch_all(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let data: Vec<EquipmentResponse> = rows
        .into_iter()
        .map(|row| EquipmentResponse::from_equipment(row.into(), locale))
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /equipment/:equipment_id
pub async fn get_equipment(
    State(state): State<Arc<AppState>>,
    Path(equipment_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, EquipmentRow>(&format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE id = $1"
    ))
    .bind(equipment_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Equipment not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(EquipmentResponse::from_equipment(
        row.into(),
        locale,
    ))))
}

/// PUT /equipment/:equipment_id
pub async fn update_equipment(
    State(state): State<Arc<AppState>>,
    Path(equipment_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<UpdateEquipmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ownership = req.ownership.map(|o| o.as_str());

    let row = sqlx::query_as::<_, EquipmentRow>(&format!(
        r#"
        UPDATE equipment SET
            name_en = COALESCE($2, name_en),
            name_ar = COALESCE($3, name_ar),
            ownership = COALESCE($4, ownership),
            hourly_rate = COALESCE($5, hourly_rate),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {EQUIPMENT_COLUMNS}
        "#
    ))
    .bind(equipment_id)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(ownership)
    .bind(req.hourly_rate)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Equipment not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(EquipmentResponse::from_equipment(
        row.into(),
        locale,
    ))))
}

/// DELETE /equipment/:equipment_id
///
/// Usage logs go with the equipment via the cascading foreign key.
pub async fn delete_equipment(
    State(state): State<Arc<AppState>>,
    Path(equipment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
        .bind(equipment_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Equipment not found"));
    }

    Ok(Json(MessageResponse::new("Equipment deleted")))
}

/// POST /equipment/:equipment_id/usage-logs
///
/// The log's cost snapshots the hourly rate as of the save.
pub async fn create_usage_log(
    State(state): State<Arc<AppState>>,
    Path(equipment_id): Path<Uuid>,
    Json(req): Json<CreateUsageLogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.hours <= Decimal::ZERO {
        return Err(ApiError::bad_request("hours must be positive"));
    }

    let mut tx = state.db.begin().await?;

    let hourly_rate: Option<Decimal> =
        sqlx::query_scalar("SELECT hourly_rate FROM equipment WHERE id = $1")
            .bind(equipment_id)
            .fetch_optional(&mut *tx)
            .await?;
    let hourly_rate = hourly_rate.ok_or_else(|| ApiError::not_found("Equipment not found"))?;

    let project_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND deleted_at IS NULL)",
    )
    .bind(req.project_id)
    .fetch_one(&mut *tx)
    .await?;
    if !project_exists {
        return Err(ApiError::bad_request("Project not found"));
    }

    let cost = usage_cost(req.hours, hourly_rate);

    let row = sqlx::query_as::<_, UsageLogRow>(&format!(
        r#"
        INSERT INTO equipment_usage_logs (equipment_id, project_id, usage_date, hours, cost,
                                          created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING {USAGE_LOG_COLUMNS}
        "#
    ))
    .bind(equipment_id)
    .bind(req.project_id)
    .bind(req.usage_date)
    .bind(req.hours)
    .bind(cost)
    .fetch_one(&mut *tx)
    .await?;

    recompute_usage_totals(&mut tx, equipment_id).await?;
    tx.commit().await?;

    let log: EquipmentUsageLog = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(log))))
}

/// GET /equipment/:equipment_id/usage-logs
pub async fn list_usage_logs(
    State(state): State<Arc<AppState>>,
    Path(equipment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, UsageLogRow>(&format!(
        "SELECT {USAGE_LOG_COLUMNS} FROM equipment_usage_logs WHERE equipment_id = $1 \
         ORDER BY usage_date DESC"
    ))
    .bind(equipment_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<EquipmentUsageLog> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /equipment/:equipment_id/usage-logs/:log_id
///
/// The cost snapshot is re-taken at the current hourly rate.
pub async fn update_usage_log(
    State(state): State<Arc<AppState>>,
    Path((equipment_id, log_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateUsageLogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(hours) = req.hours {
        if hours <= Decimal::ZERO {
            return Err(ApiError::bad_request("hours must be positive"));
        }
    }

    let mut tx = state.db.begin().await?;

    let hourly_rate: Option<Decimal> =
        sqlx::query_scalar("SELECT hourly_rate FROM equipment WHERE id = $1")
            .bind(equipment_id)
            .fetch_optional(&mut *tx)
            .await?;
    let hourly_rate = hourly_rate.ok_or_else(|| ApiError::not_found("Equipment not found"))?;

    let current_hours: Option<Decimal> = sqlx::query_scalar(
        "SELECT hours FROM equipment_usage_logs WHERE id = $1 AND equipment_id = $2 FOR UPDATE",
    )
    .bind(log_id)
    .bind(equipment_id)
    .fetch_optional(&mut *tx)
    .await?;
    let current_hours = current_hours.ok_or_else(|| ApiError::not_found("Usage log not found"))?;

    let hours = req.hours.unwrap_or(current_hours);
    let cost = usage_cost(hours, hourly_rate);

    let row = sqlx::query_as::<_, UsageLogRow>(&format!(
        r#"
        UPDATE equipment_usage_logs SET
            usage_date = COALESCE($3, usage_date),
            hours = $4,
            cost = $5
        WHERE id = $1 AND equipment_id = $2
        RETURNING {USAGE_LOG_COLUMNS}
        "#
    ))
    .bind(log_id)
    .bind(equipment_id)
    .bind(req.usage_date)
    .bind(hours)
    .bind(cost)
    .fetch_one(&mut *tx)
    .await?;

    recompute_usage_totals(&mut tx, equipment_id).await?;
    tx.commit().await?;

    let log: EquipmentUsageLog = row.into();
    Ok(Json(DataResponse::new(log)))
}

/// DELETE /equipment/:equipment_id/usage-logs/:log_id
pub async fn delete_usage_log(
    State(state): State<Arc<AppState>>,
    Path((equipment_id, log_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query("DELETE FROM equipment_usage_logs WHERE id = $1 AND equipment_id = $2")
        .bind(log_id)
        .bind(equipment_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Usage log not found"));
    }

    recompute_usage_totals(&mut tx, equipment_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("Usage log deleted")))
}
