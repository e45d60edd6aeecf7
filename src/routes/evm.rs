//! Earned-value measurement routes
//!
//! Measurement headers cache the sums and indices over their detail rows.
//! Detail saves and deletes re-derive the header in the same transaction,
//! summing in SQL so the header always matches what the table holds.

use axum::{
    extract::{Path, State},
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
use crate::domain::evm::{
    derive_evm_figures, CreateEvmDetailRequest, CreateEvmMeasurementRequest, EvmDetail,
    EvmMeasurement, UpdateEvmDetailRequest,
};
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct MeasurementRow {
    id: Uuid,
    project_id: Uuid,
    period_end: NaiveDate,
    total_planned_value: Decimal,
    total_earned_value: Decimal,
    total_actual_cost: Decimal,
    schedule_variance: Decimal,
    cost_variance: Decimal,
    spi: Decimal,
    cpi: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MeasurementRow> for EvmMeasurement {
    fn from(row: MeasurementRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            period_end: row.period_end,
            total_planned_value: row.total_planned_value,
            total_earned_value: row.total_earned_value,
            total_actual_cost: row.total_actual_cost,
            schedule_variance: row.schedule_variance,
            cost_variance: row.cost_variance,
            spi: row.spi,
            cpi: row.cpi,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DetailRow {
    id: Uuid,
    measurement_id: Uuid,
    wbs_node_id: Uuid,
    planned_value: Decimal,
    earned_value: Decimal,
    actual_cost: Decimal,
    schedule_variance: Decimal,
    cost_variance: Decimal,
    spi: Decimal,
    cpi: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DetailRow> for EvmDetail {
    fn from(row: DetailRow) -> Self {
        Self {
            id: row.id,
            measurement_id: row.measurement_id,
            wbs_node_id: row.wbs_node_id,
            planned_value: row.planned_value,
            earned_value: row.earned_value,
            actual_cost: row.actual_cost,
            schedule_variance: row.schedule_variance,
            cost_variance: row.cost_variance,
            spi: row.spi,
            cpi: row.cpi,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const MEASUREMENT_COLUMNS: &str = "id, project_id, period_end, total_planned_value, \
     total_earned_value, total_actual_cost, schedule_variance, cost_variance, spi, cpi, \
     created_at, updated_at";

const DETAIL_COLUMNS: &str = "id, measurement_id, wbs_node_id, planned_value, earned_value, \
     actual_cost, schedule_variance, cost_variance, spi, cpi, created_at, updated_at";

/// Re-sum the measurement's totals and indices from its detail rows.
///
/// Indices whose denominator sums to zero default to 1, matching the
/// per-detail derivation.
async fn recompute_measurement(
    tx: &mut Transaction<'_, Postgres>,
    measurement_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE evm_measurements m SET
            total_planned_value = s.pv,
            total_earned_value = s.ev,
            total_actual_cost = s.ac,
            schedule_variance = ROUND(s.ev - s.pv, 2),
            cost_variance = ROUND(s.ev - s.ac, 2),
            spi = CASE WHEN s.pv = 0 THEN 1 ELSE ROUND(s.ev / s.pv, 4) END,
            cpi = CASE WHEN s.ac = 0 THEN 1 ELSE ROUND(s.ev / s.ac, 4) END,
            updated_at = NOW()
        FROM (
            SELECT COALESCE(SUM(planned_value), 0) AS pv,
                   COALESCE(SUM(earned_value), 0) AS ev,
                   COALESCE(SUM(actual_cost), 0) AS ac
            FROM evm_details WHERE measurement_id = $1
        ) s
        WHERE m.id = $1
        "#,
    )
    .bind(measurement_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// POST /projects/:project_id/evm
pub async fn create_measurement(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateEvmMeasurementRequest>,
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

    let row = sqlx::query_as::<_, MeasurementRow>(&format!(
        r#"
        INSERT INTO evm_measurements (project_id, period_end, total_planned_value,
                                      total_earned_value, total_actual_cost,
                                      schedule_variance, cost_variance, spi, cpi,
                                      created_at, updated_at)
        VALUES ($1, $2, 0, 0, 0, 0, 0, 1, 1, NOW(), NOW())
        RETURNING {MEASUREMENT_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(req.period_end)
    .fetch_one(&state.db)
    .await?;

    let measurement: EvmMeasurement = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(measurement))))
}

/// GET /projects/:project_id/evm
pub async fn list_measurements(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, MeasurementRow>(&format!(
        "SELECT {MEASUREMENT_COLUMNS} FROM evm_measurements WHERE project_id = $1 \
         ORDER BY period_end"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<EvmMeasurement> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /evm/:measurement_id
pub async fn get_measurement(
    State(state): State<Arc<AppState>>,
    Path(measurement_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, MeasurementRow>(&format!(
        "SELECT {MEASUREMENT_COLUMNS} FROM evm_measurements WHERE id = $1"
    ))
    .bind(measurement_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("EVM measurement not found"))?;

    let measurement: EvmMeasurement = row.into();
    Ok(Json(DataResponse::new(measurement)))
}

/// DELETE /evm/:measurement_id
pub async fn delete_measurement(
    State(state): State<Arc<AppState>>,
    Path(measurement_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM evm_measurements WHERE id = $1")
        .bind(measurement_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("EVM measurement not found"));
    }

    Ok(Json(MessageResponse::new("EVM measurement deleted")))
}

/// POST /evm/:measurement_id/details
pub async fn create_detail(
    State(state): State<Arc<AppState>>,
    Path(measurement_id): Path<Uuid>,
    Json(req): Json<CreateEvmDetailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let measurement_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM evm_measurements WHERE id = $1)")
            .bind(measurement_id)
            .fetch_one(&mut *tx)
            .await?;
    if !measurement_exists {
        return Err(ApiError::not_found("EVM measurement not found"));
    }

    let figures = derive_evm_figures(req.planned_value, req.earned_value, req.actual_cost);

    let row = sqlx::query_as::<_, DetailRow>(&format!(
        r#"
        INSERT INTO evm_details (measurement_id, wbs_node_id, planned_value, earned_value,
                                 actual_cost, schedule_variance, cost_variance, spi, cpi,
                                 created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
        RETURNING {DETAIL_COLUMNS}
        "#
    ))
    .bind(measurement_id)
    .bind(req.wbs_node_id)
    .bind(req.planned_value)
    .bind(req.earned_value)
    .bind(req.actual_cost)
    .bind(figures.schedule_variance)
    .bind(figures.cost_variance)
    .bind(figures.spi)
    .bind(figures.cpi)
    .fetch_one(&mut *tx)
    .await?;

    recompute_measurement(&mut tx, measurement_id).await?;
    tx.commit().await?;

    let detail: EvmDetail = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(detail))))
}

/// GET /evm/:measurement_id/details
pub async fn list_details(
    State(state): State<Arc<AppState>>,
    Path(measurement_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, DetailRow>(&format!(
        "SELECT {DETAIL_COLUMNS} FROM evm_details WHERE measurement_id = $1 ORDER BY created_at"
    ))
    .bind(measurement_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<EvmDetail> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /evm/:measurement_id/details/:detail_id
pub async fn update_detail(
    State(state): State<Arc<AppState>>,
    Path((measurement_id, detail_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateEvmDetailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let current = sqlx::query_as::<_, DetailRow>(&format!(
        "SELECT {DETAIL_COLUMNS} FROM evm_details WHERE id = $1 AND measurement_id = $2 \
         FOR UPDATE"
    ))
    .bind(detail_id)
    .bind(measurement_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("EVM detail not found"))?;

    let planned_value = req.planned_value.unwrap_or(current.planned_value);
    let earned_value = req.earned_value.unwrap_or(current.earned_value);
    let actual_cost = req.actual_cost.unwrap_or(current.actual_cost);

    let figures = derive_evm_figures(planned_value, earned_value, actual_cost);

    let row = sqlx::query_as::<_, DetailRow>(&format!(
        r#"
        UPDATE evm_details SET
            planned_value = $3,
            earned_value = $4,
            actual_cost = $5,
            schedule_variance = $6,
            cost_variance = $7,
            spi = $8,
            cpi = $9,
            updated_at = NOW()
        WHERE id = $1 AND measurement_id = $2
        RETURNING {DETAIL_COLUMNS}
        "#
    ))
    .bind(detail_id)
    .bind(measurement_id)
    .bind(planned_value)
    .bind(earned_value)
    .bind(actual_cost)
    .bind(figures.schedule_variance)
    .bind(figures.cost_variance)
    .bind(figures.spi)
    .bind(figures.cpi)
    .fetch_one(&mut *tx)
    .await?;

    recompute_measurement(&mut tx, measurement_id).await?;
    tx.commit().await?;

    let detail: EvmDetail = row.into();
    Ok(Json(DataResponse::new(detail)))
}

/// DELETE /evm/:measurement_id/details/:detail_id
pub async fn delete_detail(
    State(state): State<Arc<AppState>>,
    Path((measurement_id, detail_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query("DELETE FROM evm_details WHERE id = $1 AND measurement_id = $2")
        .bind(detail_id)
        .bind(measurement_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("EVM detail not found"));
    }

    recompute_measurement(&mut tx, measurement_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("EVM detail deleted")))
}
