//! Steel fabrication order and bar bending schedule routes
//!
//! Orders soft-delete; a soft-deleted order no longer accepts bar schedules
//! and its weight stops changing. Bar schedule saves and deletes re-sum the
//! parent order's total weight in the same transaction.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::fabrication::{
    bar_total_weight, resolve_unit_weight, BarSchedule, CreateBarScheduleRequest,
    CreateFabricationOrderRequest, FabricationOrder, FabricationStatus,
    UpdateBarScheduleRequest, UpdateFabricationOrderRequest,
};
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    project_id: Uuid,
    order_no: String,
    drawing_ref: Option<String>,
    status: String,
    total_weight: Decimal,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for FabricationOrder {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            order_no: row.order_no,
            drawing_ref: row.drawing_ref,
            status: FabricationStatus::parse(&row.status),
            total_weight: row.total_weight,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BarScheduleRow {
    id: Uuid,
    order_id: Uuid,
    bar_mark: String,
    diameter: i32,
    length: Decimal,
    count: i32,
    unit_weight: Decimal,
    total_weight: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BarScheduleRow> for BarSchedule {
    fn from(row: BarScheduleRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            bar_mark: row.bar_mark,
            diameter: row.diameter,
            length: row.length,
            count: row.count,
            unit_weight: row.unit_weight,
            total_weight: row.total_weight,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, project_id, order_no, drawing_ref, status, total_weight, \
     deleted_at, created_at, updated_at";

const BAR_COLUMNS: &str = "id, order_id, bar_mark, diameter, length, count, unit_weight, \
     total_weight, created_at, updated_at";

/// Re-sum the order's total weight from its bar schedules
async fn recompute_order_weight(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE fabrication_orders SET total_weight = COALESCE((SELECT ROUND(SUM(total_weight), 2) \
         FROM bar_schedules WHERE order_id = $1), 0), updated_at = NOW() WHERE id = $1",
    )
    .bind(order_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// POST /projects/:project_id/fabrication-orders
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateFabricationOrderRequest>,
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

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        INSERT INTO fabrication_orders (project_id, order_no, drawing_ref, status,
                                        total_weight, created_at, updated_at)
        VALUES ($1, $2, $3, 'open', 0, NOW(), NOW())
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(&req.order_no)
    .bind(&req.drawing_ref)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(order_no = %req.order_no, "Fabrication order created");

    let order: FabricationOrder = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(order))))
}

/// GET /projects/:project_id/fabrication-orders
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM fabrication_orders \
         WHERE project_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<FabricationOrder> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /fabrication-orders/:order_id
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM fabrication_orders WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(order_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Fabrication order not found"))?;

    let order: FabricationOrder = row.into();
    Ok(Json(DataResponse::new(order)))
}

/// PUT /fabrication-orders/:order_id
pub async fn update_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateFabricationOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = req.status.map(|s| s.as_str());

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        UPDATE fabrication_orders SET
            drawing_ref = COALESCE($2, drawing_ref),
            status = COALESCE($3, status),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(order_id)
    .bind(&req.drawing_ref)
    .bind(status)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Fabrication order not found"))?;

    let order: FabricationOrder = row.into();
    Ok(Json(DataResponse::new(order)))
}

/// DELETE /fabrication-orders/:order_id (soft delete)
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query(
        "UPDATE fabrication_orders SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(order_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Fabrication order not found"));
    }

    Ok(Json(MessageResponse::new("Fabrication order deleted")))
}

/// POST /fabrication-orders/:order_id/bar-schedules
pub async fn create_bar_schedule(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<CreateBarScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.length <= Decimal::ZERO || req.count <= 0 {
        return Err(ApiError::bad_request("length and count must be positive"));
    }

    let mut tx = state.db.begin().await?;

    let order_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM fabrication_orders WHERE id = $1 AND deleted_at IS NULL)",
    )
    .bind(order_id)
    .fetch_one(&mut *tx)
    .await?;
    if !order_exists {
        return Err(ApiError::not_found("Fabrication order not found"));
    }

    let unit_weight =
        resolve_unit_weight(req.diameter, req.unit_weight).map_err(ApiError::BadRequest)?;
    let total_weight = bar_total_weight(req.length, req.count, unit_weight);

    let row = sqlx::query_as::<_, BarScheduleRow>(&format!(
        r#"
        INSERT INTO bar_schedules (order_id, bar_mark, diameter, length, count, unit_weight,
                                   total_weight, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
        RETURNING {BAR_COLUMNS}
        "#
    ))
    .bind(order_id)
    .bind(&req.bar_mark)
    .bind(req.diameter)
    .bind(req.length)
    .bind(req.count)
    .bind(unit_weight)
    .bind(total_weight)
    .fetch_one(&mut *tx)
    .await?;

    recompute_order_weight(&mut tx, order_id).await?;
    tx.commit().await?;

    let schedule: BarSchedule = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(schedule))))
}

/// GET /fabrication-orders/:order_id/bar-schedules
pub async fn list_bar_schedules(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, BarScheduleRow>(&format!(
        "SELECT {BAR_COLUMNS} FROM bar_schedules WHERE order_id = $1 ORDER BY bar_mark"
    ))
    .bind(order_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<BarSchedule> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /fabrication-orders/:order_id/bar-schedules/:schedule_id
pub async fn update_bar_schedule(
    State(state): State<Arc<AppState>>,
    Path((order_id, schedule_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateBarScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let current = sqlx::query_as::<_, BarScheduleRow>(&format!(
        "SELECT {BAR_COLUMNS} FROM bar_schedules WHERE id = $1 AND order_id = $2 FOR UPDATE"
    ))
    .bind(schedule_id)
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Bar schedule not found"))?;

    let diameter = req.diameter.unwrap_or(current.diameter);
    let length = req.length.unwrap_or(current.length);
    let count = req.count.unwrap_or(current.count);
    if length <= Decimal::ZERO || count <= 0 {
        return Err(ApiError::bad_request("length and count must be positive"));
    }

    // Keep the stored unit weight unless the diameter changed or a new
    // explicit weight was supplied
    let unit_weight = if req.unit_weight.is_some() || diameter != current.diameter {
        resolve_unit_weight(diameter, req.unit_weight).map_err(ApiError::BadRequest)?
    } else {
        current.unit_weight
    };
    let total_weight = bar_total_weight(length, count, unit_weight);

    let row = sqlx::query_as::<_, BarScheduleRow>(&format!(
        r#"
        UPDATE bar_schedules SET
            bar_mark = COALESCE($3, bar_mark),
            diameter = $4,
            length = $5,
            count = $6,
            unit_weight = $7,
            total_weight = $8,
            updated_at = NOW()
        WHERE id = $1 AND order_id = $2
        RETURNING {BAR_COLUMNS}
        "#
    ))
    .bind(schedule_id)
    .bind(order_id)
    .bind(&req.bar_mark)
    .bind(diameter)
    .bind(length)
    .bind(count)
    .bind(unit_weight)
    .bind(total_weight)
    .fetch_one(&mut *tx)
    .await?;

    recompute_order_weight(&mut tx, order_id).await?;
    tx.commit().await?;

    let schedule: BarSchedule = row.into();
    Ok(Json(DataResponse::new(schedule)))
}

/// DELETE /fabrication-orders/:order_id/bar-schedules/:schedule_id
pub async fn delete_bar_schedule(
    State(state): State<Arc<AppState>>,
    Path((order_id, schedule_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query("DELETE FROM bar_schedules WHERE id = $1 AND order_id = $2")
        .bind(schedule_id)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Bar schedule not found"));
    }

    recompute_order_weight(&mut tx, order_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("Bar schedule deleted")))
}
