//! Warehouse, material and stock movement routes
//!
//! Stock balances are cached per (warehouse, material) pair in
//! `stock_levels`. Movement inserts and deletes lock that row and re-derive
//! the balance from the surviving movement history in the same transaction.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::locale::{Locale, LocaleParams, LocalizedText};
use crate::domain::warehouse::{
    movement_balance_after, signed_quantity, CreateMaterialRequest, CreateStockMovementRequest,
    CreateWarehouseRequest, Material, MaterialResponse, MovementKind, StockMovement,
    UpdateMaterialRequest, UpdateWarehouseRequest, Warehouse,
};
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct WarehouseRow {
    id: Uuid,
    code: String,
    name_en: String,
    name_ar: Option<String>,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: LocalizedText::new(row.name_en, row.name_ar),
            location: row.location,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MaterialRow {
    id: Uuid,
    code: String,
    name_en: String,
    name_ar: Option<String>,
    unit: String,
    unit_cost: Decimal,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MaterialRow> for Material {
    fn from(row: MaterialRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: LocalizedText::new(row.name_en, row.name_ar),
            unit: row.unit,
            unit_cost: row.unit_cost,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: Uuid,
    warehouse_id: Uuid,
    material_id: Uuid,
    kind: String,
    quantity: Decimal,
    balance_before: Decimal,
    balance_after: Decimal,
    movement_date: NaiveDate,
    reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = ApiError;

    fn try_from(row: MovementRow) -> Result<Self, ApiError> {
        let kind = MovementKind::parse(&row.kind).ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("unknown movement kind '{}'", row.kind))
        })?;
        Ok(Self {
            id: row.id,
            warehouse_id: row.warehouse_id,
            material_id: row.material_id,
            kind,
            quantity: row.quantity,
            balance_before: row.balance_before,
            balance_after: row.balance_after,
            movement_date: row.movement_date,
            reference: row.reference,
            created_at: row.created_at,
        })
    }
}

const WAREHOUSE_COLUMNS: &str =
    "id, code, name_en, name_ar, location, created_at, updated_at";

const MATERIAL_COLUMNS: &str =
    "id, code, name_en, name_ar, unit, unit_cost, deleted_at, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, warehouse_id, material_id, kind, quantity, balance_before, \
     balance_after, movement_date, reference, created_at";

fn resolve_locale(state: &AppState, params: &LocaleParams) -> Locale {
    params.locale.unwrap_or(state.settings.default_locale)
}

/// Lock (creating if absent) the stock-level row and return its balance
async fn lock_stock_level(
    tx: &mut Transaction<'_, Postgres>,
    warehouse_id: Uuid,
    material_id: Uuid,
) -> Result<Decimal, sqlx::Error> {
    sqlx::query(
        "INSERT INTO stock_levels (warehouse_id, material_id, balance, updated_at) \
         VALUES ($1, $2, 0, NOW()) ON CONFLICT (warehouse_id, material_id) DO NOTHING",
    )
    .bind(warehouse_id)
    .bind(material_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query_scalar(
        "SELECT balance FROM stock_levels \
         WHERE warehouse_id = $1 AND material_id = $2 FOR UPDATE",
    )
    .bind(warehouse_id)
    .bind(material_id)
    .fetch_one(&mut **tx)
    .await
}

/// Re-derive the cached balance from the surviving movement history
async fn recompute_stock_level(
    tx: &mut Transaction<'_, Postgres>,
    warehouse_id: Uuid,
    material_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE stock_levels SET
            balance = COALESCE((SELECT ROUND(SUM(
                CASE WHEN kind = 'issue' THEN -quantity ELSE quantity END), 3)
                FROM stock_movements
                WHERE warehouse_id = $1 AND material_id = $2), 0),
            updated_at = NOW()
        WHERE warehouse_id = $1 AND material_id = $2
        "#,
    )
    .bind(warehouse_id)
    .bind(material_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// POST /warehouses
pub async fn create_warehouse(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWarehouseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, WarehouseRow>(&format!(
        r#"
        INSERT INTO warehouses (code, name_en, name_ar, location, created_at, updated_at)
        VALUES ($1, $2, $3, $4, NOW(), NOW())
        RETURNING {WAREHOUSE_COLUMNS}
        "#
    ))
    .bind(&req.code)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.location)
    .fetch_one(&state.db)
    .await?;

    let warehouse: Warehouse = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(warehouse))))
}

/// GET /warehouses
pub async fn list_warehouses(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, WarehouseRow>(&format!(
        "SELECT {WAREHOUSE_COLUMNS} FROM warehouses ORDER BY code"
    ))
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Warehouse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /warehouses/:warehouse_id
pub async fn get_warehouse(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, WarehouseRow>(&format!(
        "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = $1"
    ))
    .bind(warehouse_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Warehouse not found"))?;

    let warehouse: Warehouse = row.into();
    Ok(Json(DataResponse::new(warehouse)))
}

/// PUT /warehouses/:warehouse_id
pub async fn update_warehouse(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
    Json(req): Json<UpdateWarehouseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, WarehouseRow>(&format!(
        r#"
        UPDATE warehouses SET
            name_en = COALESCE($2, name_en),
            name_ar = COALESCE($3, name_ar),
            location = COALESCE($4, location),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {WAREHOUSE_COLUMNS}
        "#
    ))
    .bind(warehouse_id)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.location)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Warehouse not found"))?;

    let warehouse: Warehouse = row.into();
    Ok(Json(DataResponse::new(warehouse)))
}

/// DELETE /warehouses/:warehouse_id
///
/// A warehouse still holding stock cannot be removed; empty it first.
/// Movement history and the zeroed stock-level rows go with the warehouse
/// via the cascading foreign keys.
pub async fn delete_warehouse(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let has_stock: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM stock_levels WHERE warehouse_id = $1 AND balance <> 0)",
    )
    .bind(warehouse_id)
    .fetch_one(&state.db)
    .await?;

    if has_stock {
        return Err(ApiError::conflict(
            "Warehouse still holds stock and cannot be deleted",
        ));
    }

    let result = sqlx::query("DELETE FROM warehouses WHERE id = $1")
        .bind(warehouse_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Warehouse not found"));
    }

    Ok(Json(MessageResponse::new("Warehouse deleted")))
}

/// POST /materials
pub async fn create_material(
    State(state): State<Arc<AppState>>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, MaterialRow>(&format!(
        r#"
        INSERT INTO materials (code, name_en, name_ar, unit, unit_cost, created_at, updated_at)
        VALUES ($1, $2, $3, $4, COALESCE($5, 0), NOW(), NOW())
        RETURNING {MATERIAL_COLUMNS}
        "#
    ))
    .bind(&req.code)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.unit)
    .bind(req.unit_cost)
    .fetch_one(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let response = MaterialResponse::from_material(row.into(), locale);
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /materials
pub async fn list_materials(
    State(state): State<Arc<AppState>>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, MaterialRow>(&format!(
        "SELECT {MATERIAL_COLUMNS} FROM materials WHERE deleted_at IS NULL ORDER BY code"
    ))
    .fetch_all(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let data: Vec<MaterialResponse> = rows
        .into_iter()
        .map(|row| MaterialResponse::from_material(row.into(), locale))
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /materials/:material_id
pub async fn get_material(
    State(state): State<Arc<AppState>>,
    Path(material_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, MaterialRow>(&format!(
        "SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(material_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Material not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(MaterialResponse::from_material(
        row.into(),
        locale,
    ))))
}

/// PUT /materials/:material_id
pub async fn update_material(
    State(state): State<Arc<AppState>>,
    Path(material_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<UpdateMaterialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, MaterialRow>(&format!(
        r#"
        UPDATE materials SET
            name_en = COALESCE($2, name_en),
            name_ar = COALESCE($3, name_ar),
            unit = COALESCE($4, unit),
            unit_cost = COALESCE($5, unit_cost),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {MATERIAL_COLUMNS}
        "#
    ))
    .bind(material_id)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.unit)
    .bind(req.unit_cost)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Material not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(MaterialResponse::from_material(
        row.into(),
        locale,
    ))))
}

/// DELETE /materials/:material_id (soft delete)
pub async fn delete_material(
    State(state): State<Arc<AppState>>,
    Path(material_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query(
        "UPDATE materials SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(material_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Material not found"));
    }

    Ok(Json(MessageResponse::new("Material deleted")))
}

/// POST /warehouses/:warehouse_id/movements
pub async fn create_movement(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
    Json(req): Json<CreateStockMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match req.kind {
        // Adjustments carry their own sign
        MovementKind::Adjustment => {
            if req.quantity.is_zero() {
                return Err(ApiError::bad_request("quantity must be non-zero"));
            }
        }
        _ => {
            if req.quantity <= Decimal::ZERO {
                return Err(ApiError::bad_request("quantity must be positive"));
            }
        }
    }

    let mut tx = state.db.begin().await?;

    let warehouse_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = $1)")
            .bind(warehouse_id)
            .fetch_one(&mut *tx)
            .await?;
    if !warehouse_exists {
        return Err(ApiError::not_found("Warehouse not found"));
    }

    let material_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM materials WHERE id = $1 AND deleted_at IS NULL)",
    )
    .bind(req.material_id)
    .fetch_one(&mut *tx)
    .await?;
    if !material_exists {
        return Err(ApiError::bad_request("Material not found"));
    }

    let balance_before = lock_stock_level(&mut tx, warehouse_id, req.material_id).await?;
    let balance_after = movement_balance_after(balance_before, req.kind, req.quantity);

    if balance_after < Decimal::ZERO {
        return Err(ApiError::bad_request(format!(
            "movement of {} would drive stock below zero (balance {})",
            signed_quantity(req.kind, req.quantity),
            balance_before
        )));
    }

    let row = sqlx::query_as::<_, MovementRow>(&format!(
        r#"
        INSERT INTO stock_movements (warehouse_id, material_id, kind, quantity,
                                     balance_before, balance_after, movement_date,
                                     reference, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        RETURNING {MOVEMENT_COLUMNS}
        "#
    ))
    .bind(warehouse_id)
    .bind(req.material_id)
    .bind(req.kind.as_str())
    .bind(req.quantity)
    .bind(balance_before)
    .bind(balance_after)
    .bind(req.movement_date)
    .bind(&req.reference)
    .fetch_one(&mut *tx)
    .await?;

    recompute_stock_level(&mut tx, warehouse_id, req.material_id).await?;
    tx.commit().await?;

    let movement: StockMovement = row.try_into()?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(movement))))
}

/// GET /warehouses/:warehouse_id/movements
pub async fn list_movements(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, MovementRow>(&format!(
        "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE warehouse_id = $1 \
         ORDER BY created_at"
    ))
    .bind(warehouse_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<StockMovement> = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<_, _>>()?;

    Ok(Json(DataResponse::new(data)))
}

/// DELETE /warehouses/:warehouse_id/movements/:movement_id
pub async fn delete_movement(
    State(state): State<Arc<AppState>>,
    Path((warehouse_id, movement_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let material_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT material_id FROM stock_movements WHERE id = $1 AND warehouse_id = $2",
    )
    .bind(movement_id)
    .bind(warehouse_id)
    .fetch_optional(&mut *tx)
    .await?;
    let material_id = material_id.ok_or_else(|| ApiError::not_found("Stock movement not found"))?;

    lock_stock_level(&mut tx, warehouse_id, material_id).await?;

    sqlx::query("DELETE FROM stock_movements WHERE id = $1")
        .bind(movement_id)
        .execute(&mut *tx)
        .await?;

    recompute_stock_level(&mut tx, warehouse_id, material_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("Stock movement deleted")))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StockLevelEntry {
    pub material_id: Uuid,
    pub material_code: String,
    pub material_name: String,
    pub unit: String,
    pub balance: Decimal,
}

/// GET /warehouses/:warehouse_id/stock
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, StockLevelEntry>(
        r#"
        SELECT s.material_id, m.code AS material_code, m.name_en AS material_name,
               m.unit, s.balance
        FROM stock_levels s
        JOIN materials m ON m.id = s.material_id
        WHERE s.warehouse_id = $1
        ORDER BY m.code
        "#,
    )
    .bind(warehouse_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(rows)))
}
