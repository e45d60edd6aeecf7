//! Contract, BOQ and price-adjustment routes
//!
//! A BOQ item's cached cost-analysis columns are re-summed per resource
//! class from its child cost lines inside the same transaction as any
//! line save or delete.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::contracts::{
    boq_line_total, price_adjustment_amount, price_adjustment_factor, BoqCostLine, BoqItem,
    BoqItemResponse, Contract, ContractStatus, CostLineKind, CreateBoqCostLineRequest,
    CreateBoqItemRequest, CreateContractRequest, CreatePriceIndexRequest, IndexationInput,
    PriceIndex, UpdateBoqCostLineRequest, UpdateBoqItemRequest, UpdateContractRequest,
    UpdatePriceIndexRequest,
};
use crate::domain::locale::{Locale, LocaleParams, LocalizedText};
use crate::error::ApiError;

/// Database row for contract
#[derive(Debug, sqlx::FromRow)]
struct ContractRow {
    id: Uuid,
    project_id: Uuid,
    contract_no: String,
    title: String,
    status: String,
    contract_sum: Decimal,
    retention_percent: Decimal,
    advance_percent: Decimal,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            contract_no: row.contract_no,
            title: row.title,
            status: ContractStatus::parse(&row.status),
            contract_sum: row.contract_sum,
            retention_percent: row.retention_percent,
            advance_percent: row.advance_percent,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for BOQ item
#[derive(Debug, sqlx::FromRow)]
struct BoqItemRow {
    id: Uuid,
    contract_id: Uuid,
    item_no: String,
    description_en: String,
    description_ar: Option<String>,
    unit: String,
    quantity: Decimal,
    unit_rate: Decimal,
    line_total: Decimal,
    analysis_material_cost: Decimal,
    analysis_labor_cost: Decimal,
    analysis_equipment_cost: Decimal,
    analysis_subcontractor_cost: Decimal,
    analysis_total_cost: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BoqItemRow> for BoqItem {
    fn from(row: BoqItemRow) -> Self {
        Self {
            id: row.id,
            contract_id: row.contract_id,
            item_no: row.item_no,
            description: LocalizedText::new(row.description_en, row.description_ar),
            unit: row.unit,
            quantity: row.quantity,
            unit_rate: row.unit_rate,
            line_total: row.line_total,
            analysis_material_cost: row.analysis_material_cost,
            analysis_labor_cost: row.analysis_labor_cost,
            analysis_equipment_cost: row.analysis_equipment_cost,
            analysis_subcontractor_cost: row.analysis_subcontractor_cost,
            analysis_total_cost: row.analysis_total_cost,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for BOQ cost line
#[derive(Debug, sqlx::FromRow)]
struct CostLineRow {
    id: Uuid,
    boq_item_id: Uuid,
    kind: String,
    description: String,
    quantity: Decimal,
    unit_rate: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CostLineRow> for BoqCostLine {
    type Error = ApiError;

    fn try_from(row: CostLineRow) -> Result<Self, ApiError> {
        let kind = CostLineKind::parse(&row.kind).ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("unknown cost line kind '{}'", row.kind))
        })?;
        Ok(Self {
            id: row.id,
            boq_item_id: row.boq_item_id,
            kind,
            description: row.description,
            quantity: row.quantity,
            unit_rate: row.unit_rate,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for price index
#[derive(Debug, sqlx::FromRow)]
struct PriceIndexRow {
    id: Uuid,
    commodity: String,
    period: NaiveDate,
    index_value: Decimal,
    created_at: DateTime<Utc>,
}

impl From<PriceIndexRow> for PriceIndex {
    fn from(row: PriceIndexRow) -> Self {
        Self {
            id: row.id,
            commodity: row.commodity,
            period: row.period,
            index_value: row.index_value,
            created_at: row.created_at,
        }
    }
}

const CONTRACT_COLUMNS: &str = "id, project_id, contract_no, title, status, contract_sum, \
     retention_percent, advance_percent, start_date, end_date, created_at, updated_at";

const BOQ_ITEM_COLUMNS: &str = "id, contract_id, item_no, description_en, description_ar, unit, \
     quantity, unit_rate, line_total, analysis_material_cost, analysis_labor_cost, \
     analysis_equipment_cost, analysis_subcontractor_cost, analysis_total_cost, \
     created_at, updated_at";

const COST_LINE_COLUMNS: &str =
    "id, boq_item_id, kind, description, quantity, unit_rate, total, created_at, updated_at";

fn resolve_locale(state: &AppState, params: &LocaleParams) -> Locale {
    params.locale.unwrap_or(state.settings.default_locale)
}

/// POST /projects/:project_id/contracts
pub async fn create_contract(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateContractRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, ContractRow>(&format!(
        r#"
        INSERT INTO contracts (project_id, contract_no, title, status, contract_sum,
                               retention_percent, advance_percent, start_date, end_date,
                               created_at, updated_at)
        VALUES ($1, $2, $3, 'draft', $4, COALESCE($5, 5), COALESCE($6, 10), $7, $8, NOW(), NOW())
        RETURNING {CONTRACT_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(&req.contract_no)
    .bind(&req.title)
    .bind(req.contract_sum)
    .bind(req.retention_percent)
    .bind(req.advance_percent)
    .bind(req.start_date)
    .bind(req.end_date)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(contract_no = %req.contract_no, "Contract created");

    let contract: Contract = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(contract))))
}

/// GET /projects/:project_id/contracts
pub async fn list_contracts(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, ContractRow>(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE project_id = $1 ORDER BY created_at DESC"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Contract> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /contracts/:contract_id
pub async fn get_contract(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, ContractRow>(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = $1"
    ))
    .bind(contract_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Contract not found"))?;

    let contract: Contract = row.into();
    Ok(Json(DataResponse::new(contract)))
}

/// PUT /contracts/:contract_id
pub async fn update_contract(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<UpdateContractRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = req.status.map(|s| s.as_str());

    let row = sqlx::query_as::<_, ContractRow>(&format!(
        r#"
        UPDATE contracts SET
            title = COALESCE($2, title),
            status = COALESCE($3, status),
            contract_sum = COALESCE($4, contract_sum),
            retention_percent = COALESCE($5, retention_percent),
            advance_percent = COALESCE($6, advance_percent),
            start_date = COALESCE($7, start_date),
            end_date = COALESCE($8, end_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {CONTRACT_COLUMNS}
        "#
    ))
    .bind(contract_id)
    .bind(&req.title)
    .bind(status)
    .bind(req.contract_sum)
    .bind(req.retention_percent)
    .bind(req.advance_percent)
    .bind(req.start_date)
    .bind(req.end_date)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Contract not found"))?;

    let contract: Contract = row.into();
    Ok(Json(DataResponse::new(contract)))
}

/// DELETE /contracts/:contract_id
///
/// BOQ items, advances and certificates go with the contract via the
/// schema's cascading foreign keys.
pub async fn delete_contract(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
        .bind(contract_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Contract not found"));
    }

    tracing::info!(contract_id = %contract_id, "Contract deleted");

    Ok(Json(MessageResponse::new("Contract deleted")))
}

/// Re-sum a BOQ item's per-kind cost analysis from its current lines
async fn recompute_boq_item_costs(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE boq_items SET
            analysis_material_cost = COALESCE((SELECT SUM(total) FROM boq_cost_lines
                WHERE boq_item_id = $1 AND kind = 'material'), 0),
            analysis_labor_cost = COALESCE((SELECT SUM(total) FROM boq_cost_lines
                WHERE boq_item_id = $1 AND kind = 'labor'), 0),
            analysis_equipment_cost = COALESCE((SELECT SUM(total) FROM boq_cost_lines
                WHERE boq_item_id = $1 AND kind = 'equipment'), 0),
            analysis_subcontractor_cost = COALESCE((SELECT SUM(total) FROM boq_cost_lines
                WHERE boq_item_id = $1 AND kind = 'subcontractor'), 0),
            analysis_total_cost = COALESCE((SELECT SUM(total) FROM boq_cost_lines
                WHERE boq_item_id = $1), 0),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(item_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// POST /contracts/:contract_id/boq-items
pub async fn create_boq_item(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<CreateBoqItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let contract_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM contracts WHERE id = $1)")
            .bind(contract_id)
            .fetch_one(&state.db)
            .await?;
    if !contract_exists {
        return Err(ApiError::not_found("Contract not found"));
    }

    let line_total = boq_line_total(req.quantity, req.unit_rate);

    let row = sqlx::query_as::<_, BoqItemRow>(&format!(
        r#"
        INSERT INTO boq_items (contract_id, item_no, description_en, description_ar, unit,
                               quantity, unit_rate, line_total,
                               analysis_material_cost, analysis_labor_cost,
                               analysis_equipment_cost, analysis_subcontractor_cost,
                               analysis_total_cost, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, 0, 0, 0, 0, NOW(), NOW())
        RETURNING {BOQ_ITEM_COLUMNS}
        "#
    ))
    .bind(contract_id)
    .bind(&req.item_no)
    .bind(&req.description_en)
    .bind(&req.description_ar)
    .bind(&req.unit)
    .bind(req.quantity)
    .bind(req.unit_rate)
    .bind(line_total)
    .fetch_one(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let response = BoqItemResponse::from_item(row.into(), locale);
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /contracts/:contract_id/boq-items
pub async fn list_boq_items(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, BoqItemRow>(&format!(
        "SELECT {BOQ_ITEM_COLUMNS} FROM boq_items WHERE contract_id = $1 ORDER BY item_no"
    ))
    .bind(contract_id)
    .fetch_all(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let data: Vec<BoqItemResponse> = rows
        .into_iter()
        .map(|row| BoqItemResponse::from_item(row.into(), locale))
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /boq-items/:item_id
pub async fn get_boq_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, BoqItemRow>(&format!(
        "SELECT {BOQ_ITEM_COLUMNS} FROM boq_items WHERE id = $1"
    ))
    .bind(item_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("BOQ item not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(BoqItemResponse::from_item(
        row.into(),
        locale,
    ))))
}

/// PUT /boq-items/:item_id
pub async fn update_boq_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<UpdateBoqItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, BoqItemRow>(&format!(
        r#"
        UPDATE boq_items SET
            description_en = COALESCE($2, description_en),
            description_ar = COALESCE($3, description_ar),
            unit = COALESCE($4, unit),
            quantity = COALESCE($5, quantity),
            unit_rate = COALESCE($6, unit_rate),
            line_total = ROUND(COALESCE($5, quantity) * COALESCE($6, unit_rate), 2),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {BOQ_ITEM_COLUMNS}
        "#
    ))
    .bind(item_id)
    .bind(&req.description_en)
    .bind(&req.description_ar)
    .bind(&req.unit)
    .bind(req.quantity)
    .bind(req.unit_rate)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("BOQ item not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(BoqItemResponse::from_item(
        row.into(),
        locale,
    ))))
}

/// DELETE /boq-items/:item_id
pub async fn delete_boq_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM boq_items WHERE id = $1")
        .bind(item_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("BOQ item not found"));
    }

    Ok(Json(MessageResponse::new("BOQ item deleted")))
}

/// POST /boq-items/:item_id/cost-lines
pub async fn create_cost_line(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Json(req): Json<CreateBoqCostLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let item_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM boq_items WHERE id = $1)")
            .bind(item_id)
            .fetch_one(&mut *tx)
            .await?;
    if !item_exists {
        return Err(ApiError::not_found("BOQ item not found"));
    }

    let total = boq_line_total(req.quantity, req.unit_rate);

    let row = sqlx::query_as::<_, CostLineRow>(&format!(
        r#"
        INSERT INTO boq_cost_lines (boq_item_id, kind, description, quantity, unit_rate,
                                    total, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
        RETURNING {COST_LINE_COLUMNS}
        "#
    ))
    .bind(item_id)
    .bind(req.kind.as_str())
    .bind(&req.description)
    .bind(req.quantity)
    .bind(req.unit_rate)
    .bind(total)
    .fetch_one(&mut *tx)
    .await?;

    recompute_boq_item_costs(&mut tx, item_id).await?;
    tx.commit().await?;

    let line: BoqCostLine = row.try_into()?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(line))))
}

/// GET /boq-items/:item_id/cost-lines
pub async fn list_cost_lines(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, CostLineRow>(&format!(
        "SELECT {COST_LINE_COLUMNS} FROM boq_cost_lines WHERE boq_item_id = $1 ORDER BY created_at"
    ))
    .bind(item_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<BoqCostLine> = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<_, _>>()?;

    Ok(Json(DataResponse::new(data)))
}

/// PUT /boq-items/:item_id/cost-lines/:line_id
pub async fn update_cost_line(
    State(state): State<Arc<AppState>>,
    Path((item_id, line_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateBoqCostLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let kind = req.kind.map(|k| k.as_str());

    let row = sqlx::query_as::<_, CostLineRow>(&format!(
        r#"
        UPDATE boq_cost_lines SET
            kind = COALESCE($3, kind),
            description = COALESCE($4, description),
            quantity = COALESCE($5, quantity),
            unit_rate = COALESCE($6, unit_rate),
            total = ROUND(COALESCE($5, quantity) * COALESCE($6, unit_rate), 2),
            updated_at = NOW()
        WHERE id = $1 AND boq_item_id = $2
        RETURNING {COST_LINE_COLUMNS}
        "#
    ))
    .bind(line_id)
    .bind(item_id)
    .bind(kind)
    .bind(&req.description)
    .bind(req.quantity)
    .bind(req.unit_rate)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Cost line not found"))?;

    recompute_boq_item_costs(&mut tx, item_id).await?;
    tx.commit().await?;

    let line: BoqCostLine = row.try_into()?;
    Ok(Json(DataResponse::new(line)))
}

/// DELETE /boq-items/:item_id/cost-lines/:line_id
pub async fn delete_cost_line(
    State(state): State<Arc<AppState>>,
    Path((item_id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query("DELETE FROM boq_cost_lines WHERE id = $1 AND boq_item_id = $2")
        .bind(line_id)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Cost line not found"));
    }

    recompute_boq_item_costs(&mut tx, item_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("Cost line deleted")))
}

/// POST /price-indices
pub async fn create_price_index(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePriceIndexRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.index_value <= Decimal::ZERO {
        return Err(ApiError::bad_request("index_value must be positive"));
    }

    let row = sqlx::query_as::<_, PriceIndexRow>(
        r#"
        INSERT INTO price_indices (commodity, period, index_value, created_at)
        VALUES ($1, $2, $3, NOW())
        RETURNING id, commodity, period, index_value, created_at
        "#,
    )
    .bind(&req.commodity)
    .bind(req.period)
    .bind(req.index_value)
    .fetch_one(&state.db)
    .await?;

    let index: PriceIndex = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(index))))
}

/// GET /price-indices
pub async fn list_price_indices(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, PriceIndexRow>(
        "SELECT id, commodity, period, index_value, created_at FROM price_indices \
         ORDER BY commodity, period",
    )
    .fetch_all(&state.db)
    .await?;

    let data: Vec<PriceIndex> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /price-indices/:index_id
pub async fn update_price_index(
    State(state): State<Arc<AppState>>,
    Path(index_id): Path<Uuid>,
    Json(req): Json<UpdatePriceIndexRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.index_value <= Decimal::ZERO {
        return Err(ApiError::bad_request("index_value must be positive"));
    }

    let row = sqlx::query_as::<_, PriceIndexRow>(
        r#"
        UPDATE price_indices SET index_value = $2
        WHERE id = $1
        RETURNING id, commodity, period, index_value, created_at
        "#,
    )
    .bind(index_id)
    .bind(req.index_value)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Price index not found"))?;

    let index: PriceIndex = row.into();
    Ok(Json(DataResponse::new(index)))
}

/// DELETE /price-indices/:index_id
pub async fn delete_price_index(
    State(state): State<Arc<AppState>>,
    Path(index_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM price_indices WHERE id = $1")
        .bind(index_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Price index not found"));
    }

    Ok(Json(MessageResponse::new("Price index deleted")))
}

#[derive(Debug, Deserialize)]
pub struct PriceAdjustmentRequest {
    /// Certificate amount eligible for indexation
    pub eligible_amount: Decimal,
    pub inputs: Vec<IndexationInput>,
}

#[derive(Debug, Serialize)]
pub struct PriceAdjustmentResponse {
    pub contract_id: Uuid,
    pub eligible_amount: Decimal,
    pub adjustment_factor: Decimal,
    pub adjustment_amount: Decimal,
}

/// POST /contracts/:contract_id/price-adjustment
///
/// Pure computation over supplied commodity weightings; nothing is persisted.
pub async fn compute_price_adjustment(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<PriceAdjustmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let contract_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM contracts WHERE id = $1)")
            .bind(contract_id)
            .fetch_one(&state.db)
            .await?;
    if !contract_exists {
        return Err(ApiError::not_found("Contract not found"));
    }

    if req.inputs.is_empty() {
        return Err(ApiError::bad_request("at least one indexation input required"));
    }

    let factor = price_adjustment_factor(&req.inputs).map_err(ApiError::BadRequest)?;
    let amount = price_adjustment_amount(req.eligible_amount, factor);

    Ok(Json(DataResponse::new(PriceAdjustmentResponse {
        contract_id,
        eligible_amount: req.eligible_amount,
        adjustment_factor: factor,
        adjustment_amount: amount,
    })))
}
