//! Tender, bid and bid-line routes
//!
//! A bid's cached total is re-summed from its lines inside the same
//! transaction as any line save or delete.

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
use crate::domain::tenders::{
    bid_line_total, Bid, BidLine, BidStatus, CreateBidLineRequest, CreateBidRequest,
    CreateTenderRequest, Tender, TenderStatus, TradeCategory, UpdateBidLineRequest,
    UpdateBidRequest, UpdateTenderRequest,
};
use crate::error::ApiError;

/// Database row for tender
#[derive(Debug, sqlx::FromRow)]
struct TenderRow {
    id: Uuid,
    project_id: Uuid,
    name: String,
    description: Option<String>,
    trade_category: String,
    scope_of_work: Option<String>,
    status: String,
    bid_due_date: Option<DateTime<Utc>>,
    estimated_value: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TenderRow> for Tender {
    fn from(row: TenderRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            description: row.description,
            trade_category: TradeCategory::parse(&row.trade_category),
            scope_of_work: row.scope_of_work,
            status: TenderStatus::parse(&row.status),
            bid_due_date: row.bid_due_date,
            estimated_value: row.estimated_value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for bid
#[derive(Debug, sqlx::FromRow)]
struct BidRow {
    id: Uuid,
    tender_id: Uuid,
    supplier_id: Uuid,
    status: String,
    bid_total: Decimal,
    notes: Option<String>,
    submitted_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BidRow> for Bid {
    fn from(row: BidRow) -> Self {
        Self {
            id: row.id,
            tender_id: row.tender_id,
            supplier_id: row.supplier_id,
            status: BidStatus::parse(&row.status),
            bid_total: row.bid_total,
            notes: row.notes,
            submitted_at: row.submitted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for bid line
#[derive(Debug, sqlx::FromRow)]
struct BidLineRow {
    id: Uuid,
    bid_id: Uuid,
    description: String,
    unit: String,
    quantity: Decimal,
    unit_rate: Decimal,
    line_total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BidLineRow> for BidLine {
    fn from(row: BidLineRow) -> Self {
        Self {
            id: row.id,
            bid_id: row.bid_id,
            description: row.description,
            unit: row.unit,
            quantity: row.quantity,
            unit_rate: row.unit_rate,
            line_total: row.line_total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const TENDER_COLUMNS: &str = "id, project_id, name, description, trade_category, \
     scope_of_work, status, bid_due_date, estimated_value, created_at, updated_at";

const BID_COLUMNS: &str =
    "id, tender_id, supplier_id, status, bid_total, notes, submitted_at, created_at, updated_at";

const BID_LINE_COLUMNS: &str =
    "id, bid_id, description, unit, quantity, unit_rate, line_total, created_at, updated_at";

/// POST /projects/:project_id/tenders
pub async fn create_tender(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTenderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, TenderRow>(&format!(
        r#"
        INSERT INTO tenders (project_id, name, description, trade_category, scope_of_work,
                             status, bid_due_date, estimated_value, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 'draft', $6, $7, NOW(), NOW())
        RETURNING {TENDER_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.trade_category.as_str())
    .bind(&req.scope_of_work)
    .bind(req.bid_due_date)
    .bind(req.estimated_value)
    .fetch_one(&state.db)
    .await?;

    let tender: Tender = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(tender))))
}

/// GET /projects/:project_id/tenders
pub async fn list_tenders(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, TenderRow>(&format!(
        "SELECT {TENDER_COLUMNS} FROM tenders WHERE project_id = $1 ORDER BY created_at DESC"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Tender> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /projects/:project_id/tenders/:tender_id
pub async fn get_tender(
    State(state): State<Arc<AppState>>,
    Path((project_id, tender_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, TenderRow>(&format!(
        "SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1 AND project_id = $2"
    ))
    .bind(tender_id)
    .bind(project_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Tender not found"))?;

    let tender: Tender = row.into();
    Ok(Json(DataResponse::new(tender)))
}

/// PUT /projects/:project_id/tenders/:tender_id
pub async fn update_tender(
    State(state): State<Arc<AppState>>,
    Path((project_id, tender_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateTenderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let trade_category = req.trade_category.map(|c| c.as_str());
    let status = req.status.map(|s| s.as_str());

    let row = sqlx::query_as::<_, TenderRow>(&format!(
        r#"
        UPDATE tenders SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            trade_category = COALESCE($5, trade_category),
            scope_of_work = COALESCE($6, scope_of_work),
            status = COALESCE($7, status),
            bid_due_date = COALESCE($8, bid_due_date),
            estimated_value = COALESCE($9, estimated_value),
            updated_at = NOW()
        WHERE id = $1 AND project_id = $2
        RETURNING {TENDER_COLUMNS}
        "#
    ))
    .bind(tender_id)
    .bind(project_id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(trade_category)
    .bind(&req.scope_of_work)
    .bind(status)
    .bind(req.bid_due_date)
    .bind(req.estimated_value)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Tender not found"))?;

    let tender: Tender = row.into();
    Ok(Json(DataResponse::new(tender)))
}

/// DELETE /projects/:project_id/tenders/:tender_id
pub async fn delete_tender(
    State(state): State<Arc<AppState>>,
    Path((project_id, tender_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM tenders WHERE id = $1 AND project_id = $2")
        .bind(tender_id)
        .bind(project_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Tender not found"));
    }

    Ok(Json(MessageResponse::new("Tender deleted")))
}

/// Re-sum a bid's cached total from its current lines
async fn recompute_bid_total(
    tx: &mut Transaction<'_, Postgres>,
    bid_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE bids SET
            bid_total = COALESCE((SELECT SUM(line_total) FROM bid_lines WHERE bid_id = $1), 0),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(bid_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// POST /tenders/:tender_id/bids
pub async fn create_bid(
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<Uuid>,
    Json(req): Json<CreateBidRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tender_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tenders WHERE id = $1)")
            .bind(tender_id)
            .fetch_one(&state.db)
            .await?;
    if !tender_exists {
        return Err(ApiError::not_found("Tender not found"));
    }

    let row = sqlx::query_as::<_, BidRow>(&format!(
        r#"
        INSERT INTO bids (tender_id, supplier_id, status, bid_total, notes,
                          submitted_at, created_at, updated_at)
        VALUES ($1, $2, 'submitted', 0, $3, NOW(), NOW(), NOW())
        RETURNING {BID_COLUMNS}
        "#
    ))
    .bind(tender_id)
    .bind(req.supplier_id)
    .bind(&req.notes)
    .fetch_one(&state.db)
    .await?;

    let bid: Bid = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(bid))))
}

/// GET /tenders/:tender_id/bids
pub async fn list_bids(
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, BidRow>(&format!(
        "SELECT {BID_COLUMNS} FROM bids WHERE tender_id = $1 ORDER BY bid_total ASC"
    ))
    .bind(tender_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Bid> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /bids/:bid_id
pub async fn update_bid(
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
    Json(req): Json<UpdateBidRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = req.status.map(|s| s.as_str());

    let row = sqlx::query_as::<_, BidRow>(&format!(
        r#"
        UPDATE bids SET
            status = COALESCE($2, status),
            notes = COALESCE($3, notes),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {BID_COLUMNS}
        "#
    ))
    .bind(bid_id)
    .bind(status)
    .bind(&req.notes)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Bid not found"))?;

    let bid: Bid = row.into();
    Ok(Json(DataResponse::new(bid)))
}

/// DELETE /bids/:bid_id
pub async fn delete_bid(
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM bids WHERE id = $1")
        .bind(bid_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Bid not found"));
    }

    Ok(Json(MessageResponse::new("Bid deleted")))
}

/// POST /bids/:bid_id/lines
pub async fn create_bid_line(
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
    Json(req): Json<CreateBidLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let bid_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bids WHERE id = $1)")
        .bind(bid_id)
        .fetch_one(&mut *tx)
        .await?;
    if !bid_exists {
        return Err(ApiError::not_found("Bid not found"));
    }

    let line_total = bid_line_total(req.quantity, req.unit_rate);

    let row = sqlx::query_as::<_, BidLineRow>(&format!(
        r#"
        INSERT INTO bid_lines (bid_id, description, unit, quantity, unit_rate,
                               line_total, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
        RETURNING {BID_LINE_COLUMNS}
        "#
    ))
    .bind(bid_id)
    .bind(&req.description)
    .bind(&req.unit)
    .bind(req.quantity)
    .bind(req.unit_rate)
    .bind(line_total)
    .fetch_one(&mut *tx)
    .await?;

    recompute_bid_total(&mut tx, bid_id).await?;
    tx.commit().await?;

    let line: BidLine = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(line))))
}

/// GET /bids/:bid_id/lines
pub async fn list_bid_lines(
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, BidLineRow>(&format!(
        "SELECT {BID_LINE_COLUMNS} FROM bid_lines WHERE bid_id = $1 ORDER BY created_at"
    ))
    .bind(bid_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<BidLine> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /bids/:bid_id/lines/:line_id
pub async fn update_bid_line(
    State(state): State<Arc<AppState>>,
    Path((bid_id, line_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateBidLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    // The line total depends on both quantity and rate, so re-derive it from
    // the effective values rather than patching columns independently.
    let row = sqlx::query_as::<_, BidLineRow>(&format!(
        r#"
        UPDATE bid_lines SET
            description = COALESCE($3, description),
            unit = COALESCE($4, unit),
            quantity = COALESCE($5, quantity),
            unit_rate = COALESCE($6, unit_rate),
            line_total = ROUND(COALESCE($5, quantity) * COALESCE($6, unit_rate), 2),
            updated_at = NOW()
        WHERE id = $1 AND bid_id = $2
        RETURNING {BID_LINE_COLUMNS}
        "#
    ))
    .bind(line_id)
    .bind(bid_id)
    .bind(&req.description)
    .bind(&req.unit)
    .bind(req.quantity)
    .bind(req.unit_rate)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Bid line not found"))?;

    recompute_bid_total(&mut tx, bid_id).await?;
    tx.commit().await?;

    let line: BidLine = row.into();
    Ok(Json(DataResponse::new(line)))
}

/// DELETE /bids/:bid_id/lines/:line_id
pub async fn delete_bid_line(
    State(state): State<Arc<AppState>>,
    Path((bid_id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query("DELETE FROM bid_lines WHERE id = $1 AND bid_id = $2")
        .bind(line_id)
        .bind(bid_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Bid line not found"));
    }

    recompute_bid_total(&mut tx, bid_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("Bid line deleted")))
}
