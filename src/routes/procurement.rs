//! Supplier, RFQ and purchase order routes
//!
//! Purchase order totals cache the sum over their lines and are re-summed
//! inside the same transaction as any line save or delete.

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
use crate::domain::locale::{Locale, LocaleParams, LocalizedText};
use crate::domain::procurement::{
    po_line_total, CreatePurchaseOrderLineRequest, CreatePurchaseOrderRequest, CreateRfqLineRequest,
    CreateRfqRequest, CreateSupplierRequest, PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus,
    Rfq, RfqLine, RfqStatus, Supplier, SupplierResponse, UpdatePurchaseOrderLineRequest,
    UpdatePurchaseOrderRequest, UpdateRfqLineRequest, UpdateRfqRequest, UpdateSupplierRequest,
};
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: Uuid,
    code: String,
    name_en: String,
    name_ar: Option<String>,
    tax_no: Option<String>,
    contact_email: Option<String>,
    rating: Option<i16>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: LocalizedText::new(row.name_en, row.name_ar),
            tax_no: row.tax_no,
            contact_email: row.contact_email,
            rating: row.rating,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RfqRow {
    id: Uuid,
    project_id: Uuid,
    rfq_no: String,
    status: String,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RfqRow> for Rfq {
    fn from(row: RfqRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            rfq_no: row.rfq_no,
            status: RfqStatus::parse(&row.status),
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RfqLineRow {
    id: Uuid,
    rfq_id: Uuid,
    material_id: Uuid,
    quantity: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RfqLineRow> for RfqLine {
    fn from(row: RfqLineRow) -> Self {
        Self {
            id: row.id,
            rfq_id: row.rfq_id,
            material_id: row.material_id,
            quantity: row.quantity,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PoRow {
    id: Uuid,
    project_id: Uuid,
    supplier_id: Uuid,
    po_no: String,
    status: String,
    total_amount: Decimal,
    order_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PoRow> for PurchaseOrder {
    fn from(row: PoRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            supplier_id: row.supplier_id,
            po_no: row.po_no,
            status: PurchaseOrderStatus::parse(&row.status),
            total_amount: row.total_amount,
            order_date: row.order_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PoLineRow {
    id: Uuid,
    purchase_order_id: Uuid,
    material_id: Uuid,
    quantity: Decimal,
    unit_rate: Decimal,
    line_total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PoLineRow> for PurchaseOrderLine {
    fn from(row: PoLineRow) -> Self {
        Self {
            id: row.id,
            purchase_order_id: row.purchase_order_id,
            material_id: row.material_id,
            quantity: row.quantity,
            unit_rate: row.unit_rate,
            line_total: row.line_total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SUPPLIER_COLUMNS: &str = "id, code, name_en, name_ar, tax_no, contact_email, rating, \
     deleted_at, created_at, updated_at";

const RFQ_COLUMNS: &str = "id, project_id, rfq_no, status, due_date, created_at, updated_at";

const RFQ_LINE_COLUMNS: &str = "id, rfq_id, material_id, quantity, notes, created_at";

const PO_COLUMNS: &str = "id, project_id, supplier_id, po_no, status, total_amount, order_date, \
     created_at, updated_at";

const PO_LINE_COLUMNS: &str = "id, purchase_order_id, material_id, quantity, unit_rate, \
     line_total, created_at, updated_at";

fn resolve_locale(state: &AppState, params: &LocaleParams) -> Locale {
    params.locale.unwrap_or(state.settings.default_locale)
}

/// Re-sum the purchase order's total from its lines
async fn recompute_po_total(
    tx: &mut Transaction<'_, Postgres>,
    po_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE purchase_orders SET total_amount = COALESCE((SELECT SUM(line_total) \
         FROM purchase_order_lines WHERE purchase_order_id = $1), 0), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(po_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// POST /suppliers
pub async fn create_supplier(
    State(state): State<Arc<AppState>>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(rating) = req.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::bad_request("rating must be between 1 and 5"));
        }
    }

    let row = sqlx::query_as::<_, SupplierRow>(&format!(
        r#"
        INSERT INTO suppliers (code, name_en, name_ar, tax_no, contact_email, rating,
                               created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
        RETURNING {SUPPLIER_COLUMNS}
        "#
    ))
    .bind(&req.code)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.tax_no)
    .bind(&req.contact_email)
    .bind(req.rating)
    .fetch_one(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let response = SupplierResponse::from_supplier(row.into(), locale);
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /suppliers
pub async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, SupplierRow>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE deleted_at IS NULL ORDER BY code"
    ))
    .fetch_all(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let data: Vec<SupplierResponse> = rows
        .into_iter()
        .map(|row| SupplierResponse::from_supplier(row.into(), locale))
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /suppliers/:supplier_id
pub async fn get_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, SupplierRow>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(supplier_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Supplier not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(SupplierResponse::from_supplier(
        row.into(),
        locale,
    ))))
}

/// PUT /suppliers/:supplier_id
pub async fn update_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<UpdateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(rating) = req.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::bad_request("rating must be between 1 and 5"));
        }
    }

    let row = sqlx::query_as::<_, SupplierRow>(&format!(
        r#"
        UPDATE suppliers SET
            name_en = COALESCE($2, name_en),
            name_ar = COALESCE($3, name_ar),
            tax_no = COALESCE($4, tax_no),
            contact_email = COALESCE($5, contact_email),
            rating = COALESCE($6, rating),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {SUPPLIER_COLUMNS}
        "#
    ))
    .bind(supplier_id)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.tax_no)
    .bind(&req.contact_email)
    .bind(req.rating)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Supplier not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(SupplierResponse::from_supplier(
        row.into(),
        locale,
    ))))
}

/// DELETE /suppliers/:supplier_id (soft delete)
pub async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query(
        "UPDATE suppliers SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(supplier_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Supplier not found"));
    }

    Ok(Json(MessageResponse::new("Supplier deleted")))
}

/// POST /projects/:project_id/rfqs
pub async fn create_rfq(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateRfqRequest>,
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

    let row = sqlx::query_as::<_, RfqRow>(&format!(
        r#"
        INSERT INTO rfqs (project_id, rfq_no, status, due_date, created_at, updated_at)
        VALUES ($1, $2, 'open', $3, NOW(), NOW())
        RETURNING {RFQ_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(&req.rfq_no)
    .bind(req.due_date)
    .fetch_one(&state.db)
    .await?;

    let rfq: Rfq = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(rfq))))
}

/// GET /projects/:project_id/rfqs
pub async fn list_rfqs(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, RfqRow>(&format!(
        "SELECT {RFQ_COLUMNS} FROM rfqs WHERE project_id = $1 ORDER BY created_at DESC"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Rfq> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /rfqs/:rfq_id
pub async fn update_rfq(
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
    Json(req): Json<UpdateRfqRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = req.status.map(|s| s.as_str());

    let row = sqlx::query_as::<_, RfqRow>(&format!(
        r#"
        UPDATE rfqs SET
            status = COALESCE($2, status),
            due_date = COALESCE($3, due_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {RFQ_COLUMNS}
        "#
    ))
    .bind(rfq_id)
    .bind(status)
    .bind(req.due_date)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("RFQ not found"))?;

    let rfq: Rfq = row.into();
    Ok(Json(DataResponse::new(rfq)))
}

/// DELETE /rfqs/:rfq_id
///
/// Lines go with the RFQ via the cascading foreign key.
pub async fn delete_rfq(
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM rfqs WHERE id = $1")
        .bind(rfq_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("RFQ not found"));
    }

    Ok(Json(MessageResponse::new("RFQ deleted")))
}

/// POST /rfqs/:rfq_id/lines
pub async fn create_rfq_line(
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
    Json(req): Json<CreateRfqLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.quantity <= Decimal::ZERO {
        return Err(ApiError::bad_request("quantity must be positive"));
    }

    let rfq_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rfqs WHERE id = $1)")
        .bind(rfq_id)
        .fetch_one(&state.db)
        .await?;
    if !rfq_exists {
        return Err(ApiError::not_found("RFQ not found"));
    }

    let row = sqlx::query_as::<_, RfqLineRow>(&format!(
        r#"
        INSERT INTO rfq_lines (rfq_id, material_id, quantity, notes, created_at)
        VALUES ($1, $2, $3, $4, NOW())
        RETURNING {RFQ_LINE_COLUMNS}
        "#
    ))
    .bind(rfq_id)
    .bind(req.material_id)
    .bind(req.quantity)
    .bind(&req.notes)
    .fetch_one(&state.db)
    .await?;

    let line: RfqLine = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(line))))
}

/// GET /rfqs/:rfq_id/lines
pub async fn list_rfq_lines(
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, RfqLineRow>(&format!(
        "SELECT {RFQ_LINE_COLUMNS} FROM rfq_lines WHERE rfq_id = $1 ORDER BY created_at"
    ))
    .bind(rfq_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<RfqLine> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /rfqs/:rfq_id/lines/:line_id
pub async fn update_rfq_line(
    State(state): State<Arc<AppState>>,
    Path((rfq_id, line_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateRfqLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(quantity) = req.quantity {
        if quantity <= Decimal::ZERO {
            return Err(ApiError::bad_request("quantity must be positive"));
        }
    }

    let row = sqlx::query_as::<_, RfqLineRow>(&format!(
        r#"
        UPDATE rfq_lines SET
            quantity = COALESCE($3, quantity),
            notes = COALESCE($4, notes)
        WHERE id = $1 AND rfq_id = $2
        RETURNING {RFQ_LINE_COLUMNS}
        "#
    ))
    .bind(line_id)
    .bind(rfq_id)
    .bind(req.quantity)
    .bind(&req.notes)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("RFQ line not found"))?;

    let line: RfqLine = row.into();
    Ok(Json(DataResponse::new(line)))
}

/// DELETE /rfqs/:rfq_id/lines/:line_id
pub async fn delete_rfq_line(
    State(state): State<Arc<AppState>>,
    Path((rfq_id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM rfq_lines WHERE id = $1 AND rfq_id = $2")
        .bind(line_id)
        .bind(rfq_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("RFQ line not found"));
    }

    Ok(Json(MessageResponse::new("RFQ line deleted")))
}

/// POST /projects/:project_id/purchase-orders
pub async fn create_purchase_order(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1 AND deleted_at IS NULL)",
    )
    .bind(req.supplier_id)
    .fetch_one(&state.db)
    .await?;
    if !supplier_exists {
        return Err(ApiError::bad_request("Supplier not found"));
    }

    let row = sqlx::query_as::<_, PoRow>(&format!(
        r#"
        INSERT INTO purchase_orders (project_id, supplier_id, po_no, status, total_amount,
                                     order_date, created_at, updated_at)
        VALUES ($1, $2, $3, 'draft', 0, $4, NOW(), NOW())
        RETURNING {PO_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(req.supplier_id)
    .bind(&req.po_no)
    .bind(req.order_date)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(po_no = %req.po_no, "Purchase order created");

    let po: PurchaseOrder = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(po))))
}

/// GET /projects/:project_id/purchase-orders
pub async fn list_purchase_orders(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, PoRow>(&format!(
        "SELECT {PO_COLUMNS} FROM purchase_orders WHERE project_id = $1 ORDER BY created_at DESC"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<PurchaseOrder> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /purchase-orders/:po_id
pub async fn get_purchase_order(
    State(state): State<Arc<AppState>>,
    Path(po_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, PoRow>(&format!(
        "SELECT {PO_COLUMNS} FROM purchase_orders WHERE id = $1"
    ))
    .bind(po_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Purchase order not found"))?;

    let po: PurchaseOrder = row.into();
    Ok(Json(DataResponse::new(po)))
}

/// PUT /purchase-orders/:po_id
pub async fn update_purchase_order(
    State(state): State<Arc<AppState>>,
    Path(po_id): Path<Uuid>,
    Json(req): Json<UpdatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = req.status.map(|s| s.as_str());

    let row = sqlx::query_as::<_, PoRow>(&format!(
        r#"
        UPDATE purchase_orders SET
            status = COALESCE($2, status),
            order_date = COALESCE($3, order_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {PO_COLUMNS}
        "#
    ))
    .bind(po_id)
    .bind(status)
    .bind(req.order_date)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Purchase order not found"))?;

    let po: PurchaseOrder = row.into();
    Ok(Json(DataResponse::new(po)))
}

/// DELETE /purchase-orders/:po_id
///
/// Lines go with the order via the cascading foreign key.
pub async fn delete_purchase_order(
    State(state): State<Arc<AppState>>,
    Path(po_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
        .bind(po_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Purchase order not found"));
    }

    Ok(Json(MessageResponse::new("Purchase order deleted")))
}

/// POST /purchase-orders/:po_id/lines
pub async fn create_po_line(
    State(state): State<Arc<AppState>>,
    Path(po_id): Path<Uuid>,
    Json(req): Json<CreatePurchaseOrderLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.quantity <= Decimal::ZERO {
        return Err(ApiError::bad_request("quantity must be positive"));
    }

    let mut tx = state.db.begin().await?;

    let po_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE id = $1)")
            .bind(po_id)
            .fetch_one(&mut *tx)
            .await?;
    if !po_exists {
        return Err(ApiError::not_found("Purchase order not found"));
    }

    let line_total = po_line_total(req.quantity, req.unit_rate);

    let row = sqlx::query_as::<_, PoLineRow>(&format!(
        r#"
        INSERT INTO purchase_order_lines (purchase_order_id, material_id, quantity, unit_rate,
                                          line_total, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
        RETURNING {PO_LINE_COLUMNS}
        "#
    ))
    .bind(po_id)
    .bind(req.material_id)
    .bind(req.quantity)
    .bind(req.unit_rate)
    .bind(line_total)
    .fetch_one(&mut *tx)
    .await?;

    recompute_po_total(&mut tx, po_id).await?;
    tx.commit().await?;

    let line: PurchaseOrderLine = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(line))))
}

/// GET /purchase-orders/:po_id/lines
pub async fn list_po_lines(
    State(state): State<Arc<AppState>>,
    Path(po_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, PoLineRow>(&format!(
        "SELECT {PO_LINE_COLUMNS} FROM purchase_order_lines WHERE purchase_order_id = $1 \
         ORDER BY created_at"
    ))
    .bind(po_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<PurchaseOrderLine> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /purchase-orders/:po_id/lines/:line_id
pub async fn update_po_line(
    State(state): State<Arc<AppState>>,
    Path((po_id, line_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdatePurchaseOrderLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, PoLineRow>(&format!(
        r#"
        UPDATE purchase_order_lines SET
            quantity = COALESCE($3, quantity),
            unit_rate = COALESCE($4, unit_rate),
            line_total = ROUND(COALESCE($3, quantity) * COALESCE($4, unit_rate), 2),
            updated_at = NOW()
        WHERE id = $1 AND purchase_order_id = $2
        RETURNING {PO_LINE_COLUMNS}
        "#
    ))
    .bind(line_id)
    .bind(po_id)
    .bind(req.quantity)
    .bind(req.unit_rate)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Purchase order line not found"))?;

    recompute_po_total(&mut tx, po_id).await?;
    tx.commit().await?;

    let line: PurchaseOrderLine = row.into();
    Ok(Json(DataResponse::new(line)))
}

/// DELETE /purchase-orders/:po_id/lines/:line_id
pub async fn delete_po_line(
    State(state): State<Arc<AppState>>,
    Path((po_id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let result =
        sqlx::query("DELETE FROM purchase_order_lines WHERE id = $1 AND purchase_order_id = $2")
            .bind(line_id)
            .bind(po_id)
            .execute(&mut *tx)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Purchase order line not found"));
    }

    recompute_po_total(&mut tx, po_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("Purchase order line deleted")))
}
