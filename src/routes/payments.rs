//! Advance payment and payment certificate routes
//!
//! Recovery saves and deletes run inside a transaction that locks the parent
//! advance row, so the cached recovered/balance/status fields always reflect
//! exactly the recovery rows that exist at commit time.

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
use crate::domain::payments::{
    derive_advance_state, derive_certificate_amounts, recovery_balance_after, AdvancePayment,
    AdvanceRecovery, AdvanceStatus, CertificateStatus, CreateAdvancePaymentRequest,
    CreateAdvanceRecoveryRequest, CreatePaymentCertificateRequest, PaymentCertificate,
    UpdateAdvancePaymentRequest, UpdatePaymentCertificateRequest,
};
use crate::domain::refs::PayableKind;
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct AdvanceRow {
    id: Uuid,
    contract_id: Uuid,
    reference_no: String,
    advance_amount: Decimal,
    recovered_amount: Decimal,
    balance_amount: Decimal,
    status: String,
    paid_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AdvanceRow> for AdvancePayment {
    fn from(row: AdvanceRow) -> Self {
        Self {
            id: row.id,
            contract_id: row.contract_id,
            reference_no: row.reference_no,
            advance_amount: row.advance_amount,
            recovered_amount: row.recovered_amount,
            balance_amount: row.balance_amount,
            status: AdvanceStatus::parse(&row.status),
            paid_date: row.paid_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecoveryRow {
    id: Uuid,
    advance_payment_id: Uuid,
    balance_before: Decimal,
    recovery_amount: Decimal,
    balance_after: Decimal,
    recovered_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<RecoveryRow> for AdvanceRecovery {
    fn from(row: RecoveryRow) -> Self {
        Self {
            id: row.id,
            advance_payment_id: row.advance_payment_id,
            balance_before: row.balance_before,
            recovery_amount: row.recovery_amount,
            balance_after: row.balance_after,
            recovered_date: row.recovered_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CertificateRow {
    id: Uuid,
    contract_id: Uuid,
    certificate_no: i32,
    period_end: NaiveDate,
    payee_kind: String,
    payee_id: Uuid,
    gross_amount: Decimal,
    retention_percent: Decimal,
    retention_amount: Decimal,
    advance_recovery_amount: Decimal,
    other_deductions: Decimal,
    net_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CertificateRow> for PaymentCertificate {
    type Error = ApiError;

    fn try_from(row: CertificateRow) -> Result<Self, ApiError> {
        let payee_kind = PayableKind::parse(&row.payee_kind).ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("unknown payee kind '{}'", row.payee_kind))
        })?;
        Ok(Self {
            id: row.id,
            contract_id: row.contract_id,
            certificate_no: row.certificate_no,
            period_end: row.period_end,
            payee_kind,
            payee_id: row.payee_id,
            gross_amount: row.gross_amount,
            retention_percent: row.retention_percent,
            retention_amount: row.retention_amount,
            advance_recovery_amount: row.advance_recovery_amount,
            other_deductions: row.other_deductions,
            net_amount: row.net_amount,
            status: CertificateStatus::parse(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ADVANCE_COLUMNS: &str = "id, contract_id, reference_no, advance_amount, recovered_amount, \
     balance_amount, status, paid_date, created_at, updated_at";

const RECOVERY_COLUMNS: &str = "id, advance_payment_id, balance_before, recovery_amount, \
     balance_after, recovered_date, created_at";

const CERTIFICATE_COLUMNS: &str = "id, contract_id, certificate_no, period_end, payee_kind, \
     payee_id, gross_amount, retention_percent, retention_amount, advance_recovery_amount, \
     other_deductions, net_amount, status, created_at, updated_at";

/// POST /contracts/:contract_id/advances
pub async fn create_advance(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<CreateAdvancePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.advance_amount <= Decimal::ZERO {
        return Err(ApiError::bad_request("advance_amount must be positive"));
    }

    let contract_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM contracts WHERE id = $1)")
            .bind(contract_id)
            .fetch_one(&state.db)
            .await?;
    if !contract_exists {
        return Err(ApiError::not_found("Contract not found"));
    }

    let initial = derive_advance_state(req.advance_amount, Decimal::ZERO);

    let row = sqlx::query_as::<_, AdvanceRow>(&format!(
        r#"
        INSERT INTO advance_payments (contract_id, reference_no, advance_amount,
                                      recovered_amount, balance_amount, status, paid_date,
                                      created_at, updated_at)
        VALUES ($1, $2, $3, 0, $4, $5, $6, NOW(), NOW())
        RETURNING {ADVANCE_COLUMNS}
        "#
    ))
    .bind(contract_id)
    .bind(&req.reference_no)
    .bind(req.advance_amount)
    .bind(initial.balance_amount)
    .bind(initial.status.as_str())
    .bind(req.paid_date)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(reference_no = %req.reference_no, "Advance payment created");

    let advance: AdvancePayment = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(advance))))
}

/// GET /contracts/:contract_id/advances
pub async fn list_advances(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, AdvanceRow>(&format!(
        "SELECT {ADVANCE_COLUMNS} FROM advance_payments WHERE contract_id = $1 \
         ORDER BY created_at"
    ))
    .bind(contract_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<AdvancePayment> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /advances/:advance_id
pub async fn get_advance(
    State(state): State<Arc<AppState>>,
    Path(advance_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, AdvanceRow>(&format!(
        "SELECT {ADVANCE_COLUMNS} FROM advance_payments WHERE id = $1"
    ))
    .bind(advance_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Advance payment not found"))?;

    let advance: AdvancePayment = row.into();
    Ok(Json(DataResponse::new(advance)))
}

/// Lock the advance row for the remainder of the transaction
async fn lock_advance(
    tx: &mut Transaction<'_, Postgres>,
    advance_id: Uuid,
) -> Result<AdvanceRow, ApiError> {
    sqlx::query_as::<_, AdvanceRow>(&format!(
        "SELECT {ADVANCE_COLUMNS} FROM advance_payments WHERE id = $1 FOR UPDATE"
    ))
    .bind(advance_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Advance payment not found"))
}

/// Re-derive the advance's cached fields from its surviving recovery rows
async fn recompute_advance(
    tx: &mut Transaction<'_, Postgres>,
    advance_id: Uuid,
    advance_amount: Decimal,
) -> Result<(), ApiError> {
    let recovered_sum: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(recovery_amount), 0) FROM advance_recoveries \
         WHERE advance_payment_id = $1",
    )
    .bind(advance_id)
    .fetch_one(&mut **tx)
    .await?;

    let derived = derive_advance_state(advance_amount, recovered_sum);

    sqlx::query(
        "UPDATE advance_payments SET recovered_amount = $2, balance_amount = $3, \
         status = $4, updated_at = NOW() WHERE id = $1",
    )
    .bind(advance_id)
    .bind(derived.recovered_amount)
    .bind(derived.balance_amount)
    .bind(derived.status.as_str())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// PUT /advances/:advance_id
///
/// Changing the advance amount re-derives the cached recovered/balance/status
/// fields against the recoveries already posted.
pub async fn update_advance(
    State(state): State<Arc<AppState>>,
    Path(advance_id): Path<Uuid>,
    Json(req): Json<UpdateAdvancePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let current = lock_advance(&mut tx, advance_id).await?;

    let advance_amount = req.advance_amount.unwrap_or(current.advance_amount);
    if advance_amount <= Decimal::ZERO {
        return Err(ApiError::bad_request("advance_amount must be positive"));
    }
    if advance_amount < current.recovered_amount {
        return Err(ApiError::bad_request(format!(
            "advance_amount {} is below the {} already recovered",
            advance_amount, current.recovered_amount
        )));
    }

    let derived = derive_advance_state(advance_amount, current.recovered_amount);

    let row = sqlx::query_as::<_, AdvanceRow>(&format!(
        r#"
        UPDATE advance_payments SET
            reference_no = COALESCE($2, reference_no),
            advance_amount = $3,
            balance_amount = $4,
            status = $5,
            paid_date = COALESCE($6, paid_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {ADVANCE_COLUMNS}
        "#
    ))
    .bind(advance_id)
    .bind(&req.reference_no)
    .bind(advance_amount)
    .bind(derived.balance_amount)
    .bind(derived.status.as_str())
    .bind(req.paid_date)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let advance: AdvancePayment = row.into();
    Ok(Json(DataResponse::new(advance)))
}

/// DELETE /advances/:advance_id
///
/// Recovery rows go with the advance via the cascading foreign key.
pub async fn delete_advance(
    State(state): State<Arc<AppState>>,
    Path(advance_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM advance_payments WHERE id = $1")
        .bind(advance_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Advance payment not found"));
    }

    Ok(Json(MessageResponse::new("Advance payment deleted")))
}

/// POST /advances/:advance_id/recoveries
pub async fn create_recovery(
    State(state): State<Arc<AppState>>,
    Path(advance_id): Path<Uuid>,
    Json(req): Json<CreateAdvanceRecoveryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.recovery_amount <= Decimal::ZERO {
        return Err(ApiError::bad_request("recovery_amount must be positive"));
    }

    let mut tx = state.db.begin().await?;

    let advance = lock_advance(&mut tx, advance_id).await?;

    if req.recovery_amount > advance.balance_amount {
        return Err(ApiError::bad_request(format!(
            "recovery_amount {} exceeds outstanding balance {}",
            req.recovery_amount, advance.balance_amount
        )));
    }

    let balance_before = advance.balance_amount;
    let balance_after = recovery_balance_after(balance_before, req.recovery_amount);

    let row = sqlx::query_as::<_, RecoveryRow>(&format!(
        r#"
        INSERT INTO advance_recoveries (advance_payment_id, balance_before, recovery_amount,
                                        balance_after, recovered_date, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING {RECOVERY_COLUMNS}
        "#
    ))
    .bind(advance_id)
    .bind(balance_before)
    .bind(req.recovery_amount)
    .bind(balance_after)
    .bind(req.recovered_date)
    .fetch_one(&mut *tx)
    .await?;

    recompute_advance(&mut tx, advance_id, advance.advance_amount).await?;
    tx.commit().await?;

    let recovery: AdvanceRecovery = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(recovery))))
}

/// GET /advances/:advance_id/recoveries
pub async fn list_recoveries(
    State(state): State<Arc<AppState>>,
    Path(advance_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, RecoveryRow>(&format!(
        "SELECT {RECOVERY_COLUMNS} FROM advance_recoveries WHERE advance_payment_id = $1 \
         ORDER BY created_at"
    ))
    .bind(advance_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<AdvanceRecovery> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// DELETE /advances/:advance_id/recoveries/:recovery_id
pub async fn delete_recovery(
    State(state): State<Arc<AppState>>,
    Path((advance_id, recovery_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let advance = lock_advance(&mut tx, advance_id).await?;

    let result =
        sqlx::query("DELETE FROM advance_recoveries WHERE id = $1 AND advance_payment_id = $2")
            .bind(recovery_id)
            .bind(advance_id)
            .execute(&mut *tx)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Advance recovery not found"));
    }

    recompute_advance(&mut tx, advance_id, advance.advance_amount).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("Advance recovery deleted")))
}

/// POST /contracts/:contract_id/certificates
pub async fn create_certificate(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<CreatePaymentCertificateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let contract_retention: Decimal =
        sqlx::query_scalar("SELECT retention_percent FROM contracts WHERE id = $1")
            .bind(contract_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Contract not found"))?;

    let retention_percent = req.retention_percent.unwrap_or(contract_retention);
    let advance_recovery = req.advance_recovery_amount.unwrap_or(Decimal::ZERO);
    let other_deductions = req.other_deductions.unwrap_or(Decimal::ZERO);

    let amounts = derive_certificate_amounts(
        req.gross_amount,
        retention_percent,
        advance_recovery,
        other_deductions,
    );

    // Certificate numbers run sequentially per contract
    let next_no: i32 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(certificate_no), 0) + 1 FROM payment_certificates \
         WHERE contract_id = $1",
    )
    .bind(contract_id)
    .fetch_one(&mut *tx)
    .await?;

    let row = sqlx::query_as::<_, CertificateRow>(&format!(
        r#"
        INSERT INTO payment_certificates (contract_id, certificate_no, period_end, payee_kind,
                                          payee_id, gross_amount, retention_percent,
                                          retention_amount, advance_recovery_amount,
                                          other_deductions, net_amount, status,
                                          created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'draft', NOW(), NOW())
        RETURNING {CERTIFICATE_COLUMNS}
        "#
    ))
    .bind(contract_id)
    .bind(next_no)
    .bind(req.period_end)
    .bind(req.payee_kind.as_str())
    .bind(req.payee_id)
    .bind(req.gross_amount)
    .bind(retention_percent)
    .bind(amounts.retention_amount)
    .bind(advance_recovery)
    .bind(other_deductions)
    .bind(amounts.net_amount)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(contract_id = %contract_id, certificate_no = next_no, "Payment certificate created");

    let certificate: PaymentCertificate = row.try_into()?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(certificate))))
}

/// GET /contracts/:contract_id/certificates
pub async fn list_certificates(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, CertificateRow>(&format!(
        "SELECT {CERTIFICATE_COLUMNS} FROM payment_certificates WHERE contract_id = $1 \
         ORDER BY certificate_no"
    ))
    .bind(contract_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<PaymentCertificate> = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<_, _>>()?;

    Ok(Json(DataResponse::new(data)))
}

/// GET /certificates/:certificate_id
pub async fn get_certificate(
    State(state): State<Arc<AppState>>,
    Path(certificate_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, CertificateRow>(&format!(
        "SELECT {CERTIFICATE_COLUMNS} FROM payment_certificates WHERE id = $1"
    ))
    .bind(certificate_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Payment certificate not found"))?;

    let certificate: PaymentCertificate = row.try_into()?;
    Ok(Json(DataResponse::new(certificate)))
}

/// PUT /certificates/:certificate_id
///
/// The deduction and net columns are always re-derived from the effective
/// gross/retention/deduction inputs, never patched directly.
pub async fn update_certificate(
    State(state): State<Arc<AppState>>,
    Path(certificate_id): Path<Uuid>,
    Json(req): Json<UpdatePaymentCertificateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let current = sqlx::query_as::<_, CertificateRow>(&format!(
        "SELECT {CERTIFICATE_COLUMNS} FROM payment_certificates WHERE id = $1 FOR UPDATE"
    ))
    .bind(certificate_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Payment certificate not found"))?;

    let gross_amount = req.gross_amount.unwrap_or(current.gross_amount);
    let retention_percent = req.retention_percent.unwrap_or(current.retention_percent);
    let advance_recovery = req
        .advance_recovery_amount
        .unwrap_or(current.advance_recovery_amount);
    let other_deductions = req.other_deductions.unwrap_or(current.other_deductions);
    let status = req
        .status
        .map(|s| s.as_str())
        .unwrap_or(current.status.as_str());

    let amounts = derive_certificate_amounts(
        gross_amount,
        retention_percent,
        advance_recovery,
        other_deductions,
    );

    let row = sqlx::query_as::<_, CertificateRow>(&format!(
        r#"
        UPDATE payment_certificates SET
            gross_amount = $2,
            retention_percent = $3,
            retention_amount = $4,
            advance_recovery_amount = $5,
            other_deductions = $6,
            net_amount = $7,
            status = $8,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {CERTIFICATE_COLUMNS}
        "#
    ))
    .bind(certificate_id)
    .bind(gross_amount)
    .bind(retention_percent)
    .bind(amounts.retention_amount)
    .bind(advance_recovery)
    .bind(other_deductions)
    .bind(amounts.net_amount)
    .bind(status)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let certificate: PaymentCertificate = row.try_into()?;
    Ok(Json(DataResponse::new(certificate)))
}

/// DELETE /certificates/:certificate_id
pub async fn delete_certificate(
    State(state): State<Arc<AppState>>,
    Path(certificate_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM payment_certificates WHERE id = $1")
        .bind(certificate_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Payment certificate not found"));
    }

    Ok(Json(MessageResponse::new("Payment certificate deleted")))
}
