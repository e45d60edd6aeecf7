//! Project dashboard route
//!
//! One read-only KPI summary per project, assembled from the cached
//! aggregate columns the child-row mutations maintain. The independent
//! queries run concurrently against the pool.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use futures::try_join;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct ProjectDashboard {
    pub project_id: Uuid,
    pub project_code: String,
    pub project_name: String,
    pub status: String,
    pub contract_sum: Decimal,
    /// Weighted progress over the project's root WBS nodes
    pub overall_progress: Decimal,
    pub contracts_count: i64,
    pub contracts_value: Decimal,
    pub certified_net_total: Decimal,
    pub advances_outstanding: Decimal,
    pub open_purchase_orders: i64,
    pub purchase_orders_value: Decimal,
    pub fabricated_weight: Decimal,
    pub latest_evm: Option<EvmSnapshot>,
    pub open_inspections: i64,
    pub failed_inspections: i64,
    pub incidents_count: i64,
    pub lost_days: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct EvmSnapshot {
    pub period_end: NaiveDate,
    pub total_planned_value: Decimal,
    pub total_earned_value: Decimal,
    pub total_actual_cost: Decimal,
    pub spi: Decimal,
    pub cpi: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectHeader {
    id: Uuid,
    code: String,
    name_en: String,
    status: String,
    contract_sum: Decimal,
}

async fn fetch_progress(pool: &PgPool, project_id: Uuid) -> Result<Decimal, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(ROUND(SUM(progress_percent * weight_percent) \
         / NULLIF(SUM(weight_percent), 0), 2), 0) \
         FROM wbs_nodes WHERE project_id = $1 AND parent_id IS NULL",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

async fn fetch_contract_stats(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<(i64, Decimal), sqlx::Error> {
    sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(contract_sum), 0) FROM contracts WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

async fn fetch_certified_net(pool: &PgPool, project_id: Uuid) -> Result<Decimal, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(pc.net_amount), 0) FROM payment_certificates pc \
         JOIN contracts c ON c.id = pc.contract_id \
         WHERE c.project_id = $1 AND pc.status IN ('approved', 'paid')",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

async fn fetch_advances_outstanding(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Decimal, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(ap.balance_amount), 0) FROM advance_payments ap \
         JOIN contracts c ON c.id = ap.contract_id \
         WHERE c.project_id = $1 AND ap.status <> 'fully_recovered'",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

async fn fetch_po_stats(pool: &PgPool, project_id: Uuid) -> Result<(i64, Decimal), sqlx::Error> {
    sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE status IN ('draft', 'issued', 'partially_received')), \
         COALESCE(SUM(total_amount), 0) \
         FROM purchase_orders WHERE project_id = $1 AND status <> 'cancelled'",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

async fn fetch_fabricated_weight(pool: &PgPool, project_id: Uuid) -> Result<Decimal, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_weight), 0) FROM fabrication_orders \
         WHERE project_id = $1 AND deleted_at IS NULL",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

async fn fetch_latest_evm(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Option<EvmSnapshot>, sqlx::Error> {
    sqlx::query_as(
        "SELECT period_end, total_planned_value, total_earned_value, total_actual_cost, spi, cpi \
         FROM evm_measurements WHERE project_id = $1 ORDER BY period_end DESC LIMIT 1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await
}

async fn fetch_quality_stats(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE result = 'pending'), \
         COUNT(*) FILTER (WHERE result = 'failed') \
         FROM inspections WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

async fn fetch_hse_stats(pool: &PgPool, project_id: Uuid) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(lost_days), 0)::BIGINT \
         FROM hse_incidents WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

/// GET /projects/:project_id/dashboard
pub async fn project_dashboard(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let project: ProjectHeader = sqlx::query_as(
        "SELECT id, code, name_en, status, contract_sum FROM projects \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(project_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let pool = &state.db;
    let (
        overall_progress,
        (contracts_count, contracts_value),
        certified_net_total,
        advances_outstanding,
        (open_purchase_orders, purchase_orders_value),
        fabricated_weight,
        latest_evm,
        (open_inspections, failed_inspections),
        (incidents_count, lost_days),
    ) = try_join!(
        fetch_progress(pool, project_id),
        fetch_contract_stats(pool, project_id),
        fetch_certified_net(pool, project_id),
        fetch_advances_outstanding(pool, project_id),
        fetch_po_stats(pool, project_id),
        fetch_fabricated_weight(pool, project_id),
        fetch_latest_evm(pool, project_id),
        fetch_quality_stats(pool, project_id),
        fetch_hse_stats(pool, project_id),
    )?;

    let dashboard = ProjectDashboard {
        project_id: project.id,
        project_code: project.code,
        project_name: project.name_en,
        status: project.status,
        contract_sum: project.contract_sum,
        overall_progress,
        contracts_count,
        contracts_value,
        certified_net_total,
        advances_outstanding,
        open_purchase_orders,
        purchase_orders_value,
        fabricated_weight,
        latest_evm,
        open_inspections,
        failed_inspections,
        incidents_count,
        lost_days,
    };

    Ok(Json(DataResponse::new(dashboard)))
}
