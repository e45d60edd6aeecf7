//! Project and WBS routes
//!
//! A WBS node's cached progress is a weighted roll-up over its direct
//! children, re-derived inside the same transaction as any child save
//! or delete.

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

use crate::api::pagination::PaginationParams;
use crate::api::response::{DataResponse, MessageResponse};
use crate::api::Paginated;
use crate::app::AppState;
use crate::domain::locale::{Locale, LocaleParams, LocalizedText};
use crate::domain::projects::{
    CreateProjectRequest, CreateWbsNodeRequest, Project, ProjectResponse, ProjectStatus,
    UpdateProjectRequest, UpdateWbsNodeRequest, WbsNode, WbsNodeResponse,
};
use crate::error::ApiError;

/// Database row for project
#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    code: String,
    name_en: String,
    name_ar: Option<String>,
    client_name: Option<String>,
    status: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    contract_sum: Decimal,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: LocalizedText::new(row.name_en, row.name_ar),
            client_name: row.client_name,
            status: ProjectStatus::parse(&row.status),
            start_date: row.start_date,
            end_date: row.end_date,
            contract_sum: row.contract_sum,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for WBS node
#[derive(Debug, sqlx::FromRow)]
struct WbsNodeRow {
    id: Uuid,
    project_id: Uuid,
    parent_id: Option<Uuid>,
    code: String,
    name_en: String,
    name_ar: Option<String>,
    weight_percent: Decimal,
    progress_percent: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WbsNodeRow> for WbsNode {
    fn from(row: WbsNodeRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            parent_id: row.parent_id,
            code: row.code,
            name: LocalizedText::new(row.name_en, row.name_ar),
            weight_percent: row.weight_percent,
            progress_percent: row.progress_percent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PROJECT_COLUMNS: &str = "id, code, name_en, name_ar, client_name, status, \
     start_date, end_date, contract_sum, deleted_at, created_at, updated_at";

const WBS_COLUMNS: &str = "id, project_id, parent_id, code, name_en, name_ar, \
     weight_percent, progress_percent, created_at, updated_at";

fn resolve_locale(state: &AppState, params: &LocaleParams) -> Locale {
    params.locale.unwrap_or(state.settings.default_locale)
}

/// POST /projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE code = $1)")
            .bind(&req.code)
            .fetch_one(&state.db)
            .await?;

    if code_taken {
        return Err(ApiError::conflict(format!(
            "Project code already in use: {}",
            req.code
        )));
    }

    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        r#"
        INSERT INTO projects (code, name_en, name_ar, client_name, status,
                              start_date, end_date, contract_sum, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'planning', $5, $6, COALESCE($7, 0), NOW(), NOW())
        RETURNING {PROJECT_COLUMNS}
        "#
    ))
    .bind(&req.code)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.client_name)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(req.contract_sum)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(project_code = %req.code, "Project created");

    let locale = resolve_locale(&state, &locale);
    let response = ProjectResponse::from_project(row.into(), locale);
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE deleted_at IS NULL")
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE deleted_at IS NULL \
         ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let data: Vec<ProjectResponse> = rows
        .into_iter()
        .map(|row| ProjectResponse::from_project(row.into(), locale))
        .collect();

    Ok(Json(Paginated::new(data, &pagination, total as u64)))
}

/// GET /projects/:project_id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(project_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(ProjectResponse::from_project(
        row.into(),
        locale,
    ))))
}

/// PUT /projects/:project_id
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = req.status.map(|s| s.as_str());

    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        r#"
        UPDATE projects SET
            name_en = COALESCE($2, name_en),
            name_ar = COALESCE($3, name_ar),
            client_name = COALESCE($4, client_name),
            status = COALESCE($5, status),
            start_date = COALESCE($6, start_date),
            end_date = COALESCE($7, end_date),
            contract_sum = COALESCE($8, contract_sum),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {PROJECT_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.client_name)
    .bind(status)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(req.contract_sum)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(ProjectResponse::from_project(
        row.into(),
        locale,
    ))))
}

/// DELETE /projects/:project_id (soft delete)
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query(
        "UPDATE projects SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(project_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Project not found"));
    }

    Ok(Json(MessageResponse::new("Project deleted")))
}

/// Re-derive a parent node's cached progress from its direct children.
///
/// The weighted average is computed in one statement so concurrent child
/// writers serialize on the parent row.
async fn recompute_parent_progress(
    tx: &mut Transaction<'_, Postgres>,
    parent_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE wbs_nodes SET
            progress_percent = COALESCE((
                SELECT ROUND(SUM(progress_percent * weight_percent)
                             / NULLIF(SUM(weight_percent), 0), 2)
                FROM wbs_nodes
                WHERE parent_id = $1
            ), 0),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(parent_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// POST /projects/:project_id/wbs
pub async fn create_wbs_node(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<CreateWbsNodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    if let Some(parent_id) = req.parent_id {
        let parent_ok: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM wbs_nodes WHERE id = $1 AND project_id = $2)",
        )
        .bind(parent_id)
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await?;
        if !parent_ok {
            return Err(ApiError::bad_request("Parent WBS node not found in project"));
        }
    }

    let row = sqlx::query_as::<_, WbsNodeRow>(&format!(
        r#"
        INSERT INTO wbs_nodes (project_id, parent_id, code, name_en, name_ar,
                               weight_percent, progress_percent, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 0), NOW(), NOW())
        RETURNING {WBS_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(req.parent_id)
    .bind(&req.code)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(req.weight_percent)
    .bind(req.progress_percent)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(parent_id) = row.parent_id {
        recompute_parent_progress(&mut tx, parent_id).await?;
    }
    tx.commit().await?;

    let locale = resolve_locale(&state, &locale);
    let response = WbsNodeResponse::from_node(row.into(), locale);
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /projects/:project_id/wbs
pub async fn list_wbs_nodes(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, WbsNodeRow>(&format!(
        "SELECT {WBS_COLUMNS} FROM wbs_nodes WHERE project_id = $1 ORDER BY code"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let data: Vec<WbsNodeResponse> = rows
        .into_iter()
        .map(|row| WbsNodeResponse::from_node(row.into(), locale))
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// PUT /projects/:project_id/wbs/:node_id
pub async fn update_wbs_node(
    State(state): State<Arc<AppState>>,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<UpdateWbsNodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, WbsNodeRow>(&format!(
        r#"
        UPDATE wbs_nodes SET
            name_en = COALESCE($3, name_en),
            name_ar = COALESCE($4, name_ar),
            weight_percent = COALESCE($5, weight_percent),
            progress_percent = COALESCE($6, progress_percent),
            updated_at = NOW()
        WHERE id = $1 AND project_id = $2
        RETURNING {WBS_COLUMNS}
        "#
    ))
    .bind(node_id)
    .bind(project_id)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(req.weight_percent)
    .bind(req.progress_percent)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("WBS node not found"))?;

    if let Some(parent_id) = row.parent_id {
        recompute_parent_progress(&mut tx, parent_id).await?;
    }
    tx.commit().await?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(WbsNodeResponse::from_node(
        row.into(),
        locale,
    ))))
}

/// DELETE /projects/:project_id/wbs/:node_id
pub async fn delete_wbs_node(
    State(state): State<Arc<AppState>>,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let parent_id: Option<Uuid> = sqlx::query_scalar(
        "DELETE FROM wbs_nodes WHERE id = $1 AND project_id = $2 RETURNING parent_id",
    )
    .bind(node_id)
    .bind(project_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("WBS node not found"))?;

    if let Some(parent_id) = parent_id {
        recompute_parent_progress(&mut tx, parent_id).await?;
    }
    tx.commit().await?;

    Ok(Json(MessageResponse::new("WBS node deleted")))
}
