//! Document control, attachment and comment routes
//!
//! Attachments and comments hang off any attachable entity; the target kind
//! comes from the URL and is validated against the closed kind enum, then
//! the referenced row is checked to exist (and not be soft-deleted).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::documents::{
    Attachment, Comment, CreateAttachmentRequest, CreateCommentRequest, CreateDocumentRequest,
    Discipline, Document, DocumentStatus, UpdateDocumentRequest,
};
use crate::domain::refs::{AttachableKind, RecordRef};
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    project_id: Uuid,
    document_no: String,
    title: String,
    discipline: String,
    revision: i32,
    status: String,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            document_no: row.document_no,
            title: row.title,
            discipline: Discipline::parse(&row.discipline),
            revision: row.revision,
            status: DocumentStatus::parse(&row.status),
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AttachmentRow {
    id: Uuid,
    attachable_kind: String,
    attachable_id: Uuid,
    file_name: String,
    file_size: i64,
    content_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttachmentRow> for Attachment {
    type Error = ApiError;

    fn try_from(row: AttachmentRow) -> Result<Self, ApiError> {
        let kind = AttachableKind::parse(&row.attachable_kind).ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "unknown attachable kind '{}'",
                row.attachable_kind
            ))
        })?;
        Ok(Self {
            id: row.id,
            attachable_kind: kind,
            attachable_id: row.attachable_id,
            file_name: row.file_name,
            file_size: row.file_size,
            content_type: row.content_type,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    commentable_kind: String,
    commentable_id: Uuid,
    author_name: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = ApiError;

    fn try_from(row: CommentRow) -> Result<Self, ApiError> {
        let kind = AttachableKind::parse(&row.commentable_kind).ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "unknown commentable kind '{}'",
                row.commentable_kind
            ))
        })?;
        Ok(Self {
            id: row.id,
            commentable_kind: kind,
            commentable_id: row.commentable_id,
            author_name: row.author_name,
            body: row.body,
            created_at: row.created_at,
        })
    }
}

const DOCUMENT_COLUMNS: &str = "id, project_id, document_no, title, discipline, revision, \
     status, deleted_at, created_at, updated_at";

const ATTACHMENT_COLUMNS: &str =
    "id, attachable_kind, attachable_id, file_name, file_size, content_type, created_at";

const COMMENT_COLUMNS: &str =
    "id, commentable_kind, commentable_id, author_name, body, created_at";

/// Resolve a :kind path segment into a validated record reference
async fn resolve_record_ref(
    state: &AppState,
    kind: &str,
    record_id: Uuid,
) -> Result<RecordRef, ApiError> {
    let kind = AttachableKind::parse(kind)
        .ok_or_else(|| ApiError::bad_request(format!("unknown record kind '{kind}'")))?;

    let record = RecordRef::new(kind, record_id);
    if !record.exists(&state.db).await? {
        return Err(ApiError::not_found(format!(
            "{} {} not found",
            kind.as_str(),
            record_id
        )));
    }

    Ok(record)
}

/// POST /projects/:project_id/documents
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateDocumentRequest>,
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

    let row = sqlx::query_as::<_, DocumentRow>(&format!(
        r#"
        INSERT INTO documents (project_id, document_no, title, discipline, revision, status,
                               created_at, updated_at)
        VALUES ($1, $2, $3, $4, 0, 'draft', NOW(), NOW())
        RETURNING {DOCUMENT_COLUMNS}
        "#
    ))
    .bind(project_id)
    .bind(&req.document_no)
    .bind(&req.title)
    .bind(req.discipline.as_str())
    .fetch_one(&state.db)
    .await?;

    let document: Document = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(document))))
}

/// GET /projects/:project_id/documents
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, DocumentRow>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents \
         WHERE project_id = $1 AND deleted_at IS NULL ORDER BY document_no"
    ))
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Document> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /documents/:document_id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, DocumentRow>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(document_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Document not found"))?;

    let document: Document = row.into();
    Ok(Json(DataResponse::new(document)))
}

/// PUT /documents/:document_id
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let discipline = req.discipline.map(|d| d.as_str());
    let status = req.status.map(|s| s.as_str());

    let row = sqlx::query_as::<_, DocumentRow>(&format!(
        r#"
        UPDATE documents SET
            title = COALESCE($2, title),
            discipline = COALESCE($3, discipline),
            status = COALESCE($4, status),
            revision = revision + CASE WHEN $5 THEN 1 ELSE 0 END,
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {DOCUMENT_COLUMNS}
        "#
    ))
    .bind(document_id)
    .bind(&req.title)
    .bind(discipline)
    .bind(status)
    .bind(req.new_revision)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Document not found"))?;

    let document: Document = row.into();
    Ok(Json(DataResponse::new(document)))
}

/// DELETE /documents/:document_id (soft delete)
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query(
        "UPDATE documents SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(document_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Document not found"));
    }

    Ok(Json(MessageResponse::new("Document deleted")))
}

/// POST /attachments/:kind/:record_id
pub async fn create_attachment(
    State(state): State<Arc<AppState>>,
    Path((kind, record_id)): Path<(String, Uuid)>,
    Json(req): Json<CreateAttachmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.file_size <= 0 {
        return Err(ApiError::bad_request("file_size must be positive"));
    }

    let record = resolve_record_ref(&state, &kind, record_id).await?;

    let row = sqlx::query_as::<_, AttachmentRow>(&format!(
        r#"
        INSERT INTO attachments (attachable_kind, attachable_id, file_name, file_size,
                                 content_type, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING {ATTACHMENT_COLUMNS}
        "#
    ))
    .bind(record.kind.as_str())
    .bind(record.id)
    .bind(&req.file_name)
    .bind(req.file_size)
    .bind(&req.content_type)
    .fetch_one(&state.db)
    .await?;

    let attachment: Attachment = row.try_into()?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(attachment))))
}

/// GET /attachments/:kind/:record_id
pub async fn list_attachments(
    State(state): State<Arc<AppState>>,
    Path((kind, record_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = AttachableKind::parse(&kind)
        .ok_or_else(|| ApiError::bad_request(format!("unknown record kind '{kind}'")))?;

    let rows = sqlx::query_as::<_, AttachmentRow>(&format!(
        "SELECT {ATTACHMENT_COLUMNS} FROM attachments \
         WHERE attachable_kind = $1 AND attachable_id = $2 ORDER BY created_at"
    ))
    .bind(kind.as_str())
    .bind(record_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Attachment> = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<_, _>>()?;

    Ok(Json(DataResponse::new(data)))
}

/// DELETE /attachments/:attachment_id
pub async fn delete_attachment(
    State(state): State<Arc<AppState>>,
    Path(attachment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
        .bind(attachment_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Attachment not found"));
    }

    Ok(Json(MessageResponse::new("Attachment deleted")))
}

/// POST /comments/:kind/:record_id
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Path((kind, record_id)): Path<(String, Uuid)>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.body.trim().is_empty() {
        return Err(ApiError::bad_request("comment body must not be empty"));
    }

    let record = resolve_record_ref(&state, &kind, record_id).await?;

    let row = sqlx::query_as::<_, CommentRow>(&format!(
        r#"
        INSERT INTO comments (commentable_kind, commentable_id, author_name, body, created_at)
        VALUES ($1, $2, $3, $4, NOW())
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(record.kind.as_str())
    .bind(record.id)
    .bind(&req.author_name)
    .bind(&req.body)
    .fetch_one(&state.db)
    .await?;

    let comment: Comment = row.try_into()?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(comment))))
}

/// DELETE /comments/:comment_id
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Comment not found"));
    }

    Ok(Json(MessageResponse::new("Comment deleted")))
}

/// GET /comments/:kind/:record_id
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path((kind, record_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = AttachableKind::parse(&kind)
        .ok_or_else(|| ApiError::bad_request(format!("unknown record kind '{kind}'")))?;

    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments \
         WHERE commentable_kind = $1 AND commentable_id = $2 ORDER BY created_at"
    ))
    .bind(kind.as_str())
    .bind(record_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Comment> = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<_, _>>()?;

    Ok(Json(DataResponse::new(data)))
}
