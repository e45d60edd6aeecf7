use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::refs::AttachableKind;

/// Document discipline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    Architectural,
    Structural,
    Mechanical,
    Electrical,
    Civil,
    #[default]
    General,
}

impl Discipline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Architectural => "architectural",
            Self::Structural => "structural",
            Self::Mechanical => "mechanical",
            Self::Electrical => "electrical",
            Self::Civil => "civil",
            Self::General => "general",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "architectural" => Self::Architectural,
            "structural" => Self::Structural,
            "mechanical" => Self::Mechanical,
            "electrical" => Self::Electrical,
            "civil" => Self::Civil,
            _ => Self::General,
        }
    }
}

/// Document control status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Draft,
    IssuedForReview,
    Approved,
    Superseded,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::IssuedForReview => "issued_for_review",
            Self::Approved => "approved",
            Self::Superseded => "superseded",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "issued_for_review" => Self::IssuedForReview,
            "approved" => Self::Approved,
            "superseded" => Self::Superseded,
            "archived" => Self::Archived,
            _ => Self::Draft,
        }
    }
}

/// Controlled document (soft-deleted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub project_id: Uuid,
    pub document_no: String,
    pub title: String,
    pub discipline: Discipline,
    pub revision: i32,
    pub status: DocumentStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentRequest {
    pub document_no: String,
    pub title: String,
    #[serde(default)]
    pub discipline: Discipline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub discipline: Option<Discipline>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    /// When true the revision number is bumped on save
    #[serde(default)]
    pub new_revision: bool,
}

/// File attachment on any attachable record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub attachable_kind: AttachableKind,
    pub attachable_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttachmentRequest {
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
}

/// Free-text comment on any attachable record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub commentable_kind: AttachableKind,
    pub commentable_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub author_name: String,
    pub body: String,
}
