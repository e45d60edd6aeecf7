//! Polymorphic record references
//!
//! Attachments and comments can hang off several entity types. The reference
//! is a closed tagged union (kind enum + UUID), never an open table-name
//! string; each kind resolves to exactly one table for existence checks.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Entity kinds that can own attachments and comments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachableKind {
    Project,
    Tender,
    Contract,
    Document,
    PurchaseOrder,
    FabricationOrder,
    Inspection,
    HseIncident,
}

impl AttachableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Tender => "tender",
            Self::Contract => "contract",
            Self::Document => "document",
            Self::PurchaseOrder => "purchase_order",
            Self::FabricationOrder => "fabrication_order",
            Self::Inspection => "inspection",
            Self::HseIncident => "hse_incident",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "project" => Some(Self::Project),
            "tender" => Some(Self::Tender),
            "contract" => Some(Self::Contract),
            "document" => Some(Self::Document),
            "purchase_order" => Some(Self::PurchaseOrder),
            "fabrication_order" => Some(Self::FabricationOrder),
            "inspection" => Some(Self::Inspection),
            "hse_incident" => Some(Self::HseIncident),
            _ => None,
        }
    }

    fn table(&self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Tender => "tenders",
            Self::Contract => "contracts",
            Self::Document => "documents",
            Self::PurchaseOrder => "purchase_orders",
            Self::FabricationOrder => "fabrication_orders",
            Self::Inspection => "inspections",
            Self::HseIncident => "hse_incidents",
        }
    }

    /// Soft-deleted kinds must not accept new attachments or comments
    fn soft_deleted(&self) -> bool {
        matches!(
            self,
            Self::Project | Self::Document | Self::FabricationOrder
        )
    }
}

/// A resolved polymorphic reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub kind: AttachableKind,
    pub id: Uuid,
}

impl RecordRef {
    pub fn new(kind: AttachableKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// Check the referenced row exists (and is not soft-deleted)
    pub async fn exists(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        let sql = if self.kind.soft_deleted() {
            format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND deleted_at IS NULL)",
                self.kind.table()
            )
        } else {
            format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
                self.kind.table()
            )
        };

        sqlx::query_scalar(&sql).bind(self.id).fetch_one(pool).await
    }
}

/// Entity kinds a payment certificate can be addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayableKind {
    Supplier,
    Subcontractor,
    Employee,
}

impl PayableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supplier => "supplier",
            Self::Subcontractor => "subcontractor",
            Self::Employee => "employee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "supplier" => Some(Self::Supplier),
            "subcontractor" => Some(Self::Subcontractor),
            "employee" => Some(Self::Employee),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachable_kind_round_trips_through_str() {
        for kind in [
            AttachableKind::Project,
            AttachableKind::Tender,
            AttachableKind::Contract,
            AttachableKind::Document,
            AttachableKind::PurchaseOrder,
            AttachableKind::FabricationOrder,
            AttachableKind::Inspection,
            AttachableKind::HseIncident,
        ] {
            assert_eq!(AttachableKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AttachableKind::parse("warehouse"), None);
    }

    #[test]
    fn payable_kind_round_trips_through_str() {
        for kind in [
            PayableKind::Supplier,
            PayableKind::Subcontractor,
            PayableKind::Employee,
        ] {
            assert_eq!(PayableKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(PayableKind::parse("client"), None);
    }
}
