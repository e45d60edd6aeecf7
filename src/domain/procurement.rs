use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::locale::{Locale, LocalizedText};
use super::numeric::round_money;

/// Supplier master record (soft-deleted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub code: String,
    pub name: LocalizedText,
    pub tax_no: Option<String>,
    pub contact_email: Option<String>,
    /// 1-5 evaluation score
    pub rating: Option<i16>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSupplierRequest {
    pub code: String,
    pub name_en: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub tax_no: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub rating: Option<i16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSupplierRequest {
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub tax_no: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub rating: Option<i16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub tax_no: Option<String>,
    pub contact_email: Option<String>,
    pub rating: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupplierResponse {
    pub fn from_supplier(s: Supplier, locale: Locale) -> Self {
        Self {
            id: s.id,
            code: s.code,
            name: s.name.name(locale).to_string(),
            name_en: s.name.en.clone(),
            name_ar: s.name.ar.clone(),
            tax_no: s.tax_no,
            contact_email: s.contact_email,
            rating: s.rating,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Request-for-quotation status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RfqStatus {
    #[default]
    Open,
    Sent,
    Quoted,
    Closed,
    Cancelled,
}

impl RfqStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Sent => "sent",
            Self::Quoted => "quoted",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "sent" => Self::Sent,
            "quoted" => Self::Quoted,
            "closed" => Self::Closed,
            "cancelled" => Self::Cancelled,
            _ => Self::Open,
        }
    }
}

/// Request for quotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rfq {
    pub id: Uuid,
    pub project_id: Uuid,
    pub rfq_no: String,
    pub status: RfqStatus,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRfqRequest {
    pub rfq_no: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRfqRequest {
    #[serde(default)]
    pub status: Option<RfqStatus>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// One requested material line within an RFQ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfqLine {
    pub id: Uuid,
    pub rfq_id: Uuid,
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRfqLineRequest {
    pub material_id: Uuid,
    pub quantity: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRfqLineRequest {
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Purchase order status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    #[default]
    Draft,
    Issued,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::PartiallyReceived => "partially_received",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "issued" => Self::Issued,
            "partially_received" => Self::PartiallyReceived,
            "received" => Self::Received,
            "cancelled" => Self::Cancelled,
            _ => Self::Draft,
        }
    }
}

/// Purchase order
///
/// `total_amount` caches the sum over the order's lines and is re-derived
/// whenever a line is saved or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub project_id: Uuid,
    pub supplier_id: Uuid,
    pub po_no: String,
    pub status: PurchaseOrderStatus,
    pub total_amount: Decimal,
    pub order_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: Uuid,
    pub po_no: String,
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePurchaseOrderRequest {
    #[serde(default)]
    pub status: Option<PurchaseOrderStatus>,
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
}

/// One priced material line within a purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub unit_rate: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseOrderLineRequest {
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub unit_rate: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePurchaseOrderLineRequest {
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_rate: Option<Decimal>,
}

/// `line_total = quantity × unit_rate`, money scale
pub fn po_line_total(quantity: Decimal, unit_rate: Decimal) -> Decimal {
    round_money(quantity * unit_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn po_line_total_rounds_to_money() {
        assert_eq!(po_line_total(dec("7.5"), dec("13.333")), dec("100.00"));
    }

    #[test]
    fn po_total_is_sum_of_line_totals() {
        let lines = [
            po_line_total(dec("10"), dec("45.50")),
            po_line_total(dec("3"), dec("120")),
            po_line_total(dec("0.5"), dec("999.99")),
        ];
        let total: Decimal = lines.iter().copied().sum();
        assert_eq!(round_money(total), dec("1315.00"));
    }
}
