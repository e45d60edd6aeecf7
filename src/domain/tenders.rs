use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::numeric::round_money;

/// Trade category for tender packages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TradeCategory {
    GeneralConditions,
    SiteworkExcavation,
    Concrete,
    Masonry,
    Metals,
    Finishes,
    Mechanical,
    Electrical,
    Plumbing,
    Hvac,
    FireProtection,
    #[default]
    Other,
}

impl TradeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneralConditions => "general_conditions",
            Self::SiteworkExcavation => "sitework_excavation",
            Self::Concrete => "concrete",
            Self::Masonry => "masonry",
            Self::Metals => "metals",
            Self::Finishes => "finishes",
            Self::Mechanical => "mechanical",
            Self::Electrical => "electrical",
            Self::Plumbing => "plumbing",
            Self::Hvac => "hvac",
            Self::FireProtection => "fire_protection",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "general_conditions" => Self::GeneralConditions,
            "sitework_excavation" => Self::SiteworkExcavation,
            "concrete" => Self::Concrete,
            "masonry" => Self::Masonry,
            "metals" => Self::Metals,
            "finishes" => Self::Finishes,
            "mechanical" => Self::Mechanical,
            "electrical" => Self::Electrical,
            "plumbing" => Self::Plumbing,
            "hvac" => Self::Hvac,
            "fire_protection" => Self::FireProtection,
            _ => Self::Other,
        }
    }
}

/// Tender status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenderStatus {
    #[default]
    Draft,
    Published,
    Closed,
    Awarded,
    Cancelled,
}

impl TenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Closed => "closed",
            Self::Awarded => "awarded",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "published" => Self::Published,
            "closed" => Self::Closed,
            "awarded" => Self::Awarded,
            "cancelled" => Self::Cancelled,
            _ => Self::Draft,
        }
    }
}

/// Tender package entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tender {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub trade_category: TradeCategory,
    pub scope_of_work: Option<String>,
    pub status: TenderStatus,
    pub bid_due_date: Option<DateTime<Utc>>,
    pub estimated_value: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a tender
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenderRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub trade_category: TradeCategory,
    #[serde(default)]
    pub scope_of_work: Option<String>,
    #[serde(default)]
    pub bid_due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_value: Option<Decimal>,
}

/// Request DTO for updating a tender
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTenderRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub trade_category: Option<TradeCategory>,
    #[serde(default)]
    pub scope_of_work: Option<String>,
    #[serde(default)]
    pub status: Option<TenderStatus>,
    #[serde(default)]
    pub bid_due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_value: Option<Decimal>,
}

/// Bid status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    #[default]
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
    Withdrawn,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "under_review" => Self::UnderReview,
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            "withdrawn" => Self::Withdrawn,
            _ => Self::Submitted,
        }
    }
}

/// Supplier bid against a tender
///
/// `bid_total` is a cached sum over the bid's lines, re-derived whenever a
/// line is saved or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub supplier_id: Uuid,
    pub status: BidStatus,
    pub bid_total: Decimal,
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBidRequest {
    pub supplier_id: Uuid,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBidRequest {
    #[serde(default)]
    pub status: Option<BidStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One priced line within a bid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidLine {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub description: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_rate: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBidLineRequest {
    pub description: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_rate: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBidLineRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_rate: Option<Decimal>,
}

/// `line_total = quantity × unit_rate`, money scale
pub fn bid_line_total(quantity: Decimal, unit_rate: Decimal) -> Decimal {
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
    fn line_total_is_quantity_times_rate() {
        assert_eq!(bid_line_total(dec("12.5"), dec("80")), dec("1000.00"));
        assert_eq!(bid_line_total(dec("3"), dec("19.999")), dec("60.00"));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            BidStatus::Submitted,
            BidStatus::UnderReview,
            BidStatus::Accepted,
            BidStatus::Rejected,
            BidStatus::Withdrawn,
        ] {
            assert_eq!(BidStatus::parse(status.as_str()), status);
        }
    }
}
