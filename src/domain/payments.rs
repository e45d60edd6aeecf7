use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::numeric::round_money;
use super::refs::PayableKind;

/// Advance payment recovery status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceStatus {
    #[default]
    Pending,
    PartiallyRecovered,
    FullyRecovered,
}

impl AdvanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PartiallyRecovered => "partially_recovered",
            Self::FullyRecovered => "fully_recovered",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "partially_recovered" => Self::PartiallyRecovered,
            "fully_recovered" => Self::FullyRecovered,
            _ => Self::Pending,
        }
    }
}

/// Contract advance payment
///
/// `recovered_amount`, `balance_amount` and `status` are cached values derived
/// from the advance's recovery rows and are re-derived whenever a recovery is
/// created or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancePayment {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub reference_no: String,
    pub advance_amount: Decimal,
    pub recovered_amount: Decimal,
    pub balance_amount: Decimal,
    pub status: AdvanceStatus,
    pub paid_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdvancePaymentRequest {
    pub reference_no: String,
    pub advance_amount: Decimal,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAdvancePaymentRequest {
    #[serde(default)]
    pub reference_no: Option<String>,
    #[serde(default)]
    pub advance_amount: Option<Decimal>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

/// One recovery installment deducted against an advance payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceRecovery {
    pub id: Uuid,
    pub advance_payment_id: Uuid,
    /// Parent balance as read before this recovery was applied
    pub balance_before: Decimal,
    pub recovery_amount: Decimal,
    pub balance_after: Decimal,
    pub recovered_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdvanceRecoveryRequest {
    pub recovery_amount: Decimal,
    pub recovered_date: NaiveDate,
}

/// Derived state of an advance payment after applying its recoveries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceState {
    pub recovered_amount: Decimal,
    pub balance_amount: Decimal,
    pub status: AdvanceStatus,
}

/// Re-derive an advance payment's cached fields from the sum of its
/// current recovery rows.
pub fn derive_advance_state(advance_amount: Decimal, recovered_sum: Decimal) -> AdvanceState {
    let recovered_amount = round_money(recovered_sum);
    let balance_amount = round_money(advance_amount - recovered_amount);

    let status = if recovered_amount.is_zero() {
        AdvanceStatus::Pending
    } else if balance_amount <= Decimal::ZERO {
        AdvanceStatus::FullyRecovered
    } else {
        AdvanceStatus::PartiallyRecovered
    };

    AdvanceState {
        recovered_amount,
        balance_amount,
        status,
    }
}

/// `balance_after = balance_before − recovery_amount`
pub fn recovery_balance_after(balance_before: Decimal, recovery_amount: Decimal) -> Decimal {
    round_money(balance_before - recovery_amount)
}

/// Interim payment certificate status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Paid,
    Rejected,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "submitted" => Self::Submitted,
            "approved" => Self::Approved,
            "paid" => Self::Paid,
            "rejected" => Self::Rejected,
            _ => Self::Draft,
        }
    }
}

/// Interim payment certificate (IPC)
///
/// Deduction and net fields are derived from the gross amount on every save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCertificate {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub certificate_no: i32,
    pub period_end: NaiveDate,
    pub payee_kind: PayableKind,
    pub payee_id: Uuid,
    pub gross_amount: Decimal,
    pub retention_percent: Decimal,
    pub retention_amount: Decimal,
    pub advance_recovery_amount: Decimal,
    pub other_deductions: Decimal,
    pub net_amount: Decimal,
    pub status: CertificateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentCertificateRequest {
    pub period_end: NaiveDate,
    pub payee_kind: PayableKind,
    pub payee_id: Uuid,
    pub gross_amount: Decimal,
    /// Defaults to the contract's retention percent
    #[serde(default)]
    pub retention_percent: Option<Decimal>,
    #[serde(default)]
    pub advance_recovery_amount: Option<Decimal>,
    #[serde(default)]
    pub other_deductions: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentCertificateRequest {
    #[serde(default)]
    pub gross_amount: Option<Decimal>,
    #[serde(default)]
    pub retention_percent: Option<Decimal>,
    #[serde(default)]
    pub advance_recovery_amount: Option<Decimal>,
    #[serde(default)]
    pub other_deductions: Option<Decimal>,
    #[serde(default)]
    pub status: Option<CertificateStatus>,
}

/// Derived money fields of a payment certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateAmounts {
    pub retention_amount: Decimal,
    pub net_amount: Decimal,
}

/// `retention = gross × retention% / 100`;
/// `net = gross − retention − advance recovery − other deductions`
pub fn derive_certificate_amounts(
    gross_amount: Decimal,
    retention_percent: Decimal,
    advance_recovery_amount: Decimal,
    other_deductions: Decimal,
) -> CertificateAmounts {
    let retention_amount = round_money(gross_amount * retention_percent / Decimal::ONE_HUNDRED);
    let net_amount = round_money(
        gross_amount - retention_amount - advance_recovery_amount - other_deductions,
    );

    CertificateAmounts {
        retention_amount,
        net_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn recovery_chains_the_balance() {
        assert_eq!(
            recovery_balance_after(dec("100000"), dec("12500")),
            dec("87500.00")
        );
    }

    #[test]
    fn advance_state_partial_then_full() {
        let partial = derive_advance_state(dec("100000"), dec("40000"));
        assert_eq!(partial.recovered_amount, dec("40000.00"));
        assert_eq!(partial.balance_amount, dec("60000.00"));
        assert_eq!(partial.status, AdvanceStatus::PartiallyRecovered);

        let full = derive_advance_state(dec("100000"), dec("100000"));
        assert_eq!(full.balance_amount, dec("0.00"));
        assert_eq!(full.status, AdvanceStatus::FullyRecovered);

        // Over-recovery still reads as fully recovered
        let over = derive_advance_state(dec("100000"), dec("100000.01"));
        assert_eq!(over.balance_amount, dec("-0.01"));
        assert_eq!(over.status, AdvanceStatus::FullyRecovered);
    }

    #[test]
    fn advance_state_with_no_recoveries_is_pending() {
        let state = derive_advance_state(dec("50000"), Decimal::ZERO);
        assert_eq!(state.status, AdvanceStatus::Pending);
        assert_eq!(state.balance_amount, dec("50000.00"));
    }

    #[test]
    fn advance_state_is_idempotent() {
        let a = derive_advance_state(dec("75000"), dec("33333.33"));
        let b = derive_advance_state(dec("75000"), dec("33333.33"));
        assert_eq!(a, b);
    }

    #[test]
    fn certificate_net_deducts_retention_recovery_and_others() {
        let amounts = derive_certificate_amounts(
            dec("200000"),
            dec("5"),      // retention percent
            dec("20000"),  // advance recovery
            dec("1500.5"), // other deductions
        );
        assert_eq!(amounts.retention_amount, dec("10000.00"));
        assert_eq!(amounts.net_amount, dec("168499.50"));
    }

    #[test]
    fn certificate_with_zero_retention() {
        let amounts =
            derive_certificate_amounts(dec("5000"), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(amounts.retention_amount, dec("0.00"));
        assert_eq!(amounts.net_amount, dec("5000.00"));
    }
}
