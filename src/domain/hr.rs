use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::locale::{Locale, LocalizedText};
use super::numeric::round_money;

/// Employee entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub code: String,
    pub name: LocalizedText,
    pub job_title: Option<String>,
    pub basic_salary: Decimal,
    pub allowances: Decimal,
    pub hire_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployeeRequest {
    pub code: String,
    pub name_en: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    pub basic_salary: Decimal,
    #[serde(default)]
    pub allowances: Option<Decimal>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEmployeeRequest {
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub basic_salary: Option<Decimal>,
    #[serde(default)]
    pub allowances: Option<Decimal>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub job_title: Option<String>,
    pub basic_salary: Decimal,
    pub allowances: Decimal,
    pub hire_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeResponse {
    pub fn from_employee(e: Employee, locale: Locale) -> Self {
        Self {
            id: e.id,
            code: e.code,
            name: e.name.name(locale).to_string(),
            name_en: e.name.en.clone(),
            name_ar: e.name.ar.clone(),
            job_title: e.job_title,
            basic_salary: e.basic_salary,
            allowances: e.allowances,
            hire_date: e.hire_date,
            active: e.active,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Payroll run for one month
///
/// The `total_*` columns cache sums over the run's lines and are re-derived
/// whenever a line is saved or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRun {
    pub id: Uuid,
    /// First day of the payroll month
    pub period: NaiveDate,
    pub total_gross: Decimal,
    pub total_deductions: Decimal,
    pub total_net: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayrollRunRequest {
    pub period: NaiveDate,
}

/// One employee's pay line within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollLine {
    pub id: Uuid,
    pub run_id: Uuid,
    pub employee_id: Uuid,
    pub basic_salary: Decimal,
    pub allowances: Decimal,
    pub overtime: Decimal,
    pub gross_pay: Decimal,
    pub income_tax: Decimal,
    pub social_insurance: Decimal,
    pub other_deductions: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayrollLineRequest {
    pub employee_id: Uuid,
    #[serde(default)]
    pub overtime: Option<Decimal>,
    #[serde(default)]
    pub other_deductions: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePayrollLineRequest {
    #[serde(default)]
    pub overtime: Option<Decimal>,
    #[serde(default)]
    pub other_deductions: Option<Decimal>,
}

/// Annual personal exemption before the brackets apply
const ANNUAL_EXEMPTION: Decimal = Decimal::from_parts(15_000, 0, 0, false, 0);

/// Employee share of social insurance, percent of basic salary
const SOCIAL_INSURANCE_PERCENT: Decimal = Decimal::from_parts(11, 0, 0, false, 0);

/// Progressive annual brackets: (upper bound of taxable income, rate %)
const TAX_BRACKETS: [(i64, i64, u32); 5] = [
    (30_000, 10, 0),
    (45_000, 15, 0),
    (60_000, 20, 0),
    (200_000, 225, 1),
    (i64::MAX, 25, 0),
];

/// Annual income tax over the progressive bracket table, after the
/// personal exemption. Cumulative: each bracket taxes only its own slice.
pub fn annual_income_tax(annual_gross: Decimal) -> Decimal {
    let taxable = annual_gross - ANNUAL_EXEMPTION;
    if taxable <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut tax = Decimal::ZERO;
    let mut lower = Decimal::ZERO;
    for (upper, rate, rate_scale) in TAX_BRACKETS {
        let upper = if upper == i64::MAX {
            taxable
        } else {
            Decimal::from(upper).min(taxable)
        };
        if upper <= lower {
            break;
        }
        let rate = Decimal::new(rate, rate_scale);
        tax += (upper - lower) * rate / Decimal::ONE_HUNDRED;
        lower = upper;
    }

    round_money(tax)
}

/// Monthly income tax: annualize the gross, apply the brackets, divide by 12
pub fn monthly_income_tax(monthly_gross: Decimal) -> Decimal {
    round_money(annual_income_tax(monthly_gross * Decimal::from(12)) / Decimal::from(12))
}

/// Derived money fields of one payroll line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollAmounts {
    pub gross_pay: Decimal,
    pub income_tax: Decimal,
    pub social_insurance: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,
}

/// `gross = basic + allowances + overtime`;
/// `net = gross − (tax + insurance + other)`
pub fn derive_payroll_amounts(
    basic_salary: Decimal,
    allowances: Decimal,
    overtime: Decimal,
    other_deductions: Decimal,
) -> PayrollAmounts {
    let gross_pay = round_money(basic_salary + allowances + overtime);
    let income_tax = monthly_income_tax(gross_pay);
    let social_insurance =
        round_money(basic_salary * SOCIAL_INSURANCE_PERCENT / Decimal::ONE_HUNDRED);
    let total_deductions = round_money(income_tax + social_insurance + other_deductions);
    let net_pay = round_money(gross_pay - total_deductions);

    PayrollAmounts {
        gross_pay,
        income_tax,
        social_insurance,
        total_deductions,
        net_pay,
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
    fn income_below_exemption_pays_no_tax() {
        assert_eq!(annual_income_tax(dec("12000")), Decimal::ZERO);
        assert_eq!(monthly_income_tax(dec("1000")), Decimal::ZERO);
    }

    #[test]
    fn brackets_are_cumulative() {
        // 120,000/yr gross -> 105,000 taxable:
        // 30,000@10% + 15,000@15% + 15,000@20% + 45,000@22.5% = 18,375
        assert_eq!(annual_income_tax(dec("120000")), dec("18375.00"));
        assert_eq!(monthly_income_tax(dec("10000")), dec("1531.25"));
    }

    #[test]
    fn top_bracket_applies_above_200k() {
        // 300,000 taxable: 3,000 + 2,250 + 3,000 + 31,500 + 25,000 = 64,750
        assert_eq!(annual_income_tax(dec("315000")), dec("64750.00"));
    }

    #[test]
    fn payroll_line_nets_out_deductions() {
        let amounts = derive_payroll_amounts(dec("8000"), dec("1500"), dec("500"), dec("200"));
        assert_eq!(amounts.gross_pay, dec("10000.00"));
        assert_eq!(amounts.income_tax, dec("1531.25"));
        assert_eq!(amounts.social_insurance, dec("880.00"));
        assert_eq!(amounts.total_deductions, dec("2611.25"));
        assert_eq!(amounts.net_pay, dec("7388.75"));
    }

    #[test]
    fn derivation_is_idempotent() {
        let a = derive_payroll_amounts(dec("6543.21"), dec("123.45"), Decimal::ZERO, dec("10"));
        let b = derive_payroll_amounts(dec("6543.21"), dec("123.45"), Decimal::ZERO, dec("10"));
        assert_eq!(a, b);
    }
}
