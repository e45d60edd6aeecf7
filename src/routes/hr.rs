//! Employee and payroll routes
//!
//! Payroll lines snapshot the employee's salary at creation time; the run
//! header re-sums its totals inside the same transaction as any line save
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

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::hr::{
    derive_payroll_amounts, CreateEmployeeRequest, CreatePayrollLineRequest,
    CreatePayrollRunRequest, Employee, EmployeeResponse, PayrollLine, PayrollRun,
    UpdateEmployeeRequest, UpdatePayrollLineRequest,
};
use crate::domain::locale::{Locale, LocaleParams, LocalizedText};
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: Uuid,
    code: String,
    name_en: String,
    name_ar: Option<String>,
    job_title: Option<String>,
    basic_salary: Decimal,
    allowances: Decimal,
    hire_date: Option<NaiveDate>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: LocalizedText::new(row.name_en, row.name_ar),
            job_title: row.job_title,
            basic_salary: row.basic_salary,
            allowances: row.allowances,
            hire_date: row.hire_date,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    period: NaiveDate,
    total_gross: Decimal,
    total_deductions: Decimal,
    total_net: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RunRow> for PayrollRun {
    fn from(row: RunRow) -> Self {
        Self {
            id: row.id,
            period: row.period,
            total_gross: row.total_gross,
            total_deductions: row.total_deductions,
            total_net: row.total_net,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: Uuid,
    run_id: Uuid,
    employee_id: Uuid,
    basic_salary: Decimal,
    allowances: Decimal,
    overtime: Decimal,
    gross_pay: Decimal,
    income_tax: Decimal,
    social_insurance: Decimal,
    other_deductions: Decimal,
    total_deductions: Decimal,
    net_pay: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LineRow> for PayrollLine {
    fn from(row: LineRow) -> Self {
        Self {
            id: row.id,
            run_id: row.run_id,
            employee_id: row.employee_id,
            basic_salary: row.basic_salary,
            allowances: row.allowances,
            overtime: row.overtime,
            gross_pay: row.gross_pay,
            income_tax: row.income_tax,
            social_insurance: row.social_insurance,
            other_deductions: row.other_deductions,
            total_deductions: row.total_deductions,
            net_pay: row.net_pay,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const EMPLOYEE_COLUMNS: &str = "id, code, name_en, name_ar, job_title, basic_salary, allowances, \
     hire_date, active, created_at, updated_at";

const RUN_COLUMNS: &str =
    "id, period, total_gross, total_deductions, total_net, created_at, updated_at";

const LINE_COLUMNS: &str = "id, run_id, employee_id, basic_salary, allowances, overtime, \
     gross_pay, income_tax, social_insurance, other_deductions, total_deductions, net_pay, \
     created_at, updated_at";

fn resolve_locale(state: &AppState, params: &LocaleParams) -> Locale {
    params.locale.unwrap_or(state.settings.default_locale)
}

/// Re-sum the payroll run's totals from its lines
async fn recompute_run_totals(
    tx: &mut Transaction<'_, Postgres>,
    run_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE payroll_runs SET
            total_gross = COALESCE((SELECT SUM(gross_pay) FROM payroll_lines
                WHERE run_id = $1), 0),
            total_deductions = COALESCE((SELECT SUM(total_deductions) FROM payroll_lines
                WHERE run_id = $1), 0),
            total_net = COALESCE((SELECT SUM(net_pay) FROM payroll_lines
                WHERE run_id = $1), 0),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(run_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// POST /employees
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.basic_salary < Decimal::ZERO {
        return Err(ApiError::bad_request("basic_salary must not be negative"));
    }

    let row = sqlx::query_as::<_, EmployeeRow>(&format!(
        r#"
        INSERT INTO employees (code, name_en, name_ar, job_title, basic_salary, allowances,
                               hire_date, active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0), $7, TRUE, NOW(), NOW())
        RETURNING {EMPLOYEE_COLUMNS}
        "#
    ))
    .bind(&req.code)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.job_title)
    .bind(req.basic_salary)
    .bind(req.allowances)
    .bind(req.hire_date)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(code = %req.code, "Employee created");

    let locale = resolve_locale(&state, &locale);
    let response = EmployeeResponse::from_employee(row.into(), locale);
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /employees
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, EmployeeRow>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY code"
    ))
    .fetch_all(&state.db)
    .await?;

    let locale = resolve_locale(&state, &locale);
    let data: Vec<EmployeeResponse> = rows
        .into_iter()
        .map(|row| EmployeeResponse::from_employee(row.into(), locale))
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /employees/:employee_id
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, EmployeeRow>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
    ))
    .bind(employee_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(EmployeeResponse::from_employee(
        row.into(),
        locale,
    ))))
}

/// PUT /employees/:employee_id
pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<Uuid>,
    Query(locale): Query<LocaleParams>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, EmployeeRow>(&format!(
        r#"
        UPDATE employees SET
            name_en = COALESCE($2, name_en),
            name_ar = COALESCE($3, name_ar),
            job_title = COALESCE($4, job_title),
            basic_salary = COALESCE($5, basic_salary),
            allowances = COALESCE($6, allowances),
            active = COALESCE($7, active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {EMPLOYEE_COLUMNS}
        "#
    ))
    .bind(employee_id)
    .bind(&req.name_en)
    .bind(&req.name_ar)
    .bind(&req.job_title)
    .bind(req.basic_salary)
    .bind(req.allowances)
    .bind(req.active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let locale = resolve_locale(&state, &locale);
    Ok(Json(DataResponse::new(EmployeeResponse::from_employee(
        row.into(),
        locale,
    ))))
}

/// DELETE /employees/:employee_id
///
/// Payroll lines keep a plain foreign key to the employee, so an employee
/// with posted lines cannot be removed.
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let has_lines: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM payroll_lines WHERE employee_id = $1)")
            .bind(employee_id)
            .fetch_one(&state.db)
            .await?;

    if has_lines {
        return Err(ApiError::conflict(
            "Employee has payroll lines and cannot be deleted",
        ));
    }

    let result = sqlx::query("DELETE FROM employees WHERE id = $1")
        .bind(employee_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    Ok(Json(MessageResponse::new("Employee deleted")))
}

/// POST /payroll-runs
pub async fn create_payroll_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePayrollRunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let existing_run: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM payroll_runs WHERE period = $1")
            .bind(req.period)
            .fetch_optional(&state.db)
            .await?;

    if let Some(run_id) = existing_run {
        return Err(ApiError::conflict(format!(
            "Payroll run already exists for this period: {}",
            run_id
        )));
    }

    let row = sqlx::query_as::<_, RunRow>(&format!(
        r#"
        INSERT INTO payroll_runs (period, total_gross, total_deductions, total_net,
                                  created_at, updated_at)
        VALUES ($1, 0, 0, 0, NOW(), NOW())
        RETURNING {RUN_COLUMNS}
        "#
    ))
    .bind(req.period)
    .fetch_one(&state.db)
    .await?;

    let run: PayrollRun = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(run))))
}

/// GET /payroll-runs
pub async fn list_payroll_runs(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, RunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM payroll_runs ORDER BY period DESC"
    ))
    .fetch_all(&state.db)
    .await?;

    let data: Vec<PayrollRun> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /payroll-runs/:run_id
pub async fn get_payroll_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, RunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM payroll_runs WHERE id = $1"
    ))
    .bind(run_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Payroll run not found"))?;

    let run: PayrollRun = row.into();
    Ok(Json(DataResponse::new(run)))
}

/// DELETE /payroll-runs/:run_id
///
/// Lines go with the run via the cascading foreign key.
pub async fn delete_payroll_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM payroll_runs WHERE id = $1")
        .bind(run_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Payroll run not found"));
    }

    Ok(Json(MessageResponse::new("Payroll run deleted")))
}

/// POST /payroll-runs/:run_id/lines
///
/// Basic salary and allowances are copied from the employee record so the
/// line stays stable if the employee's pay changes later.
pub async fn create_payroll_line(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
    Json(req): Json<CreatePayrollLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let run_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM payroll_runs WHERE id = $1)")
        .bind(run_id)
        .fetch_one(&mut *tx)
        .await?;
    if !run_exists {
        return Err(ApiError::not_found("Payroll run not found"));
    }

    let employee: Option<(Decimal, Decimal)> = sqlx::query_as(
        "SELECT basic_salary, allowances FROM employees WHERE id = $1 AND active",
    )
    .bind(req.employee_id)
    .fetch_optional(&mut *tx)
    .await?;
    let (basic_salary, allowances) =
        employee.ok_or_else(|| ApiError::bad_request("Employee not found or inactive"))?;

    let overtime = req.overtime.unwrap_or(Decimal::ZERO);
    let other_deductions = req.other_deductions.unwrap_or(Decimal::ZERO);
    let amounts = derive_payroll_amounts(basic_salary, allowances, overtime, other_deductions);

    let row = sqlx::query_as::<_, LineRow>(&format!(
        r#"
        INSERT INTO payroll_lines (run_id, employee_id, basic_salary, allowances, overtime,
                                   gross_pay, income_tax, social_insurance, other_deductions,
                                   total_deductions, net_pay, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
        RETURNING {LINE_COLUMNS}
        "#
    ))
    .bind(run_id)
    .bind(req.employee_id)
    .bind(basic_salary)
    .bind(allowances)
    .bind(overtime)
    .bind(amounts.gross_pay)
    .bind(amounts.income_tax)
    .bind(amounts.social_insurance)
    .bind(other_deductions)
    .bind(amounts.total_deductions)
    .bind(amounts.net_pay)
    .fetch_one(&mut *tx)
    .await?;

    recompute_run_totals(&mut tx, run_id).await?;
    tx.commit().await?;

    let line: PayrollLine = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(line))))
}

/// GET /payroll-runs/:run_id/lines
pub async fn list_payroll_lines(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM payroll_lines WHERE run_id = $1 ORDER BY created_at"
    ))
    .bind(run_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<PayrollLine> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// PUT /payroll-runs/:run_id/lines/:line_id
pub async fn update_payroll_line(
    State(state): State<Arc<AppState>>,
    Path((run_id, line_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdatePayrollLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let current = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM payroll_lines WHERE id = $1 AND run_id = $2 FOR UPDATE"
    ))
    .bind(line_id)
    .bind(run_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Payroll line not found"))?;

    let overtime = req.overtime.unwrap_or(current.overtime);
    let other_deductions = req.other_deductions.unwrap_or(current.other_deductions);
    let amounts = derive_payroll_amounts(
        current.basic_salary,
        current.allowances,
        overtime,
        other_deductions,
    );

    let row = sqlx::query_as::<_, LineRow>(&format!(
        r#"
        UPDATE payroll_lines SET
            overtime = $3,
            gross_pay = $4,
            income_tax = $5,
            social_insurance = $6,
            other_deductions = $7,
            total_deductions = $8,
            net_pay = $9,
            updated_at = NOW()
        WHERE id = $1 AND run_id = $2
        RETURNING {LINE_COLUMNS}
        "#
    ))
    .bind(line_id)
    .bind(run_id)
    .bind(overtime)
    .bind(amounts.gross_pay)
    .bind(amounts.income_tax)
    .bind(amounts.social_insurance)
    .bind(other_deductions)
    .bind(amounts.total_deductions)
    .bind(amounts.net_pay)
    .fetch_one(&mut *tx)
    .await?;

    recompute_run_totals(&mut tx, run_id).await?;
    tx.commit().await?;

    let line: PayrollLine = row.into();
    Ok(Json(DataResponse::new(line)))
}

/// DELETE /payroll-runs/:run_id/lines/:line_id
pub async fn delete_payroll_line(
    State(state): State<Arc<AppState>>,
    Path((run_id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query("DELETE FROM payroll_lines WHERE id = $1 AND run_id = $2")
        .bind(line_id)
        .bind(run_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Payroll line not found"));
    }

    recompute_run_totals(&mut tx, run_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("Payroll line deleted")))
}
