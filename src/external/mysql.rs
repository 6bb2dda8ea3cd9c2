//! MySQL-backed collaborators over the HR schema (`sql/schema.sql`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use super::{AuditEntry, AuditError, AuditSink, EmployeeDirectory, HolidayCalendar, LeaveTypeCatalog};
use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::{EmployeeProfile, Region};
use crate::model::leave_type::LeaveType;

#[derive(FromRow)]
struct LeaveTypeRow {
    code: String,
    name: String,
    category: String,
    is_paid: bool,
    requires_approval: bool,
    max_consecutive_days: Option<Decimal>,
    min_days_notice: i32,
    allow_half_day: bool,
    allow_negative_balance: bool,
    carry_forward_allowed: bool,
    max_carry_forward_days: Option<Decimal>,
    accrual_frequency: String,
    accrual_rate: Option<Decimal>,
    annual_allocation: Decimal,
    region: String,
    sort_order: i32,
}

impl TryFrom<LeaveTypeRow> for LeaveType {
    type Error = LeaveError;

    fn try_from(row: LeaveTypeRow) -> Result<Self, Self::Error> {
        Ok(LeaveType {
            accrual_frequency: parse_column("accrual_frequency", &row.accrual_frequency)?,
            region: parse_column("region", &row.region)?,
            code: row.code,
            name: row.name,
            category: row.category,
            is_paid: row.is_paid,
            requires_approval: row.requires_approval,
            max_consecutive_days: row.max_consecutive_days,
            min_days_notice: i64::from(row.min_days_notice),
            allow_half_day: row.allow_half_day,
            allow_negative_balance: row.allow_negative_balance,
            carry_forward_allowed: row.carry_forward_allowed,
            max_carry_forward_days: row.max_carry_forward_days,
            accrual_rate: row.accrual_rate,
            annual_allocation: row.annual_allocation,
            sort_order: row.sort_order,
        })
    }
}

/// Parse a persisted enum column, reporting the column on failure.
pub(crate) fn parse_column<T: std::str::FromStr>(column: &str, value: &str) -> LeaveResult<T> {
    value
        .parse()
        .map_err(|_| LeaveError::Storage(format!("unexpected {column} value '{value}'")))
}

const LEAVE_TYPE_COLUMNS: &str = r#"
    code, name, category, is_paid, requires_approval, max_consecutive_days,
    min_days_notice, allow_half_day, allow_negative_balance, carry_forward_allowed,
    max_carry_forward_days, accrual_frequency, accrual_rate, annual_allocation,
    region, sort_order
"#;

/// Leave types rarely change, so lookups go through a TTL cache.
pub struct MySqlLeaveTypeCatalog {
    pool: MySqlPool,
    cache: Cache<String, LeaveType>,
}

impl MySqlLeaveTypeCatalog {
    pub fn new(pool: MySqlPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(ttl)
            .build();
        Self { pool, cache }
    }
}

#[async_trait]
impl LeaveTypeCatalog for MySqlLeaveTypeCatalog {
    async fn get(&self, code: &str) -> LeaveResult<Option<LeaveType>> {
        if let Some(hit) = self.cache.get(code).await {
            return Ok(Some(hit));
        }

        let sql = format!("SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types WHERE code = ?");
        let row = sqlx::query_as::<_, LeaveTypeRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, code, "Failed to fetch leave type");
                LeaveError::from(e)
            })?;

        match row {
            Some(row) => {
                let leave_type = LeaveType::try_from(row)?;
                self.cache
                    .insert(leave_type.code.clone(), leave_type.clone())
                    .await;
                Ok(Some(leave_type))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> LeaveResult<Vec<LeaveType>> {
        let sql = format!("SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types ORDER BY sort_order, code");
        let rows = sqlx::query_as::<_, LeaveTypeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(LeaveType::try_from).collect()
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    first_name: String,
    last_name: String,
    email: String,
    manager_id: Option<u64>,
    region: String,
    employment_type: String,
    status: String,
}

impl TryFrom<EmployeeRow> for EmployeeProfile {
    type Error = LeaveError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(EmployeeProfile {
            id: row.id,
            name: format!("{} {}", row.first_name, row.last_name)
                .trim()
                .to_string(),
            email: row.email,
            manager_id: row.manager_id,
            region: parse_column("region", &row.region)?,
            employment_type: row.employment_type,
            is_active: row.status.eq_ignore_ascii_case("active"),
        })
    }
}

pub struct MySqlEmployeeDirectory {
    pool: MySqlPool,
}

impl MySqlEmployeeDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlEmployeeDirectory {
    async fn get(&self, employee_id: u64) -> LeaveResult<Option<EmployeeProfile>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, first_name, last_name, email, manager_id, region, employment_type, status
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee");
            LeaveError::from(e)
        })?;

        row.map(EmployeeProfile::try_from).transpose()
    }

    async fn active_cohort(
        &self,
        region: Region,
        employment_type: &str,
    ) -> LeaveResult<Vec<EmployeeProfile>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, first_name, last_name, email, manager_id, region, employment_type, status
            FROM employees
            WHERE status = 'active'
            AND region = ?
            AND employment_type = ?
            ORDER BY id
            "#,
        )
        .bind(region.as_ref())
        .bind(employment_type)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EmployeeProfile::try_from).collect()
    }
}

pub struct MySqlHolidayCalendar {
    pool: MySqlPool,
}

impl MySqlHolidayCalendar {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HolidayCalendar for MySqlHolidayCalendar {
    async fn list_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        region: Region,
    ) -> LeaveResult<Vec<NaiveDate>> {
        let days = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT holiday_date
            FROM holidays
            WHERE holiday_date BETWEEN ? AND ?
            AND (region = ? OR region = 'ALL')
            ORDER BY holiday_date
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(region.as_ref())
        .fetch_all(&self.pool)
        .await?;
        Ok(days)
    }
}

pub struct MySqlAuditSink {
    pool: MySqlPool,
}

impl MySqlAuditSink {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for MySqlAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs
                (action, entity, entity_id, actor_id, old_values, new_values)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.action)
        .bind(&entry.entity)
        .bind(&entry.entity_id)
        .bind(entry.actor_id)
        .bind(entry.old_values.as_ref().map(|v| v.to_string()))
        .bind(entry.new_values.as_ref().map(|v| v.to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| AuditError(e.to_string()))?;
        Ok(())
    }
}
