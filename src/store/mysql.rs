//! MySQL [`LeaveStore`] on InnoDB transactions.
//!
//! Rows read through a [`MySqlTx`] use `SELECT ... FOR UPDATE`, which gives
//! the per-balance and per-request serialization the services rely on.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use super::{LeaveStore, LeaveTx};
use crate::error::{LeaveError, LeaveResult};
use crate::external::mysql::parse_column;
use crate::model::approval::{Approval, NewApproval};
use crate::model::leave_balance::{BalanceAmounts, BalanceKey, LeaveBalance};
use crate::model::leave_request::{LeaveFilter, LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::process_history::{HistoryFilter, LeaveProcessHistory, NewProcessHistory};

#[derive(FromRow)]
struct BalanceRow {
    employee_id: u64,
    leave_type_code: String,
    year: i32,
    allocated: Decimal,
    used: Decimal,
    pending: Decimal,
    available: Decimal,
    carried_forward: Decimal,
    expired: Decimal,
    encashed: Decimal,
}

impl From<BalanceRow> for LeaveBalance {
    fn from(row: BalanceRow) -> Self {
        LeaveBalance::restore(
            BalanceKey::new(row.employee_id, row.leave_type_code, row.year),
            BalanceAmounts {
                allocated: row.allocated,
                used: row.used,
                pending: row.pending,
                available: row.available,
                carried_forward: row.carried_forward,
                expired: row.expired,
                encashed: row.encashed,
            },
        )
    }
}

const BALANCE_COLUMNS: &str = r#"
    employee_id, leave_type_code, year, allocated, used, pending, available,
    carried_forward, expired, encashed
"#;

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    employee_id: u64,
    leave_type_code: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days: Decimal,
    balance_year: i32,
    is_half_day: bool,
    half_day_type: Option<String>,
    reason: String,
    contact_during_leave: Option<String>,
    emergency_contact: Option<String>,
    status: String,
    is_draft: bool,
    approved_date: Option<DateTime<Utc>>,
    rejected_date: Option<DateTime<Utc>>,
    cancelled_date: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for LeaveRequest {
    type Error = LeaveError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let half_day_type = match row.half_day_type.as_deref() {
            Some(value) => Some(parse_column("half_day_type", value)?),
            None => None,
        };
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type_code: row.leave_type_code,
            start_date: row.start_date,
            end_date: row.end_date,
            total_days: row.total_days,
            balance_year: row.balance_year,
            is_half_day: row.is_half_day,
            half_day_type,
            reason: row.reason,
            contact_during_leave: row.contact_during_leave,
            emergency_contact: row.emergency_contact,
            status: parse_column("status", &row.status)?,
            is_draft: row.is_draft,
            approved_date: row.approved_date,
            rejected_date: row.rejected_date,
            cancelled_date: row.cancelled_date,
            rejection_reason: row.rejection_reason,
            remarks: row.remarks,
            created_at: row.created_at,
        })
    }
}

const REQUEST_COLUMNS: &str = r#"
    id, employee_id, leave_type_code, start_date, end_date, total_days, balance_year,
    is_half_day, half_day_type, reason, contact_during_leave, emergency_contact, status, is_draft,
    approved_date, rejected_date, cancelled_date, rejection_reason, remarks, created_at
"#;

#[derive(FromRow)]
struct ApprovalRow {
    id: u64,
    leave_request_id: u64,
    approver_employee_id: u64,
    level: u32,
    status: String,
    comments: Option<String>,
    approved_date: Option<DateTime<Utc>>,
    rejected_date: Option<DateTime<Utc>>,
    is_active: bool,
}

impl TryFrom<ApprovalRow> for Approval {
    type Error = LeaveError;

    fn try_from(row: ApprovalRow) -> Result<Self, Self::Error> {
        Ok(Approval {
            id: row.id,
            leave_request_id: row.leave_request_id,
            approver_employee_id: row.approver_employee_id,
            level: row.level,
            status: parse_column("status", &row.status)?,
            comments: row.comments,
            approved_date: row.approved_date,
            rejected_date: row.rejected_date,
            is_active: row.is_active,
        })
    }
}

const APPROVAL_COLUMNS: &str = r#"
    id, leave_request_id, approver_employee_id, level, status, comments,
    approved_date, rejected_date, is_active
"#;

#[derive(FromRow)]
struct HistoryRow {
    id: u64,
    region: String,
    employment_type: String,
    process_month: u32,
    process_year: i32,
    leave_type_code: String,
    days_processed: Decimal,
    employees_count: u32,
    processed_by: u64,
    comments: Option<String>,
    processed_at: DateTime<Utc>,
}

impl From<HistoryRow> for LeaveProcessHistory {
    fn from(row: HistoryRow) -> Self {
        LeaveProcessHistory {
            id: row.id,
            region: row.region,
            employment_type: row.employment_type,
            process_month: row.process_month,
            process_year: row.process_year,
            leave_type_code: row.leave_type_code,
            days_processed: row.days_processed,
            employees_count: row.employees_count,
            processed_by: row.processed_by,
            comments: row.comments,
            processed_at: row.processed_at,
        }
    }
}

const HISTORY_COLUMNS: &str = r#"
    id, region, employment_type, process_month, process_year, leave_type_code,
    days_processed, employees_count, processed_by, comments, processed_at
"#;

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    U32(u32),
    I32(i32),
    Str(String),
}

/// `WHERE` clause and its bind values for a request listing.
fn request_where(filter: &LeaveFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(employee_id) = filter.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }
    if let Some(status) = filter.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }
    (where_sql, args)
}

fn history_where(filter: &HistoryFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(region) = &filter.region {
        where_sql.push_str(" AND region = ?");
        args.push(FilterValue::Str(region.clone()));
    }
    if let Some(employment_type) = &filter.employment_type {
        where_sql.push_str(" AND employment_type = ?");
        args.push(FilterValue::Str(employment_type.clone()));
    }
    if let Some(month) = filter.month {
        where_sql.push_str(" AND process_month = ?");
        args.push(FilterValue::U32(month));
    }
    if let Some(year) = filter.year {
        where_sql.push_str(" AND process_year = ?");
        args.push(FilterValue::I32(year));
    }
    (where_sql, args)
}

fn bind_all<'q, O>(
    mut query: sqlx::query::QueryAs<'q, MySql, O, sqlx::mysql::MySqlArguments>,
    args: Vec<FilterValue>,
) -> sqlx::query::QueryAs<'q, MySql, O, sqlx::mysql::MySqlArguments> {
    for arg in args {
        query = match arg {
            FilterValue::U64(v) => query.bind(v),
            FilterValue::U32(v) => query.bind(v),
            FilterValue::I32(v) => query.bind(v),
            FilterValue::Str(s) => query.bind(s),
        };
    }
    query
}

#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn begin(&self) -> LeaveResult<Box<dyn LeaveTx>> {
        let tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to open transaction");
            LeaveError::from(e)
        })?;
        Ok(Box::new(MySqlTx { tx }))
    }

    async fn find_request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?");
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn list_requests(&self, filter: &LeaveFilter) -> LeaveResult<(Vec<LeaveRequest>, u64)> {
        let (_, per_page, offset) = filter.pagination();

        let (where_sql, args) = request_where(filter);
        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(v),
                FilterValue::U32(v) => count_q.bind(v),
                FilterValue::I32(v) => count_q.bind(v),
                FilterValue::Str(s) => count_q.bind(s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to count leave requests");
            LeaveError::from(e)
        })?;

        let (where_sql, args) = request_where(filter);
        let data_sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM leave_requests
            {}
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
            where_sql
        );
        let rows = bind_all(sqlx::query_as::<_, RequestRow>(&data_sql), args)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch leave list");
                LeaveError::from(e)
            })?;

        let requests = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<LeaveResult<Vec<_>>>()?;
        Ok((requests, u64::try_from(total).unwrap_or_default()))
    }

    async fn approvals_for(&self, request_id: u64) -> LeaveResult<Vec<Approval>> {
        let sql = format!(
            "SELECT {APPROVAL_COLUMNS} FROM leave_approvals WHERE leave_request_id = ? ORDER BY level, id"
        );
        let rows = sqlx::query_as::<_, ApprovalRow>(&sql)
            .bind(request_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Approval::try_from).collect()
    }

    async fn open_approvals_for_approver(&self, approver_employee_id: u64) -> LeaveResult<Vec<Approval>> {
        let sql = format!(
            r#"
            SELECT {APPROVAL_COLUMNS}
            FROM leave_approvals
            WHERE approver_employee_id = ?
            AND status = 'PENDING'
            AND is_active = TRUE
            ORDER BY id
            "#
        );
        let rows = sqlx::query_as::<_, ApprovalRow>(&sql)
            .bind(approver_employee_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Approval::try_from).collect()
    }

    async fn find_balance(&self, key: &BalanceKey) -> LeaveResult<Option<LeaveBalance>> {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE employee_id = ? AND leave_type_code = ? AND year = ?"
        );
        let row = sqlx::query_as::<_, BalanceRow>(&sql)
            .bind(key.employee_id)
            .bind(&key.leave_type_code)
            .bind(key.year)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LeaveBalance::from))
    }

    async fn balances_for(&self, employee_id: u64, year: i32) -> LeaveResult<Vec<LeaveBalance>> {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE employee_id = ? AND year = ? ORDER BY leave_type_code"
        );
        let rows = sqlx::query_as::<_, BalanceRow>(&sql)
            .bind(employee_id)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LeaveBalance::from).collect())
    }

    async fn history(&self, filter: &HistoryFilter) -> LeaveResult<Vec<LeaveProcessHistory>> {
        let (where_sql, args) = history_where(filter);
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM leave_process_history{} ORDER BY processed_at DESC, id DESC",
            where_sql
        );
        let rows = bind_all(sqlx::query_as::<_, HistoryRow>(&sql), args)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LeaveProcessHistory::from).collect())
    }
}

pub struct MySqlTx {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl LeaveTx for MySqlTx {
    async fn balance(&mut self, key: &BalanceKey) -> LeaveResult<Option<LeaveBalance>> {
        let sql = format!(
            r#"
            SELECT {BALANCE_COLUMNS}
            FROM leave_balances
            WHERE employee_id = ? AND leave_type_code = ? AND year = ?
            FOR UPDATE
            "#
        );
        let row = sqlx::query_as::<_, BalanceRow>(&sql)
            .bind(key.employee_id)
            .bind(&key.leave_type_code)
            .bind(key.year)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(LeaveBalance::from))
    }

    async fn balance_or_open(&mut self, key: &BalanceKey) -> LeaveResult<LeaveBalance> {
        // A locking read on a missing key takes a gap lock; two first-time
        // writers then deadlock on the upsert. Insert the zero row first so
        // the read below locks a record instead.
        sqlx::query("INSERT IGNORE INTO leave_balances (employee_id, leave_type_code, year) VALUES (?, ?, ?)")
            .bind(key.employee_id)
            .bind(&key.leave_type_code)
            .bind(key.year)
            .execute(&mut *self.tx)
            .await?;
        Ok(self
            .balance(key)
            .await?
            .unwrap_or_else(|| LeaveBalance::open(key.clone())))
    }

    async fn put_balance(&mut self, balance: &LeaveBalance) -> LeaveResult<()> {
        let key = balance.key();
        let amounts = balance.amounts();
        sqlx::query(
            r#"
            INSERT INTO leave_balances
                (employee_id, leave_type_code, year, allocated, used, pending, available,
                 carried_forward, expired, encashed)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                allocated = VALUES(allocated),
                used = VALUES(used),
                pending = VALUES(pending),
                available = VALUES(available),
                carried_forward = VALUES(carried_forward),
                expired = VALUES(expired),
                encashed = VALUES(encashed)
            "#,
        )
        .bind(key.employee_id)
        .bind(&key.leave_type_code)
        .bind(key.year)
        .bind(amounts.allocated)
        .bind(amounts.used)
        .bind(amounts.pending)
        .bind(amounts.available)
        .bind(amounts.carried_forward)
        .bind(amounts.expired)
        .bind(amounts.encashed)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id = key.employee_id, code = %key.leave_type_code, "Failed to write leave balance");
            LeaveError::from(e)
        })?;
        Ok(())
    }

    async fn balances_for_year(&mut self, year: i32) -> LeaveResult<Vec<LeaveBalance>> {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE year = ? ORDER BY employee_id, leave_type_code FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, BalanceRow>(&sql)
            .bind(year)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().map(LeaveBalance::from).collect())
    }

    async fn request(&mut self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE");
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn insert_request(&mut self, request: NewLeaveRequest) -> LeaveResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type_code, start_date, end_date, total_days, balance_year,
                 is_half_day, half_day_type, reason, contact_during_leave, emergency_contact,
                 status, is_draft)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(&request.leave_type_code)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.total_days)
        .bind(request.balance_year)
        .bind(request.is_half_day)
        .bind(request.half_day_type.map(|t| t.to_string()))
        .bind(&request.reason)
        .bind(&request.contact_during_leave)
        .bind(&request.emergency_contact)
        .bind(request.status.as_ref())
        .bind(request.status == LeaveStatus::Draft)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id = request.employee_id, "Failed to create leave request");
            LeaveError::from(e)
        })?;

        let id = result.last_insert_id();
        self.request(id)
            .await?
            .ok_or_else(|| LeaveError::Storage(format!("leave request {id} vanished after insert")))
    }

    async fn update_request(&mut self, request: &LeaveRequest) -> LeaveResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET leave_type_code = ?, start_date = ?, end_date = ?, total_days = ?,
                balance_year = ?, is_half_day = ?, half_day_type = ?, reason = ?, contact_during_leave = ?,
                emergency_contact = ?, status = ?, is_draft = ?, approved_date = ?,
                rejected_date = ?, cancelled_date = ?, rejection_reason = ?, remarks = ?
            WHERE id = ?
            "#,
        )
        .bind(&request.leave_type_code)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.total_days)
        .bind(request.balance_year)
        .bind(request.is_half_day)
        .bind(request.half_day_type.map(|t| t.to_string()))
        .bind(&request.reason)
        .bind(&request.contact_during_leave)
        .bind(&request.emergency_contact)
        .bind(request.status.as_ref())
        .bind(request.is_draft)
        .bind(request.approved_date)
        .bind(request.rejected_date)
        .bind(request.cancelled_date)
        .bind(&request.rejection_reason)
        .bind(&request.remarks)
        .bind(request.id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id = request.id, "Failed to update leave request");
            LeaveError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(LeaveError::not_found(format!("leave request {}", request.id)));
        }
        Ok(())
    }

    async fn delete_request(&mut self, id: u64) -> LeaveResult<()> {
        sqlx::query("DELETE FROM leave_approvals WHERE leave_request_id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn overlapping_requests(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<u64>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        // Locking the employee's range also blocks a concurrent insert that
        // would overlap.
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM leave_requests
            WHERE employee_id = ?
            AND status IN ('PENDING', 'APPROVED')
            AND start_date <= ?
            AND ? <= end_date
            AND id <> ?
            FOR UPDATE
            "#
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(employee_id)
            .bind(end)
            .bind(start)
            .bind(exclude_id.unwrap_or(0))
            .fetch_all(&mut *self.tx)
            .await?;
        rows.into_iter().map(LeaveRequest::try_from).collect()
    }

    async fn approvals(&mut self, request_id: u64) -> LeaveResult<Vec<Approval>> {
        let sql = format!(
            "SELECT {APPROVAL_COLUMNS} FROM leave_approvals WHERE leave_request_id = ? ORDER BY level, id FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, ApprovalRow>(&sql)
            .bind(request_id)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.into_iter().map(Approval::try_from).collect()
    }

    async fn insert_approval(&mut self, approval: NewApproval) -> LeaveResult<Approval> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_approvals
                (leave_request_id, approver_employee_id, level, status, is_active)
            VALUES (?, ?, ?, 'PENDING', TRUE)
            "#,
        )
        .bind(approval.leave_request_id)
        .bind(approval.approver_employee_id)
        .bind(approval.level)
        .execute(&mut *self.tx)
        .await?;

        Ok(approval.into_approval(result.last_insert_id()))
    }

    async fn update_approval(&mut self, approval: &Approval) -> LeaveResult<()> {
        sqlx::query(
            r#"
            UPDATE leave_approvals
            SET status = ?, comments = ?, approved_date = ?, rejected_date = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(approval.status.as_ref())
        .bind(&approval.comments)
        .bind(approval.approved_date)
        .bind(approval.rejected_date)
        .bind(approval.is_active)
        .bind(approval.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn count_open_approvals(&mut self, request_id: u64) -> LeaveResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM leave_approvals
            WHERE leave_request_id = ?
            AND status = 'PENDING'
            AND is_active = TRUE
            "#,
        )
        .bind(request_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn history(&mut self, filter: &HistoryFilter) -> LeaveResult<Vec<LeaveProcessHistory>> {
        let (where_sql, args) = history_where(filter);
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM leave_process_history{} ORDER BY processed_at DESC, id DESC",
            where_sql
        );
        let rows = bind_all(sqlx::query_as::<_, HistoryRow>(&sql), args)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().map(LeaveProcessHistory::from).collect())
    }

    async fn insert_history(&mut self, row: NewProcessHistory) -> LeaveResult<LeaveProcessHistory> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_process_history
                (region, employment_type, process_month, process_year, leave_type_code,
                 days_processed, employees_count, processed_by, comments)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.region)
        .bind(&row.employment_type)
        .bind(row.process_month)
        .bind(row.process_year)
        .bind(&row.leave_type_code)
        .bind(row.days_processed)
        .bind(row.employees_count)
        .bind(row.processed_by)
        .bind(&row.comments)
        .execute(&mut *self.tx)
        .await?;

        Ok(row.into_history(result.last_insert_id(), Utc::now()))
    }

    async fn commit(self: Box<Self>) -> LeaveResult<()> {
        let MySqlTx { tx } = *self;
        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit transaction");
            LeaveError::from(e)
        })
    }
}
