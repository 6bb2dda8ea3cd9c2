use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum LeaveStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Statuses that hold days on the calendar for overlap checks.
    pub fn blocks_calendar(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum HalfDayType {
    FirstHalf,
    SecondHalf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "CL")]
    pub leave_type_code: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "3", value_type = String)]
    pub total_days: Decimal,
    /// Fiscal year of the balance row the days are drawn from.
    #[schema(example = 2025)]
    pub balance_year: i32,
    pub is_half_day: bool,
    pub half_day_type: Option<HalfDayType>,
    pub reason: String,
    pub contact_during_leave: Option<String>,
    pub emergency_contact: Option<String>,
    pub status: LeaveStatus,
    pub is_draft: bool,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub approved_date: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub rejected_date: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub cancelled_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub remarks: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Closed-interval overlap: `start1 <= end2 && start2 <= end1`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    /// Keep `is_draft` in lock-step with `status`.
    pub fn set_status(&mut self, status: LeaveStatus) {
        self.status = status;
        self.is_draft = status == LeaveStatus::Draft;
    }
}

/// A request as handed to the store before it has an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: Decimal,
    pub balance_year: i32,
    pub is_half_day: bool,
    pub half_day_type: Option<HalfDayType>,
    pub reason: String,
    pub contact_during_leave: Option<String>,
    pub emergency_contact: Option<String>,
    pub status: LeaveStatus,
}

impl NewLeaveRequest {
    pub fn into_request(self, id: u64, created_at: DateTime<Utc>) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: self.employee_id,
            leave_type_code: self.leave_type_code,
            start_date: self.start_date,
            end_date: self.end_date,
            total_days: self.total_days,
            balance_year: self.balance_year,
            is_half_day: self.is_half_day,
            half_day_type: self.half_day_type,
            reason: self.reason,
            contact_during_leave: self.contact_during_leave,
            emergency_contact: self.emergency_contact,
            is_draft: self.status == LeaveStatus::Draft,
            status: self.status,
            approved_date: None,
            rejected_date: None,
            cancelled_date: None,
            rejection_reason: None,
            remarks: None,
            created_at,
        }
    }
}

/// Filters for listing requests.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "PENDING", value_type = Option<String>)]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

impl LeaveFilter {
    /// `(page, per_page, offset)` with page >= 1 and per_page in 1..=100.
    pub fn pagination(&self) -> (u64, u64, u64) {
        let per_page = self.per_page.unwrap_or(10).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (page, per_page, (page - 1) * per_page)
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| id == request.employee_id)
            && self.status.is_none_or(|status| status == request.status)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeavePage {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
}
