//! Collaborators the leave core calls but does not own.
//!
//! Reads (leave types, employees, holidays) propagate failures. Writes to the
//! notifier and audit sink are best-effort: the services log and drop their
//! errors once the business transition has committed.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::LeaveResult;
use crate::model::employee::{EmployeeProfile, Region};
use crate::model::leave_type::LeaveType;

pub mod memory;
pub mod mysql;
pub mod notify;

#[async_trait]
pub trait LeaveTypeCatalog: Send + Sync {
    async fn get(&self, code: &str) -> LeaveResult<Option<LeaveType>>;
    /// Every configured type, ordered by `sort_order`.
    async fn list(&self) -> LeaveResult<Vec<LeaveType>>;
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn get(&self, employee_id: u64) -> LeaveResult<Option<EmployeeProfile>>;
    /// Active employees sharing a region and employment type.
    async fn active_cohort(
        &self,
        region: Region,
        employment_type: &str,
    ) -> LeaveResult<Vec<EmployeeProfile>>;
}

#[async_trait]
pub trait HolidayCalendar: Send + Sync {
    async fn list_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        region: Region,
    ) -> LeaveResult<Vec<NaiveDate>>;
}

/// Outbound leave notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeaveNotification {
    Submitted {
        to: String,
        employee_name: String,
        leave_type_name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        days: Decimal,
    },
    Approved {
        to: String,
        employee_name: String,
        leave_type_name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        days: Decimal,
    },
    Rejected {
        to: String,
        employee_name: String,
        leave_type_name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
    },
    Cancelled {
        to: String,
        employee_name: String,
        leave_type_name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

impl LeaveNotification {
    pub fn recipient(&self) -> &str {
        match self {
            LeaveNotification::Submitted { to, .. }
            | LeaveNotification::Approved { to, .. }
            | LeaveNotification::Rejected { to, .. }
            | LeaveNotification::Cancelled { to, .. } => to,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LeaveNotification::Submitted { .. } => "submitted",
            LeaveNotification::Approved { .. } => "approved",
            LeaveNotification::Rejected { .. } => "rejected",
            LeaveNotification::Cancelled { .. } => "cancelled",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: LeaveNotification) -> Result<(), NotifyError>;
}

/// One audited mutation with before/after snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub actor_id: u64,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
}

impl AuditEntry {
    pub fn new(action: &str, entity: &str, entity_id: impl ToString, actor_id: u64) -> Self {
        Self {
            action: action.to_string(),
            entity: entity.to_string(),
            entity_id: entity_id.to_string(),
            actor_id,
            old_values: None,
            new_values: None,
        }
    }

    pub fn before(mut self, value: impl Serialize) -> Self {
        self.old_values = serde_json::to_value(value).ok();
        self
    }

    pub fn after(mut self, value: impl Serialize) -> Self {
        self.new_values = serde_json::to_value(value).ok();
        self
    }
}

#[derive(Debug, thiserror::Error)]
#[error("audit write failed: {0}")]
pub struct AuditError(pub String);

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}
