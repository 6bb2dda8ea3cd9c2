use std::sync::Arc;

use tracing::warn;

use crate::error::{LeaveError, LeaveResult};
use crate::external::{
    AuditEntry, AuditSink, EmployeeDirectory, HolidayCalendar, LeaveNotification,
    LeaveTypeCatalog, Notifier,
};
use crate::model::employee::EmployeeProfile;
use crate::model::leave_type::LeaveType;
use crate::store::LeaveStore;

pub mod approval;
pub mod calendar;
pub mod ledger;
pub mod lifecycle;
pub mod policy;

pub use approval::ApprovalChain;
pub use ledger::BalanceLedger;
pub use lifecycle::RequestLifecycle;
pub use policy::PolicyProcessor;

/// Everything the leave services need, shared by cheap clone.
#[derive(Clone)]
pub struct LeaveContext {
    pub store: Arc<dyn LeaveStore>,
    pub catalog: Arc<dyn LeaveTypeCatalog>,
    pub employees: Arc<dyn EmployeeDirectory>,
    pub holidays: Arc<dyn HolidayCalendar>,
    pub notifier: Arc<dyn Notifier>,
    pub audit: Arc<dyn AuditSink>,
}

impl LeaveContext {
    pub fn ledger(&self) -> BalanceLedger<'_> {
        BalanceLedger::new(self)
    }

    pub fn lifecycle(&self) -> RequestLifecycle<'_> {
        RequestLifecycle::new(self)
    }

    pub fn approvals(&self) -> ApprovalChain<'_> {
        ApprovalChain::new(self)
    }

    pub fn policy(&self) -> PolicyProcessor<'_> {
        PolicyProcessor::new(self)
    }

    pub(crate) async fn leave_type(&self, code: &str) -> LeaveResult<LeaveType> {
        self.catalog
            .get(code)
            .await?
            .ok_or_else(|| LeaveError::not_found(format!("leave type {code}")))
    }

    pub(crate) async fn employee(&self, employee_id: u64) -> LeaveResult<EmployeeProfile> {
        self.employees
            .get(employee_id)
            .await?
            .ok_or_else(|| LeaveError::not_found(format!("employee {employee_id}")))
    }

    /// Best-effort: a failed send never undoes the committed transition.
    pub(crate) async fn notify(&self, notification: LeaveNotification) {
        let kind = notification.kind();
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(error = %e, kind, "Leave notification dropped");
        }
    }

    /// Best-effort, like [`LeaveContext::notify`].
    pub(crate) async fn record(&self, entry: AuditEntry) {
        let action = entry.action.clone();
        if let Err(e) = self.audit.record(entry).await {
            warn!(error = %e, %action, "Audit entry dropped");
        }
    }

    /// Manager profile for notifications; lookup failures only log.
    pub(crate) async fn manager_of(&self, employee: &EmployeeProfile) -> Option<EmployeeProfile> {
        let manager_id = employee.manager_id?;
        match self.employees.get(manager_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, manager_id, "Manager lookup failed");
                None
            }
        }
    }
}

/// Audit action names.
pub mod actions {
    pub const REQUEST_DRAFT: &str = "LEAVE_REQUEST_DRAFT";
    pub const REQUEST_CREATE: &str = "LEAVE_REQUEST_CREATE";
    pub const REQUEST_SUBMIT: &str = "LEAVE_REQUEST_SUBMIT";
    pub const REQUEST_UPDATE: &str = "LEAVE_REQUEST_UPDATE";
    pub const REQUEST_CANCEL: &str = "LEAVE_REQUEST_CANCEL";
    pub const REQUEST_DELETE: &str = "LEAVE_REQUEST_DELETE";
    pub const APPROVAL_RECORDED: &str = "LEAVE_APPROVAL_RECORDED";
    pub const REQUEST_APPROVE: &str = "LEAVE_REQUEST_APPROVE";
    pub const REQUEST_REJECT: &str = "LEAVE_REQUEST_REJECT";
    pub const BALANCE_GRANT: &str = "LEAVE_BALANCE_GRANT";
    pub const BALANCE_REVOKE: &str = "LEAVE_BALANCE_REVOKE";
    pub const BALANCE_ALLOCATE: &str = "LEAVE_BALANCE_ALLOCATE";
    pub const BALANCE_INITIALIZE: &str = "LEAVE_BALANCE_INITIALIZE";
    pub const BALANCE_CARRY_FORWARD: &str = "LEAVE_BALANCE_CARRY_FORWARD";
    pub const POLICY_PROCESS: &str = "LEAVE_POLICY_PROCESS";
    pub const SPECIAL_LEAVE: &str = "LEAVE_SPECIAL_PROCESS";
    pub const SPECIAL_LEAVE_BULK: &str = "LEAVE_SPECIAL_PROCESS_BULK";
}
