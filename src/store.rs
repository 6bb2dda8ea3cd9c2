//! Persistence seam for the leave core.
//!
//! Every service operation runs inside one [`LeaveTx`]. Rows read through a
//! transaction are locked against other transactions until it commits or is
//! dropped; dropping without [`LeaveTx::commit`] discards every write.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::LeaveResult;
use crate::model::approval::{Approval, NewApproval};
use crate::model::leave_balance::{BalanceKey, LeaveBalance};
use crate::model::leave_request::{LeaveFilter, LeaveRequest, NewLeaveRequest};
use crate::model::process_history::{HistoryFilter, LeaveProcessHistory, NewProcessHistory};

pub mod memory;
pub mod mysql;

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn begin(&self) -> LeaveResult<Box<dyn LeaveTx>>;

    // Unlocked reads for listing endpoints.
    async fn find_request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>>;
    async fn list_requests(&self, filter: &LeaveFilter) -> LeaveResult<(Vec<LeaveRequest>, u64)>;
    async fn approvals_for(&self, request_id: u64) -> LeaveResult<Vec<Approval>>;
    async fn open_approvals_for_approver(&self, approver_employee_id: u64) -> LeaveResult<Vec<Approval>>;
    async fn find_balance(&self, key: &BalanceKey) -> LeaveResult<Option<LeaveBalance>>;
    async fn balances_for(&self, employee_id: u64, year: i32) -> LeaveResult<Vec<LeaveBalance>>;
    async fn history(&self, filter: &HistoryFilter) -> LeaveResult<Vec<LeaveProcessHistory>>;
}

#[async_trait]
pub trait LeaveTx: Send {
    /// Load a balance row for update.
    async fn balance(&mut self, key: &BalanceKey) -> LeaveResult<Option<LeaveBalance>>;
    /// Load a balance row for update, starting from a zeroed row when none exists.
    async fn balance_or_open(&mut self, key: &BalanceKey) -> LeaveResult<LeaveBalance> {
        Ok(self
            .balance(key)
            .await?
            .unwrap_or_else(|| LeaveBalance::open(key.clone())))
    }
    /// Insert or overwrite a balance row.
    async fn put_balance(&mut self, balance: &LeaveBalance) -> LeaveResult<()>;
    /// Every row of a year, locked for update.
    async fn balances_for_year(&mut self, year: i32) -> LeaveResult<Vec<LeaveBalance>>;

    /// Load a request for update.
    async fn request(&mut self, id: u64) -> LeaveResult<Option<LeaveRequest>>;
    async fn insert_request(&mut self, request: NewLeaveRequest) -> LeaveResult<LeaveRequest>;
    async fn update_request(&mut self, request: &LeaveRequest) -> LeaveResult<()>;
    async fn delete_request(&mut self, id: u64) -> LeaveResult<()>;
    /// PENDING/APPROVED requests of the employee intersecting `[start, end]`,
    /// other than `exclude_id`.
    async fn overlapping_requests(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<u64>,
    ) -> LeaveResult<Vec<LeaveRequest>>;

    async fn approvals(&mut self, request_id: u64) -> LeaveResult<Vec<Approval>>;
    async fn insert_approval(&mut self, approval: NewApproval) -> LeaveResult<Approval>;
    async fn update_approval(&mut self, approval: &Approval) -> LeaveResult<()>;
    /// Active approvals still PENDING for the request.
    async fn count_open_approvals(&mut self, request_id: u64) -> LeaveResult<u64>;

    async fn history(&mut self, filter: &HistoryFilter) -> LeaveResult<Vec<LeaveProcessHistory>>;
    async fn insert_history(&mut self, row: NewProcessHistory) -> LeaveResult<LeaveProcessHistory>;

    async fn commit(self: Box<Self>) -> LeaveResult<()>;
}
