//! In-memory [`LeaveStore`].
//!
//! A transaction owns the state mutex for its whole lifetime and edits a
//! working copy, so units of work are fully serialized and an uncommitted
//! transaction leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LeaveStore, LeaveTx};
use crate::error::{LeaveError, LeaveResult};
use crate::model::approval::{Approval, NewApproval};
use crate::model::leave_balance::{BalanceKey, LeaveBalance};
use crate::model::leave_request::{LeaveFilter, LeaveRequest, NewLeaveRequest};
use crate::model::process_history::{HistoryFilter, LeaveProcessHistory, NewProcessHistory};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    balances: BTreeMap<BalanceKey, LeaveBalance>,
    requests: BTreeMap<u64, LeaveRequest>,
    approvals: BTreeMap<u64, Approval>,
    history: Vec<LeaveProcessHistory>,
    last_request_id: u64,
    last_approval_id: u64,
    last_history_id: u64,
}

impl MemoryState {
    fn approvals_of(&self, request_id: u64) -> Vec<Approval> {
        self.approvals
            .values()
            .filter(|a| a.leave_request_id == request_id)
            .cloned()
            .collect()
    }

    fn history_matching(&self, filter: &HistoryFilter) -> Vec<LeaveProcessHistory> {
        let mut rows: Vec<_> = self
            .history
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.processed_at.cmp(&a.processed_at).then(b.id.cmp(&a.id)));
        rows
    }
}

#[derive(Clone, Default)]
pub struct MemoryLeaveStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn begin(&self) -> LeaveResult<Box<dyn LeaveTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn find_request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn list_requests(&self, filter: &LeaveFilter) -> LeaveResult<(Vec<LeaveRequest>, u64)> {
        let state = self.state.lock().await;
        let (_, per_page, offset) = filter.pagination();
        let mut matching: Vec<_> = state
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(per_page as usize)
            .collect();
        Ok((page, total))
    }

    async fn approvals_for(&self, request_id: u64) -> LeaveResult<Vec<Approval>> {
        Ok(self.state.lock().await.approvals_of(request_id))
    }

    async fn open_approvals_for_approver(&self, approver_employee_id: u64) -> LeaveResult<Vec<Approval>> {
        Ok(self
            .state
            .lock()
            .await
            .approvals
            .values()
            .filter(|a| a.approver_employee_id == approver_employee_id && a.is_open())
            .cloned()
            .collect())
    }

    async fn find_balance(&self, key: &BalanceKey) -> LeaveResult<Option<LeaveBalance>> {
        Ok(self.state.lock().await.balances.get(key).cloned())
    }

    async fn balances_for(&self, employee_id: u64, year: i32) -> LeaveResult<Vec<LeaveBalance>> {
        Ok(self
            .state
            .lock()
            .await
            .balances
            .values()
            .filter(|b| b.key().employee_id == employee_id && b.key().year == year)
            .cloned()
            .collect())
    }

    async fn history(&self, filter: &HistoryFilter) -> LeaveResult<Vec<LeaveProcessHistory>> {
        Ok(self.state.lock().await.history_matching(filter))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl LeaveTx for MemoryTx {
    async fn balance(&mut self, key: &BalanceKey) -> LeaveResult<Option<LeaveBalance>> {
        Ok(self.working.balances.get(key).cloned())
    }

    async fn put_balance(&mut self, balance: &LeaveBalance) -> LeaveResult<()> {
        self.working
            .balances
            .insert(balance.key().clone(), balance.clone());
        Ok(())
    }

    async fn balances_for_year(&mut self, year: i32) -> LeaveResult<Vec<LeaveBalance>> {
        Ok(self
            .working
            .balances
            .values()
            .filter(|b| b.key().year == year)
            .cloned()
            .collect())
    }

    async fn request(&mut self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        Ok(self.working.requests.get(&id).cloned())
    }

    async fn insert_request(&mut self, request: NewLeaveRequest) -> LeaveResult<LeaveRequest> {
        self.working.last_request_id += 1;
        let stored = request.into_request(self.working.last_request_id, Utc::now());
        self.working.requests.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_request(&mut self, request: &LeaveRequest) -> LeaveResult<()> {
        match self.working.requests.get_mut(&request.id) {
            Some(slot) => {
                *slot = request.clone();
                Ok(())
            }
            None => Err(LeaveError::not_found(format!("leave request {}", request.id))),
        }
    }

    async fn delete_request(&mut self, id: u64) -> LeaveResult<()> {
        self.working.requests.remove(&id);
        self.working.approvals.retain(|_, a| a.leave_request_id != id);
        Ok(())
    }

    async fn overlapping_requests(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<u64>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        Ok(self
            .working
            .requests
            .values()
            .filter(|r| {
                r.employee_id == employee_id
                    && Some(r.id) != exclude_id
                    && r.status.blocks_calendar()
                    && r.overlaps(start, end)
            })
            .cloned()
            .collect())
    }

    async fn approvals(&mut self, request_id: u64) -> LeaveResult<Vec<Approval>> {
        Ok(self.working.approvals_of(request_id))
    }

    async fn insert_approval(&mut self, approval: NewApproval) -> LeaveResult<Approval> {
        self.working.last_approval_id += 1;
        let stored = approval.into_approval(self.working.last_approval_id);
        self.working.approvals.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_approval(&mut self, approval: &Approval) -> LeaveResult<()> {
        match self.working.approvals.get_mut(&approval.id) {
            Some(slot) => {
                *slot = approval.clone();
                Ok(())
            }
            None => Err(LeaveError::not_found(format!("approval {}", approval.id))),
        }
    }

    async fn count_open_approvals(&mut self, request_id: u64) -> LeaveResult<u64> {
        Ok(self
            .working
            .approvals
            .values()
            .filter(|a| a.leave_request_id == request_id && a.is_open())
            .count() as u64)
    }

    async fn history(&mut self, filter: &HistoryFilter) -> LeaveResult<Vec<LeaveProcessHistory>> {
        Ok(self.working.history_matching(filter))
    }

    async fn insert_history(&mut self, row: NewProcessHistory) -> LeaveResult<LeaveProcessHistory> {
        self.working.last_history_id += 1;
        let stored = row.into_history(self.working.last_history_id, Utc::now());
        self.working.history.push(stored.clone());
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> LeaveResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
