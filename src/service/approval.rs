//! Approver decisions.
//!
//! Approval is conjunctive: a request becomes APPROVED once no active
//! approval is left pending. Rejection is disjunctive: one rejection ends the
//! request immediately.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::lifecycle::{balance_key, locked_request};
use super::{LeaveContext, actions, ledger};
use crate::error::{LeaveError, LeaveResult};
use crate::external::{AuditEntry, LeaveNotification};
use crate::model::approval::{Approval, NewApproval};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Actor;
use crate::store::LeaveTx;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApprovalOutcome {
    pub request: LeaveRequest,
    pub approval: Approval,
    /// Active approvals still pending after this decision.
    pub remaining: u64,
    pub fully_approved: bool,
}

pub struct ApprovalChain<'a> {
    ctx: &'a LeaveContext,
}

impl<'a> ApprovalChain<'a> {
    pub fn new(ctx: &'a LeaveContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, comments), fields(approver = actor.employee_id))]
    pub async fn approve(
        &self,
        request_id: u64,
        actor: Actor,
        comments: Option<String>,
    ) -> LeaveResult<ApprovalOutcome> {
        self.ctx.employee(actor.employee_id).await?;

        let mut tx = self.ctx.store.begin().await?;
        let mut request = pending_request(tx.as_mut(), request_id).await?;
        let mut approval = resolve_approval(tx.as_mut(), &request, actor).await?;

        let now = Utc::now();
        approval.approve(comments, now);
        tx.update_approval(&approval).await?;

        let remaining = tx.count_open_approvals(request_id).await?;
        let fully_approved = remaining == 0;
        if fully_approved {
            ledger::commit(tx.as_mut(), &balance_key(&request), request.total_days).await?;
            request.set_status(LeaveStatus::Approved);
            request.approved_date = Some(now);
            tx.update_request(&request).await?;
        }
        tx.commit().await?;

        let outcome = ApprovalOutcome {
            request,
            approval,
            remaining,
            fully_approved,
        };
        if fully_approved {
            info!(leave_id = request_id, "Leave request approved");
            self.notify_employee(&outcome.request, None).await;
            self.ctx
                .record(
                    AuditEntry::new(actions::REQUEST_APPROVE, "leave_request", request_id, actor.employee_id)
                        .after(&outcome),
                )
                .await;
        } else {
            info!(leave_id = request_id, remaining, "Approval recorded, chain not exhausted");
            self.ctx
                .record(
                    AuditEntry::new(actions::APPROVAL_RECORDED, "leave_approval", outcome.approval.id, actor.employee_id)
                        .after(&outcome.approval),
                )
                .await;
        }
        Ok(outcome)
    }

    /// A single rejection is final regardless of other pending approvals.
    #[instrument(skip(self, comments, rejection_reason), fields(approver = actor.employee_id))]
    pub async fn reject(
        &self,
        request_id: u64,
        actor: Actor,
        comments: Option<String>,
        rejection_reason: &str,
    ) -> LeaveResult<ApprovalOutcome> {
        let reason = rejection_reason.trim();
        if reason.is_empty() {
            return Err(LeaveError::validation("rejection_reason is required"));
        }
        self.ctx.employee(actor.employee_id).await?;

        let mut tx = self.ctx.store.begin().await?;
        let mut request = pending_request(tx.as_mut(), request_id).await?;
        let mut approval = resolve_approval(tx.as_mut(), &request, actor).await?;

        let now = Utc::now();
        approval.reject(comments, now);
        tx.update_approval(&approval).await?;

        // The rest of the chain can no longer be acted on.
        for mut other in tx.approvals(request_id).await?.into_iter().filter(Approval::is_open) {
            other.is_active = false;
            tx.update_approval(&other).await?;
        }

        ledger::release(tx.as_mut(), &balance_key(&request), request.total_days).await?;
        request.set_status(LeaveStatus::Rejected);
        request.rejected_date = Some(now);
        request.rejection_reason = Some(reason.to_string());
        tx.update_request(&request).await?;
        tx.commit().await?;

        info!(leave_id = request_id, "Leave request rejected");
        let outcome = ApprovalOutcome {
            request,
            approval,
            remaining: 0,
            fully_approved: false,
        };
        self.notify_employee(&outcome.request, Some(reason)).await;
        self.ctx
            .record(
                AuditEntry::new(actions::REQUEST_REJECT, "leave_request", request_id, actor.employee_id)
                    .after(&outcome),
            )
            .await;
        Ok(outcome)
    }

    /// Append an approver at the next level of a PENDING request's chain.
    pub async fn add_approver(
        &self,
        request_id: u64,
        actor: Actor,
        approver_employee_id: u64,
    ) -> LeaveResult<Approval> {
        actor.require_hr_or_admin()?;
        self.ctx.employee(approver_employee_id).await?;

        let mut tx = self.ctx.store.begin().await?;
        let request = pending_request(tx.as_mut(), request_id).await?;
        let chain = tx.approvals(request.id).await?;
        if chain
            .iter()
            .any(|a| a.is_open() && a.approver_employee_id == approver_employee_id)
        {
            return Err(LeaveError::invalid_state(format!(
                "employee {approver_employee_id} already has a pending approval on request {request_id}"
            )));
        }
        let level = chain.iter().map(|a| a.level).max().unwrap_or(0) + 1;
        let approval = tx
            .insert_approval(NewApproval {
                leave_request_id: request_id,
                approver_employee_id,
                level,
            })
            .await?;
        tx.commit().await?;

        info!(leave_id = request_id, approver_employee_id, level, "Approver added");
        Ok(approval)
    }

    pub async fn pending_for(&self, approver_employee_id: u64) -> LeaveResult<Vec<Approval>> {
        self.ctx
            .store
            .open_approvals_for_approver(approver_employee_id)
            .await
    }

    pub async fn approvals_for(&self, request_id: u64) -> LeaveResult<Vec<Approval>> {
        if self.ctx.store.find_request(request_id).await?.is_none() {
            return Err(LeaveError::not_found(format!("leave request {request_id}")));
        }
        self.ctx.store.approvals_for(request_id).await
    }

    async fn notify_employee(&self, request: &LeaveRequest, rejection: Option<&str>) {
        let employee = match self.ctx.employee(request.employee_id).await {
            Ok(employee) => employee,
            Err(e) => {
                warn!(error = %e, leave_id = request.id, "Employee lookup for notification failed");
                return;
            }
        };
        let leave_type_name = match self.ctx.catalog.get(&request.leave_type_code).await {
            Ok(Some(leave_type)) => leave_type.name,
            _ => request.leave_type_code.clone(),
        };
        let notification = match rejection {
            Some(reason) => LeaveNotification::Rejected {
                to: employee.email,
                employee_name: employee.name,
                leave_type_name,
                start_date: request.start_date,
                end_date: request.end_date,
                reason: reason.to_string(),
            },
            None => LeaveNotification::Approved {
                to: employee.email,
                employee_name: employee.name,
                leave_type_name,
                start_date: request.start_date,
                end_date: request.end_date,
                days: request.total_days,
            },
        };
        self.ctx.notify(notification).await;
    }
}

async fn pending_request(tx: &mut dyn LeaveTx, request_id: u64) -> LeaveResult<LeaveRequest> {
    let request = locked_request(tx, request_id).await?;
    if request.status != LeaveStatus::Pending {
        return Err(LeaveError::invalid_state(format!(
            "leave request {request_id} is {}, not PENDING",
            request.status
        )));
    }
    Ok(request)
}

/// The actor's own open approval on the request. An admin without one gets a
/// fresh level-1 approval created on the spot.
async fn resolve_approval(
    tx: &mut dyn LeaveTx,
    request: &LeaveRequest,
    actor: Actor,
) -> LeaveResult<Approval> {
    let own = tx
        .approvals(request.id)
        .await?
        .into_iter()
        .find(|a| a.is_open() && a.approver_employee_id == actor.employee_id);

    match own {
        Some(approval) => Ok(approval),
        None if actor.role.is_admin() => {
            tx.insert_approval(NewApproval::level_one(request.id, actor.employee_id))
                .await
        }
        None => Err(LeaveError::not_found("pending approval for this approver")),
    }
}
