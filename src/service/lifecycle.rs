//! Leave request lifecycle: drafts, submission, edits, cancellation.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{LeaveContext, actions, calendar, ledger};
use crate::error::{LeaveError, LeaveResult};
use crate::external::{AuditEntry, LeaveNotification};
use crate::model::approval::{Approval, NewApproval};
use crate::model::employee::EmployeeProfile;
use crate::model::leave_balance::BalanceKey;
use crate::model::leave_request::{
    HalfDayType, LeaveFilter, LeavePage, LeaveRequest, LeaveStatus, NewLeaveRequest,
};
use crate::model::leave_type::LeaveType;
use crate::model::role::Actor;
use crate::store::LeaveTx;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "CL")]
    pub leave_type_code: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Working days as counted by the client. Defaults to the calendar span.
    #[schema(value_type = Option<String>, example = "3")]
    pub total_days: Option<Decimal>,
    #[serde(default)]
    pub is_half_day: bool,
    pub half_day_type: Option<HalfDayType>,
    #[schema(example = "Family trip")]
    pub reason: String,
    pub contact_during_leave: Option<String>,
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub is_draft: bool,
}

/// Partial edit of a draft. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateLeave {
    pub leave_type_code: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub total_days: Option<Decimal>,
    pub is_half_day: Option<bool>,
    pub half_day_type: Option<HalfDayType>,
    pub reason: Option<String>,
    pub contact_during_leave: Option<String>,
    pub emergency_contact: Option<String>,
}

impl UpdateLeave {
    fn touches_days(&self) -> bool {
        self.start_date.is_some()
            || self.end_date.is_some()
            || self.total_days.is_some()
            || self.is_half_day.is_some()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DayPreview {
    pub calendar_days: i64,
    #[schema(value_type = String, example = "2")]
    pub working_days: Decimal,
    #[schema(value_type = Vec<String>)]
    pub holidays: Vec<NaiveDate>,
}

/// Ledger and approval effects of moving a request into the PENDING path.
struct Routed {
    approval: Option<Approval>,
    auto_approved: bool,
}

pub struct RequestLifecycle<'a> {
    ctx: &'a LeaveContext,
}

impl<'a> RequestLifecycle<'a> {
    pub fn new(ctx: &'a LeaveContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, input), fields(code = %input.leave_type_code))]
    pub async fn create(&self, employee_id: u64, input: CreateLeave) -> LeaveResult<LeaveRequest> {
        let employee = self.ctx.employee(employee_id).await?;
        let leave_type = self.ctx.leave_type(&input.leave_type_code).await?;
        let total_days = calendar::resolve_total_days(
            input.start_date,
            input.end_date,
            input.total_days,
            input.is_half_day,
        )?;
        if input.reason.trim().is_empty() {
            return Err(LeaveError::validation("reason is required"));
        }

        let new = NewLeaveRequest {
            employee_id,
            leave_type_code: leave_type.code.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            total_days,
            balance_year: calendar::balance_year(employee.region, input.start_date),
            is_half_day: input.is_half_day,
            half_day_type: input.half_day_type.filter(|_| input.is_half_day),
            reason: input.reason,
            contact_during_leave: input.contact_during_leave,
            emergency_contact: input.emergency_contact,
            status: if input.is_draft {
                LeaveStatus::Draft
            } else {
                LeaveStatus::Pending
            },
        };

        if input.is_draft {
            let mut tx = self.ctx.store.begin().await?;
            let request = tx.insert_request(new).await?;
            tx.commit().await?;

            info!(leave_id = request.id, employee_id, "Leave draft saved");
            self.ctx
                .record(
                    AuditEntry::new(actions::REQUEST_DRAFT, "leave_request", request.id, employee_id)
                        .after(&request),
                )
                .await;
            return Ok(request);
        }

        check_rules(&employee, &leave_type, new.start_date, total_days, new.is_half_day)?;

        let mut tx = self.ctx.store.begin().await?;
        let key = BalanceKey::new(employee_id, leave_type.code.clone(), new.balance_year);
        ledger::ensure_available(tx.as_mut(), &key, total_days, leave_type.allow_negative_balance).await?;
        reject_overlap(tx.as_mut(), employee_id, new.start_date, new.end_date, None).await?;

        let mut request = tx.insert_request(new).await?;
        let routed = route(tx.as_mut(), &mut request, &employee, &leave_type).await?;
        tx.commit().await?;

        info!(leave_id = request.id, employee_id, days = %request.total_days, status = %request.status, "Leave request submitted");
        self.after_routing(&request, &employee, &leave_type, &routed, actions::REQUEST_CREATE)
            .await;
        Ok(request)
    }

    /// DRAFT -> PENDING. The status check happens under the request lock, so
    /// a concurrent second submit observes PENDING and fails.
    #[instrument(skip(self))]
    pub async fn submit_draft(&self, id: u64, employee_id: u64) -> LeaveResult<LeaveRequest> {
        let mut tx = self.ctx.store.begin().await?;
        let mut request = locked_request(tx.as_mut(), id).await?;
        if request.employee_id != employee_id {
            return Err(LeaveError::forbidden("only the owner can submit this draft"));
        }
        if request.status != LeaveStatus::Draft {
            return Err(LeaveError::invalid_state(format!(
                "only drafts can be submitted (status is {})",
                request.status
            )));
        }

        let employee = self.ctx.employee(employee_id).await?;
        let leave_type = self.ctx.leave_type(&request.leave_type_code).await?;
        check_rules(
            &employee,
            &leave_type,
            request.start_date,
            request.total_days,
            request.is_half_day,
        )?;

        request.balance_year = calendar::balance_year(employee.region, request.start_date);
        let key = balance_key(&request);
        ledger::ensure_available(tx.as_mut(), &key, request.total_days, leave_type.allow_negative_balance)
            .await?;
        reject_overlap(
            tx.as_mut(),
            employee_id,
            request.start_date,
            request.end_date,
            Some(request.id),
        )
        .await?;

        request.set_status(LeaveStatus::Pending);
        tx.update_request(&request).await?;
        let routed = route(tx.as_mut(), &mut request, &employee, &leave_type).await?;
        tx.commit().await?;

        info!(leave_id = id, employee_id, status = %request.status, "Leave draft submitted");
        self.after_routing(&request, &employee, &leave_type, &routed, actions::REQUEST_SUBMIT)
            .await;
        Ok(request)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: u64, employee_id: u64, patch: UpdateLeave) -> LeaveResult<LeaveRequest> {
        let mut tx = self.ctx.store.begin().await?;
        let mut request = locked_request(tx.as_mut(), id).await?;
        if request.employee_id != employee_id {
            return Err(LeaveError::forbidden("only the owner can edit this request"));
        }
        if request.status != LeaveStatus::Draft {
            return Err(LeaveError::invalid_state("only drafts can be edited"));
        }
        let before = request.clone();

        if let Some(code) = &patch.leave_type_code {
            request.leave_type_code = self.ctx.leave_type(code).await?.code;
        }
        if patch.touches_days() {
            request.start_date = patch.start_date.unwrap_or(request.start_date);
            request.end_date = patch.end_date.unwrap_or(request.end_date);
            request.is_half_day = patch.is_half_day.unwrap_or(request.is_half_day);
            request.total_days = calendar::resolve_total_days(
                request.start_date,
                request.end_date,
                patch.total_days,
                request.is_half_day,
            )?;
            let employee = self.ctx.employee(employee_id).await?;
            request.balance_year = calendar::balance_year(employee.region, request.start_date);
        }
        if let Some(half) = patch.half_day_type {
            request.half_day_type = Some(half);
        }
        if !request.is_half_day {
            request.half_day_type = None;
        }
        if let Some(reason) = patch.reason {
            if reason.trim().is_empty() {
                return Err(LeaveError::validation("reason is required"));
            }
            request.reason = reason;
        }
        if patch.contact_during_leave.is_some() {
            request.contact_during_leave = patch.contact_during_leave;
        }
        if patch.emergency_contact.is_some() {
            request.emergency_contact = patch.emergency_contact;
        }

        tx.update_request(&request).await?;
        tx.commit().await?;

        self.ctx
            .record(
                AuditEntry::new(actions::REQUEST_UPDATE, "leave_request", id, employee_id)
                    .before(&before)
                    .after(&request),
            )
            .await;
        Ok(request)
    }

    /// Owner or admin; PENDING gives back the reservation, APPROVED refunds
    /// the used days.
    #[instrument(skip(self, reason), fields(actor = actor.employee_id))]
    pub async fn cancel(&self, id: u64, actor: Actor, reason: Option<String>) -> LeaveResult<LeaveRequest> {
        let mut tx = self.ctx.store.begin().await?;
        let mut request = locked_request(tx.as_mut(), id).await?;
        if request.employee_id != actor.employee_id && !actor.role.is_admin() {
            return Err(LeaveError::forbidden("only the owner or an admin can cancel"));
        }
        let key = balance_key(&request);
        match request.status {
            LeaveStatus::Pending => {
                ledger::release(tx.as_mut(), &key, request.total_days).await?;
            }
            LeaveStatus::Approved => {
                ledger::refund_used(tx.as_mut(), &key, request.total_days).await?;
            }
            other => {
                return Err(LeaveError::invalid_state(format!("cannot cancel a {other} request")));
            }
        }
        let before = request.clone();

        for mut approval in tx.approvals(id).await?.into_iter().filter(Approval::is_open) {
            approval.is_active = false;
            tx.update_approval(&approval).await?;
        }

        request.set_status(LeaveStatus::Cancelled);
        request.cancelled_date = Some(Utc::now());
        request.remarks = reason;
        tx.update_request(&request).await?;
        tx.commit().await?;

        info!(leave_id = id, previous = %before.status, "Leave request cancelled");
        if let Ok(employee) = self.ctx.employee(request.employee_id).await {
            if let Some(manager) = self.ctx.manager_of(&employee).await {
                let leave_type_name = self.type_name(&request.leave_type_code).await;
                self.ctx
                    .notify(LeaveNotification::Cancelled {
                        to: manager.email,
                        employee_name: employee.name,
                        leave_type_name,
                        start_date: request.start_date,
                        end_date: request.end_date,
                    })
                    .await;
            }
        }
        self.ctx
            .record(
                AuditEntry::new(actions::REQUEST_CANCEL, "leave_request", id, actor.employee_id)
                    .before(&before)
                    .after(&request),
            )
            .await;
        Ok(request)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64, employee_id: u64) -> LeaveResult<()> {
        let mut tx = self.ctx.store.begin().await?;
        let request = locked_request(tx.as_mut(), id).await?;
        if request.employee_id != employee_id {
            return Err(LeaveError::forbidden("only the owner can delete this request"));
        }
        if request.status != LeaveStatus::Draft {
            return Err(LeaveError::invalid_state("only drafts can be deleted"));
        }
        tx.delete_request(id).await?;
        tx.commit().await?;

        info!(leave_id = id, employee_id, "Leave draft deleted");
        self.ctx
            .record(
                AuditEntry::new(actions::REQUEST_DELETE, "leave_request", id, employee_id)
                    .before(&request),
            )
            .await;
        Ok(())
    }

    pub async fn get(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.ctx
            .store
            .find_request(id)
            .await?
            .ok_or_else(|| LeaveError::not_found(format!("leave request {id}")))
    }

    pub async fn list(&self, filter: &LeaveFilter) -> LeaveResult<LeavePage> {
        let (page, per_page, _) = filter.pagination();
        let (data, total) = self.ctx.store.list_requests(filter).await?;
        Ok(LeavePage {
            data,
            page,
            per_page,
            total,
        })
    }

    /// Working days in a prospective range, skipping weekends and the
    /// employee region's holidays. Informational only.
    pub async fn preview_days(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        is_half_day: bool,
    ) -> LeaveResult<DayPreview> {
        if start > end {
            return Err(LeaveError::InvalidDateRange);
        }
        let employee = self.ctx.employee(employee_id).await?;
        let holidays = self.ctx.holidays.list_between(start, end, employee.region).await?;
        let working = calendar::working_days(start, end, &holidays);

        let working_days = if is_half_day && start == end && working == 1 {
            Decimal::new(5, 1)
        } else {
            Decimal::from(working)
        };
        Ok(DayPreview {
            calendar_days: calendar::calendar_span(start, end),
            working_days,
            holidays,
        })
    }

    async fn after_routing(
        &self,
        request: &LeaveRequest,
        employee: &EmployeeProfile,
        leave_type: &LeaveType,
        routed: &Routed,
        action: &str,
    ) {
        if routed.auto_approved {
            self.ctx
                .notify(LeaveNotification::Approved {
                    to: employee.email.clone(),
                    employee_name: employee.name.clone(),
                    leave_type_name: leave_type.name.clone(),
                    start_date: request.start_date,
                    end_date: request.end_date,
                    days: request.total_days,
                })
                .await;
        } else if let Some(manager) = self.ctx.manager_of(employee).await {
            self.ctx
                .notify(LeaveNotification::Submitted {
                    to: manager.email,
                    employee_name: employee.name.clone(),
                    leave_type_name: leave_type.name.clone(),
                    start_date: request.start_date,
                    end_date: request.end_date,
                    days: request.total_days,
                })
                .await;
        }

        self.ctx
            .record(
                AuditEntry::new(action, "leave_request", request.id, employee.id).after(
                    serde_json::json!({ "request": request, "approval": routed.approval }),
                ),
            )
            .await;
    }

    async fn type_name(&self, code: &str) -> String {
        match self.ctx.catalog.get(code).await {
            Ok(Some(leave_type)) => leave_type.name,
            _ => code.to_string(),
        }
    }
}

/// Balance row a request draws from, fixed when it was last routed or edited.
pub(crate) fn balance_key(request: &LeaveRequest) -> BalanceKey {
    BalanceKey::new(
        request.employee_id,
        request.leave_type_code.clone(),
        request.balance_year,
    )
}

pub(crate) async fn locked_request(tx: &mut dyn LeaveTx, id: u64) -> LeaveResult<LeaveRequest> {
    tx.request(id)
        .await?
        .ok_or_else(|| LeaveError::not_found(format!("leave request {id}")))
}

fn check_rules(
    employee: &EmployeeProfile,
    leave_type: &LeaveType,
    start_date: NaiveDate,
    total_days: Decimal,
    is_half_day: bool,
) -> LeaveResult<()> {
    if !employee.is_active {
        return Err(LeaveError::forbidden(format!("employee {} is not active", employee.id)));
    }
    if !leave_type.region.applies_to(employee.region) {
        return Err(LeaveError::validation(format!(
            "{} is not available in region {}",
            leave_type.code, employee.region
        )));
    }
    if is_half_day && !leave_type.allow_half_day {
        return Err(LeaveError::validation(format!(
            "{} does not allow half days",
            leave_type.code
        )));
    }
    if let Some(max) = leave_type.max_consecutive_days {
        if total_days > max {
            return Err(LeaveError::validation(format!(
                "{} allows at most {max} consecutive days",
                leave_type.code
            )));
        }
    }
    let notice = (start_date - Utc::now().date_naive()).num_days();
    if notice < leave_type.min_days_notice {
        return Err(LeaveError::validation(format!(
            "{} requires {} days notice",
            leave_type.code, leave_type.min_days_notice
        )));
    }
    Ok(())
}

async fn reject_overlap(
    tx: &mut dyn LeaveTx,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
    exclude_id: Option<u64>,
) -> LeaveResult<()> {
    match tx
        .overlapping_requests(employee_id, start, end, exclude_id)
        .await?
        .first()
    {
        Some(existing) => Err(LeaveError::OverlappingRequest {
            existing_id: existing.id,
        }),
        None => Ok(()),
    }
}

/// Reserve the days, then either auto-approve or open the manager's
/// level-1 approval. `request` must already be persisted as PENDING.
async fn route(
    tx: &mut dyn LeaveTx,
    request: &mut LeaveRequest,
    employee: &EmployeeProfile,
    leave_type: &LeaveType,
) -> LeaveResult<Routed> {
    let key = balance_key(request);
    ledger::reserve(tx, &key, request.total_days, leave_type.allow_negative_balance).await?;

    if !leave_type.requires_approval {
        ledger::commit(tx, &key, request.total_days).await?;
        request.set_status(LeaveStatus::Approved);
        request.approved_date = Some(Utc::now());
        tx.update_request(request).await?;
        return Ok(Routed {
            approval: None,
            auto_approved: true,
        });
    }

    let approval = match employee.manager_id {
        Some(manager_id) => Some(
            tx.insert_approval(NewApproval::level_one(request.id, manager_id))
                .await?,
        ),
        None => None,
    };
    Ok(Routed {
        approval,
        auto_approved: false,
    })
}
