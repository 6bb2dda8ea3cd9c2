use crate::api::balance::{CarryForward, InitializeBalances, UpsertAllocation};
use crate::api::leave_request::{AddApprover, ApproveLeave, CancelLeave, RejectLeave};
use crate::model::approval::{Approval, ApprovalStatus};
use crate::model::employee::Region;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{HalfDayType, LeaveFilter, LeavePage, LeaveRequest, LeaveStatus};
use crate::model::process_history::{HistoryFilter, LeaveProcessHistory};
use crate::service::approval::ApprovalOutcome;
use crate::service::ledger::{BalanceAdjustment, CarryForwardLine, CarryForwardReport};
use crate::service::lifecycle::{CreateLeave, DayPreview, UpdateLeave};
use crate::service::policy::{
    BulkSpecialLeave, CreditedLeave, ProcessLeaves, ProcessLeavesReport, SpecialLeave,
    SpecialLeaveAction, SpecialLeaveOutcome, SpecialLeaveReport,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management System

Leave balances, leave requests, approval chains and bulk policy runs.

### Key Features
- **Requests**
  - Apply for leave or keep drafts, submit, edit, cancel
- **Approvals**
  - Multi-level chains: every approver must approve, one rejection is final
- **Balances**
  - Allocation, grants, revocations, pro-rated initialization, carry forward
- **Policy processing**
  - Credit days to a region/employment-type cohort, special leave in bulk

### Security
Every endpoint requires a **JWT Bearer** access token issued by the identity service.
Administrative operations are limited to **Admin** and **HR**.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::submit_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::leave_approvals,
        crate::api::leave_request::add_approver,
        crate::api::leave_request::pending_approvals,
        crate::api::leave_request::preview_leave,

        crate::api::balance::list_balances,
        crate::api::balance::upsert_allocation,
        crate::api::balance::grant_balance,
        crate::api::balance::revoke_balance,
        crate::api::balance::initialize_balances,
        crate::api::balance::carry_forward,

        crate::api::policy::process_leaves,
        crate::api::policy::process_special_leave,
        crate::api::policy::process_special_leave_bulk,
        crate::api::policy::process_history
    ),
    components(
        schemas(
            CreateLeave,
            UpdateLeave,
            LeaveRequest,
            LeaveStatus,
            HalfDayType,
            LeaveFilter,
            LeavePage,
            DayPreview,
            ApproveLeave,
            RejectLeave,
            CancelLeave,
            AddApprover,
            Approval,
            ApprovalStatus,
            ApprovalOutcome,
            LeaveBalance,
            BalanceAdjustment,
            UpsertAllocation,
            InitializeBalances,
            CarryForward,
            CarryForwardLine,
            CarryForwardReport,
            Region,
            ProcessLeaves,
            CreditedLeave,
            ProcessLeavesReport,
            SpecialLeaveAction,
            SpecialLeave,
            BulkSpecialLeave,
            SpecialLeaveOutcome,
            SpecialLeaveReport,
            HistoryFilter,
            LeaveProcessHistory
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request and approval APIs"),
        (name = "Balance", description = "Leave balance APIs"),
        (name = "Policy", description = "Bulk leave processing APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_leave_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/leave",
            "/api/v1/leave/{leave_id}/approve",
            "/api/v1/leave/{leave_id}/reject",
            "/api/v1/balance/carry-forward",
            "/api/v1/policy/process",
            "/api/v1/policy/special/bulk",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }

    #[test]
    fn response_bodies_are_registered_schemas() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        for name in [
            "LeaveBalance",
            "CarryForwardReport",
            "LeavePage",
            "DayPreview",
            "Approval",
            "ApprovalOutcome",
            "ProcessLeavesReport",
            "SpecialLeaveOutcome",
            "SpecialLeaveReport",
            "LeaveProcessHistory",
        ] {
            assert!(components.schemas.contains_key(name), "missing schema {name}");
        }
    }
}
