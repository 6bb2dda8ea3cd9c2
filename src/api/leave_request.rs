use crate::auth::auth::AuthUser;
use crate::model::leave_request::{LeaveFilter, LeaveRequest};
use crate::service::LeaveContext;
use crate::service::lifecycle::{CreateLeave, UpdateLeave};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ApproveLeave {
    #[schema(example = "Enjoy")]
    pub comments: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    pub comments: Option<String>,
    #[schema(example = "project deadline")]
    pub rejection_reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CancelLeave {
    #[schema(example = "Plans changed")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddApprover {
    #[schema(example = 3000)]
    pub approver_employee_id: u64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewQuery {
    /// First day of leave
    #[param(value_type = String, format = "date", example = "2026-01-05")]
    pub start_date: NaiveDate,
    /// Last day of leave
    #[param(value_type = String, format = "date", example = "2026-01-07")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_half_day: bool,
}

/* =========================
Create leave request
========================= */
/// Apply for leave, or save a draft with `is_draft = true`.
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request created", body = LeaveRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Overlaps an existing request"),
        (status = 422, description = "Insufficient balance", body = Object, example = json!({
            "message": "insufficient leave balance: available 2, requested 3"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let request = ctx
        .lifecycle()
        .create(actor.employee_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(request))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = crate::model::leave_request::LeavePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let mut filter = query.into_inner();
    if !auth.role.is_hr_or_admin() {
        // Employees are pinned to their own requests.
        filter.employee_id = Some(auth.actor()?.employee_id);
    }
    let page = ctx.lifecycle().list(&filter).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "leave request 1 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = ctx.lifecycle().get(leave_id).await?;
    if !auth.can_view(request.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your leave request"));
    }
    Ok(HttpResponse::Ok().json(request))
}

/// Edit a draft.
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the draft to edit")
    ),
    request_body = UpdateLeave,
    responses(
        (status = 200, description = "Draft updated", body = LeaveRequest),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Request is no longer a draft")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let request = ctx
        .lifecycle()
        .update(path.into_inner(), actor.employee_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Delete a draft.
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the draft to delete")
    ),
    responses(
        (status = 200, description = "Draft deleted", body = Object, example = json!({
            "message": "Leave draft deleted"
        })),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Request is no longer a draft")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    ctx.lifecycle()
        .delete(path.into_inner(), actor.employee_id)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave draft deleted"
    })))
}

/// Submit a draft for approval.
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/submit",
    params(
        ("leave_id" = u64, Path, description = "ID of the draft to submit")
    ),
    responses(
        (status = 200, description = "Draft submitted", body = LeaveRequest),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Already submitted or overlapping"),
        (status = 422, description = "Insufficient balance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let request = ctx
        .lifecycle()
        .submit_draft(path.into_inner(), actor.employee_id)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Approve leave
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body = ApproveLeave,
    responses(
        (status = 200, description = "Approval recorded", body = crate::service::approval::ApprovalOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No pending approval for this approver", body = Object, example = json!({
            "message": "pending approval for this approver not found"
        })),
        (status = 409, description = "Leave request is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    path: web::Path<u64>,
    payload: web::Json<ApproveLeave>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let outcome = ctx
        .approvals()
        .approve(path.into_inner(), actor, payload.into_inner().comments)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/* =========================
Reject leave
========================= */
/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = crate::service::approval::ApprovalOutcome),
        (status = 400, description = "Missing rejection reason", body = Object, example = json!({
            "message": "validation failed: rejection_reason is required"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No pending approval for this approver"),
        (status = 409, description = "Leave request is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let RejectLeave {
        comments,
        rejection_reason,
    } = payload.into_inner();
    let outcome = ctx
        .approvals()
        .reject(path.into_inner(), actor, comments, &rejection_reason)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Cancel a pending or approved request (owner or admin).
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    request_body = CancelLeave,
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 403, description = "Neither owner nor admin"),
        (status = 409, description = "Request cannot be cancelled in its current status")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    path: web::Path<u64>,
    payload: web::Json<CancelLeave>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let request = ctx
        .lifecycle()
        .cancel(path.into_inner(), actor, payload.into_inner().reason)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Approval chain of a request.
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}/approvals",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Approvals ordered by level", body = [crate::model::approval::Approval]),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_approvals(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request: LeaveRequest = ctx.lifecycle().get(leave_id).await?;
    if !auth.can_view(request.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your leave request"));
    }
    let approvals = ctx.approvals().approvals_for(leave_id).await?;
    Ok(HttpResponse::Ok().json(approvals))
}

/// Add a further approval level to a pending request (HR/Admin).
#[utoipa::path(
    post,
    path = "/api/v1/leave/{leave_id}/approvers",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body = AddApprover,
    responses(
        (status = 201, description = "Approver added", body = crate::model::approval::Approval),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Request is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn add_approver(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    path: web::Path<u64>,
    payload: web::Json<AddApprover>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let approval = ctx
        .approvals()
        .add_approver(path.into_inner(), actor, payload.approver_employee_id)
        .await?;
    Ok(HttpResponse::Created().json(approval))
}

/// Approvals waiting on the caller.
#[utoipa::path(
    get,
    path = "/api/v1/leave/approvals/pending",
    responses(
        (status = 200, description = "Open approvals assigned to the caller", body = [crate::model::approval::Approval]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn pending_approvals(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let approvals = ctx.approvals().pending_for(actor.employee_id).await?;
    Ok(HttpResponse::Ok().json(approvals))
}

/// Working-day preview for a prospective request.
#[utoipa::path(
    get,
    path = "/api/v1/leave/preview",
    params(PreviewQuery),
    responses(
        (status = 200, description = "Day counts", body = crate::service::lifecycle::DayPreview),
        (status = 400, description = "start_date after end_date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn preview_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    query: web::Query<PreviewQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let preview = ctx
        .lifecycle()
        .preview_days(actor.employee_id, query.start_date, query.end_date, query.is_half_day)
        .await?;
    Ok(HttpResponse::Ok().json(preview))
}
