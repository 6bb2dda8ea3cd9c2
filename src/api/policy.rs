use crate::auth::auth::AuthUser;
use crate::model::process_history::HistoryFilter;
use crate::service::LeaveContext;
use crate::service::policy::{BulkSpecialLeave, ProcessLeaves, SpecialLeave};
use actix_web::{HttpResponse, Responder, web};

/* =========================
Policy processing (HR/Admin)
========================= */
/// Credit leave days to a region/employment-type cohort.
#[utoipa::path(
    post,
    path = "/api/v1/policy/process",
    request_body = ProcessLeaves,
    responses(
        (status = 200, description = "Run summary; `already_processed` flags a repeat run", body = crate::service::policy::ProcessLeavesReport),
        (status = 400, description = "Invalid month or no amounts"),
        (status = 403, description = "HR/Admin only"),
        (status = 422, description = "No eligible employees", body = Object, example = json!({
            "message": "no eligible employees found for the selected criteria"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policy"
)]
pub async fn process_leaves(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    payload: web::Json<ProcessLeaves>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let report = ctx
        .policy()
        .process_leaves(auth.actor()?, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Grant or revoke special leave for one employee.
#[utoipa::path(
    post,
    path = "/api/v1/policy/special",
    request_body = SpecialLeave,
    responses(
        (status = 200, description = "Balance and history row", body = crate::service::policy::SpecialLeaveOutcome),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Unknown employee, leave type or balance"),
        (status = 422, description = "Insufficient balance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policy"
)]
pub async fn process_special_leave(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    payload: web::Json<SpecialLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let outcome = ctx
        .policy()
        .process_special_leave(auth.actor()?, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Grant or revoke special leave for many employees, collecting failures.
#[utoipa::path(
    post,
    path = "/api/v1/policy/special/bulk",
    request_body = BulkSpecialLeave,
    responses(
        (status = 200, description = "Processed ids with per-employee errors and warnings", body = crate::service::policy::SpecialLeaveReport),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policy"
)]
pub async fn process_special_leave_bulk(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    payload: web::Json<BulkSpecialLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let report = ctx
        .policy()
        .process_special_leave_bulk(auth.actor()?, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Processing history, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/policy/history",
    params(HistoryFilter),
    responses(
        (status = 200, description = "History rows", body = [crate::model::process_history::LeaveProcessHistory]),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policy"
)]
pub async fn process_history(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    query: web::Query<HistoryFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let rows = ctx.policy().history(&query).await?;
    Ok(HttpResponse::Ok().json(rows))
}
