use crate::auth::auth::AuthUser;
use crate::model::leave_balance::BalanceKey;
use crate::service::ledger::BalanceAdjustment;
use crate::service::{LeaveContext, calendar};
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BalanceQuery {
    /// Defaults to the caller; other employees need HR/Admin
    pub employee_id: Option<u64>,
    /// Defaults to the employee's current fiscal year
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpsertAllocation {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "PL")]
    pub leave_type_code: String,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(value_type = String, example = "15")]
    pub allocated: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct InitializeBalances {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 2026)]
    pub year: i32,
    /// Joining date for pro-rating; absent means a full allocation
    #[schema(value_type = Option<String>, format = "date")]
    pub joined_on: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct CarryForward {
    #[schema(example = 2025)]
    pub from_year: i32,
}

/// Balances of one employee for one year.
#[utoipa::path(
    get,
    path = "/api/v1/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Balances ordered by leave type", body = [crate::model::leave_balance::LeaveBalance]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn list_balances(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match query.employee_id {
        Some(id) => id,
        None => auth.actor()?.employee_id,
    };
    if !auth.can_view(employee_id) {
        return Err(actix_web::error::ErrorForbidden("HR/Admin only"));
    }
    let year = match query.year {
        Some(year) => year,
        None => {
            let employee = ctx.employee(employee_id).await?;
            calendar::balance_year(employee.region, Utc::now().date_naive())
        }
    };
    let balances = ctx.ledger().balances(employee_id, year).await?;
    Ok(HttpResponse::Ok().json(balances))
}

/// Set the allocation of one balance row.
#[utoipa::path(
    put,
    path = "/api/v1/balance",
    request_body = UpsertAllocation,
    responses(
        (status = 200, description = "Balance after the change", body = crate::model::leave_balance::LeaveBalance),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Unknown employee or leave type")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn upsert_allocation(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    payload: web::Json<UpsertAllocation>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let payload = payload.into_inner();
    let key = BalanceKey::new(payload.employee_id, payload.leave_type_code, payload.year);
    let balance = ctx
        .ledger()
        .upsert_allocation(auth.actor()?, key, payload.allocated)
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Add days to a balance.
#[utoipa::path(
    post,
    path = "/api/v1/balance/grant",
    request_body = BalanceAdjustment,
    responses(
        (status = 200, description = "Balance after the grant", body = crate::model::leave_balance::LeaveBalance),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn grant_balance(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    payload: web::Json<BalanceAdjustment>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let balance = ctx.ledger().grant(auth.actor()?, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Remove days from a balance.
#[utoipa::path(
    post,
    path = "/api/v1/balance/revoke",
    request_body = BalanceAdjustment,
    responses(
        (status = 200, description = "Balance after the revocation", body = crate::model::leave_balance::LeaveBalance),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "No balance record"),
        (status = 422, description = "Insufficient balance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn revoke_balance(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    payload: web::Json<BalanceAdjustment>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let balance = ctx.ledger().revoke(auth.actor()?, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Allocate a year's entitlements for an employee.
#[utoipa::path(
    post,
    path = "/api/v1/balance/initialize",
    request_body = InitializeBalances,
    responses(
        (status = 200, description = "Allocated balances", body = [crate::model::leave_balance::LeaveBalance]),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Unknown employee")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn initialize_balances(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    payload: web::Json<InitializeBalances>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let balances = ctx
        .ledger()
        .initialize_balances(auth.actor()?, payload.employee_id, payload.year, payload.joined_on)
        .await?;
    Ok(HttpResponse::Ok().json(balances))
}

/// Year-end carry forward.
#[utoipa::path(
    post,
    path = "/api/v1/balance/carry-forward",
    request_body = CarryForward,
    responses(
        (status = 200, description = "Rows carried and expired", body = crate::service::ledger::CarryForwardReport),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn carry_forward(
    auth: AuthUser,
    ctx: web::Data<LeaveContext>,
    payload: web::Json<CarryForward>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let report = ctx
        .ledger()
        .carry_forward(auth.actor()?, payload.from_year)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}
