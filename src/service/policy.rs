//! Bulk crediting of leave days to employee cohorts.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{LeaveContext, actions, calendar, ledger};
use crate::error::{LeaveError, LeaveResult};
use crate::external::AuditEntry;
use crate::model::employee::Region;
use crate::model::leave_balance::{BalanceKey, LeaveBalance};
use crate::model::leave_type::{BEREAVEMENT_LEAVE, CASUAL_LEAVE, PLANNED_TIME_OFF, PRIVILEGE_LEAVE};
use crate::model::process_history::{HistoryFilter, LeaveProcessHistory, NewProcessHistory};
use crate::model::role::Actor;

/// Region and employment type recorded for runs that span cohorts.
const ALL_COHORTS: &str = "ALL";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProcessLeaves {
    pub region: Region,
    #[schema(example = "FTE")]
    pub employment_type: String,
    #[schema(example = 4)]
    pub month: u32,
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(value_type = Option<String>, example = "0.75")]
    pub casual_leave: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub privilege_leave: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub planned_time_off: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub bereavement_leave: Option<Decimal>,
    pub comments: Option<String>,
}

impl ProcessLeaves {
    /// Supplied `(code, days)` pairs in CL, PL, PTO, BL order.
    fn credits(&self) -> LeaveResult<Vec<(&'static str, Decimal)>> {
        let supplied = [
            (CASUAL_LEAVE, self.casual_leave),
            (PRIVILEGE_LEAVE, self.privilege_leave),
            (PLANNED_TIME_OFF, self.planned_time_off),
            (BEREAVEMENT_LEAVE, self.bereavement_leave),
        ];
        let mut credits = Vec::new();
        for (code, days) in supplied {
            match days {
                Some(days) if days <= Decimal::ZERO => {
                    return Err(LeaveError::validation(format!("{code} days must be positive")));
                }
                Some(days) => credits.push((code, days)),
                None => {}
            }
        }
        if credits.is_empty() {
            return Err(LeaveError::validation("at least one leave amount is required"));
        }
        Ok(credits)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreditedLeave {
    pub leave_type_code: String,
    #[schema(value_type = String)]
    pub days: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessLeavesReport {
    /// A previous run exists for the same cohort and period. It does not
    /// stop this run from crediting again.
    pub already_processed: bool,
    pub employees_count: u32,
    pub credited_year: i32,
    pub processed: Vec<CreditedLeave>,
    pub history: Vec<LeaveProcessHistory>,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SpecialLeaveAction {
    Add,
    Remove,
}

impl SpecialLeaveAction {
    fn signed(self, days: Decimal) -> Decimal {
        match self {
            SpecialLeaveAction::Add => days,
            SpecialLeaveAction::Remove => -days,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SpecialLeave {
    pub employee_id: u64,
    #[schema(example = "BL")]
    pub leave_type_code: String,
    #[schema(value_type = String, example = "2")]
    pub days: Decimal,
    pub action: SpecialLeaveAction,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkSpecialLeave {
    pub employee_ids: Vec<u64>,
    #[schema(example = "BL")]
    pub leave_type_code: String,
    #[schema(value_type = String, example = "2")]
    pub days: Decimal,
    pub action: SpecialLeaveAction,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpecialLeaveOutcome {
    pub balance: LeaveBalance,
    pub history: LeaveProcessHistory,
}

/// Partial-failure summary of a bulk special leave run.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SpecialLeaveReport {
    pub processed: Vec<u64>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub history: Option<LeaveProcessHistory>,
}

pub struct PolicyProcessor<'a> {
    ctx: &'a LeaveContext,
}

impl<'a> PolicyProcessor<'a> {
    pub fn new(ctx: &'a LeaveContext) -> Self {
        Self { ctx }
    }

    /// Credit each supplied amount to every active employee of the cohort.
    ///
    /// Days land in the balances of the cohort region's current fiscal year;
    /// `month` and `year` only label the history rows.
    #[instrument(skip(self, input), fields(region = %input.region, employment_type = %input.employment_type, month = input.month, year = input.year))]
    pub async fn process_leaves(&self, actor: Actor, input: ProcessLeaves) -> LeaveResult<ProcessLeavesReport> {
        actor.require_hr_or_admin()?;
        if !(1..=12).contains(&input.month) {
            return Err(LeaveError::validation("month must be between 1 and 12"));
        }
        let credits = input.credits()?;
        for (code, _) in &credits {
            self.ctx.leave_type(code).await?;
        }

        let cohort = self
            .ctx
            .employees
            .active_cohort(input.region, &input.employment_type)
            .await?;
        if cohort.is_empty() {
            return Err(LeaveError::NoEligibleEmployees);
        }
        let employees_count = cohort.len() as u32;
        let credited_year = calendar::balance_year(input.region, Utc::now().date_naive());

        let mut tx = self.ctx.store.begin().await?;
        let prior = tx
            .history(&HistoryFilter::cohort(
                input.region.as_ref(),
                &input.employment_type,
                input.month,
                input.year,
            ))
            .await?;
        let already_processed = !prior.is_empty();

        let mut history = Vec::with_capacity(credits.len());
        for (code, days) in &credits {
            for employee in &cohort {
                let key = BalanceKey::new(employee.id, *code, credited_year);
                ledger::grant(tx.as_mut(), &key, *days).await?;
            }
            let row = tx
                .insert_history(NewProcessHistory {
                    region: input.region.to_string(),
                    employment_type: input.employment_type.clone(),
                    process_month: input.month,
                    process_year: input.year,
                    leave_type_code: code.to_string(),
                    days_processed: *days,
                    employees_count,
                    processed_by: actor.employee_id,
                    comments: input.comments.clone(),
                })
                .await?;
            history.push(row);
        }
        tx.commit().await?;

        let report = ProcessLeavesReport {
            already_processed,
            employees_count,
            credited_year,
            processed: credits
                .iter()
                .map(|(code, days)| CreditedLeave {
                    leave_type_code: code.to_string(),
                    days: *days,
                })
                .collect(),
            history,
        };
        info!(employees_count, already_processed, "Leave policy processed");
        self.ctx
            .record(
                AuditEntry::new(
                    actions::POLICY_PROCESS,
                    "leave_process_history",
                    format!("{}:{}:{}-{:02}", input.region, input.employment_type, input.year, input.month),
                    actor.employee_id,
                )
                .after(&report.processed),
            )
            .await;
        Ok(report)
    }

    /// Grant or revoke days for one employee. Every failure propagates.
    pub async fn process_special_leave(&self, actor: Actor, input: SpecialLeave) -> LeaveResult<SpecialLeaveOutcome> {
        actor.require_hr_or_admin()?;
        ensure_positive_days(input.days)?;
        let leave_type = self.ctx.leave_type(&input.leave_type_code).await?;
        let employee = self.ctx.employee(input.employee_id).await?;
        if !employee.is_active {
            return Err(LeaveError::validation(format!("employee {} is not active", employee.id)));
        }

        let now = Utc::now();
        let year = calendar::balance_year(employee.region, now.date_naive());
        let key = BalanceKey::new(employee.id, leave_type.code.clone(), year);
        let mut tx = self.ctx.store.begin().await?;
        let balance = match input.action {
            SpecialLeaveAction::Add => ledger::grant(tx.as_mut(), &key, input.days).await?,
            SpecialLeaveAction::Remove => ledger::revoke(tx.as_mut(), &key, input.days).await?,
        };
        let history = tx
            .insert_history(NewProcessHistory {
                region: employee.region.to_string(),
                employment_type: employee.employment_type.clone(),
                process_month: now.month(),
                process_year: now.year(),
                leave_type_code: leave_type.code.clone(),
                days_processed: input.action.signed(input.days),
                employees_count: 1,
                processed_by: actor.employee_id,
                comments: input.comments,
            })
            .await?;
        tx.commit().await?;

        info!(employee_id = employee.id, code = %leave_type.code, action = %input.action, days = %input.days, "Special leave processed");
        let outcome = SpecialLeaveOutcome { balance, history };
        self.ctx
            .record(
                AuditEntry::new(actions::SPECIAL_LEAVE, "leave_balance", employee.id, actor.employee_id)
                    .after(&outcome),
            )
            .await;
        Ok(outcome)
    }

    /// Bulk form of [`PolicyProcessor::process_special_leave`]. Per-employee
    /// failures are collected and the remaining employees still processed.
    pub async fn process_special_leave_bulk(
        &self,
        actor: Actor,
        input: BulkSpecialLeave,
    ) -> LeaveResult<SpecialLeaveReport> {
        actor.require_hr_or_admin()?;
        ensure_positive_days(input.days)?;
        if input.employee_ids.is_empty() {
            return Err(LeaveError::validation("employee_ids must not be empty"));
        }
        let leave_type = self.ctx.leave_type(&input.leave_type_code).await?;

        let now = Utc::now();
        let mut report = SpecialLeaveReport::default();
        let mut tx = self.ctx.store.begin().await?;

        for &employee_id in &input.employee_ids {
            let employee = match self.ctx.employees.get(employee_id).await? {
                None => {
                    report.errors.push(format!("employee {employee_id} not found"));
                    continue;
                }
                Some(employee) if !employee.is_active => {
                    report.errors.push(format!("employee {employee_id} is not active"));
                    continue;
                }
                Some(employee) => employee,
            };

            let year = calendar::balance_year(employee.region, now.date_naive());
            let key = BalanceKey::new(employee_id, leave_type.code.clone(), year);
            let result = match input.action {
                SpecialLeaveAction::Add => {
                    if tx.balance(&key).await?.is_none() {
                        report.warnings.push(format!(
                            "employee {employee_id}: created {} balance for {}",
                            key.leave_type_code, key.year
                        ));
                    }
                    ledger::grant(tx.as_mut(), &key, input.days).await
                }
                SpecialLeaveAction::Remove => ledger::revoke(tx.as_mut(), &key, input.days).await,
            };
            match result {
                Ok(_) => report.processed.push(employee_id),
                Err(e @ LeaveError::Storage(_)) => return Err(e),
                Err(e) => report.errors.push(format!("employee {employee_id}: {e}")),
            }
        }

        if !report.processed.is_empty() {
            let row = tx
                .insert_history(NewProcessHistory {
                    region: ALL_COHORTS.to_string(),
                    employment_type: ALL_COHORTS.to_string(),
                    process_month: now.month(),
                    process_year: now.year(),
                    leave_type_code: leave_type.code.clone(),
                    days_processed: input.action.signed(input.days),
                    employees_count: report.processed.len() as u32,
                    processed_by: actor.employee_id,
                    comments: input.comments.clone(),
                })
                .await?;
            report.history = Some(row);
        }
        tx.commit().await?;

        info!(
            code = %leave_type.code,
            action = %input.action,
            processed = report.processed.len(),
            errors = report.errors.len(),
            "Bulk special leave processed"
        );
        self.ctx
            .record(
                AuditEntry::new(actions::SPECIAL_LEAVE_BULK, "leave_balance", leave_type.code.as_str(), actor.employee_id)
                    .after(&report),
            )
            .await;
        Ok(report)
    }

    pub async fn history(&self, filter: &HistoryFilter) -> LeaveResult<Vec<LeaveProcessHistory>> {
        self.ctx.store.history(filter).await
    }
}

fn ensure_positive_days(days: Decimal) -> LeaveResult<()> {
    if days <= Decimal::ZERO {
        return Err(LeaveError::validation("days must be greater than zero"));
    }
    Ok(())
}
