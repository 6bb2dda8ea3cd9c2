//! Balance ledger.
//!
//! The free functions are the transaction-scoped transitions the request and
//! policy services compose into their own units of work. [`BalanceLedger`]
//! wraps the administrative operations that stand on their own.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::{LeaveContext, actions, calendar};
use crate::error::{LeaveError, LeaveResult};
use crate::external::AuditEntry;
use crate::model::leave_balance::{BalanceKey, LeaveBalance};
use crate::model::role::Actor;
use crate::store::LeaveTx;

/// Load, mutate and write back one balance row under the transaction's lock.
async fn apply<F>(
    tx: &mut dyn LeaveTx,
    key: &BalanceKey,
    create_if_missing: bool,
    op: F,
) -> LeaveResult<LeaveBalance>
where
    F: FnOnce(&mut LeaveBalance) -> LeaveResult<()> + Send,
{
    let mut balance = if create_if_missing {
        tx.balance_or_open(key).await?
    } else {
        tx.balance(key)
            .await?
            .ok_or_else(|| LeaveError::NoBalanceRecord(key.clone()))?
    };
    op(&mut balance)?;
    debug_assert!(balance.is_consistent());
    tx.put_balance(&balance).await?;
    Ok(balance)
}

/// Fails unless `days` could be reserved right now.
pub(crate) async fn ensure_available(
    tx: &mut dyn LeaveTx,
    key: &BalanceKey,
    days: Decimal,
    allow_negative: bool,
) -> LeaveResult<()> {
    match tx.balance(key).await? {
        Some(balance) if allow_negative || balance.available() >= days => Ok(()),
        Some(balance) => Err(LeaveError::InsufficientBalance {
            available: balance.available(),
            requested: days,
        }),
        None if allow_negative => Ok(()),
        None => Err(LeaveError::NoBalanceRecord(key.clone())),
    }
}

pub(crate) async fn reserve(
    tx: &mut dyn LeaveTx,
    key: &BalanceKey,
    days: Decimal,
    allow_negative: bool,
) -> LeaveResult<LeaveBalance> {
    let balance = apply(tx, key, allow_negative, |b| b.reserve(days, allow_negative)).await?;
    debug!(employee_id = key.employee_id, code = %key.leave_type_code, %days, "Reserved leave days");
    Ok(balance)
}

pub(crate) async fn commit(tx: &mut dyn LeaveTx, key: &BalanceKey, days: Decimal) -> LeaveResult<LeaveBalance> {
    let balance = apply(tx, key, false, |b| b.commit(days)).await?;
    debug!(employee_id = key.employee_id, code = %key.leave_type_code, %days, "Committed leave days");
    Ok(balance)
}

pub(crate) async fn release(tx: &mut dyn LeaveTx, key: &BalanceKey, days: Decimal) -> LeaveResult<LeaveBalance> {
    let balance = apply(tx, key, false, |b| b.release(days)).await?;
    debug!(employee_id = key.employee_id, code = %key.leave_type_code, %days, "Released leave days");
    Ok(balance)
}

pub(crate) async fn refund_used(
    tx: &mut dyn LeaveTx,
    key: &BalanceKey,
    days: Decimal,
) -> LeaveResult<LeaveBalance> {
    apply(tx, key, false, |b| b.refund_used(days)).await
}

pub(crate) async fn grant(tx: &mut dyn LeaveTx, key: &BalanceKey, days: Decimal) -> LeaveResult<LeaveBalance> {
    apply(tx, key, true, |b| b.grant(days)).await
}

pub(crate) async fn revoke(tx: &mut dyn LeaveTx, key: &BalanceKey, days: Decimal) -> LeaveResult<LeaveBalance> {
    apply(tx, key, false, |b| b.revoke(days)).await
}

pub(crate) async fn upsert_allocation(
    tx: &mut dyn LeaveTx,
    key: &BalanceKey,
    allocated: Decimal,
) -> LeaveResult<LeaveBalance> {
    apply(tx, key, true, |b| b.set_allocation(allocated)).await
}

/// Admin-facing balance adjustment.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BalanceAdjustment {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "CL")]
    pub leave_type_code: String,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(value_type = String, example = "2")]
    pub days: Decimal,
}

impl BalanceAdjustment {
    fn key(&self) -> BalanceKey {
        BalanceKey::new(self.employee_id, self.leave_type_code.clone(), self.year)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CarryForwardLine {
    pub employee_id: u64,
    pub leave_type_code: String,
    #[schema(value_type = String)]
    pub carried: Decimal,
    #[schema(value_type = String)]
    pub expired: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CarryForwardReport {
    pub from_year: i32,
    pub to_year: i32,
    pub rows_examined: usize,
    pub lines: Vec<CarryForwardLine>,
}

pub struct BalanceLedger<'a> {
    ctx: &'a LeaveContext,
}

impl<'a> BalanceLedger<'a> {
    pub fn new(ctx: &'a LeaveContext) -> Self {
        Self { ctx }
    }

    pub async fn balance(&self, key: &BalanceKey) -> LeaveResult<LeaveBalance> {
        self.ctx
            .store
            .find_balance(key)
            .await?
            .ok_or_else(|| LeaveError::NoBalanceRecord(key.clone()))
    }

    pub async fn balances(&self, employee_id: u64, year: i32) -> LeaveResult<Vec<LeaveBalance>> {
        self.ctx.store.balances_for(employee_id, year).await
    }

    pub async fn grant(&self, actor: Actor, adjustment: BalanceAdjustment) -> LeaveResult<LeaveBalance> {
        actor.require_hr_or_admin()?;
        self.ctx.leave_type(&adjustment.leave_type_code).await?;
        self.ctx.employee(adjustment.employee_id).await?;

        let key = adjustment.key();
        let mut tx = self.ctx.store.begin().await?;
        let before = tx.balance(&key).await?;
        let after = grant(tx.as_mut(), &key, adjustment.days).await?;
        tx.commit().await?;

        info!(employee_id = key.employee_id, code = %key.leave_type_code, days = %adjustment.days, "Leave balance granted");
        self.ctx
            .record(
                AuditEntry::new(actions::BALANCE_GRANT, "leave_balance", balance_id(&key), actor.employee_id)
                    .before(before)
                    .after(&after),
            )
            .await;
        Ok(after)
    }

    pub async fn revoke(&self, actor: Actor, adjustment: BalanceAdjustment) -> LeaveResult<LeaveBalance> {
        actor.require_hr_or_admin()?;

        let key = adjustment.key();
        let mut tx = self.ctx.store.begin().await?;
        let before = tx.balance(&key).await?;
        let after = revoke(tx.as_mut(), &key, adjustment.days).await?;
        tx.commit().await?;

        info!(employee_id = key.employee_id, code = %key.leave_type_code, days = %adjustment.days, "Leave balance revoked");
        self.ctx
            .record(
                AuditEntry::new(actions::BALANCE_REVOKE, "leave_balance", balance_id(&key), actor.employee_id)
                    .before(before)
                    .after(&after),
            )
            .await;
        Ok(after)
    }

    /// Set `allocated` absolutely. Unlike [`BalanceLedger::grant`] this does
    /// not add to the existing allocation.
    pub async fn upsert_allocation(
        &self,
        actor: Actor,
        key: BalanceKey,
        allocated: Decimal,
    ) -> LeaveResult<LeaveBalance> {
        actor.require_hr_or_admin()?;
        self.ctx.leave_type(&key.leave_type_code).await?;
        self.ctx.employee(key.employee_id).await?;

        let mut tx = self.ctx.store.begin().await?;
        let before = tx.balance(&key).await?;
        let after = upsert_allocation(tx.as_mut(), &key, allocated).await?;
        tx.commit().await?;

        self.ctx
            .record(
                AuditEntry::new(actions::BALANCE_ALLOCATE, "leave_balance", balance_id(&key), actor.employee_id)
                    .before(before)
                    .after(&after),
            )
            .await;
        Ok(after)
    }

    /// Allocate every applicable leave type's annual entitlement for `year`,
    /// pro-rated for employees who joined during that fiscal year.
    pub async fn initialize_balances(
        &self,
        actor: Actor,
        employee_id: u64,
        year: i32,
        joined_on: Option<NaiveDate>,
    ) -> LeaveResult<Vec<LeaveBalance>> {
        actor.require_hr_or_admin()?;
        let employee = self.ctx.employee(employee_id).await?;
        let leave_types = self.ctx.catalog.list().await?;

        let mut tx = self.ctx.store.begin().await?;
        let mut allocated = Vec::new();
        for leave_type in leave_types
            .iter()
            .filter(|t| t.region.applies_to(employee.region) && t.annual_allocation > Decimal::ZERO)
        {
            let amount = calendar::prorated_allocation(
                leave_type.annual_allocation,
                employee.region,
                year,
                joined_on,
            );
            let key = BalanceKey::new(employee_id, leave_type.code.clone(), year);
            allocated.push(upsert_allocation(tx.as_mut(), &key, amount).await?);
        }
        tx.commit().await?;

        info!(employee_id, year, types = allocated.len(), "Leave balances initialized");
        self.ctx
            .record(
                AuditEntry::new(actions::BALANCE_INITIALIZE, "employee", employee_id, actor.employee_id)
                    .after(&allocated),
            )
            .await;
        Ok(allocated)
    }

    /// Roll `from_year` balances into `from_year + 1`.
    ///
    /// Whatever is left in a `from_year` row leaves it: the carried part moves
    /// into the next year's `carried_forward`, the rest lapses, and the source
    /// row books both as `expired`. A second run finds nothing left to move.
    pub async fn carry_forward(&self, actor: Actor, from_year: i32) -> LeaveResult<CarryForwardReport> {
        actor.require_hr_or_admin()?;
        let policies: HashMap<String, _> = self
            .ctx
            .catalog
            .list()
            .await?
            .into_iter()
            .map(|t| (t.code.clone(), t))
            .collect();

        let to_year = from_year + 1;
        let mut tx = self.ctx.store.begin().await?;
        let rows = tx.balances_for_year(from_year).await?;
        let rows_examined = rows.len();
        let mut lines = Vec::new();

        for mut row in rows {
            let available = row.available();
            if available <= Decimal::ZERO {
                continue;
            }
            let Some(policy) = policies.get(&row.key().leave_type_code) else {
                warn!(code = %row.key().leave_type_code, "Balance row without leave type skipped");
                continue;
            };

            let mut carried = Decimal::ZERO;
            if policy.carry_forward_allowed {
                let next_key = BalanceKey::new(row.key().employee_id, row.key().leave_type_code.clone(), to_year);
                let mut next = tx.balance_or_open(&next_key).await?;
                let already = next.amounts().carried_forward;
                carried = policy
                    .max_carry_forward_days
                    .map_or(available, |cap| available.min((cap - already).max(Decimal::ZERO)));
                if carried > Decimal::ZERO {
                    next.set_carried_forward(already + carried, policy.allow_negative_balance)?;
                    debug_assert!(next.is_consistent());
                    tx.put_balance(&next).await?;
                }
            }
            let expired = available - carried;

            row.expire(available)?;
            tx.put_balance(&row).await?;

            lines.push(CarryForwardLine {
                employee_id: row.key().employee_id,
                leave_type_code: row.key().leave_type_code.clone(),
                carried,
                expired,
            });
        }
        tx.commit().await?;

        let report = CarryForwardReport {
            from_year,
            to_year,
            rows_examined,
            lines,
        };
        info!(from_year, rows = report.lines.len(), "Year-end carry forward complete");
        self.ctx
            .record(
                AuditEntry::new(actions::BALANCE_CARRY_FORWARD, "leave_balance", from_year, actor.employee_id)
                    .after(&report),
            )
            .await;
        Ok(report)
    }
}

fn balance_id(key: &BalanceKey) -> String {
    format!("{}:{}:{}", key.employee_id, key.leave_type_code, key.year)
}
