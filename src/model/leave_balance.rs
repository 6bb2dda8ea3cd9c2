use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{LeaveError, LeaveResult};

/// Composite identity of a balance row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct BalanceKey {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "CL")]
    pub leave_type_code: String,
    #[schema(example = 2026)]
    pub year: i32,
}

impl BalanceKey {
    pub fn new(employee_id: u64, leave_type_code: impl Into<String>, year: i32) -> Self {
        Self {
            employee_id,
            leave_type_code: leave_type_code.into(),
            year,
        }
    }
}

/// The seven amounts tracked per balance row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BalanceAmounts {
    #[schema(value_type = String, example = "12")]
    pub allocated: Decimal,
    #[schema(value_type = String, example = "3")]
    pub used: Decimal,
    #[schema(value_type = String, example = "0")]
    pub pending: Decimal,
    #[schema(value_type = String, example = "9")]
    pub available: Decimal,
    #[schema(value_type = String, example = "0")]
    pub carried_forward: Decimal,
    #[schema(value_type = String, example = "0")]
    pub expired: Decimal,
    #[schema(value_type = String, example = "0")]
    pub encashed: Decimal,
}

impl BalanceAmounts {
    /// `allocated + carried_forward - used - pending - expired - encashed`
    pub fn derived_available(&self) -> Decimal {
        self.allocated + self.carried_forward - self.used - self.pending - self.expired - self.encashed
    }
}

/// A per employee / leave type / year balance.
///
/// The amounts are private: the transition methods below are the only way to
/// change them, and every one of them keeps `available` equal to
/// [`BalanceAmounts::derived_available`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveBalance {
    #[serde(flatten)]
    key: BalanceKey,
    #[serde(flatten)]
    amounts: BalanceAmounts,
}

impl LeaveBalance {
    /// A zeroed row.
    pub fn open(key: BalanceKey) -> Self {
        Self {
            key,
            amounts: BalanceAmounts::default(),
        }
    }

    /// Rebuild a row from persisted amounts.
    pub fn restore(key: BalanceKey, amounts: BalanceAmounts) -> Self {
        Self { key, amounts }
    }

    pub fn key(&self) -> &BalanceKey {
        &self.key
    }

    pub fn amounts(&self) -> &BalanceAmounts {
        &self.amounts
    }

    pub fn available(&self) -> Decimal {
        self.amounts.available
    }

    pub fn is_consistent(&self) -> bool {
        self.amounts.available == self.amounts.derived_available() && self.amounts.pending >= Decimal::ZERO
    }

    /// `pending += days; available -= days`
    pub fn reserve(&mut self, days: Decimal, allow_negative: bool) -> LeaveResult<()> {
        ensure_positive(days)?;
        if !allow_negative && self.amounts.available < days {
            return Err(self.insufficient(days));
        }
        self.amounts.pending += days;
        self.amounts.available -= days;
        Ok(())
    }

    /// `pending -= days; used += days`
    pub fn commit(&mut self, days: Decimal) -> LeaveResult<()> {
        ensure_positive(days)?;
        self.ensure_pending(days)?;
        self.amounts.pending -= days;
        self.amounts.used += days;
        Ok(())
    }

    /// `pending -= days; available += days`
    pub fn release(&mut self, days: Decimal) -> LeaveResult<()> {
        ensure_positive(days)?;
        self.ensure_pending(days)?;
        self.amounts.pending -= days;
        self.amounts.available += days;
        Ok(())
    }

    /// `used -= days; available += days`
    pub fn refund_used(&mut self, days: Decimal) -> LeaveResult<()> {
        ensure_positive(days)?;
        if self.amounts.used < days {
            return Err(LeaveError::invalid_state(format!(
                "cannot refund {days} days, only {} used",
                self.amounts.used
            )));
        }
        self.amounts.used -= days;
        self.amounts.available += days;
        Ok(())
    }

    /// `allocated += days; available += days`
    pub fn grant(&mut self, days: Decimal) -> LeaveResult<()> {
        ensure_positive(days)?;
        self.amounts.allocated += days;
        self.amounts.available += days;
        Ok(())
    }

    /// `allocated -= days; available -= days`, never below zero available.
    pub fn revoke(&mut self, days: Decimal) -> LeaveResult<()> {
        ensure_positive(days)?;
        if self.amounts.available < days {
            return Err(self.insufficient(days));
        }
        self.amounts.allocated -= days;
        self.amounts.available -= days;
        Ok(())
    }

    /// Absolute allocation; `available` is recomputed from the other fields.
    pub fn set_allocation(&mut self, allocated: Decimal) -> LeaveResult<()> {
        if allocated < Decimal::ZERO {
            return Err(LeaveError::validation("allocated cannot be negative"));
        }
        self.amounts.allocated = allocated;
        self.amounts.available = self.amounts.derived_available();
        Ok(())
    }

    /// Absolute carry-forward; `available` moves by the difference and may
    /// only go below zero when the type allows a negative balance.
    pub fn set_carried_forward(&mut self, carried: Decimal, allow_negative: bool) -> LeaveResult<()> {
        if carried < Decimal::ZERO {
            return Err(LeaveError::validation("carried forward cannot be negative"));
        }
        let available = self.amounts.available + carried - self.amounts.carried_forward;
        if !allow_negative && available < Decimal::ZERO {
            return Err(self.insufficient(self.amounts.carried_forward - carried));
        }
        self.amounts.available = available;
        self.amounts.carried_forward = carried;
        Ok(())
    }

    /// `expired += days; available -= days`
    pub fn expire(&mut self, days: Decimal) -> LeaveResult<()> {
        ensure_positive(days)?;
        if self.amounts.available < days {
            return Err(self.insufficient(days));
        }
        self.amounts.expired += days;
        self.amounts.available -= days;
        Ok(())
    }

    fn ensure_pending(&self, days: Decimal) -> LeaveResult<()> {
        if self.amounts.pending < days {
            return Err(LeaveError::invalid_state(format!(
                "cannot settle {days} days, only {} pending",
                self.amounts.pending
            )));
        }
        Ok(())
    }

    fn insufficient(&self, requested: Decimal) -> LeaveError {
        LeaveError::InsufficientBalance {
            available: self.amounts.available,
            requested,
        }
    }
}

fn ensure_positive(days: Decimal) -> LeaveResult<()> {
    if days <= Decimal::ZERO {
        return Err(LeaveError::validation("days must be greater than zero"));
    }
    Ok(())
}
