use rust_decimal::Decimal;

use crate::model::leave_balance::BalanceKey;

/// Failure kinds surfaced by the leave services.
///
/// Every variant carries a stable message; the HTTP layer decides the status
/// code (see `api::error`).
#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("start_date cannot be after end_date")]
    InvalidDateRange,
    #[error("leave request overlaps existing request #{existing_id}")]
    OverlappingRequest { existing_id: u64 },
    #[error("insufficient leave balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("no eligible employees found for the selected criteria")]
    NoEligibleEmployees,
    #[error(
        "no leave balance record for employee {} ({}, {})",
        .0.employee_id,
        .0.leave_type_code,
        .0.year
    )]
    NoBalanceRecord(BalanceKey),
    #[error("storage error: {0}")]
    Storage(String),
}

impl LeaveError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

impl From<sqlx::Error> for LeaveError {
    fn from(value: sqlx::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

pub type LeaveResult<T> = Result<T, LeaveError>;
