use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::employee::Region;

/// Region applicability of a leave type. `All` applies everywhere.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LeaveRegion {
    All,
    Ind,
    Us,
}

impl LeaveRegion {
    pub fn applies_to(self, region: Region) -> bool {
        match self {
            LeaveRegion::All => true,
            LeaveRegion::Ind => region == Region::Ind,
            LeaveRegion::Us => region == Region::Us,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AccrualFrequency {
    None,
    Monthly,
    Yearly,
}

/// Policy for one leave type. Read-only from the leave core's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveType {
    #[schema(example = "CL")]
    pub code: String,
    #[schema(example = "Casual Leave")]
    pub name: String,
    #[schema(example = "GENERAL")]
    pub category: String,
    pub is_paid: bool,
    pub requires_approval: bool,
    #[schema(value_type = Option<String>, example = "5")]
    pub max_consecutive_days: Option<Decimal>,
    pub min_days_notice: i64,
    pub allow_half_day: bool,
    pub allow_negative_balance: bool,
    pub carry_forward_allowed: bool,
    #[schema(value_type = Option<String>)]
    pub max_carry_forward_days: Option<Decimal>,
    pub accrual_frequency: AccrualFrequency,
    #[schema(value_type = Option<String>)]
    pub accrual_rate: Option<Decimal>,
    #[schema(value_type = String, example = "12")]
    pub annual_allocation: Decimal,
    pub region: LeaveRegion,
    pub sort_order: i32,
}

/// Fixed codes credited by standard policy runs.
pub const CASUAL_LEAVE: &str = "CL";
pub const PRIVILEGE_LEAVE: &str = "PL";
pub const PLANNED_TIME_OFF: &str = "PTO";
pub const BEREAVEMENT_LEAVE: &str = "BL";
