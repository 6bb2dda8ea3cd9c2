use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Region an employee belongs to; drives holidays and fiscal years.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Region {
    Ind,
    Us,
}

/// What the leave core needs to know about an employee.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeProfile {
    #[schema(example = 1000)]
    pub id: u64,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    pub manager_id: Option<u64>,
    pub region: Region,
    #[schema(example = "FTE")]
    pub employment_type: String,
    pub is_active: bool,
}
