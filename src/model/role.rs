use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    System = 4,
    ApiUser = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::System),
            5 => Some(Role::ApiUser),
            _ => None,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Roles allowed to run administrative leave operations.
    pub fn is_hr_or_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}

/// The person performing a leave operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Actor {
    pub employee_id: u64,
    pub role: Role,
}

impl Actor {
    pub fn new(employee_id: u64, role: Role) -> Self {
        Self { employee_id, role }
    }

    pub fn require_hr_or_admin(&self) -> crate::error::LeaveResult<()> {
        if self.role.is_hr_or_admin() {
            Ok(())
        } else {
            Err(crate::error::LeaveError::forbidden("HR/Admin only"))
        }
    }
}
