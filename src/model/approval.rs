use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// One approver's decision slot on a leave request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Approval {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub leave_request_id: u64,
    #[schema(example = 2000)]
    pub approver_employee_id: u64,
    #[schema(example = 1)]
    pub level: u32,
    pub status: ApprovalStatus,
    pub comments: Option<String>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub approved_date: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub rejected_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Approval {
    /// Still waiting on this approver.
    pub fn is_open(&self) -> bool {
        self.is_active && self.status == ApprovalStatus::Pending
    }

    pub fn approve(&mut self, comments: Option<String>, at: DateTime<Utc>) {
        self.status = ApprovalStatus::Approved;
        self.comments = comments;
        self.approved_date = Some(at);
    }

    pub fn reject(&mut self, comments: Option<String>, at: DateTime<Utc>) {
        self.status = ApprovalStatus::Rejected;
        self.comments = comments;
        self.rejected_date = Some(at);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewApproval {
    pub leave_request_id: u64,
    pub approver_employee_id: u64,
    pub level: u32,
}

impl NewApproval {
    pub fn level_one(leave_request_id: u64, approver_employee_id: u64) -> Self {
        Self {
            leave_request_id,
            approver_employee_id,
            level: 1,
        }
    }

    pub fn into_approval(self, id: u64) -> Approval {
        Approval {
            id,
            leave_request_id: self.leave_request_id,
            approver_employee_id: self.approver_employee_id,
            level: self.level,
            status: ApprovalStatus::Pending,
            comments: None,
            approved_date: None,
            rejected_date: None,
            is_active: true,
        }
    }
}
