use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Append-only record of one policy processing run for one leave type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveProcessHistory {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "IND")]
    pub region: String,
    #[schema(example = "FTE")]
    pub employment_type: String,
    #[schema(example = 4)]
    pub process_month: u32,
    #[schema(example = 2025)]
    pub process_year: i32,
    #[schema(example = "CL")]
    pub leave_type_code: String,
    /// Negative for special removals.
    #[schema(example = "0.75", value_type = String)]
    pub days_processed: Decimal,
    #[schema(example = 50)]
    pub employees_count: u32,
    #[schema(example = 1)]
    pub processed_by: u64,
    pub comments: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProcessHistory {
    pub region: String,
    pub employment_type: String,
    pub process_month: u32,
    pub process_year: i32,
    pub leave_type_code: String,
    pub days_processed: Decimal,
    pub employees_count: u32,
    pub processed_by: u64,
    pub comments: Option<String>,
}

impl NewProcessHistory {
    pub fn into_history(self, id: u64, processed_at: DateTime<Utc>) -> LeaveProcessHistory {
        LeaveProcessHistory {
            id,
            region: self.region,
            employment_type: self.employment_type,
            process_month: self.process_month,
            process_year: self.process_year,
            leave_type_code: self.leave_type_code,
            days_processed: self.days_processed,
            employees_count: self.employees_count,
            processed_by: self.processed_by,
            comments: self.comments,
            processed_at,
        }
    }
}

/// History lookup; every field narrows the result when present.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct HistoryFilter {
    #[schema(example = "IND")]
    pub region: Option<String>,
    #[schema(example = "FTE")]
    pub employment_type: Option<String>,
    #[schema(example = 4)]
    pub month: Option<u32>,
    #[schema(example = 2025)]
    pub year: Option<i32>,
}

impl HistoryFilter {
    pub fn cohort(region: &str, employment_type: &str, month: u32, year: i32) -> Self {
        Self {
            region: Some(region.to_string()),
            employment_type: Some(employment_type.to_string()),
            month: Some(month),
            year: Some(year),
        }
    }

    pub fn matches(&self, row: &LeaveProcessHistory) -> bool {
        self.region.as_deref().is_none_or(|r| r.eq_ignore_ascii_case(&row.region))
            && self
                .employment_type
                .as_deref()
                .is_none_or(|t| t.eq_ignore_ascii_case(&row.employment_type))
            && self.month.is_none_or(|m| m == row.process_month)
            && self.year.is_none_or(|y| y == row.process_year)
    }
}
