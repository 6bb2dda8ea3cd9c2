//! Shared fixtures: an in-memory leave context with a small org chart.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use lms::external::memory::{
    MemoryCatalog, MemoryDirectory, MemoryHolidays, RecordingAudit, RecordingNotifier,
};
use lms::model::employee::{EmployeeProfile, Region};
use lms::model::leave_balance::{BalanceKey, LeaveBalance};
use lms::model::leave_type::{AccrualFrequency, LeaveRegion, LeaveType};
use lms::model::role::{Actor, Role};
use lms::service::LeaveContext;
use lms::service::lifecycle::CreateLeave;
use lms::store::{LeaveStore, LeaveTx};
use lms::store::memory::MemoryLeaveStore;

pub const EMPLOYEE: u64 = 1000;
pub const EMPLOYEE_2: u64 = 1001;
/// Reports to nobody.
pub const LONE_EMPLOYEE: u64 = 1002;
pub const INACTIVE_EMPLOYEE: u64 = 1003;
pub const MANAGER: u64 = 2000;
pub const SECOND_APPROVER: u64 = 3000;
pub const HR: u64 = 9100;
pub const ADMIN: u64 = 9000;

/// Leave type that skips approval.
pub const ON_DUTY: &str = "OD";
/// Leave type that may go negative.
pub const UNPAID: &str = "LWP";

pub struct Harness {
    pub ctx: LeaveContext,
    pub store: MemoryLeaveStore,
    pub directory: Arc<MemoryDirectory>,
    pub holidays: Arc<MemoryHolidays>,
    pub notifier: Arc<RecordingNotifier>,
    pub audit: Arc<RecordingAudit>,
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryLeaveStore::new();
        let catalog = Arc::new(MemoryCatalog::with_types(leave_types()));
        let directory = Arc::new(MemoryDirectory::default());
        let holidays = Arc::new(MemoryHolidays::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let audit = Arc::new(RecordingAudit::default());

        for profile in [
            employee(EMPLOYEE, Some(MANAGER)),
            employee(EMPLOYEE_2, Some(MANAGER)),
            employee(LONE_EMPLOYEE, None),
            EmployeeProfile {
                is_active: false,
                ..employee(INACTIVE_EMPLOYEE, Some(MANAGER))
            },
            employee(MANAGER, None),
            employee(SECOND_APPROVER, None),
            employee(HR, None),
            employee(ADMIN, None),
        ] {
            directory.upsert(profile);
        }

        let ctx = LeaveContext {
            store: Arc::new(store.clone()),
            catalog,
            employees: directory.clone(),
            holidays: holidays.clone(),
            notifier: notifier.clone(),
            audit: audit.clone(),
        };
        Self {
            ctx,
            store,
            directory,
            holidays,
            notifier,
            audit,
        }
    }

    /// Write a balance row with `allocated == available == days`.
    pub async fn seed(&self, employee_id: u64, code: &str, year: i32, days: Decimal) {
        let key = BalanceKey::new(employee_id, code, year);
        let mut balance = LeaveBalance::open(key);
        balance.set_allocation(days).expect("allocation");
        let mut tx = self.store.begin().await.expect("begin");
        tx.put_balance(&balance).await.expect("put");
        tx.commit().await.expect("commit");
    }

    pub async fn balance(&self, employee_id: u64, code: &str, year: i32) -> LeaveBalance {
        self.store
            .find_balance(&BalanceKey::new(employee_id, code, year))
            .await
            .expect("store")
            .expect("balance row")
    }
}

pub fn employee(id: u64, manager_id: Option<u64>) -> EmployeeProfile {
    EmployeeProfile {
        id,
        name: format!("Employee {id}"),
        email: format!("e{id}@company.com"),
        manager_id,
        region: Region::Ind,
        employment_type: "STAFF".to_string(),
        is_active: true,
    }
}

pub fn admin() -> Actor {
    Actor::new(ADMIN, Role::Admin)
}

pub fn hr() -> Actor {
    Actor::new(HR, Role::Hr)
}

pub fn staff(employee_id: u64) -> Actor {
    Actor::new(employee_id, Role::Employee)
}

/// Requests are placed in June of next year so notice periods never bite.
/// June sits inside both the April-March and the calendar fiscal year, so the
/// balance row is keyed by this year in every region.
pub fn leave_year() -> i32 {
    Utc::now().year() + 1
}

/// `offset` days after 2 June of [`leave_year`] (a weekday-agnostic anchor).
pub fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(leave_year(), 6, 2).expect("date") + Duration::days(offset)
}

pub fn leave(code: &str, start: NaiveDate, end: NaiveDate) -> CreateLeave {
    CreateLeave {
        leave_type_code: code.to_string(),
        start_date: start,
        end_date: end,
        total_days: None,
        is_half_day: false,
        half_day_type: None,
        reason: "Family trip".to_string(),
        contact_during_leave: None,
        emergency_contact: None,
        is_draft: false,
    }
}

pub fn draft(code: &str, start: NaiveDate, end: NaiveDate) -> CreateLeave {
    CreateLeave {
        is_draft: true,
        ..leave(code, start, end)
    }
}

fn leave_type(code: &str, name: &str) -> LeaveType {
    LeaveType {
        code: code.to_string(),
        name: name.to_string(),
        category: "GENERAL".to_string(),
        is_paid: true,
        requires_approval: true,
        max_consecutive_days: None,
        min_days_notice: 0,
        allow_half_day: true,
        allow_negative_balance: false,
        carry_forward_allowed: false,
        max_carry_forward_days: None,
        accrual_frequency: AccrualFrequency::Yearly,
        accrual_rate: None,
        annual_allocation: Decimal::ZERO,
        region: LeaveRegion::All,
        sort_order: 0,
    }
}

pub fn leave_types() -> Vec<LeaveType> {
    vec![
        LeaveType {
            max_consecutive_days: Some(dec!(5)),
            annual_allocation: dec!(12),
            sort_order: 1,
            ..leave_type("CL", "Casual Leave")
        },
        LeaveType {
            min_days_notice: 7,
            allow_half_day: false,
            carry_forward_allowed: true,
            max_carry_forward_days: Some(dec!(5)),
            annual_allocation: dec!(15),
            sort_order: 2,
            ..leave_type("PL", "Privilege Leave")
        },
        LeaveType {
            region: LeaveRegion::Us,
            annual_allocation: dec!(20),
            sort_order: 3,
            ..leave_type("PTO", "Planned Time Off")
        },
        LeaveType {
            accrual_frequency: AccrualFrequency::None,
            sort_order: 4,
            ..leave_type("BL", "Bereavement Leave")
        },
        LeaveType {
            is_paid: false,
            allow_negative_balance: true,
            accrual_frequency: AccrualFrequency::None,
            sort_order: 5,
            ..leave_type(UNPAID, "Leave Without Pay")
        },
        LeaveType {
            requires_approval: false,
            accrual_frequency: AccrualFrequency::None,
            sort_order: 6,
            ..leave_type(ON_DUTY, "On Duty")
        },
    ]
}

/// First Monday on or after `date`.
pub fn monday_from(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as i64;
    if back == 0 {
        date
    } else {
        date + Duration::days(7 - back)
    }
}
