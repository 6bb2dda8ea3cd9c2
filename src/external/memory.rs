//! In-process collaborators for tests and local runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{
    AuditEntry, AuditError, AuditSink, EmployeeDirectory, HolidayCalendar, LeaveNotification,
    LeaveTypeCatalog, Notifier, NotifyError,
};
use crate::error::LeaveResult;
use crate::model::employee::{EmployeeProfile, Region};
use crate::model::leave_type::LeaveType;

#[derive(Default)]
pub struct MemoryCatalog {
    types: RwLock<BTreeMap<String, LeaveType>>,
}

impl MemoryCatalog {
    pub fn with_types(types: impl IntoIterator<Item = LeaveType>) -> Self {
        let catalog = Self::default();
        for leave_type in types {
            catalog.upsert(leave_type);
        }
        catalog
    }

    pub fn upsert(&self, leave_type: LeaveType) {
        self.types
            .write()
            .expect("catalog lock poisoned")
            .insert(leave_type.code.clone(), leave_type);
    }
}

#[async_trait]
impl LeaveTypeCatalog for MemoryCatalog {
    async fn get(&self, code: &str) -> LeaveResult<Option<LeaveType>> {
        Ok(self
            .types
            .read()
            .expect("catalog lock poisoned")
            .get(code)
            .cloned())
    }

    async fn list(&self) -> LeaveResult<Vec<LeaveType>> {
        let mut types: Vec<_> = self
            .types
            .read()
            .expect("catalog lock poisoned")
            .values()
            .cloned()
            .collect();
        types.sort_by_key(|t| t.sort_order);
        Ok(types)
    }
}

#[derive(Default)]
pub struct MemoryDirectory {
    employees: RwLock<BTreeMap<u64, EmployeeProfile>>,
}

impl MemoryDirectory {
    pub fn upsert(&self, employee: EmployeeProfile) {
        self.employees
            .write()
            .expect("directory lock poisoned")
            .insert(employee.id, employee);
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryDirectory {
    async fn get(&self, employee_id: u64) -> LeaveResult<Option<EmployeeProfile>> {
        Ok(self
            .employees
            .read()
            .expect("directory lock poisoned")
            .get(&employee_id)
            .cloned())
    }

    async fn active_cohort(
        &self,
        region: Region,
        employment_type: &str,
    ) -> LeaveResult<Vec<EmployeeProfile>> {
        Ok(self
            .employees
            .read()
            .expect("directory lock poisoned")
            .values()
            .filter(|e| {
                e.is_active
                    && e.region == region
                    && e.employment_type.eq_ignore_ascii_case(employment_type)
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryHolidays {
    days: RwLock<HashMap<Region, Vec<NaiveDate>>>,
}

impl MemoryHolidays {
    pub fn add(&self, region: Region, date: NaiveDate) {
        self.days
            .write()
            .expect("holiday lock poisoned")
            .entry(region)
            .or_default()
            .push(date);
    }
}

#[async_trait]
impl HolidayCalendar for MemoryHolidays {
    async fn list_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        region: Region,
    ) -> LeaveResult<Vec<NaiveDate>> {
        let days = self.days.read().expect("holiday lock poisoned");
        let mut found: Vec<_> = days
            .get(&region)
            .map(|dates| {
                dates
                    .iter()
                    .copied()
                    .filter(|d| *d >= start && *d <= end)
                    .collect()
            })
            .unwrap_or_default();
        found.sort();
        Ok(found)
    }
}

/// Keeps every notification; can be switched to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<LeaveNotification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<LeaveNotification> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }

    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: LeaveNotification) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError("smtp relay unavailable".to_string()));
        }
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push(notification);
        Ok(())
    }
}

/// Keeps every audit entry; can be switched to fail.
#[derive(Default)]
pub struct RecordingAudit {
    entries: Mutex<Vec<AuditEntry>>,
    failing: AtomicBool,
}

impl RecordingAudit {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit lock poisoned").clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.action).collect()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuditError("audit table locked".to_string()));
        }
        self.entries.lock().expect("audit lock poisoned").push(entry);
        Ok(())
    }
}
