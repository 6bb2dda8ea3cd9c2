mod common;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal_macros::dec;

use common::*;
use lms::LeaveError;
use lms::model::approval::ApprovalStatus;
use lms::model::employee::{EmployeeProfile, Region};
use lms::model::leave_balance::BalanceKey;
use lms::model::leave_request::{HalfDayType, LeaveFilter, LeaveStatus};
use lms::service::lifecycle::UpdateLeave;
use lms::store::LeaveStore;

#[tokio::test]
async fn submitting_reserves_days_and_opens_manager_approval() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;

    let request = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(0), day(2)))
        .await
        .expect("create");

    assert_eq!(request.status, LeaveStatus::Pending);
    assert!(!request.is_draft);
    assert_eq!(request.total_days, dec!(3));

    let balance = h.balance(EMPLOYEE, "CL", leave_year()).await;
    assert_eq!(balance.amounts().pending, dec!(3));
    assert_eq!(balance.available(), dec!(6));

    let approvals = h.ctx.approvals().approvals_for(request.id).await.expect("approvals");
    assert_eq!(approvals.len(), 1);
    assert_eq!(approvals[0].approver_employee_id, MANAGER);
    assert_eq!(approvals[0].level, 1);
    assert_eq!(approvals[0].status, ApprovalStatus::Pending);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind(), "submitted");
    assert_eq!(sent[0].recipient(), "e2000@company.com");
    assert_eq!(h.audit.actions(), vec!["LEAVE_REQUEST_CREATE".to_string()]);
}

#[tokio::test]
async fn insufficient_balance_leaves_no_trace() {
    let h = Harness::new();
    h.seed(EMPLOYEE_2, "CL", leave_year(), dec!(2)).await;

    let err = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE_2, leave("CL", day(0), day(2)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LeaveError::InsufficientBalance { available, requested }
            if available == dec!(2) && requested == dec!(3)
    ));
    let page = h
        .ctx
        .lifecycle()
        .list(&LeaveFilter {
            employee_id: Some(EMPLOYEE_2),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(page.total, 0);

    let balance = h.balance(EMPLOYEE_2, "CL", leave_year()).await;
    assert_eq!(balance.available(), dec!(2));
    assert_eq!(balance.amounts().pending, dec!(0));
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn missing_balance_row_is_reported() {
    let h = Harness::new();

    let err = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(0), day(0)))
        .await
        .unwrap_err();

    assert!(matches!(err, LeaveError::NoBalanceRecord(ref key) if key.leave_type_code == "CL"));
}

#[tokio::test]
async fn drafts_touch_nothing_until_submitted() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;

    let draft = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, draft("CL", day(0), day(1)))
        .await
        .expect("draft");
    assert_eq!(draft.status, LeaveStatus::Draft);
    assert!(draft.is_draft);
    assert_eq!(h.balance(EMPLOYEE, "CL", leave_year()).await.available(), dec!(9));
    assert!(h.store.approvals_for(draft.id).await.expect("approvals").is_empty());
    assert!(h.notifier.sent().is_empty());

    let submitted = h
        .ctx
        .lifecycle()
        .submit_draft(draft.id, EMPLOYEE)
        .await
        .expect("submit");
    assert_eq!(submitted.status, LeaveStatus::Pending);
    assert!(!submitted.is_draft);

    let balance = h.balance(EMPLOYEE, "CL", leave_year()).await;
    assert_eq!(balance.amounts().pending, dec!(2));
    assert_eq!(balance.available(), dec!(7));
    assert_eq!(h.store.approvals_for(draft.id).await.expect("approvals").len(), 1);
    assert_eq!(
        h.audit.actions(),
        vec!["LEAVE_REQUEST_DRAFT".to_string(), "LEAVE_REQUEST_SUBMIT".to_string()]
    );
}

#[tokio::test]
async fn draft_can_be_saved_without_any_balance() {
    let h = Harness::new();

    let draft = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, draft("CL", day(0), day(1)))
        .await
        .expect("draft");

    let err = h.ctx.lifecycle().submit_draft(draft.id, EMPLOYEE).await.unwrap_err();
    assert!(matches!(err, LeaveError::NoBalanceRecord(_)));
    let still = h.ctx.lifecycle().get(draft.id).await.expect("get");
    assert_eq!(still.status, LeaveStatus::Draft);
}

#[tokio::test]
async fn concurrent_double_submit_reserves_once() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;
    let draft = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, draft("CL", day(0), day(2)))
        .await
        .expect("draft");

    let lifecycle = h.ctx.lifecycle();
    let (first, second) = tokio::join!(
        lifecycle.submit_draft(draft.id, EMPLOYEE),
        lifecycle.submit_draft(draft.id, EMPLOYEE)
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(LeaveError::InvalidState(_))))
    );

    let balance = h.balance(EMPLOYEE, "CL", leave_year()).await;
    assert_eq!(balance.amounts().pending, dec!(3));
    assert_eq!(balance.available(), dec!(6));
    assert_eq!(h.store.approvals_for(draft.id).await.expect("approvals").len(), 1);
}

#[tokio::test]
async fn concurrent_submissions_cannot_overdraw_one_row() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(4)).await;

    let lifecycle = h.ctx.lifecycle();
    let (first, second) = tokio::join!(
        lifecycle.create(EMPLOYEE, leave("CL", day(0), day(2))),
        lifecycle.create(EMPLOYEE, leave("CL", day(10), day(12)))
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(LeaveError::InsufficientBalance { .. })))
            .count(),
        1
    );

    let balance = h.balance(EMPLOYEE, "CL", leave_year()).await;
    assert_eq!(balance.amounts().pending, dec!(3));
    assert_eq!(balance.available(), dec!(1));
    assert!(balance.is_consistent());
}

#[tokio::test]
async fn january_to_march_leave_draws_from_the_april_fiscal_year() {
    let h = Harness::new();
    let year = leave_year();
    h.ctx
        .ledger()
        .initialize_balances(hr(), EMPLOYEE, year, None)
        .await
        .expect("initialize");

    let february = NaiveDate::from_ymd_opt(year + 1, 2, 10).expect("date");
    let request = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", february, february + Duration::days(1)))
        .await
        .expect("create");
    assert_eq!(request.balance_year, year);

    let fiscal = h.balance(EMPLOYEE, "CL", year).await;
    assert_eq!(fiscal.amounts().pending, dec!(2));
    assert_eq!(fiscal.available(), dec!(10));
    assert!(
        h.store
            .find_balance(&BalanceKey::new(EMPLOYEE, "CL", year + 1))
            .await
            .expect("store")
            .is_none()
    );

    h.ctx
        .approvals()
        .approve(request.id, staff(MANAGER), None)
        .await
        .expect("approve");
    let fiscal = h.balance(EMPLOYEE, "CL", year).await;
    assert_eq!(fiscal.amounts().used, dec!(2));

    h.ctx
        .lifecycle()
        .cancel(request.id, staff(EMPLOYEE), None)
        .await
        .expect("cancel");
    let fiscal = h.balance(EMPLOYEE, "CL", year).await;
    assert_eq!(fiscal.amounts().used, dec!(0));
    assert_eq!(fiscal.available(), dec!(12));
}

#[tokio::test]
async fn submitted_drafts_draw_from_the_fiscal_year_of_their_start() {
    let h = Harness::new();
    let year = leave_year();
    h.seed(EMPLOYEE, "CL", year, dec!(5)).await;

    let march = NaiveDate::from_ymd_opt(year + 1, 3, 30).expect("date");
    let draft = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, draft("CL", march, march))
        .await
        .expect("draft");
    h.ctx
        .lifecycle()
        .submit_draft(draft.id, EMPLOYEE)
        .await
        .expect("submit");

    assert_eq!(h.balance(EMPLOYEE, "CL", year).await.amounts().pending, dec!(1));
}

#[tokio::test]
async fn calendar_year_regions_draw_from_the_calendar_year() {
    let h = Harness::new();
    h.directory.upsert(EmployeeProfile {
        region: Region::Us,
        ..employee(7000, Some(MANAGER))
    });
    let year = leave_year();
    h.seed(7000, "CL", year, dec!(5)).await;
    h.seed(7000, "CL", year - 1, dec!(5)).await;

    let january = NaiveDate::from_ymd_opt(year, 1, 12).expect("date");
    let request = h
        .ctx
        .lifecycle()
        .create(7000, leave("CL", january, january))
        .await
        .expect("create");

    assert_eq!(request.balance_year, year);
    assert_eq!(h.balance(7000, "CL", year).await.amounts().pending, dec!(1));
    assert_eq!(h.balance(7000, "CL", year - 1).await.amounts().pending, dec!(0));
}

#[tokio::test]
async fn only_the_owner_submits_and_only_drafts_are_submittable() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;
    let draft = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, draft("CL", day(0), day(0)))
        .await
        .expect("draft");

    let err = h.ctx.lifecycle().submit_draft(draft.id, EMPLOYEE_2).await.unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));

    h.ctx.lifecycle().submit_draft(draft.id, EMPLOYEE).await.expect("submit");
    let err = h.ctx.lifecycle().submit_draft(draft.id, EMPLOYEE).await.unwrap_err();
    assert!(matches!(err, LeaveError::InvalidState(_)));

    let err = h.ctx.lifecycle().submit_draft(404, EMPLOYEE).await.unwrap_err();
    assert!(matches!(err, LeaveError::NotFound(_)));
}

#[tokio::test]
async fn drafts_can_be_edited_and_deleted_but_pending_cannot() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;
    let draft = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, draft("CL", day(0), day(0)))
        .await
        .expect("draft");

    let edited = h
        .ctx
        .lifecycle()
        .update(
            draft.id,
            EMPLOYEE,
            UpdateLeave {
                end_date: Some(day(3)),
                reason: Some("Wedding".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(edited.end_date, day(3));
    assert_eq!(edited.total_days, dec!(4));
    assert_eq!(edited.reason, "Wedding");

    let err = h
        .ctx
        .lifecycle()
        .update(
            draft.id,
            EMPLOYEE,
            UpdateLeave {
                reason: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Validation(_)));

    let err = h
        .ctx
        .lifecycle()
        .update(
            draft.id,
            EMPLOYEE,
            UpdateLeave {
                start_date: Some(day(5)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::InvalidDateRange));

    let pending = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(10), day(10)))
        .await
        .expect("create");
    let err = h
        .ctx
        .lifecycle()
        .update(pending.id, EMPLOYEE, UpdateLeave::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::InvalidState(_)));
    let err = h.ctx.lifecycle().delete(pending.id, EMPLOYEE).await.unwrap_err();
    assert!(matches!(err, LeaveError::InvalidState(_)));

    let err = h.ctx.lifecycle().delete(draft.id, EMPLOYEE_2).await.unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));
    h.ctx.lifecycle().delete(draft.id, EMPLOYEE).await.expect("delete");
    let err = h.ctx.lifecycle().get(draft.id).await.unwrap_err();
    assert!(matches!(err, LeaveError::NotFound(_)));
}

#[tokio::test]
async fn overlapping_requests_are_rejected() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;
    let first = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(0), day(2)))
        .await
        .expect("create");

    let err = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(2), day(3)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::OverlappingRequest { existing_id } if existing_id == first.id));

    // Adjacent ranges do not overlap.
    h.ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(3), day(3)))
        .await
        .expect("adjacent");

    // A cancelled request frees its dates.
    h.ctx
        .lifecycle()
        .cancel(first.id, staff(EMPLOYEE), None)
        .await
        .expect("cancel");
    h.ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(1), day(2)))
        .await
        .expect("reuse dates");

    // Other employees are unaffected.
    h.seed(EMPLOYEE_2, "CL", leave_year(), dec!(9)).await;
    h.ctx
        .lifecycle()
        .create(EMPLOYEE_2, leave("CL", day(0), day(2)))
        .await
        .expect("other employee");
}

#[tokio::test]
async fn half_day_counts_as_half() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;

    let request = h
        .ctx
        .lifecycle()
        .create(
            EMPLOYEE,
            lms::service::lifecycle::CreateLeave {
                is_half_day: true,
                half_day_type: Some(HalfDayType::SecondHalf),
                ..leave("CL", day(0), day(0))
            },
        )
        .await
        .expect("create");

    assert_eq!(request.total_days, dec!(0.5));
    assert_eq!(request.half_day_type, Some(HalfDayType::SecondHalf));
    assert_eq!(h.balance(EMPLOYEE, "CL", leave_year()).await.available(), dec!(8.5));
}

#[tokio::test]
async fn invalid_ranges_and_day_counts_are_rejected() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;

    let err = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(2), day(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::InvalidDateRange));

    let err = h
        .ctx
        .lifecycle()
        .create(
            EMPLOYEE,
            lms::service::lifecycle::CreateLeave {
                total_days: Some(dec!(5)),
                ..leave("CL", day(0), day(1))
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Validation(_)));

    let err = h
        .ctx
        .lifecycle()
        .create(
            EMPLOYEE,
            lms::service::lifecycle::CreateLeave {
                reason: String::new(),
                ..leave("CL", day(0), day(1))
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Validation(_)));

    // A client-supplied working-day count inside the span is trusted.
    let request = h
        .ctx
        .lifecycle()
        .create(
            EMPLOYEE,
            lms::service::lifecycle::CreateLeave {
                total_days: Some(dec!(2)),
                ..leave("CL", day(0), day(3))
            },
        )
        .await
        .expect("create");
    assert_eq!(request.total_days, dec!(2));
}

#[tokio::test]
async fn leave_types_without_approval_are_approved_immediately() {
    let h = Harness::new();
    h.seed(EMPLOYEE, ON_DUTY, leave_year(), dec!(5)).await;

    let request = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave(ON_DUTY, day(0), day(1)))
        .await
        .expect("create");

    assert_eq!(request.status, LeaveStatus::Approved);
    assert!(request.approved_date.is_some());
    let balance = h.balance(EMPLOYEE, ON_DUTY, leave_year()).await;
    assert_eq!(balance.amounts().used, dec!(2));
    assert_eq!(balance.amounts().pending, dec!(0));
    assert_eq!(balance.available(), dec!(3));
    assert!(h.store.approvals_for(request.id).await.expect("approvals").is_empty());

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind(), "approved");
    assert_eq!(sent[0].recipient(), "e1000@company.com");
}

#[tokio::test]
async fn employee_without_manager_waits_without_approvals() {
    let h = Harness::new();
    h.seed(LONE_EMPLOYEE, "CL", leave_year(), dec!(9)).await;

    let request = h
        .ctx
        .lifecycle()
        .create(LONE_EMPLOYEE, leave("CL", day(0), day(0)))
        .await
        .expect("create");

    assert_eq!(request.status, LeaveStatus::Pending);
    assert!(h.store.approvals_for(request.id).await.expect("approvals").is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn cancelling_pending_returns_the_reservation() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;
    let request = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(0), day(2)))
        .await
        .expect("create");

    let cancelled = h
        .ctx
        .lifecycle()
        .cancel(request.id, staff(EMPLOYEE), Some("Plans changed".to_string()))
        .await
        .expect("cancel");

    assert_eq!(cancelled.status, LeaveStatus::Cancelled);
    assert!(cancelled.cancelled_date.is_some());
    assert_eq!(cancelled.remarks.as_deref(), Some("Plans changed"));
    let balance = h.balance(EMPLOYEE, "CL", leave_year()).await;
    assert_eq!(balance.amounts().pending, dec!(0));
    assert_eq!(balance.available(), dec!(9));

    let approvals = h.store.approvals_for(request.id).await.expect("approvals");
    assert!(approvals.iter().all(|a| !a.is_active));
    assert!(h.ctx.approvals().pending_for(MANAGER).await.expect("pending").is_empty());
    assert_eq!(h.notifier.sent().last().map(|n| n.kind()), Some("cancelled"));
}

#[tokio::test]
async fn cancelling_approved_refunds_used_days() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;
    let request = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(0), day(1)))
        .await
        .expect("create");
    h.ctx
        .approvals()
        .approve(request.id, staff(MANAGER), None)
        .await
        .expect("approve");
    assert_eq!(h.balance(EMPLOYEE, "CL", leave_year()).await.amounts().used, dec!(2));

    h.ctx
        .lifecycle()
        .cancel(request.id, staff(EMPLOYEE), None)
        .await
        .expect("cancel");

    let balance = h.balance(EMPLOYEE, "CL", leave_year()).await;
    assert_eq!(balance.amounts().used, dec!(0));
    assert_eq!(balance.available(), dec!(9));
    assert!(balance.is_consistent());
}

#[tokio::test]
async fn cancel_checks_ownership_and_state() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;
    let request = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(0), day(0)))
        .await
        .expect("create");

    let err = h
        .ctx
        .lifecycle()
        .cancel(request.id, staff(EMPLOYEE_2), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));
    let err = h.ctx.lifecycle().cancel(request.id, hr(), None).await.unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));

    h.ctx
        .lifecycle()
        .cancel(request.id, admin(), None)
        .await
        .expect("admin cancel");
    let err = h
        .ctx
        .lifecycle()
        .cancel(request.id, staff(EMPLOYEE), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::InvalidState(_)));

    let draft = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, draft("CL", day(5), day(5)))
        .await
        .expect("draft");
    let err = h
        .ctx
        .lifecycle()
        .cancel(draft.id, staff(EMPLOYEE), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::InvalidState(_)));
}

#[tokio::test]
async fn notification_and_audit_failures_do_not_undo_the_transition() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(9)).await;
    h.notifier.fail_sends(true);
    h.audit.fail_writes(true);

    let request = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(0), day(2)))
        .await
        .expect("create");

    assert_eq!(request.status, LeaveStatus::Pending);
    assert_eq!(h.balance(EMPLOYEE, "CL", leave_year()).await.available(), dec!(6));
    assert!(h.notifier.sent().is_empty());
    assert!(h.audit.entries().is_empty());
}

#[tokio::test]
async fn preview_skips_weekends_and_holidays() {
    let h = Harness::new();
    let monday = monday_from(day(0));
    h.holidays.add(lms::model::employee::Region::Ind, monday + Duration::days(2));
    h.holidays.add(lms::model::employee::Region::Us, monday + Duration::days(3));

    // Monday through the following Sunday: five weekdays, one IND holiday.
    let preview = h
        .ctx
        .lifecycle()
        .preview_days(EMPLOYEE, monday, monday + Duration::days(6), false)
        .await
        .expect("preview");
    assert_eq!(preview.calendar_days, 7);
    assert_eq!(preview.working_days, dec!(4));
    assert_eq!(preview.holidays, vec![monday + Duration::days(2)]);

    let half = h
        .ctx
        .lifecycle()
        .preview_days(EMPLOYEE, monday, monday, true)
        .await
        .expect("preview");
    assert_eq!(half.working_days, dec!(0.5));

    let err = h
        .ctx
        .lifecycle()
        .preview_days(EMPLOYEE, monday + Duration::days(1), monday, false)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::InvalidDateRange));
}

#[tokio::test]
async fn inactive_employees_cannot_apply() {
    let h = Harness::new();
    h.seed(INACTIVE_EMPLOYEE, "CL", leave_year(), dec!(9)).await;

    let err = h
        .ctx
        .lifecycle()
        .create(INACTIVE_EMPLOYEE, leave("CL", day(0), day(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));
}

#[tokio::test]
async fn negative_balance_types_can_overdraw() {
    let h = Harness::new();

    let request = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave(UNPAID, day(0), day(2)))
        .await
        .expect("create");

    assert_eq!(request.status, LeaveStatus::Pending);
    let balance = h.balance(EMPLOYEE, UNPAID, leave_year()).await;
    assert_eq!(balance.amounts().pending, dec!(3));
    assert_eq!(balance.available(), dec!(-3));
    assert!(balance.is_consistent());
}

#[tokio::test]
async fn leave_type_rules_are_enforced() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(20)).await;
    h.seed(EMPLOYEE, "PTO", leave_year(), dec!(20)).await;

    // PTO is US only.
    let err = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("PTO", day(0), day(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Validation(_)));

    // CL allows at most five consecutive days.
    let err = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(0), day(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Validation(_)));

    // PL needs seven days notice and no half days.
    let soon = Utc::now().date_naive() + Duration::days(2);
    let err = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("PL", soon, soon))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Validation(_)));

    let err = h
        .ctx
        .lifecycle()
        .create(
            EMPLOYEE,
            lms::service::lifecycle::CreateLeave {
                is_half_day: true,
                ..leave("PL", day(0), day(0))
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Validation(_)));

    let err = h
        .ctx
        .lifecycle()
        .create(EMPLOYEE, leave("XX", day(0), day(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::NotFound(_)));
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(12)).await;
    for offset in 0..3 {
        h.ctx
            .lifecycle()
            .create(EMPLOYEE, leave("CL", day(offset * 2), day(offset * 2)))
            .await
            .expect("create");
    }
    h.ctx
        .lifecycle()
        .create(EMPLOYEE, draft("CL", day(20), day(20)))
        .await
        .expect("draft");

    let pending = h
        .ctx
        .lifecycle()
        .list(&LeaveFilter {
            employee_id: Some(EMPLOYEE),
            status: Some(LeaveStatus::Pending),
            page: Some(1),
            per_page: Some(2),
        })
        .await
        .expect("list");
    assert_eq!(pending.total, 3);
    assert_eq!(pending.data.len(), 2);
    assert_eq!(pending.per_page, 2);

    let all = h
        .ctx
        .lifecycle()
        .list(&LeaveFilter {
            employee_id: Some(EMPLOYEE),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(all.total, 4);
}
