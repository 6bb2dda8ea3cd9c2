mod common;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use common::*;
use lms::LeaveError;
use lms::model::leave_balance::BalanceKey;
use lms::service::ledger::BalanceAdjustment;
use lms::store::LeaveStore;

fn adjustment(employee_id: u64, code: &str, year: i32, days: rust_decimal::Decimal) -> BalanceAdjustment {
    BalanceAdjustment {
        employee_id,
        leave_type_code: code.to_string(),
        year,
        days,
    }
}

#[tokio::test]
async fn grant_creates_missing_rows_and_adds_to_existing_ones() {
    let h = Harness::new();

    let created = h
        .ctx
        .ledger()
        .grant(hr(), adjustment(EMPLOYEE, "BL", 2030, dec!(3)))
        .await
        .expect("grant");
    assert_eq!(created.amounts().allocated, dec!(3));
    assert_eq!(created.available(), dec!(3));

    let topped_up = h
        .ctx
        .ledger()
        .grant(admin(), adjustment(EMPLOYEE, "BL", 2030, dec!(1.5)))
        .await
        .expect("grant");
    assert_eq!(topped_up.amounts().allocated, dec!(4.5));
    assert_eq!(topped_up.available(), dec!(4.5));

    let entries = h.audit.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "LEAVE_BALANCE_GRANT");
    assert_eq!(entries[0].entity_id, "1000:BL:2030");
    assert!(entries[0].old_values.as_ref().is_none_or(|v| v.is_null()));
    assert!(entries[1].old_values.as_ref().is_some_and(|v| !v.is_null()));
}

#[tokio::test]
async fn revoke_never_drops_below_zero() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", 2030, dec!(4)).await;

    let after = h
        .ctx
        .ledger()
        .revoke(hr(), adjustment(EMPLOYEE, "CL", 2030, dec!(1)))
        .await
        .expect("revoke");
    assert_eq!(after.amounts().allocated, dec!(3));
    assert_eq!(after.available(), dec!(3));

    let err = h
        .ctx
        .ledger()
        .revoke(hr(), adjustment(EMPLOYEE, "CL", 2030, dec!(3.5)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::InsufficientBalance { .. }));
    assert_eq!(h.balance(EMPLOYEE, "CL", 2030).await.available(), dec!(3));

    let err = h
        .ctx
        .ledger()
        .revoke(hr(), adjustment(EMPLOYEE, "PL", 2030, dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::NoBalanceRecord(_)));
}

#[tokio::test]
async fn adjustments_need_positive_days_and_known_references() {
    let h = Harness::new();

    let err = h
        .ctx
        .ledger()
        .grant(hr(), adjustment(EMPLOYEE, "CL", 2030, dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Validation(_)));

    let err = h
        .ctx
        .ledger()
        .grant(hr(), adjustment(EMPLOYEE, "ZZ", 2030, dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::NotFound(_)));

    let err = h
        .ctx
        .ledger()
        .grant(hr(), adjustment(55_555, "CL", 2030, dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::NotFound(_)));
}

#[tokio::test]
async fn employees_cannot_adjust_balances() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", 2030, dec!(4)).await;

    let err = h
        .ctx
        .ledger()
        .grant(staff(EMPLOYEE), adjustment(EMPLOYEE, "CL", 2030, dec!(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));

    let err = h
        .ctx
        .ledger()
        .upsert_allocation(staff(MANAGER), BalanceKey::new(EMPLOYEE, "CL", 2030), dec!(30))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));

    let err = h
        .ctx
        .ledger()
        .carry_forward(staff(EMPLOYEE), 2030)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));

    assert_eq!(h.balance(EMPLOYEE, "CL", 2030).await.available(), dec!(4));
    assert!(h.audit.entries().is_empty());
}

#[tokio::test]
async fn allocation_is_absolute_and_keeps_pending_days() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", leave_year(), dec!(10)).await;
    h.ctx
        .lifecycle()
        .create(EMPLOYEE, leave("CL", day(0), day(1)))
        .await
        .expect("create");

    let key = BalanceKey::new(EMPLOYEE, "CL", leave_year());
    let after = h
        .ctx
        .ledger()
        .upsert_allocation(admin(), key.clone(), dec!(12))
        .await
        .expect("allocate");

    assert_eq!(after.amounts().allocated, dec!(12));
    assert_eq!(after.amounts().pending, dec!(2));
    assert_eq!(after.available(), dec!(10));
    assert!(after.is_consistent());

    let err = h
        .ctx
        .ledger()
        .upsert_allocation(admin(), key, dec!(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Validation(_)));
}

#[tokio::test]
async fn balance_lookup_reports_missing_rows() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "CL", 2030, dec!(4)).await;
    h.seed(EMPLOYEE, "PL", 2030, dec!(6)).await;
    h.seed(EMPLOYEE, "PL", 2031, dec!(6)).await;

    let found = h
        .ctx
        .ledger()
        .balance(&BalanceKey::new(EMPLOYEE, "PL", 2030))
        .await
        .expect("balance");
    assert_eq!(found.available(), dec!(6));

    let err = h
        .ctx
        .ledger()
        .balance(&BalanceKey::new(EMPLOYEE, "BL", 2030))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::NoBalanceRecord(_)));

    assert_eq!(h.ctx.ledger().balances(EMPLOYEE, 2030).await.expect("list").len(), 2);
    assert!(h.ctx.ledger().balances(EMPLOYEE_2, 2030).await.expect("list").is_empty());
}

#[tokio::test]
async fn initialization_allocates_applicable_types() {
    let h = Harness::new();

    let balances = h
        .ctx
        .ledger()
        .initialize_balances(hr(), EMPLOYEE, 2030, None)
        .await
        .expect("initialize");

    // CL and PL; PTO is US only and the rest have no annual allocation.
    let mut codes: Vec<_> = balances
        .iter()
        .map(|b| b.key().leave_type_code.clone())
        .collect();
    codes.sort();
    assert_eq!(codes, vec!["CL".to_string(), "PL".to_string()]);
    assert_eq!(h.balance(EMPLOYEE, "CL", 2030).await.available(), dec!(12));
    assert_eq!(h.balance(EMPLOYEE, "PL", 2030).await.available(), dec!(15));
    assert_eq!(h.audit.actions(), vec!["LEAVE_BALANCE_INITIALIZE".to_string()]);
}

#[tokio::test]
async fn initialization_prorates_mid_year_joiners() {
    let h = Harness::new();
    let joined = NaiveDate::from_ymd_opt(2030, 10, 15).expect("date");

    h.ctx
        .ledger()
        .initialize_balances(admin(), EMPLOYEE, 2030, Some(joined))
        .await
        .expect("initialize");

    // Fiscal year April to March: October through March is six months.
    assert_eq!(h.balance(EMPLOYEE, "CL", 2030).await.amounts().allocated, dec!(6));
    assert_eq!(h.balance(EMPLOYEE, "PL", 2030).await.amounts().allocated, dec!(7.5));
}

#[tokio::test]
async fn carry_forward_caps_and_expires_the_rest() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "PL", 2030, dec!(8)).await;
    h.seed(EMPLOYEE, "CL", 2030, dec!(4)).await;
    h.seed(EMPLOYEE_2, "PL", 2030, dec!(3)).await;
    h.seed(EMPLOYEE_2, "PL", 2031, dec!(15)).await;
    h.seed(EMPLOYEE_2, "CL", 2029, dec!(4)).await;

    let report = h.ctx.ledger().carry_forward(hr(), 2030).await.expect("carry forward");

    assert_eq!(report.from_year, 2030);
    assert_eq!(report.to_year, 2031);
    assert_eq!(report.rows_examined, 3);
    assert_eq!(report.lines.len(), 3);

    let pl_line = report
        .lines
        .iter()
        .find(|line| line.employee_id == EMPLOYEE && line.leave_type_code == "PL")
        .expect("PL line");
    assert_eq!(pl_line.carried, dec!(5));
    assert_eq!(pl_line.expired, dec!(3));

    // Both the carried and the lapsed days leave the old year.
    let pl_old = h.balance(EMPLOYEE, "PL", 2030).await;
    assert_eq!(pl_old.amounts().expired, dec!(8));
    assert_eq!(pl_old.available(), dec!(0));
    assert!(pl_old.is_consistent());
    let pl_new = h.balance(EMPLOYEE, "PL", 2031).await;
    assert_eq!(pl_new.amounts().carried_forward, dec!(5));
    assert_eq!(pl_new.available(), dec!(5));

    let cl_old = h.balance(EMPLOYEE, "CL", 2030).await;
    assert_eq!(cl_old.amounts().expired, dec!(4));
    assert_eq!(cl_old.available(), dec!(0));
    assert!(
        h.store
            .find_balance(&BalanceKey::new(EMPLOYEE, "CL", 2031))
            .await
            .expect("store")
            .is_none()
    );

    // Under the cap everything moves, on top of the new year's allocation.
    let e2_new = h.balance(EMPLOYEE_2, "PL", 2031).await;
    assert_eq!(e2_new.amounts().carried_forward, dec!(3));
    assert_eq!(e2_new.available(), dec!(18));
    assert!(e2_new.is_consistent());
}

#[tokio::test]
async fn carry_forward_twice_changes_nothing() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "PL", 2030, dec!(8)).await;
    h.seed(EMPLOYEE, "CL", 2030, dec!(4)).await;

    h.ctx.ledger().carry_forward(admin(), 2030).await.expect("first");
    let first_old = h.balance(EMPLOYEE, "PL", 2030).await;
    let first_new = h.balance(EMPLOYEE, "PL", 2031).await;

    let second = h.ctx.ledger().carry_forward(admin(), 2030).await.expect("second");

    assert!(second.lines.is_empty());
    assert_eq!(h.balance(EMPLOYEE, "PL", 2030).await, first_old);
    assert_eq!(h.balance(EMPLOYEE, "PL", 2031).await, first_new);
    assert_eq!(h.balance(EMPLOYEE, "CL", 2030).await.amounts().expired, dec!(4));
}

#[tokio::test]
async fn carried_days_cannot_be_spent_twice() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "PL", 2030, dec!(8)).await;
    h.ctx.ledger().carry_forward(hr(), 2030).await.expect("carry forward");

    // Spend part of the carried days in the new leave year.
    let start = NaiveDate::from_ymd_opt(2031, 6, 2).expect("date");
    h.ctx
        .lifecycle()
        .create(EMPLOYEE, leave("PL", start, start + chrono::Duration::days(2)))
        .await
        .expect("create");
    let reserved = h.balance(EMPLOYEE, "PL", 2031).await;
    assert_eq!(reserved.amounts().pending, dec!(3));
    assert_eq!(reserved.available(), dec!(2));

    // Nothing is left in the old year to take back.
    let revoked = h
        .ctx
        .ledger()
        .revoke(hr(), adjustment(EMPLOYEE, "PL", 2030, dec!(3)))
        .await;
    assert!(matches!(revoked, Err(LeaveError::InsufficientBalance { .. })));

    // Late credit to the old year cannot push the new year past the cap.
    h.ctx
        .ledger()
        .grant(hr(), adjustment(EMPLOYEE, "PL", 2030, dec!(4)))
        .await
        .expect("grant");
    let rerun = h.ctx.ledger().carry_forward(hr(), 2030).await.expect("rerun");
    assert_eq!(rerun.lines.len(), 1);
    assert_eq!(rerun.lines[0].carried, dec!(0));
    assert_eq!(rerun.lines[0].expired, dec!(4));

    let new_year = h.balance(EMPLOYEE, "PL", 2031).await;
    assert_eq!(new_year.amounts().carried_forward, dec!(5));
    assert_eq!(new_year.amounts().pending, dec!(3));
    assert_eq!(new_year.available(), dec!(2));
    assert!(new_year.is_consistent());
    assert_eq!(h.balance(EMPLOYEE, "PL", 2030).await.available(), dec!(0));
}

#[tokio::test]
async fn carry_forward_tops_up_to_the_cap_across_runs() {
    let h = Harness::new();
    h.seed(EMPLOYEE, "PL", 2030, dec!(2)).await;
    h.ctx.ledger().carry_forward(hr(), 2030).await.expect("first");
    assert_eq!(h.balance(EMPLOYEE, "PL", 2031).await.amounts().carried_forward, dec!(2));

    h.ctx
        .ledger()
        .grant(hr(), adjustment(EMPLOYEE, "PL", 2030, dec!(6)))
        .await
        .expect("grant");
    let second = h.ctx.ledger().carry_forward(hr(), 2030).await.expect("second");
    assert_eq!(second.lines[0].carried, dec!(3));
    assert_eq!(second.lines[0].expired, dec!(3));

    let new_year = h.balance(EMPLOYEE, "PL", 2031).await;
    assert_eq!(new_year.amounts().carried_forward, dec!(5));
    assert_eq!(new_year.available(), dec!(5));
}

#[tokio::test]
async fn concurrent_first_grants_to_one_row_both_land() {
    let h = Harness::new();
    let ledger = h.ctx.ledger();

    let (first, second) = tokio::join!(
        ledger.grant(hr(), adjustment(EMPLOYEE, "BL", 2030, dec!(2))),
        ledger.grant(admin(), adjustment(EMPLOYEE, "BL", 2030, dec!(3))),
    );
    first.expect("first grant");
    second.expect("second grant");

    let row = h.balance(EMPLOYEE, "BL", 2030).await;
    assert_eq!(row.amounts().allocated, dec!(5));
    assert_eq!(row.available(), dec!(5));
}
