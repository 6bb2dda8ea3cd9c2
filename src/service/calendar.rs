//! Day counting and fiscal-year arithmetic.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;

use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::Region;

/// Inclusive number of calendar days in `[start, end]`.
pub fn calendar_span(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Day count stored on a request.
///
/// A supplied count is trusted (the client has already excluded weekends) as
/// long as it is positive and fits in the calendar span. Without one, the
/// inclusive span is used, collapsed to half a day for a single-day half-day
/// request.
pub fn resolve_total_days(
    start: NaiveDate,
    end: NaiveDate,
    supplied: Option<Decimal>,
    is_half_day: bool,
) -> LeaveResult<Decimal> {
    if start > end {
        return Err(LeaveError::InvalidDateRange);
    }
    let span = calendar_span(start, end);

    match supplied {
        Some(days) if days <= Decimal::ZERO => {
            Err(LeaveError::validation("total_days must be greater than zero"))
        }
        Some(days) if days > Decimal::from(span) => Err(LeaveError::validation(format!(
            "total_days {days} exceeds the {span} calendar days requested"
        ))),
        Some(days) => Ok(days),
        None if is_half_day && span == 1 => Ok(Decimal::new(5, 1)),
        None => Ok(Decimal::from(span)),
    }
}

/// Weekdays in `[start, end]` that are not holidays.
pub fn working_days(start: NaiveDate, end: NaiveDate, holidays: &[NaiveDate]) -> i64 {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .filter(|day| !holidays.contains(day))
        .count() as i64
}

/// First and last day of the fiscal year labelled `year`.
///
/// India-style regions run April to March, everything else follows the
/// calendar year.
pub fn fiscal_year_bounds(region: Region, year: i32) -> (NaiveDate, NaiveDate) {
    match region {
        Region::Ind => (ymd(year, 4, 1), ymd(year + 1, 3, 31)),
        Region::Us => (ymd(year, 1, 1), ymd(year, 12, 31)),
    }
}

/// Label of the fiscal year containing `date`; balance rows are keyed by it.
pub fn balance_year(region: Region, date: NaiveDate) -> i32 {
    match region {
        Region::Ind if date.month() < 4 => date.year() - 1,
        _ => date.year(),
    }
}

/// Annual allocation scaled to the whole months left in the fiscal year at
/// `joined_on` (joining month included), rounded down to half a day.
pub fn prorated_allocation(
    annual: Decimal,
    region: Region,
    year: i32,
    joined_on: Option<NaiveDate>,
) -> Decimal {
    let (fy_start, fy_end) = fiscal_year_bounds(region, year);
    let Some(joined) = joined_on else {
        return annual;
    };
    if joined <= fy_start {
        return annual;
    }
    if joined > fy_end {
        return Decimal::ZERO;
    }

    let months_left = (fy_end.year() - joined.year()) * 12 + fy_end.month() as i32
        - joined.month() as i32
        + 1;
    let raw = annual * Decimal::from(months_left) / Decimal::from(12);
    (raw * Decimal::TWO).floor() / Decimal::TWO
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}
