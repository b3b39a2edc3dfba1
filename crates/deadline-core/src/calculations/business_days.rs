//! Day-by-day business-day arithmetic.
//!
//! Holiday placement is irregular, so these walk the calendar one day at a
//! time instead of using a closed form. The origin date is never counted and
//! never returned.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::warn;

use crate::calendar::is_business_day;
use crate::error::{DeadlineError, DeadlineResult};

/// Upper bound on calendar days a single scan may visit (about ten years).
pub const DEFAULT_MAX_SCAN_DAYS: u32 = 3_660;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanDirection {
    Forward,
    Backward,
}

impl ScanDirection {
    fn step(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            ScanDirection::Forward => date.succ_opt(),
            ScanDirection::Backward => date.pred_opt(),
        }
    }
}

/// Date reached after `n` business days following `start`.
pub fn add_business_days(
    start: NaiveDate,
    n: i64,
    holidays: &HashSet<NaiveDate>,
) -> DeadlineResult<NaiveDate> {
    add_business_days_capped(start, n, holidays, DEFAULT_MAX_SCAN_DAYS)
}

/// Date reached after walking `n` business days back from `end`.
pub fn subtract_business_days(
    end: NaiveDate,
    n: i64,
    holidays: &HashSet<NaiveDate>,
) -> DeadlineResult<NaiveDate> {
    subtract_business_days_capped(end, n, holidays, DEFAULT_MAX_SCAN_DAYS)
}

pub fn add_business_days_capped(
    start: NaiveDate,
    n: i64,
    holidays: &HashSet<NaiveDate>,
    max_scan_days: u32,
) -> DeadlineResult<NaiveDate> {
    scan(start, n, holidays, ScanDirection::Forward, max_scan_days)
}

pub fn subtract_business_days_capped(
    end: NaiveDate,
    n: i64,
    holidays: &HashSet<NaiveDate>,
    max_scan_days: u32,
) -> DeadlineResult<NaiveDate> {
    scan(end, n, holidays, ScanDirection::Backward, max_scan_days)
}

/// Business days in the half-open interval `(from, to]`.
///
/// Returns 0 when `to` is on or before `from`. For any `n >= 1`,
/// `count_business_days(s, add_business_days(s, n)?)` is exactly `n`.
pub fn count_business_days(from: NaiveDate, to: NaiveDate, holidays: &HashSet<NaiveDate>) -> i64 {
    let mut count = 0;
    let mut cursor = from;
    while cursor < to {
        match cursor.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
        if is_business_day(cursor, holidays) {
            count += 1;
        }
    }
    count
}

fn scan(
    origin: NaiveDate,
    n: i64,
    holidays: &HashSet<NaiveDate>,
    direction: ScanDirection,
    max_scan_days: u32,
) -> DeadlineResult<NaiveDate> {
    if n < 1 {
        warn!(%origin, n, "rejected non-positive business day count");
        return Err(DeadlineError::invalid(format!(
            "business day count must be at least 1 (got {n})"
        )));
    }

    let mut cursor = origin;
    let mut counted = 0;
    let mut scanned = 0u32;
    while counted < n {
        if scanned >= max_scan_days {
            warn!(
                %origin,
                n,
                counted,
                scanned,
                holidays = holidays.len(),
                "business-day scan hit its cap"
            );
            return Err(DeadlineError::DegenerateCalendar {
                from: origin,
                scanned_days: scanned,
                remaining: n - counted,
            });
        }
        cursor = direction.step(cursor).ok_or_else(|| {
            DeadlineError::invalid(format!("date arithmetic left the supported range at {cursor}"))
        })?;
        scanned += 1;
        if is_business_day(cursor, holidays) {
            counted += 1;
        }
    }
    Ok(cursor)
}
