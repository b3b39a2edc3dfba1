use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::calculations::business_days::{DEFAULT_MAX_SCAN_DAYS, add_business_days_capped};
use crate::error::{DeadlineError, DeadlineResult};
use crate::urgency::{UrgencyTier, days_until};

/// Inputs for one due-date calculation. Counting begins the day after `start_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineSpec {
    pub start_date: NaiveDate,
    pub required_business_days: i64,
    #[serde(default)]
    pub holidays: HashSet<NaiveDate>,
}

impl DeadlineSpec {
    pub fn new<I>(start_date: NaiveDate, required_business_days: i64, holidays: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            start_date,
            required_business_days,
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn validate(&self) -> DeadlineResult<()> {
        if self.required_business_days < 1 {
            return Err(DeadlineError::invalid(format!(
                "required business days must be at least 1 (got {})",
                self.required_business_days
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedDeadline {
    pub due_date: NaiveDate,
    pub days_until_due: i64,
}

impl ComputedDeadline {
    pub fn urgency(&self) -> UrgencyTier {
        UrgencyTier::classify(self.days_until_due)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDate {
    pub days_before: i64,
    pub reminder_date: NaiveDate,
}

pub fn schedule_deadline(
    spec: &DeadlineSpec,
    today: NaiveDate,
) -> DeadlineResult<ComputedDeadline> {
    schedule_deadline_with_limit(spec, today, DEFAULT_MAX_SCAN_DAYS)
}

pub fn schedule_deadline_with_limit(
    spec: &DeadlineSpec,
    today: NaiveDate,
    max_scan_days: u32,
) -> DeadlineResult<ComputedDeadline> {
    let due_date = compute_due_date(spec, max_scan_days)?;
    let computed = ComputedDeadline {
        due_date,
        days_until_due: days_until(due_date, today),
    };
    debug!(
        start = %spec.start_date,
        business_days = spec.required_business_days,
        due = %computed.due_date,
        days_until_due = computed.days_until_due,
        "deadline scheduled"
    );
    Ok(computed)
}

pub fn compute_due_date(spec: &DeadlineSpec, max_scan_days: u32) -> DeadlineResult<NaiveDate> {
    spec.validate()?;
    add_business_days_capped(
        spec.start_date,
        spec.required_business_days,
        &spec.holidays,
        max_scan_days,
    )
}

/// Reminder dates on the plain calendar, furthest from the due date first.
pub fn generate_reminders(due_date: NaiveDate, offsets: &[i64]) -> DeadlineResult<Vec<NaiveDate>> {
    Ok(plan_reminders(due_date, offsets)?
        .into_iter()
        .map(|reminder| reminder.reminder_date)
        .collect())
}

/// Like [`generate_reminders`] but keeps each offset next to its date.
///
/// Offsets are deduplicated. Calendar days, not business days, are
/// subtracted, so a reminder may land on a weekend or holiday.
pub fn plan_reminders(due_date: NaiveDate, offsets: &[i64]) -> DeadlineResult<Vec<ReminderDate>> {
    if let Some(negative) = offsets.iter().find(|offset| **offset < 0) {
        return Err(DeadlineError::invalid(format!(
            "reminder offset must be non-negative (got {negative})"
        )));
    }

    let mut ordered = offsets.to_vec();
    ordered.sort_unstable_by(|a, b| b.cmp(a));
    ordered.dedup();

    ordered
        .into_iter()
        .map(|days_before| {
            let reminder_date = due_date
                .checked_sub_days(Days::new(days_before as u64))
                .ok_or_else(|| {
                    DeadlineError::invalid(format!(
                        "reminder {days_before} days before {due_date} is out of range"
                    ))
                })?;
            Ok(ReminderDate {
                days_before,
                reminder_date,
            })
        })
        .collect()
}
