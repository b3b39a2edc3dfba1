use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::calculations::business_days::{
    DEFAULT_MAX_SCAN_DAYS, add_business_days_capped, count_business_days,
    subtract_business_days_capped,
};
use crate::error::{DeadlineError, DeadlineResult};

/// Saturday and Sunday are never business days; neither is any date in `holidays`.
pub fn is_business_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    !is_weekend(date) && !holidays.contains(&date)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The effective holiday set for one user plus the scan limit applied to
/// arithmetic over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    holidays: HashSet<NaiveDate>,
    max_scan_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendarConfig {
    holidays: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_scan_days: Option<u32>,
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl HolidayCalendar {
    /// Weekends only, no holidays.
    pub fn new() -> Self {
        Self {
            holidays: HashSet::new(),
            max_scan_days: DEFAULT_MAX_SCAN_DAYS,
        }
    }

    pub fn with_holidays<I>(holidays: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            holidays: holidays.into_iter().collect(),
            max_scan_days: DEFAULT_MAX_SCAN_DAYS,
        }
    }

    pub fn with_max_scan_days(mut self, max_scan_days: u32) -> Self {
        self.max_scan_days = max_scan_days;
        self
    }

    pub fn from_config(config: &HolidayCalendarConfig) -> Self {
        Self {
            holidays: config.holidays.iter().copied().collect(),
            max_scan_days: config.max_scan_days.unwrap_or(DEFAULT_MAX_SCAN_DAYS),
        }
    }

    pub fn to_config(&self) -> HolidayCalendarConfig {
        HolidayCalendarConfig::from(self)
    }

    pub fn holidays(&self) -> &HashSet<NaiveDate> {
        &self.holidays
    }

    pub fn max_scan_days(&self) -> u32 {
        self.max_scan_days
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        self.holidays.extend(dates);
    }

    pub fn remove_holiday(&mut self, date: NaiveDate) -> bool {
        self.holidays.remove(&date)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        is_business_day(date, &self.holidays)
    }

    /// First business day strictly after `from`.
    pub fn next_business_day(&self, from: NaiveDate) -> DeadlineResult<NaiveDate> {
        self.add_business_days(from, 1)
    }

    /// Last business day strictly before `from`.
    pub fn prev_business_day(&self, from: NaiveDate) -> DeadlineResult<NaiveDate> {
        self.subtract_business_days(from, 1)
    }

    pub fn add_business_days(&self, start: NaiveDate, n: i64) -> DeadlineResult<NaiveDate> {
        add_business_days_capped(start, n, &self.holidays, self.max_scan_days)
    }

    pub fn subtract_business_days(&self, end: NaiveDate, n: i64) -> DeadlineResult<NaiveDate> {
        subtract_business_days_capped(end, n, &self.holidays, self.max_scan_days)
    }

    /// Business days in `(from, to]`.
    pub fn count_business_days(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        count_business_days(from, to, &self.holidays)
    }

    /// Business days in the inclusive range `[start, end]`.
    pub fn business_days_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DeadlineResult<Vec<NaiveDate>> {
        if start > end {
            return Err(DeadlineError::invalid(format!(
                "range start {start} is after range end {end}"
            )));
        }
        Ok(start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_business_day(*day))
            .collect())
    }
}

impl HolidayCalendarConfig {
    pub fn new<I>(holidays: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            holidays,
            max_scan_days: None,
        }
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }

    pub fn max_scan_days(&self) -> Option<u32> {
        self.max_scan_days
    }
}

impl From<&HolidayCalendar> for HolidayCalendarConfig {
    fn from(calendar: &HolidayCalendar) -> Self {
        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        let max_scan_days = (calendar.max_scan_days != DEFAULT_MAX_SCAN_DAYS)
            .then_some(calendar.max_scan_days);
        Self {
            holidays,
            max_scan_days,
        }
    }
}
