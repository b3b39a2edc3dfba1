//! Urgency tiers derived from the signed number of days until a due date.
//!
//! "Today" is always supplied by the caller; nothing in here reads a clock.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dates::calendar_date;

/// Ordered from most to least urgent, so sorting ascending puts overdue work first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Overdue,
    DueToday,
    /// 1 to 3 days out.
    Critical,
    /// 4 to 7 days out.
    Warning,
    /// More than 7 days out.
    Normal,
}

impl UrgencyTier {
    pub fn classify(days_until: i64) -> Self {
        match days_until {
            d if d < 0 => UrgencyTier::Overdue,
            0 => UrgencyTier::DueToday,
            1..=3 => UrgencyTier::Critical,
            4..=7 => UrgencyTier::Warning,
            _ => UrgencyTier::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyTier::Overdue => "overdue",
            UrgencyTier::DueToday => "due_today",
            UrgencyTier::Critical => "critical",
            UrgencyTier::Warning => "warning",
            UrgencyTier::Normal => "normal",
        }
    }

    pub fn variants() -> &'static [(&'static str, &'static str)] {
        &[
            ("overdue", "Due date has passed"),
            ("due_today", "Due today"),
            ("critical", "Due within 1-3 days"),
            ("warning", "Due within 4-7 days"),
            ("normal", "Due in more than 7 days"),
        ]
    }

    /// Deadlines that belong on the dashboard's urgent counter (a week or less, overdue included).
    pub fn is_urgent(&self) -> bool {
        *self <= UrgencyTier::Warning
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrgencyTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overdue" => Ok(UrgencyTier::Overdue),
            "due_today" | "today" => Ok(UrgencyTier::DueToday),
            "critical" => Ok(UrgencyTier::Critical),
            "warning" => Ok(UrgencyTier::Warning),
            "normal" => Ok(UrgencyTier::Normal),
            _ => Err(()),
        }
    }
}

/// Whole calendar days from `today` to `target`; negative once `target` has passed.
pub fn days_until(target: NaiveDate, today: NaiveDate) -> i64 {
    (target - today).num_days()
}

/// Same as [`days_until`] for timestamps: both sides are truncated to their
/// calendar date first, so 23:59 on the eve of a due date is still one day out.
pub fn days_until_at(target: NaiveDateTime, now: NaiveDateTime) -> i64 {
    days_until(calendar_date(target), calendar_date(now))
}

pub fn classify(days_until: i64) -> UrgencyTier {
    UrgencyTier::classify(days_until)
}

pub fn urgency_for(target: NaiveDate, today: NaiveDate) -> UrgencyTier {
    classify(days_until(target, today))
}

/// Short human label, e.g. "overdue by 2 days", "due today", "5 days".
pub fn describe_days_until(days_until: i64) -> String {
    let plural = |n: i64| if n == 1 { "day" } else { "days" };
    match days_until {
        d if d < 0 => format!("overdue by {} {}", -d, plural(-d)),
        0 => "due today".to_string(),
        d => format!("{} {}", d, plural(d)),
    }
}
