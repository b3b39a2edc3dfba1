use chrono::{Datelike, Days, NaiveDate};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::calculations::business_days::add_business_days_capped;
use crate::calendar::HolidayCalendar;
use crate::config::DocketConfig;
use crate::dates::format_iso_date;
use crate::error::DeadlineError;
use crate::holiday::{Holiday, HolidayScope, HolidaySource, effective_holidays};
use crate::record_validation::{self, RecordValidationError};
use crate::records::{Case, CaseStatus, Deadline, DeadlineType, Reminder};
use crate::scheduling::{
    ComputedDeadline, DeadlineSpec, plan_reminders, schedule_deadline_with_limit,
};
use crate::sync::CalendarSyncRequest;
use crate::urgency::{UrgencyTier, days_until};

#[derive(Debug, Error)]
pub enum DocketError {
    #[error(transparent)]
    Deadline(#[from] DeadlineError),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i32 },
    #[error("{kind} {id} does not belong to user '{user_id}'")]
    Forbidden {
        kind: &'static str,
        id: i32,
        user_id: String,
    },
    #[error("{kind} {id} already exists")]
    Conflict { kind: &'static str, id: i32 },
    #[error("case {0} is not active")]
    CaseNotActive(i32),
    #[error("deadline {0} is already completed")]
    AlreadyCompleted(i32),
    #[error("invalid record: {0}")]
    Invalid(String),
}

impl From<RecordValidationError> for DocketError {
    fn from(value: RecordValidationError) -> Self {
        DocketError::Invalid(value.to_string())
    }
}

/// Request to open a deadline on a case. The due date is derived, never supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeadline {
    pub case_id: i32,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub deadline_type: DeadlineType,
    pub start_date: NaiveDate,
    pub business_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Falls back to the configured default offsets when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_offsets: Option<Vec<i64>>,
}

impl NewDeadline {
    pub fn new(
        case_id: i32,
        user_id: impl Into<String>,
        title: impl Into<String>,
        start_date: NaiveDate,
        business_days: i64,
    ) -> Self {
        Self {
            case_id,
            user_id: user_id.into(),
            title: title.into(),
            deadline_type: DeadlineType::Other,
            start_date,
            business_days,
            notes: None,
            reminder_offsets: None,
        }
    }

    pub fn with_type(mut self, deadline_type: DeadlineType) -> Self {
        self.deadline_type = deadline_type;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_reminder_offsets(mut self, offsets: Vec<i64>) -> Self {
        self.reminder_offsets = Some(offsets);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDeadline {
    pub deadline: Deadline,
    pub computed: ComputedDeadline,
    pub urgency: UrgencyTier,
    pub reminders: Vec<Reminder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingDeadline {
    pub deadline: Deadline,
    pub case_number: String,
    pub case_name: String,
    pub days_until: i64,
    pub urgency: UrgencyTier,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocketStats {
    pub active_cases: usize,
    pub active_deadlines: usize,
    /// Due within a week, overdue included.
    pub urgent_deadlines: usize,
    pub overdue_deadlines: usize,
    pub completed_this_month: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub deadline_count: usize,
    pub rescheduled: Vec<i32>,
}

impl RefreshSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![format!("deadlines={}", self.deadline_count)];
        if !self.rescheduled.is_empty() {
            let ids = self
                .rescheduled
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("rescheduled={ids}"));
        }
        parts.join(", ")
    }
}

/// In-memory record set: holidays, cases, deadlines and their reminders,
/// scoped per user the way the record store scopes them.
#[derive(Debug, Clone, Default)]
pub struct Docket {
    config: DocketConfig,
    holidays: Vec<Holiday>,
    cases: BTreeMap<i32, Case>,
    deadlines: BTreeMap<i32, Deadline>,
    reminders: BTreeMap<i32, Reminder>,
}

impl Docket {
    pub fn new() -> Self {
        Self::with_config(DocketConfig::default())
    }

    pub fn with_config(config: DocketConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub(crate) fn from_records(
        config: DocketConfig,
        holidays: Vec<Holiday>,
        cases: Vec<Case>,
        deadlines: Vec<Deadline>,
        reminders: Vec<Reminder>,
    ) -> Result<Self, DocketError> {
        record_validation::validate_record_collection(&cases, &deadlines, &reminders, &holidays)?;
        Ok(Self {
            config,
            holidays,
            cases: cases.into_iter().map(|case| (case.id, case)).collect(),
            deadlines: deadlines.into_iter().map(|d| (d.id, d)).collect(),
            reminders: reminders.into_iter().map(|r| (r.id, r)).collect(),
        })
    }

    /// Checks ids, cross references and per-record invariants.
    pub fn validate(&self) -> Result<(), DocketError> {
        let cases: Vec<Case> = self.cases.values().cloned().collect();
        let deadlines: Vec<Deadline> = self.deadlines.values().cloned().collect();
        let reminders: Vec<Reminder> = self.reminders.values().cloned().collect();
        record_validation::validate_record_collection(
            &cases,
            &deadlines,
            &reminders,
            &self.holidays,
        )?;
        Ok(())
    }

    pub fn config(&self) -> &DocketConfig {
        &self.config
    }

    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    pub fn cases(&self) -> impl Iterator<Item = &Case> {
        self.cases.values()
    }

    pub fn deadlines(&self) -> impl Iterator<Item = &Deadline> {
        self.deadlines.values()
    }

    pub fn reminders(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders.values()
    }

    /// Returns `false` when an identical holiday is already recorded.
    pub fn add_holiday(&mut self, holiday: Holiday) -> Result<bool, DocketError> {
        record_validation::validate_holiday(&holiday)?;
        if self.holidays.contains(&holiday) {
            return Ok(false);
        }
        debug!(date = %holiday.date, scope = %holiday.scope, "holiday added");
        self.holidays.push(holiday);
        Ok(true)
    }

    /// Adds a holiday and reschedules open deadlines against it. Returns `None` when
    /// the holiday was already present. A failed refresh drops the holiday again.
    pub fn apply_holiday(
        &mut self,
        holiday: Holiday,
    ) -> Result<Option<RefreshSummary>, DocketError> {
        let before = self.holidays.len();
        if !self.add_holiday(holiday)? {
            return Ok(None);
        }
        match self.refresh() {
            Ok(summary) => Ok(Some(summary)),
            Err(err) => {
                self.holidays.truncate(before);
                Err(err)
            }
        }
    }

    pub fn add_holidays<I>(&mut self, holidays: I) -> Result<usize, DocketError>
    where
        I: IntoIterator<Item = Holiday>,
    {
        let mut added = 0;
        for holiday in holidays {
            if self.add_holiday(holiday)? {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn remove_holiday(
        &mut self,
        date: NaiveDate,
        scope: HolidayScope,
        owner: Option<&str>,
    ) -> bool {
        let before = self.holidays.len();
        self.holidays.retain(|holiday| {
            !(holiday.date == date
                && holiday.scope == scope
                && (scope == HolidayScope::National || holiday.owner.as_deref() == owner))
        });
        self.holidays.len() != before
    }

    /// Holidays effective for `user_id`, ordered by date.
    pub fn holidays_for(&self, user_id: &str) -> Vec<&Holiday> {
        let mut holidays: Vec<&Holiday> = self
            .holidays
            .iter()
            .filter(|holiday| holiday.is_effective_for(user_id))
            .collect();
        holidays.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        holidays
    }

    pub fn calendar_for(&self, user_id: &str) -> HolidayCalendar {
        HolidayCalendar::with_holidays(self.effective_holidays(user_id))
            .with_max_scan_days(self.config.max_scan_days)
    }

    pub fn add_case(&mut self, case: Case) -> Result<(), DocketError> {
        record_validation::validate_case(&case)?;
        if self.cases.contains_key(&case.id) {
            return Err(DocketError::Conflict {
                kind: "case",
                id: case.id,
            });
        }
        self.cases.insert(case.id, case);
        Ok(())
    }

    pub fn next_case_id(&self) -> i32 {
        self.cases.keys().next_back().map_or(1, |max| max + 1)
    }

    pub fn case(&self, case_id: i32, user_id: &str) -> Result<&Case, DocketError> {
        let case = self.cases.get(&case_id).ok_or(DocketError::NotFound {
            kind: "case",
            id: case_id,
        })?;
        if case.user_id != user_id {
            return Err(DocketError::Forbidden {
                kind: "case",
                id: case_id,
                user_id: user_id.to_string(),
            });
        }
        Ok(case)
    }

    pub fn cases_for(&self, user_id: &str) -> Vec<&Case> {
        self.cases
            .values()
            .filter(|case| case.user_id == user_id)
            .collect()
    }

    pub fn set_case_status(
        &mut self,
        case_id: i32,
        user_id: &str,
        status: CaseStatus,
    ) -> Result<(), DocketError> {
        self.case(case_id, user_id)?;
        if let Some(case) = self.cases.get_mut(&case_id) {
            case.status = status;
        }
        Ok(())
    }

    /// Computes the due date against the user's effective holidays and
    /// records the deadline together with its reminders.
    pub fn create_deadline(
        &mut self,
        new: NewDeadline,
        today: NaiveDate,
    ) -> Result<ScheduledDeadline, DocketError> {
        let case = self.case(new.case_id, &new.user_id)?;
        if !case.is_active() {
            return Err(DocketError::CaseNotActive(case.id));
        }
        if new.title.trim().is_empty() {
            return Err(DocketError::Invalid("deadline title must not be empty".into()));
        }

        let spec = DeadlineSpec {
            start_date: new.start_date,
            required_business_days: new.business_days,
            holidays: self.effective_holidays(&new.user_id),
        };
        let computed = schedule_deadline_with_limit(&spec, today, self.config.max_scan_days)?;
        let offsets = new
            .reminder_offsets
            .clone()
            .unwrap_or_else(|| self.config.notifications.default_reminders.clone());
        let planned = plan_reminders(computed.due_date, &offsets)?;

        let deadline = Deadline {
            id: self.next_deadline_id(),
            case_id: new.case_id,
            user_id: new.user_id,
            title: new.title,
            deadline_type: new.deadline_type,
            start_date: new.start_date,
            business_days: new.business_days,
            due_date: computed.due_date,
            notes: new.notes,
            is_completed: false,
            completed_on: None,
        };

        let mut next_reminder_id = self.next_reminder_id();
        let mut reminders = Vec::with_capacity(planned.len());
        for plan in planned {
            let reminder = Reminder {
                id: next_reminder_id,
                deadline_id: deadline.id,
                user_id: deadline.user_id.clone(),
                days_before: plan.days_before,
                reminder_date: plan.reminder_date,
                is_sent: false,
                sent_on: None,
            };
            next_reminder_id += 1;
            self.reminders.insert(reminder.id, reminder.clone());
            reminders.push(reminder);
        }
        self.deadlines.insert(deadline.id, deadline.clone());

        info!(
            deadline_id = deadline.id,
            case_id = deadline.case_id,
            due = %deadline.due_date,
            reminders = reminders.len(),
            "deadline created"
        );
        Ok(ScheduledDeadline {
            urgency: computed.urgency(),
            deadline,
            computed,
            reminders,
        })
    }

    pub fn deadline(&self, deadline_id: i32, user_id: &str) -> Result<&Deadline, DocketError> {
        let deadline = self.deadlines.get(&deadline_id).ok_or(DocketError::NotFound {
            kind: "deadline",
            id: deadline_id,
        })?;
        if deadline.user_id != user_id {
            return Err(DocketError::Forbidden {
                kind: "deadline",
                id: deadline_id,
                user_id: user_id.to_string(),
            });
        }
        Ok(deadline)
    }

    /// Reminders of one deadline, furthest from the due date first.
    pub fn reminders_for(&self, deadline_id: i32) -> Vec<&Reminder> {
        let mut reminders: Vec<&Reminder> = self
            .reminders
            .values()
            .filter(|reminder| reminder.deadline_id == deadline_id)
            .collect();
        reminders.sort_by_key(|reminder| (reminder.reminder_date, reminder.id));
        reminders
    }

    pub fn complete_deadline(
        &mut self,
        deadline_id: i32,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<&Deadline, DocketError> {
        if self.deadline(deadline_id, user_id)?.is_completed {
            return Err(DocketError::AlreadyCompleted(deadline_id));
        }
        let deadline = self
            .deadlines
            .get_mut(&deadline_id)
            .ok_or(DocketError::NotFound {
                kind: "deadline",
                id: deadline_id,
            })?;
        deadline.is_completed = true;
        deadline.completed_on = Some(today);
        info!(deadline_id, completed_on = %today, "deadline completed");
        Ok(deadline)
    }

    /// Removes the deadline and every reminder attached to it.
    pub fn delete_deadline(
        &mut self,
        deadline_id: i32,
        user_id: &str,
    ) -> Result<Deadline, DocketError> {
        self.deadline(deadline_id, user_id)?;
        let removed = self
            .deadlines
            .remove(&deadline_id)
            .ok_or(DocketError::NotFound {
                kind: "deadline",
                id: deadline_id,
            })?;
        self.reminders
            .retain(|_, reminder| reminder.deadline_id != deadline_id);
        Ok(removed)
    }

    /// Active deadlines of `user_id`, soonest due first.
    pub fn upcoming(&self, user_id: &str, today: NaiveDate) -> Vec<UpcomingDeadline> {
        let mut upcoming: Vec<UpcomingDeadline> = self
            .deadlines
            .values()
            .filter(|deadline| deadline.user_id == user_id && deadline.is_active())
            .map(|deadline| {
                let (case_number, case_name) = self
                    .cases
                    .get(&deadline.case_id)
                    .map(|case| (case.case_number.clone(), case.case_name.clone()))
                    .unwrap_or_default();
                let days = days_until(deadline.due_date, today);
                UpcomingDeadline {
                    deadline: deadline.clone(),
                    case_number,
                    case_name,
                    days_until: days,
                    urgency: UrgencyTier::classify(days),
                }
            })
            .collect();
        upcoming.sort_by_key(|item| (item.deadline.due_date, item.deadline.id));
        upcoming
    }

    pub fn stats(&self, user_id: &str, today: NaiveDate) -> DocketStats {
        let mut stats = DocketStats {
            active_cases: self
                .cases
                .values()
                .filter(|case| case.user_id == user_id && case.is_active())
                .count(),
            ..DocketStats::default()
        };

        for deadline in self.deadlines.values().filter(|d| d.user_id == user_id) {
            match deadline.completed_on {
                Some(done) => {
                    if done.year() == today.year() && done.month() == today.month() {
                        stats.completed_this_month += 1;
                    }
                }
                None => {
                    stats.active_deadlines += 1;
                    let tier = UrgencyTier::classify(days_until(deadline.due_date, today));
                    if tier.is_urgent() {
                        stats.urgent_deadlines += 1;
                    }
                    if tier == UrgencyTier::Overdue {
                        stats.overdue_deadlines += 1;
                    }
                }
            }
        }
        stats
    }

    /// Unsent reminders dated on or before `today` whose deadline is still open.
    pub fn due_reminders(&self, today: NaiveDate) -> Vec<&Reminder> {
        let mut due: Vec<&Reminder> = self
            .reminders
            .values()
            .filter(|reminder| !reminder.is_sent && reminder.reminder_date <= today)
            .filter(|reminder| {
                self.deadlines
                    .get(&reminder.deadline_id)
                    .is_some_and(Deadline::is_active)
            })
            .collect();
        due.sort_by_key(|reminder| (reminder.reminder_date, reminder.id));
        due
    }

    pub fn mark_reminder_sent(
        &mut self,
        reminder_id: i32,
        today: NaiveDate,
    ) -> Result<(), DocketError> {
        let reminder = self
            .reminders
            .get_mut(&reminder_id)
            .ok_or(DocketError::NotFound {
                kind: "reminder",
                id: reminder_id,
            })?;
        reminder.is_sent = true;
        reminder.sent_on = Some(today);
        Ok(())
    }

    /// Recomputes the due date of every open deadline against the current
    /// holiday list and moves reminder dates along with it.
    pub fn refresh(&mut self) -> Result<RefreshSummary, DocketError> {
        let users: HashSet<&str> = self
            .deadlines
            .values()
            .filter(|deadline| deadline.is_active())
            .map(|deadline| deadline.user_id.as_str())
            .collect();
        let calendars: HashMap<&str, HashSet<NaiveDate>> = users
            .into_iter()
            .map(|user| (user, effective_holidays(&self.holidays, user)))
            .collect();
        let max_scan_days = self.config.max_scan_days;
        let open: Vec<&Deadline> = self
            .deadlines
            .values()
            .filter(|deadline| deadline.is_active())
            .collect();

        let empty = HashSet::new();
        let recomputed: Vec<(i32, NaiveDate)> = open
            .par_iter()
            .map(|deadline| {
                let holidays = calendars
                    .get(deadline.user_id.as_str())
                    .unwrap_or(&empty);
                add_business_days_capped(
                    deadline.start_date,
                    deadline.business_days,
                    holidays,
                    max_scan_days,
                )
                .map(|due| (deadline.id, due))
            })
            .collect::<Result<Vec<_>, DeadlineError>>()?;

        let deadline_count = recomputed.len();
        let changed: HashMap<i32, NaiveDate> = recomputed
            .into_iter()
            .filter(|(deadline_id, due)| {
                self.deadlines
                    .get(deadline_id)
                    .is_some_and(|deadline| deadline.due_date != *due)
            })
            .collect();

        // Nothing is written until every reminder date is known.
        let mut reminder_dates = Vec::new();
        for reminder in self.reminders.values() {
            let Some(due) = changed.get(&reminder.deadline_id) else {
                continue;
            };
            let date = due
                .checked_sub_days(Days::new(reminder.days_before as u64))
                .ok_or_else(|| {
                    DeadlineError::invalid(format!(
                        "reminder {} falls outside the supported date range",
                        reminder.id
                    ))
                })?;
            reminder_dates.push((reminder.id, date));
        }

        let mut rescheduled: Vec<i32> = changed.keys().copied().collect();
        rescheduled.sort_unstable();
        for (deadline_id, due) in &changed {
            if let Some(deadline) = self.deadlines.get_mut(deadline_id) {
                debug!(deadline_id, from = %deadline.due_date, to = %due, "deadline rescheduled");
                deadline.due_date = *due;
            }
        }
        for (reminder_id, date) in reminder_dates {
            if let Some(reminder) = self.reminders.get_mut(&reminder_id) {
                reminder.reminder_date = date;
            }
        }

        Ok(RefreshSummary {
            deadline_count,
            rescheduled,
        })
    }

    /// Tabular view of [`Docket::upcoming`] for rendering and export.
    pub fn deadlines_frame(&self, user_id: &str, today: NaiveDate) -> PolarsResult<DataFrame> {
        let upcoming = self.upcoming(user_id, today);

        let ids: Vec<i32> = upcoming.iter().map(|item| item.deadline.id).collect();
        let case_numbers: Vec<&str> = upcoming
            .iter()
            .map(|item| item.case_number.as_str())
            .collect();
        let titles: Vec<&str> = upcoming
            .iter()
            .map(|item| item.deadline.title.as_str())
            .collect();
        let kinds: Vec<&str> = upcoming
            .iter()
            .map(|item| item.deadline.deadline_type.as_str())
            .collect();
        let start_dates: Vec<String> = upcoming
            .iter()
            .map(|item| format_iso_date(item.deadline.start_date))
            .collect();
        let business_days: Vec<i64> = upcoming
            .iter()
            .map(|item| item.deadline.business_days)
            .collect();
        let due_dates: Vec<String> = upcoming
            .iter()
            .map(|item| format_iso_date(item.deadline.due_date))
            .collect();
        let days: Vec<i64> = upcoming.iter().map(|item| item.days_until).collect();
        let urgency: Vec<&str> = upcoming.iter().map(|item| item.urgency.as_str()).collect();

        let start_refs: Vec<&str> = start_dates.iter().map(String::as_str).collect();
        let due_refs: Vec<&str> = due_dates.iter().map(String::as_str).collect();

        DataFrame::new(vec![
            Series::new(PlSmallStr::from_static("id"), ids).into_column(),
            Series::new(PlSmallStr::from_static("case_number"), case_numbers).into_column(),
            Series::new(PlSmallStr::from_static("title"), titles).into_column(),
            Series::new(PlSmallStr::from_static("deadline_type"), kinds).into_column(),
            Series::new(PlSmallStr::from_static("start_date"), start_refs).into_column(),
            Series::new(PlSmallStr::from_static("business_days"), business_days).into_column(),
            Series::new(PlSmallStr::from_static("due_date"), due_refs).into_column(),
            Series::new(PlSmallStr::from_static("days_until"), days).into_column(),
            Series::new(PlSmallStr::from_static("urgency"), urgency).into_column(),
        ])
    }

    pub fn sync_request(
        &self,
        deadline_id: i32,
        user_id: &str,
    ) -> Result<CalendarSyncRequest, DocketError> {
        let deadline = self.deadline(deadline_id, user_id)?;
        let case = self.cases.get(&deadline.case_id).ok_or(DocketError::NotFound {
            kind: "case",
            id: deadline.case_id,
        })?;
        Ok(CalendarSyncRequest::for_deadline(deadline, case))
    }

    fn next_deadline_id(&self) -> i32 {
        self.deadlines.keys().next_back().map_or(1, |max| max + 1)
    }

    fn next_reminder_id(&self) -> i32 {
        self.reminders.keys().next_back().map_or(1, |max| max + 1)
    }
}

impl HolidaySource for Docket {
    fn effective_holidays(&self, user_id: &str) -> HashSet<NaiveDate> {
        effective_holidays(&self.holidays, user_id)
    }
}
