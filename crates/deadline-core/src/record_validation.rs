use crate::holiday::{Holiday, HolidayScope};
use crate::records::{Case, Deadline, Reminder};
use chrono::Days;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RecordValidationError {
    message: String,
}

impl RecordValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn validate_holiday(holiday: &Holiday) -> Result<(), RecordValidationError> {
    if holiday.name.trim().is_empty() {
        return Err(RecordValidationError::new(format!(
            "holiday on {} requires a name",
            holiday.date
        )));
    }
    match (holiday.scope, holiday.owner.as_deref()) {
        (HolidayScope::Personal, None) => Err(RecordValidationError::new(format!(
            "personal holiday '{}' on {} requires an owner",
            holiday.name, holiday.date
        ))),
        (HolidayScope::Personal, Some(owner)) if owner.trim().is_empty() => {
            Err(RecordValidationError::new(format!(
                "personal holiday '{}' on {} requires a non-empty owner",
                holiday.name, holiday.date
            )))
        }
        _ => Ok(()),
    }
}

pub fn validate_case(case: &Case) -> Result<(), RecordValidationError> {
    if case.user_id.trim().is_empty() {
        return Err(RecordValidationError::new(format!(
            "case {} requires a user_id",
            case.id
        )));
    }
    if case.case_number.trim().is_empty() {
        return Err(RecordValidationError::new(format!(
            "case {} requires a case_number",
            case.id
        )));
    }
    if case.case_name.trim().is_empty() {
        return Err(RecordValidationError::new(format!(
            "case {} requires a case_name",
            case.id
        )));
    }
    Ok(())
}

pub fn validate_deadline(deadline: &Deadline) -> Result<(), RecordValidationError> {
    if deadline.title.trim().is_empty() {
        return Err(RecordValidationError::new(format!(
            "deadline {} requires a title",
            deadline.id
        )));
    }
    if deadline.business_days < 1 {
        return Err(RecordValidationError::new(format!(
            "deadline {} has business_days {} (must be at least 1)",
            deadline.id, deadline.business_days
        )));
    }
    if deadline.due_date <= deadline.start_date {
        return Err(RecordValidationError::new(format!(
            "deadline {} due_date {} must fall after start_date {}",
            deadline.id, deadline.due_date, deadline.start_date
        )));
    }
    if deadline.is_completed != deadline.completed_on.is_some() {
        return Err(RecordValidationError::new(format!(
            "deadline {} completed_on must be set exactly when is_completed is true",
            deadline.id
        )));
    }
    Ok(())
}

pub fn validate_reminder(
    reminder: &Reminder,
    deadline: &Deadline,
) -> Result<(), RecordValidationError> {
    if reminder.days_before < 0 {
        return Err(RecordValidationError::new(format!(
            "reminder {} has negative days_before {}",
            reminder.id, reminder.days_before
        )));
    }
    if reminder.user_id != deadline.user_id {
        return Err(RecordValidationError::new(format!(
            "reminder {} belongs to '{}' but deadline {} belongs to '{}'",
            reminder.id, reminder.user_id, deadline.id, deadline.user_id
        )));
    }
    let expected = deadline
        .due_date
        .checked_sub_days(Days::new(reminder.days_before as u64));
    if expected != Some(reminder.reminder_date) {
        return Err(RecordValidationError::new(format!(
            "reminder {} date {} is not {} days before due date {}",
            reminder.id, reminder.reminder_date, reminder.days_before, deadline.due_date
        )));
    }
    if reminder.is_sent != reminder.sent_on.is_some() {
        return Err(RecordValidationError::new(format!(
            "reminder {} sent_on must be set exactly when is_sent is true",
            reminder.id
        )));
    }
    Ok(())
}

pub fn validate_record_collection(
    cases: &[Case],
    deadlines: &[Deadline],
    reminders: &[Reminder],
    holidays: &[Holiday],
) -> Result<(), RecordValidationError> {
    for holiday in holidays {
        validate_holiday(holiday)?;
    }

    let mut case_owners: HashMap<i32, &str> = HashMap::with_capacity(cases.len());
    for case in cases {
        validate_case(case)?;
        if case_owners.insert(case.id, case.user_id.as_str()).is_some() {
            return Err(RecordValidationError::new(format!(
                "duplicate case id {}",
                case.id
            )));
        }
    }

    let mut deadlines_by_id: HashMap<i32, &Deadline> = HashMap::with_capacity(deadlines.len());
    for deadline in deadlines {
        validate_deadline(deadline)?;
        match case_owners.get(&deadline.case_id) {
            None => {
                return Err(RecordValidationError::new(format!(
                    "deadline {} references missing case {}",
                    deadline.id, deadline.case_id
                )));
            }
            Some(owner) if *owner != deadline.user_id => {
                return Err(RecordValidationError::new(format!(
                    "deadline {} belongs to '{}' but case {} belongs to '{}'",
                    deadline.id, deadline.user_id, deadline.case_id, owner
                )));
            }
            Some(_) => {}
        }
        if deadlines_by_id.insert(deadline.id, deadline).is_some() {
            return Err(RecordValidationError::new(format!(
                "duplicate deadline id {}",
                deadline.id
            )));
        }
    }

    let mut reminder_ids = HashSet::with_capacity(reminders.len());
    for reminder in reminders {
        if !reminder_ids.insert(reminder.id) {
            return Err(RecordValidationError::new(format!(
                "duplicate reminder id {}",
                reminder.id
            )));
        }
        let deadline = deadlines_by_id.get(&reminder.deadline_id).ok_or_else(|| {
            RecordValidationError::new(format!(
                "reminder {} references missing deadline {}",
                reminder.id, reminder.deadline_id
            ))
        })?;
        validate_reminder(reminder, deadline)?;
    }

    Ok(())
}
