//! External calendar integration boundary.
//!
//! The docket only describes what should change; a [`CalendarSync`]
//! implementation decides how to talk to the remote calendar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::records::{Case, Deadline, DeadlineType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CalendarSyncRequest {
    Upsert {
        deadline_id: i32,
        title: String,
        case_number: String,
        case_name: String,
        deadline_type: DeadlineType,
        due_date: NaiveDate,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    Remove {
        deadline_id: i32,
    },
}

impl CalendarSyncRequest {
    /// Completed deadlines are removed from the remote calendar; open ones are upserted.
    pub fn for_deadline(deadline: &Deadline, case: &Case) -> Self {
        if deadline.is_completed {
            return CalendarSyncRequest::Remove {
                deadline_id: deadline.id,
            };
        }
        CalendarSyncRequest::Upsert {
            deadline_id: deadline.id,
            title: deadline.title.clone(),
            case_number: case.case_number.clone(),
            case_name: case.case_name.clone(),
            deadline_type: deadline.deadline_type,
            due_date: deadline.due_date,
            notes: deadline.notes.clone(),
        }
    }

    pub fn deadline_id(&self) -> i32 {
        match self {
            CalendarSyncRequest::Upsert { deadline_id, .. }
            | CalendarSyncRequest::Remove { deadline_id } => *deadline_id,
        }
    }
}

#[derive(Debug, Error)]
#[error("calendar sync failed for deadline {deadline_id}: {reason}")]
pub struct SyncError {
    pub deadline_id: i32,
    pub reason: String,
}

pub trait CalendarSync {
    fn is_connected(&self) -> bool;
    fn push(&self, request: &CalendarSyncRequest) -> Result<(), SyncError>;
}

/// Pushes `request` when the integration is connected. Returns whether anything was sent.
pub fn sync_deadline(
    sync: &dyn CalendarSync,
    request: &CalendarSyncRequest,
) -> Result<bool, SyncError> {
    if !sync.is_connected() {
        debug!(
            deadline_id = request.deadline_id(),
            "calendar not connected, skipping sync"
        );
        return Ok(false);
    }
    sync.push(request)?;
    Ok(true)
}
