use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::docket::Docket;
use crate::records::{Case, Deadline};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
}

/// Everything a notifier needs to tell a user about one reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNotice {
    pub reminder_id: i32,
    pub deadline: Deadline,
    pub case: Case,
    pub recipient: Recipient,
    pub reminder_date: NaiveDate,
}

impl ReminderNotice {
    pub fn subject(&self) -> String {
        format!("Deadline reminder: {}", self.deadline.title)
    }

    pub fn body(&self) -> String {
        let mut lines = vec![
            format!("Dear {},", self.recipient.full_name),
            String::new(),
            "This is a reminder about the following deadline:".to_string(),
            String::new(),
            format!("Case: {} ({})", self.case.case_name, self.case.case_number),
            format!("Court: {}", self.case.court),
            format!("Client: {}", self.case.client_name),
            String::new(),
            format!("Deadline: {}", self.deadline.title),
            format!("Type: {}", self.deadline.deadline_type),
            format!("Due date: {}", self.deadline.due_date.format("%A, %B %-d, %Y")),
        ];
        if let Some(notes) = self.deadline.notes.as_deref() {
            lines.push(format!("Notes: {notes}"));
        }
        lines.push(String::new());
        lines.push("Please make sure this deadline is met on time.".to_string());
        lines.join("\n")
    }
}

#[derive(Debug, Error)]
#[error("delivery to {recipient} failed: {reason}")]
pub struct NotifyError {
    pub recipient: String,
    pub reason: String,
}

/// Delivers reminder notices; implemented outside the core (email, push, ...).
pub trait Notifier {
    fn deliver(&self, notice: &ReminderNotice) -> Result<(), NotifyError>;
}

/// Logs the notice instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn deliver(&self, notice: &ReminderNotice) -> Result<(), NotifyError> {
        info!(
            reminder_id = notice.reminder_id,
            deadline_id = notice.deadline.id,
            recipient = %notice.recipient.email,
            subject = %notice.subject(),
            "reminder notice"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub sent: Vec<i32>,
    pub skipped: Vec<(i32, String)>,
    pub failed: Vec<(i32, String)>,
}

/// Delivers every reminder due on or before `today` and marks the delivered
/// ones as sent. Failed deliveries stay unsent so the next dispatch retries them.
pub fn dispatch_due_reminders(
    docket: &mut Docket,
    notifier: &dyn Notifier,
    recipients: &HashMap<String, Recipient>,
    today: NaiveDate,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    let email_enabled = docket.config().notifications.email_enabled;

    let mut notices = Vec::new();
    for reminder in docket.due_reminders(today) {
        if !email_enabled {
            summary
                .skipped
                .push((reminder.id, "notifications disabled".to_string()));
            continue;
        }
        let Some(recipient) = recipients.get(&reminder.user_id) else {
            summary
                .skipped
                .push((reminder.id, format!("no recipient for user '{}'", reminder.user_id)));
            continue;
        };
        let Ok(deadline) = docket.deadline(reminder.deadline_id, &reminder.user_id) else {
            summary
                .skipped
                .push((reminder.id, format!("deadline {} missing", reminder.deadline_id)));
            continue;
        };
        let Ok(case) = docket.case(deadline.case_id, &reminder.user_id) else {
            summary
                .skipped
                .push((reminder.id, format!("case {} missing", deadline.case_id)));
            continue;
        };
        notices.push(ReminderNotice {
            reminder_id: reminder.id,
            deadline: deadline.clone(),
            case: case.clone(),
            recipient: recipient.clone(),
            reminder_date: reminder.reminder_date,
        });
    }

    for notice in notices {
        match notifier.deliver(&notice) {
            Ok(()) => match docket.mark_reminder_sent(notice.reminder_id, today) {
                Ok(()) => summary.sent.push(notice.reminder_id),
                Err(err) => summary.failed.push((notice.reminder_id, err.to_string())),
            },
            Err(err) => {
                warn!(reminder_id = notice.reminder_id, %err, "reminder delivery failed");
                summary.failed.push((notice.reminder_id, err.to_string()));
            }
        }
    }
    summary
}
