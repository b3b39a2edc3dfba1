use chrono::NaiveDate;
use deadline_tool::{
    Case, DeadlineType, Docket, DocketConfig, Holiday, NewDeadline, Notifier, NotifyError,
    Recipient, ReminderNotice, TracingNotifier, dispatch_due_reminders,
};
use std::cell::RefCell;
use std::collections::HashMap;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[derive(Default)]
struct RecordingNotifier {
    delivered: RefCell<Vec<ReminderNotice>>,
    fail_for: Option<i32>,
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, notice: &ReminderNotice) -> Result<(), NotifyError> {
        if self.fail_for == Some(notice.reminder_id) {
            return Err(NotifyError {
                recipient: notice.recipient.email.clone(),
                reason: "mailbox full".into(),
            });
        }
        self.delivered.borrow_mut().push(notice.clone());
        Ok(())
    }
}

fn seeded_docket(config: DocketConfig) -> Docket {
    let mut docket = Docket::with_config(config);
    docket
        .add_holiday(Holiday::national(d(2025, 1, 17), "Court closure"))
        .unwrap();
    let mut case = Case::new(1, "alice", "CV-2025-001", "Smith v. Jones");
    case.court = "District Court".into();
    case.client_name = "Jane Smith".into();
    docket.add_case(case).unwrap();
    docket
        .create_deadline(
            NewDeadline::new(1, "alice", "File answer", d(2025, 1, 6), 10)
                .with_type(DeadlineType::Filing)
                .with_notes("Bring exhibits"),
            d(2025, 1, 6),
        )
        .unwrap();
    docket
}

fn recipients() -> HashMap<String, Recipient> {
    let mut recipients = HashMap::new();
    recipients.insert(
        "alice".to_string(),
        Recipient {
            user_id: "alice".into(),
            email: "alice@example.com".into(),
            full_name: "Alice Attorney".into(),
        },
    );
    recipients
}

#[test]
fn dispatch_sends_due_reminders_and_marks_them() {
    let mut docket = seeded_docket(DocketConfig::default());
    let notifier = RecordingNotifier::default();

    let summary = dispatch_due_reminders(&mut docket, &notifier, &recipients(), d(2025, 1, 18));
    assert_eq!(summary.sent, vec![1, 2]);
    assert!(summary.skipped.is_empty());
    assert!(summary.failed.is_empty());
    assert_eq!(notifier.delivered.borrow().len(), 2);
    assert!(docket.due_reminders(d(2025, 1, 18)).is_empty());

    let sent = docket.reminders_for(1);
    assert!(sent[0].is_sent && sent[1].is_sent && !sent[2].is_sent);
    assert_eq!(sent[0].sent_on, Some(d(2025, 1, 18)));

    // Nothing left to send on the same day
    let again = dispatch_due_reminders(&mut docket, &notifier, &recipients(), d(2025, 1, 18));
    assert!(again.sent.is_empty());
}

#[test]
fn failed_delivery_stays_unsent() {
    let mut docket = seeded_docket(DocketConfig::default());
    let notifier = RecordingNotifier {
        fail_for: Some(2),
        ..RecordingNotifier::default()
    };

    let summary = dispatch_due_reminders(&mut docket, &notifier, &recipients(), d(2025, 1, 18));
    assert_eq!(summary.sent, vec![1]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, 2);
    let pending: Vec<i32> = docket
        .due_reminders(d(2025, 1, 18))
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(pending, vec![2]);
}

#[test]
fn disabled_notifications_skip_everything() {
    let mut config = DocketConfig::default();
    config.notifications.email_enabled = false;
    let mut docket = seeded_docket(config);

    let summary =
        dispatch_due_reminders(&mut docket, &TracingNotifier, &recipients(), d(2025, 1, 18));
    assert!(summary.sent.is_empty());
    assert_eq!(summary.skipped.len(), 2);
    assert_eq!(docket.due_reminders(d(2025, 1, 18)).len(), 2);
}

#[test]
fn users_without_recipient_are_skipped() {
    let mut docket = seeded_docket(DocketConfig::default());
    let summary =
        dispatch_due_reminders(&mut docket, &TracingNotifier, &HashMap::new(), d(2025, 1, 18));
    assert!(summary.sent.is_empty());
    assert_eq!(summary.skipped.len(), 2);
    assert!(summary.skipped[0].1.contains("alice"));
}

#[test]
fn notice_renders_subject_and_body() {
    let mut docket = seeded_docket(DocketConfig::default());
    let notifier = RecordingNotifier::default();
    dispatch_due_reminders(&mut docket, &notifier, &recipients(), d(2025, 1, 11));

    let delivered = notifier.delivered.borrow();
    assert_eq!(delivered.len(), 1);
    let notice = &delivered[0];
    assert_eq!(notice.subject(), "Deadline reminder: File answer");
    let body = notice.body();
    assert!(body.starts_with("Dear Alice Attorney,"));
    assert!(body.contains("Case: Smith v. Jones (CV-2025-001)"));
    assert!(body.contains("Court: District Court"));
    assert!(body.contains("Type: filing"));
    assert!(body.contains("Due date: Tuesday, January 21, 2025"));
    assert!(body.contains("Notes: Bring exhibits"));
}
