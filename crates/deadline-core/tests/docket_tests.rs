use chrono::{Days, NaiveDate};
use std::collections::HashSet;
use deadline_tool::{
    CalendarSyncRequest, Case, CaseStatus, DeadlineType, Docket, DocketConfig, DocketError,
    Holiday, HolidayScope, HolidaySource, NewDeadline, UrgencyTier, add_business_days,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn docket_with_case() -> Docket {
    let mut docket = Docket::new();
    docket
        .add_holiday(Holiday::national(d(2025, 1, 17), "Court closure"))
        .unwrap();
    let mut case = Case::new(1, "alice", "CV-2025-001", "Smith v. Jones");
    case.court = "District Court".into();
    case.client_name = "Smith".into();
    docket.add_case(case).unwrap();
    docket
}

fn filing(business_days: i64) -> NewDeadline {
    NewDeadline::new(1, "alice", "File answer", d(2025, 1, 6), business_days)
        .with_type(DeadlineType::Filing)
}

#[test]
fn create_deadline_computes_due_date_and_default_reminders() {
    let mut docket = docket_with_case();
    let scheduled = docket.create_deadline(filing(10), d(2025, 1, 18)).unwrap();

    assert_eq!(scheduled.deadline.id, 1);
    assert_eq!(scheduled.deadline.due_date, d(2025, 1, 21));
    assert_eq!(scheduled.computed.days_until_due, 3);
    assert_eq!(scheduled.urgency, UrgencyTier::Critical);

    let dates: Vec<NaiveDate> = scheduled
        .reminders
        .iter()
        .map(|reminder| reminder.reminder_date)
        .collect();
    assert_eq!(dates, vec![d(2025, 1, 11), d(2025, 1, 18), d(2025, 1, 20)]);
    assert!(scheduled.reminders.iter().all(|r| !r.is_sent));
    assert_eq!(docket.reminders_for(1).len(), 3);
}

#[test]
fn explicit_offsets_override_configured_defaults() {
    let mut config = DocketConfig::default();
    config.notifications.default_reminders = vec![5];
    let mut docket = Docket::with_config(config);
    docket
        .add_case(Case::new(1, "alice", "CV-1", "A v. B"))
        .unwrap();

    let defaulted = docket
        .create_deadline(
            NewDeadline::new(1, "alice", "Brief", d(2025, 1, 6), 10),
            d(2025, 1, 6),
        )
        .unwrap();
    assert_eq!(defaulted.reminders.len(), 1);
    assert_eq!(defaulted.reminders[0].days_before, 5);

    let explicit = docket
        .create_deadline(
            NewDeadline::new(1, "alice", "Reply", d(2025, 1, 6), 10)
                .with_reminder_offsets(vec![2, 7]),
            d(2025, 1, 6),
        )
        .unwrap();
    let offsets: Vec<i64> = explicit.reminders.iter().map(|r| r.days_before).collect();
    assert_eq!(offsets, vec![7, 2]);
    assert_eq!(explicit.deadline.id, 2);
}

#[test]
fn personal_holidays_apply_only_to_their_owner() {
    let mut docket = docket_with_case();
    docket
        .add_case(Case::new(2, "bob", "CV-2025-002", "Doe v. Roe"))
        .unwrap();
    docket
        .add_holiday(Holiday::personal(d(2025, 1, 21), "Vacation", "bob"))
        .unwrap();

    let alice = docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();
    let bob = docket
        .create_deadline(
            NewDeadline::new(2, "bob", "File answer", d(2025, 1, 6), 10),
            d(2025, 1, 6),
        )
        .unwrap();

    assert_eq!(alice.deadline.due_date, d(2025, 1, 21));
    assert_eq!(bob.deadline.due_date, d(2025, 1, 22));
    assert!(!docket.effective_holidays("alice").contains(&d(2025, 1, 21)));
    assert!(docket.effective_holidays("bob").contains(&d(2025, 1, 21)));
    assert_eq!(docket.holidays_for("alice").len(), 1);
    assert_eq!(docket.holidays_for("bob").len(), 2);
}

#[test]
fn duplicate_holiday_is_ignored_and_personal_needs_owner() {
    let mut docket = docket_with_case();
    assert!(
        !docket
            .add_holiday(Holiday::national(d(2025, 1, 17), "Court closure"))
            .unwrap()
    );
    let ownerless = Holiday {
        date: d(2025, 2, 3),
        name: "Day off".into(),
        scope: HolidayScope::Personal,
        owner: None,
    };
    assert!(matches!(
        docket.add_holiday(ownerless),
        Err(DocketError::Invalid(_))
    ));
    assert!(docket.remove_holiday(d(2025, 1, 17), HolidayScope::National, None));
    assert!(docket.holidays().is_empty());
}

#[test]
fn foreign_and_missing_cases_are_rejected() {
    let mut docket = docket_with_case();
    let foreign = NewDeadline::new(1, "mallory", "Sneaky", d(2025, 1, 6), 5);
    assert!(matches!(
        docket.create_deadline(foreign, d(2025, 1, 6)),
        Err(DocketError::Forbidden { .. })
    ));
    let missing = NewDeadline::new(42, "alice", "Nowhere", d(2025, 1, 6), 5);
    assert!(matches!(
        docket.create_deadline(missing, d(2025, 1, 6)),
        Err(DocketError::NotFound { kind: "case", id: 42 })
    ));
    assert!(docket.deadlines().next().is_none());
}

#[test]
fn closed_cases_take_no_new_deadlines() {
    let mut docket = docket_with_case();
    docket
        .set_case_status(1, "alice", CaseStatus::Closed)
        .unwrap();
    assert!(matches!(
        docket.create_deadline(filing(5), d(2025, 1, 6)),
        Err(DocketError::CaseNotActive(1))
    ));
}

#[test]
fn invalid_business_days_surface_as_deadline_errors() {
    let mut docket = docket_with_case();
    assert!(matches!(
        docket.create_deadline(filing(0), d(2025, 1, 6)),
        Err(DocketError::Deadline(_))
    ));
    assert!(matches!(
        docket.create_deadline(filing(5).with_reminder_offsets(vec![-2]), d(2025, 1, 6)),
        Err(DocketError::Deadline(_))
    ));
    assert!(docket.deadlines().next().is_none());
    assert!(docket.reminders().next().is_none());
}

#[test]
fn duplicate_case_id_conflicts() {
    let mut docket = docket_with_case();
    assert!(matches!(
        docket.add_case(Case::new(1, "alice", "CV-X", "Other")),
        Err(DocketError::Conflict { kind: "case", id: 1 })
    ));
    assert_eq!(docket.next_case_id(), 2);
}

#[test]
fn completing_removes_deadline_from_upcoming_and_due_reminders() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();

    assert_eq!(docket.due_reminders(d(2025, 1, 18)).len(), 2);
    docket.complete_deadline(1, "alice", d(2025, 1, 18)).unwrap();

    assert!(docket.upcoming("alice", d(2025, 1, 18)).is_empty());
    assert!(docket.due_reminders(d(2025, 1, 18)).is_empty());
    assert!(matches!(
        docket.complete_deadline(1, "alice", d(2025, 1, 19)),
        Err(DocketError::AlreadyCompleted(1))
    ));
    let deadline = docket.deadline(1, "alice").unwrap();
    assert_eq!(deadline.completed_on, Some(d(2025, 1, 18)));
}

#[test]
fn deleting_a_deadline_drops_its_reminders() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();
    docket.create_deadline(filing(3), d(2025, 1, 6)).unwrap();
    assert_eq!(docket.reminders().count(), 6);

    assert!(matches!(
        docket.delete_deadline(1, "bob"),
        Err(DocketError::Forbidden { .. })
    ));
    let removed = docket.delete_deadline(1, "alice").unwrap();
    assert_eq!(removed.id, 1);
    assert_eq!(docket.reminders().count(), 3);
    assert!(docket.reminders().all(|r| r.deadline_id == 2));
    assert!(matches!(
        docket.deadline(1, "alice"),
        Err(DocketError::NotFound { .. })
    ));
}

#[test]
fn upcoming_is_sorted_by_due_date_with_urgency() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(20), d(2025, 1, 6)).unwrap();
    docket.create_deadline(filing(2), d(2025, 1, 6)).unwrap();
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();

    let upcoming = docket.upcoming("alice", d(2025, 1, 18));
    let ids: Vec<i32> = upcoming.iter().map(|item| item.deadline.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
    assert_eq!(upcoming[0].urgency, UrgencyTier::Overdue);
    assert_eq!(upcoming[1].urgency, UrgencyTier::Critical);
    assert_eq!(upcoming[0].case_number, "CV-2025-001");
    assert!(docket.upcoming("bob", d(2025, 1, 18)).is_empty());
}

#[test]
fn stats_count_urgent_overdue_and_completed() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(2), d(2025, 1, 6)).unwrap(); // due Jan 8
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap(); // due Jan 21
    docket.create_deadline(filing(40), d(2025, 1, 6)).unwrap(); // far out
    docket.create_deadline(filing(1), d(2025, 1, 6)).unwrap();
    docket.complete_deadline(4, "alice", d(2025, 1, 10)).unwrap();

    let stats = docket.stats("alice", d(2025, 1, 18));
    assert_eq!(stats.active_cases, 1);
    assert_eq!(stats.active_deadlines, 3);
    assert_eq!(stats.urgent_deadlines, 2);
    assert_eq!(stats.overdue_deadlines, 1);
    assert_eq!(stats.completed_this_month, 1);

    let next_month = docket.stats("alice", d(2025, 2, 3));
    assert_eq!(next_month.completed_this_month, 0);
}

#[test]
fn refresh_moves_due_and_reminder_dates_after_holiday_change() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();
    docket.create_deadline(filing(2), d(2025, 1, 6)).unwrap();

    docket
        .add_holiday(Holiday::national(d(2025, 1, 21), "Snow day"))
        .unwrap();
    let summary = docket.refresh().unwrap();

    assert_eq!(summary.deadline_count, 2);
    assert_eq!(summary.rescheduled, vec![1]);
    assert_eq!(summary.to_cli_summary(), "deadlines=2, rescheduled=1");
    assert_eq!(docket.deadline(1, "alice").unwrap().due_date, d(2025, 1, 22));

    let dates: Vec<NaiveDate> = docket
        .reminders_for(1)
        .iter()
        .map(|reminder| reminder.reminder_date)
        .collect();
    assert_eq!(dates, vec![d(2025, 1, 12), d(2025, 1, 19), d(2025, 1, 21)]);
    docket.validate().unwrap();
}

#[test]
fn apply_holiday_reschedules_once() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();

    let snow_day = Holiday::national(d(2025, 1, 21), "Snow day");
    let summary = docket.apply_holiday(snow_day.clone()).unwrap().unwrap();
    assert_eq!(summary.rescheduled, vec![1]);
    assert_eq!(docket.deadline(1, "alice").unwrap().due_date, d(2025, 1, 22));

    assert_eq!(docket.apply_holiday(snow_day).unwrap(), None);
    assert_eq!(docket.holidays().len(), 2);
}

#[test]
fn refresh_leaves_completed_deadlines_alone() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();
    docket.complete_deadline(1, "alice", d(2025, 1, 15)).unwrap();
    docket
        .add_holiday(Holiday::national(d(2025, 1, 21), "Snow day"))
        .unwrap();

    let summary = docket.refresh().unwrap();
    assert_eq!(summary.deadline_count, 0);
    assert!(summary.rescheduled.is_empty());
    assert_eq!(docket.deadline(1, "alice").unwrap().due_date, d(2025, 1, 21));
}

#[test]
fn failed_refresh_leaves_due_and_reminder_dates_untouched() {
    let mut docket = Docket::new();
    docket
        .add_case(Case::new(1, "alice", "CV-0001", "Ancient v. Earliest"))
        .unwrap();
    let none = HashSet::new();
    let start = NaiveDate::MIN + Days::new(10);
    let closed = add_business_days(start, 1, &none).unwrap();
    docket
        .add_holiday(Holiday::national(closed, "Court closure"))
        .unwrap();

    let closed_only: HashSet<NaiveDate> = [closed].into_iter().collect();
    let closed_due = add_business_days(start, 1, &closed_only).unwrap();
    let earliest_offset = (closed_due - NaiveDate::MIN).num_days();
    docket
        .create_deadline(
            NewDeadline::new(1, "alice", "File answer", start, 1)
                .with_reminder_offsets(vec![1, earliest_offset]),
            start,
        )
        .unwrap();
    let stored_due = docket.deadline(1, "alice").unwrap().due_date;
    let stored_reminders: Vec<NaiveDate> = docket
        .reminders_for(1)
        .iter()
        .map(|reminder| reminder.reminder_date)
        .collect();
    assert_eq!(stored_reminders.first(), Some(&NaiveDate::MIN));

    // Reopening the court pulls the due date earlier and the furthest reminder underflows
    assert!(docket.remove_holiday(closed, HolidayScope::National, None));
    assert!(docket.refresh().is_err());

    assert_eq!(docket.deadline(1, "alice").unwrap().due_date, stored_due);
    let after: Vec<NaiveDate> = docket
        .reminders_for(1)
        .iter()
        .map(|reminder| reminder.reminder_date)
        .collect();
    assert_eq!(after, stored_reminders);
    docket.validate().unwrap();
}

#[test]
fn deadlines_frame_has_one_row_per_open_deadline() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();
    docket.create_deadline(filing(2), d(2025, 1, 6)).unwrap();

    let df = docket.deadlines_frame("alice", d(2025, 1, 18)).unwrap();
    assert_eq!(df.height(), 2);
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "id",
            "case_number",
            "title",
            "deadline_type",
            "start_date",
            "business_days",
            "due_date",
            "days_until",
            "urgency"
        ]
    );

    let empty = docket.deadlines_frame("bob", d(2025, 1, 18)).unwrap();
    assert_eq!(empty.height(), 0);
}

#[test]
fn sync_request_follows_completion_state() {
    let mut docket = docket_with_case();
    docket
        .create_deadline(filing(10).with_notes("Serve opposing counsel"), d(2025, 1, 6))
        .unwrap();

    match docket.sync_request(1, "alice").unwrap() {
        CalendarSyncRequest::Upsert {
            due_date,
            case_number,
            notes,
            ..
        } => {
            assert_eq!(due_date, d(2025, 1, 21));
            assert_eq!(case_number, "CV-2025-001");
            assert_eq!(notes.as_deref(), Some("Serve opposing counsel"));
        }
        other => panic!("expected upsert, got {other:?}"),
    }

    docket.complete_deadline(1, "alice", d(2025, 1, 20)).unwrap();
    assert_eq!(
        docket.sync_request(1, "alice").unwrap(),
        CalendarSyncRequest::Remove { deadline_id: 1 }
    );
    assert!(matches!(
        docket.sync_request(1, "bob"),
        Err(DocketError::Forbidden { .. })
    ));
}

#[test]
fn mark_reminder_sent_removes_it_from_due_list() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();
    let due: Vec<i32> = docket
        .due_reminders(d(2025, 1, 18))
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(due, vec![1, 2]);

    docket.mark_reminder_sent(1, d(2025, 1, 18)).unwrap();
    assert_eq!(docket.due_reminders(d(2025, 1, 18)).len(), 1);
    assert!(matches!(
        docket.mark_reminder_sent(99, d(2025, 1, 18)),
        Err(DocketError::NotFound { kind: "reminder", .. })
    ));
}

#[test]
fn stored_deadline_reproduces_its_calculation() {
    let mut docket = docket_with_case();
    docket.create_deadline(filing(10), d(2025, 1, 6)).unwrap();
    let deadline = docket.deadline(1, "alice").unwrap();
    let spec = deadline.spec(docket.effective_holidays("alice"));
    let computed = deadline_tool::schedule_deadline(&spec, d(2025, 1, 18)).unwrap();
    assert_eq!(computed.due_date, deadline.due_date);
    let calendar = docket.calendar_for("alice");
    assert_eq!(
        calendar.count_business_days(deadline.start_date, deadline.due_date),
        10
    );
}
