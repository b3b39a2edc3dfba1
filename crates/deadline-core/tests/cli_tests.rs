#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("DEADLINE_TOOL_CONFIG")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_calc_prints_due_date_and_urgency() {
    run_cli("today 2025-01-18\ncalc 2025-01-06 10 2025-01-17\nquit\n")
        .success()
        .stdout(str_contains("Due date: 2025-01-21"))
        .stdout(str_contains("Days until due: 3 (critical)"));
}

#[test]
fn cli_calc_rejects_malformed_dates() {
    run_cli("calc 2025-1-6 10\nquit\n")
        .success()
        .stdout(str_contains("malformed date '2025-1-6'"));
}

#[test]
fn cli_urgency_labels_days() {
    run_cli("urgency 0\nurgency 5\nquit\n")
        .success()
        .stdout(str_contains("due_today (due today)"))
        .stdout(str_contains("warning (5 days)"));
}

#[test]
fn cli_schedules_deadline_against_recorded_holidays() {
    let script = "today 2025-01-18\n\
                  holiday add 2025-01-17 national Court closure\n\
                  case add CV-1 Smith v. Jones\n\
                  deadline add 1 2025-01-06 10 filing File answer\n\
                  show\n\
                  stats\n\
                  quit\n";
    run_cli(script)
        .success()
        .stdout(str_contains("Added case id=1 (CV-1)."))
        .stdout(str_contains("Added deadline id=1 due 2025-01-21 (3 days, critical)."))
        .stdout(str_contains("| File answer"))
        .stdout(str_contains("Urgent deadlines    : 1"));
}

#[test]
fn cli_complete_and_delete_commands() {
    let script = "today 2025-01-18\n\
                  case add CV-1 Smith v. Jones\n\
                  deadline add 1 2025-01-06 3 response Reply\n\
                  deadline complete 1\n\
                  deadline complete 1\n\
                  deadline delete 1\n\
                  deadline delete 1\n\
                  quit\n";
    run_cli(script)
        .success()
        .stdout(str_contains("Completed deadline 1."))
        .stdout(str_contains("already completed"))
        .stdout(str_contains("Deleted deadline 1."))
        .stdout(str_contains("deadline 1 not found"));
}

#[test]
fn cli_other_users_cannot_touch_foreign_cases() {
    let script = "case add CV-1 Smith v. Jones\n\
                  user bob\n\
                  deadline add 1 2025-01-06 3 filing Sneaky\n\
                  quit\n";
    run_cli(script)
        .success()
        .stdout(str_contains("does not belong to user 'bob'"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "today 2025-01-18\ncase add CV-1 Persisted case\ndeadline add 1 2025-01-06 5 filing Kept\nsave json {path}\ndeadline add 1 2025-01-06 5 filing Temp\nload json {path}\nshow\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(
        output.contains("Loaded docket from"),
        "expected output to mention load completion"
    );
    let after_reload = output
        .split("Loaded docket from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("Kept"), "persisted deadline should remain");
    assert!(
        !after_reload.contains("Temp"),
        "unsaved deadline should not appear after reload:\n{}",
        after_reload
    );
}

#[test]
fn cli_reminder_preview_and_sync() {
    let script = "today 2025-01-18\n\
                  reminders preview 2025-01-21 1,10,3\n\
                  case add CV-9 Acme v. Widget\n\
                  deadline add 1 2025-01-06 10 hearing Hearing prep\n\
                  sync 1\n\
                  reminders send\n\
                  reminders due\n\
                  quit\n";
    run_cli(script)
        .success()
        .stdout(str_contains("2025-01-11 (10 day(s) before)"))
        .stdout(str_contains("\"action\": \"upsert\""))
        .stdout(str_contains("Sent 2 reminder(s), skipped 0, failed 0."))
        .stdout(str_contains("No reminders due."));
}
