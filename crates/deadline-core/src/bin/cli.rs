use chrono::{Local, NaiveDate};
use deadline_tool::dates::parse_iso_date_list;
use deadline_tool::scheduling::schedule_deadline_with_limit;
use deadline_tool::urgency::describe_days_until;
use deadline_tool::{
    Case, CaseStatus, DeadlineSpec, DeadlineType, Docket, DocketConfig, Holiday, HolidayScope,
    NewDeadline, Recipient, TracingNotifier, UrgencyTier, dispatch_due_reminders,
    load_docket_from_json, load_holidays_from_csv, parse_iso_date, plan_reminders,
    save_docket_to_json, save_holidays_to_csv,
};
use polars::prelude::{AnyValue, DataFrame};
use std::collections::HashMap;
use std::io::{self, Write};
use std::str::FromStr;

fn parse_offset_list(s: &str) -> Result<Vec<i64>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| format!("Invalid offset '{part}'"))
        })
        .collect()
}

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| {
                    col.get(row_idx)
                        .map(|av| cell_text(&av))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(value.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(col_names.as_slice()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row.as_slice()));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                                        Show this help\n  user [id]                                   Show or switch the current user\n  today [YYYY-MM-DD]                          Show or pin the reference date\n  holiday add <date> <national|personal> <name...>\n                                              Record a holiday\n  holiday remove <date> <national|personal>   Remove a holiday\n  holiday list                                List holidays effective for the user\n  holiday import <csv_path>                   Import holidays (date,name,scope,owner)\n  holiday export <csv_path>                   Export all holidays as CSV\n  case add <case_number> <name...>            Open a case for the user\n  case list                                   List the user's cases\n  case status <id> <active|archived|closed>   Change case status\n  deadline add <case_id> <start> <business_days> <type> <title...>\n                                              Schedule a deadline\n  deadline complete <id>                      Mark a deadline completed\n  deadline delete <id>                        Delete a deadline and its reminders\n  deadline types                              List deadline types\n  calc <start> <business_days> [holidays_csv] Compute a due date\n  urgency <days_until>                        Classify a day count\n  show                                        Show upcoming deadlines\n  stats                                       Show dashboard counts\n  refresh                                     Recompute due dates after holiday changes\n  reminders due                               List reminders due as of today\n  reminders send                              Deliver due reminders (logged)\n  reminders preview <due> <offsets_csv>       Preview reminder dates\n  sync <deadline_id>                          Print the calendar sync request\n  save json <path>                            Persist docket to disk\n  load json <path>                            Load docket from disk\n  quit|exit                                   Exit"
    );
}

fn print_deadline_types() {
    println!("Deadline types:");
    for (key, description) in DeadlineType::variants() {
        println!("  {:<10} {}", key, description);
    }
}

fn print_upcoming(docket: &Docket, user: &str, today: NaiveDate) {
    match docket.deadlines_frame(user, today) {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error rendering deadlines: {e}"),
    }
}

fn holiday_command(docket: &mut Docket, user: &str, args: &[&str]) {
    match args {
        ["add", date_s, scope_s, name @ ..] if !name.is_empty() => {
            let date = match parse_iso_date(date_s) {
                Ok(d) => d,
                Err(e) => {
                    println!("{e}");
                    return;
                }
            };
            let name = name.join(" ");
            let holiday = match HolidayScope::from_str(scope_s) {
                Ok(HolidayScope::National) => Holiday::national(date, name),
                Ok(HolidayScope::Personal) => Holiday::personal(date, name, user),
                Err(()) => {
                    println!("Invalid scope '{scope_s}' (national|personal)");
                    return;
                }
            };
            match docket.add_holiday(holiday) {
                Ok(true) => println!("Added holiday {date}."),
                Ok(false) => println!("Holiday {date} already recorded."),
                Err(e) => println!("Error adding holiday: {e}"),
            }
        }
        ["remove", date_s, scope_s] => {
            let (Ok(date), Ok(scope)) = (parse_iso_date(date_s), HolidayScope::from_str(scope_s))
            else {
                println!("Usage: holiday remove <YYYY-MM-DD> <national|personal>");
                return;
            };
            if docket.remove_holiday(date, scope, Some(user)) {
                println!("Removed holiday {date}.");
            } else {
                println!("No {scope} holiday on {date}.");
            }
        }
        ["list"] => {
            let holidays = docket.holidays_for(user);
            if holidays.is_empty() {
                println!("No holidays.");
            }
            for holiday in holidays {
                println!("  {}  {:<9} {}", holiday.date, holiday.scope.as_str(), holiday.name);
            }
        }
        ["import", path] => match load_holidays_from_csv(path) {
            Ok(holidays) => match docket.add_holidays(holidays) {
                Ok(added) => println!("Imported {added} holiday(s) from {path}."),
                Err(e) => println!("Error importing holidays: {e}"),
            },
            Err(e) => println!("Error reading {path}: {e}"),
        },
        ["export", path] => match save_holidays_to_csv(docket.holidays(), path) {
            Ok(()) => println!("Exported {} holiday(s) to {path}.", docket.holidays().len()),
            Err(e) => println!("Error writing {path}: {e}"),
        },
        _ => println!("Usage: holiday <add|remove|list|import|export> ..."),
    }
}

fn case_command(docket: &mut Docket, user: &str, args: &[&str]) {
    match args {
        ["add", number, name @ ..] if !name.is_empty() => {
            let id = docket.next_case_id();
            match docket.add_case(Case::new(id, user, *number, name.join(" "))) {
                Ok(()) => println!("Added case id={id} ({number})."),
                Err(e) => println!("Error adding case: {e}"),
            }
        }
        ["list"] => {
            let cases = docket.cases_for(user);
            if cases.is_empty() {
                println!("No cases.");
            }
            for case in cases {
                println!(
                    "  {:>3}  {:<14} {:<9} {}",
                    case.id,
                    case.case_number,
                    case.status.as_str(),
                    case.case_name
                );
            }
        }
        ["status", id_s, status_s] => {
            let (Ok(id), Ok(status)) = (id_s.parse::<i32>(), CaseStatus::from_str(status_s))
            else {
                println!("Usage: case status <id> <active|archived|closed>");
                return;
            };
            match docket.set_case_status(id, user, status) {
                Ok(()) => println!("Case {id} is now {}.", status.as_str()),
                Err(e) => println!("Error updating case: {e}"),
            }
        }
        _ => println!("Usage: case <add|list|status> ..."),
    }
}

fn deadline_command(docket: &mut Docket, user: &str, today: NaiveDate, args: &[&str]) {
    match args {
        ["add", case_s, start_s, days_s, type_s, title @ ..] if !title.is_empty() => {
            let Ok(case_id) = case_s.parse::<i32>() else {
                println!("Invalid case_id");
                return;
            };
            let start_date = match parse_iso_date(start_s) {
                Ok(d) => d,
                Err(e) => {
                    println!("{e}");
                    return;
                }
            };
            let Ok(business_days) = days_s.parse::<i64>() else {
                println!("Invalid business_days");
                return;
            };
            let Ok(deadline_type) = DeadlineType::from_str(type_s) else {
                println!("Invalid deadline type '{type_s}' (see 'deadline types')");
                return;
            };
            let new = NewDeadline::new(case_id, user, title.join(" "), start_date, business_days)
                .with_type(deadline_type);
            match docket.create_deadline(new, today) {
                Ok(scheduled) => {
                    println!(
                        "Added deadline id={} due {} ({}, {}).",
                        scheduled.deadline.id,
                        scheduled.deadline.due_date,
                        describe_days_until(scheduled.computed.days_until_due),
                        scheduled.urgency
                    );
                    for reminder in &scheduled.reminders {
                        println!(
                            "  reminder {} ({} day(s) before)",
                            reminder.reminder_date, reminder.days_before
                        );
                    }
                }
                Err(e) => println!("Error adding deadline: {e}"),
            }
        }
        ["complete", id_s] => {
            let Ok(id) = id_s.parse::<i32>() else {
                println!("Invalid id");
                return;
            };
            match docket.complete_deadline(id, user, today) {
                Ok(_) => println!("Completed deadline {id}."),
                Err(e) => println!("Error completing deadline: {e}"),
            }
        }
        ["delete", id_s] => {
            let Ok(id) = id_s.parse::<i32>() else {
                println!("Invalid id");
                return;
            };
            match docket.delete_deadline(id, user) {
                Ok(_) => println!("Deleted deadline {id}."),
                Err(e) => println!("Error deleting deadline: {e}"),
            }
        }
        ["types"] => print_deadline_types(),
        _ => println!("Usage: deadline <add|complete|delete|types> ..."),
    }
}

fn calc_command(docket: &Docket, today: NaiveDate, args: &[&str]) {
    let (start_s, days_s, holidays_s) = match args {
        [start, days] => (*start, *days, ""),
        [start, days, holidays] => (*start, *days, *holidays),
        _ => {
            println!("Usage: calc <YYYY-MM-DD> <business_days> [holidays_csv]");
            return;
        }
    };
    let start_date = match parse_iso_date(start_s) {
        Ok(d) => d,
        Err(e) => {
            println!("{e}");
            return;
        }
    };
    let Ok(business_days) = days_s.parse::<i64>() else {
        println!("Invalid business_days");
        return;
    };
    let holidays = match parse_iso_date_list(holidays_s) {
        Ok(h) => h,
        Err(e) => {
            println!("{e}");
            return;
        }
    };
    let spec = DeadlineSpec::new(start_date, business_days, holidays);
    match schedule_deadline_with_limit(&spec, today, docket.config().max_scan_days) {
        Ok(computed) => {
            println!("Due date: {}", computed.due_date);
            println!(
                "Days until due: {} ({})",
                computed.days_until_due,
                computed.urgency()
            );
        }
        Err(e) => println!("Error: {e}"),
    }
}

fn reminders_command(docket: &mut Docket, user: &str, today: NaiveDate, args: &[&str]) {
    match args {
        ["due"] => {
            let due = docket.due_reminders(today);
            if due.is_empty() {
                println!("No reminders due.");
            }
            for reminder in due {
                println!(
                    "  reminder {} for deadline {} on {} ({})",
                    reminder.id, reminder.deadline_id, reminder.reminder_date, reminder.user_id
                );
            }
        }
        ["send"] => {
            let mut recipients = HashMap::new();
            recipients.insert(
                user.to_string(),
                Recipient {
                    user_id: user.to_string(),
                    email: format!("{user}@localhost"),
                    full_name: user.to_string(),
                },
            );
            let summary = dispatch_due_reminders(docket, &TracingNotifier, &recipients, today);
            println!(
                "Sent {} reminder(s), skipped {}, failed {}.",
                summary.sent.len(),
                summary.skipped.len(),
                summary.failed.len()
            );
        }
        ["preview", due_s, offsets_s] => {
            let due_date = match parse_iso_date(due_s) {
                Ok(d) => d,
                Err(e) => {
                    println!("{e}");
                    return;
                }
            };
            let offsets = match parse_offset_list(offsets_s) {
                Ok(o) => o,
                Err(e) => {
                    println!("{e}");
                    return;
                }
            };
            match plan_reminders(due_date, &offsets) {
                Ok(planned) => {
                    for plan in planned {
                        println!("  {} ({} day(s) before)", plan.reminder_date, plan.days_before);
                    }
                }
                Err(e) => println!("Error: {e}"),
            }
        }
        _ => println!("Usage: reminders <due|send|preview> ..."),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config = match DocketConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Falling back to default configuration: {e}");
            DocketConfig::default()
        }
    };
    let mut docket = Docket::with_config(config);
    let mut user = String::from("local");
    let mut today = Local::now().date_naive();

    println!("Deadline Tool (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let (cmd, args) = match parts.split_first() {
            Some((cmd, args)) => (*cmd, args),
            None => continue,
        };

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "user" => match args {
                [] => println!("Current user: {user}"),
                [id] => {
                    user = id.to_string();
                    println!("Switched to user {user}.");
                }
                _ => println!("Usage: user [id]"),
            },
            "today" => match args {
                [] => println!("Today: {today}"),
                [date_s] => match parse_iso_date(date_s) {
                    Ok(d) => {
                        today = d;
                        println!("Today set to {today}.");
                    }
                    Err(e) => println!("{e}"),
                },
                _ => println!("Usage: today [YYYY-MM-DD]"),
            },
            "holiday" => holiday_command(&mut docket, &user, args),
            "case" => case_command(&mut docket, &user, args),
            "deadline" => deadline_command(&mut docket, &user, today, args),
            "calc" => calc_command(&docket, today, args),
            "urgency" => match args {
                [days_s] => match days_s.parse::<i64>() {
                    Ok(days) => println!(
                        "{} ({})",
                        UrgencyTier::classify(days),
                        describe_days_until(days)
                    ),
                    Err(_) => println!("Invalid days_until"),
                },
                _ => println!("Usage: urgency <days_until>"),
            },
            "show" => print_upcoming(&docket, &user, today),
            "stats" => {
                let stats = docket.stats(&user, today);
                println!("Active cases        : {}", stats.active_cases);
                println!("Active deadlines    : {}", stats.active_deadlines);
                println!("Urgent deadlines    : {}", stats.urgent_deadlines);
                println!("Overdue deadlines   : {}", stats.overdue_deadlines);
                println!("Completed this month: {}", stats.completed_this_month);
            }
            "refresh" => match docket.refresh() {
                Ok(summary) => println!("Refreshed: {}", summary.to_cli_summary()),
                Err(e) => println!("Error refreshing docket: {e}"),
            },
            "reminders" => reminders_command(&mut docket, &user, today, args),
            "sync" => match args {
                [id_s] => match id_s.parse::<i32>() {
                    Ok(id) => match docket.sync_request(id, &user) {
                        Ok(request) => match serde_json::to_string_pretty(&request) {
                            Ok(json) => println!("{json}"),
                            Err(e) => println!("Error serializing request: {e}"),
                        },
                        Err(e) => println!("Error: {e}"),
                    },
                    Err(_) => println!("Invalid id"),
                },
                _ => println!("Usage: sync <deadline_id>"),
            },
            "save" => match args {
                ["json", path] => match save_docket_to_json(&docket, path) {
                    Ok(()) => println!("Saved docket to {path}."),
                    Err(e) => println!("Error saving docket: {e}"),
                },
                _ => println!("Usage: save json <path>"),
            },
            "load" => match args {
                ["json", path] => match load_docket_from_json(path, docket.config().clone()) {
                    Ok(loaded) => {
                        docket = loaded;
                        println!("Loaded docket from {path}.");
                    }
                    Err(e) => println!("Error loading docket: {e}"),
                },
                _ => println!("Usage: load json <path>"),
            },
            _ => println!("Unknown command '{cmd}'. Type 'help'."),
        }
    }
}
