use chrono::NaiveDate;
use deadline_tool::dates::{calendar_date, parse_iso_date_list};
use deadline_tool::{DeadlineError, format_iso_date, parse_iso_date};

#[test]
fn parses_zero_padded_iso_dates() {
    let date = parse_iso_date("2025-01-06").unwrap();
    assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    assert_eq!(format_iso_date(date), "2025-01-06");
}

#[test]
fn rejects_anything_that_is_not_yyyy_mm_dd() {
    for raw in [
        "2025-1-6",
        "2025/01/06",
        "06-01-2025",
        "2025-01-06T00:00:00",
        " 2025-01-06",
        "2025-02-30",
        "2025-13-01",
        "",
    ] {
        assert!(
            matches!(parse_iso_date(raw), Err(DeadlineError::InvalidInput(_))),
            "{raw:?}"
        );
    }
}

#[test]
fn leap_day_only_in_leap_years() {
    assert!(parse_iso_date("2024-02-29").is_ok());
    assert!(parse_iso_date("2025-02-29").is_err());
}

#[test]
fn date_lists_skip_blanks() {
    let dates = parse_iso_date_list(" 2025-01-17, ,2025-12-25 ").unwrap();
    assert_eq!(dates.len(), 2);
    assert!(parse_iso_date_list("").unwrap().is_empty());
    assert!(parse_iso_date_list("2025-01-17,nope").is_err());
}

#[test]
fn time_of_day_is_dropped() {
    let moment = NaiveDate::from_ymd_opt(2025, 1, 21)
        .unwrap()
        .and_hms_opt(23, 59, 59)
        .unwrap();
    assert_eq!(calendar_date(moment), NaiveDate::from_ymd_opt(2025, 1, 21).unwrap());
}
