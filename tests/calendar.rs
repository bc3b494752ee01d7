mod common;

use chrono::{NaiveDateTime, NaiveTime};
use common::{date, strings};
use group_tally::TallyError;
use group_tally::calendar::{MonthEndPolicy, is_month_end, is_weekend};
use group_tally::config::Config;
use group_tally::io::sheets::{
    column_letter, select_worksheet, spreadsheet_id_from_url, worksheet_pattern,
};
use group_tally::ledger::RerunPolicy;
use group_tally::aggregate::aggregate_groups;
use group_tally::model::{GroupLayout, Month};
use group_tally::schedule::{DailyTrigger, parse_time_of_day};

fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").expect("valid timestamp")
}

#[test]
fn weekends_are_saturday_and_sunday() {
    assert!(!is_weekend(date("2025-01-20")));
    assert!(!is_weekend(date("2025-01-24")));
    assert!(is_weekend(date("2025-01-25")));
    assert!(is_weekend(date("2025-01-26")));
}

#[test]
fn month_end_requires_last_day_on_a_weekday() {
    assert!(is_month_end(date("2025-01-31")));
    assert!(is_month_end(date("2025-02-28")));
    assert!(is_month_end(date("2024-02-29")));
    assert!(!is_month_end(date("2024-02-28")));
    assert!(!is_month_end(date("2025-05-30")));
    assert!(!is_month_end(date("2025-05-31")));
    assert!(!is_month_end(date("2025-08-31")));
}

#[test]
fn month_end_policy_overrides_the_calendar() {
    let ordinary = date("2025-01-20");
    assert!(!MonthEndPolicy::Calendar.applies(ordinary));
    assert!(MonthEndPolicy::Always.applies(ordinary));
    assert!(!MonthEndPolicy::Never.applies(date("2025-01-31")));
}

#[test]
fn worksheet_lookup_takes_first_title_containing_the_date() {
    let titles = strings(&["01.19(日)", "01.20(一)", "備份 01.20"]);
    let day = date("2025-01-20");

    assert_eq!(worksheet_pattern(day), "01.20");
    assert_eq!(select_worksheet(&titles, day).expect("found"), "01.20(一)");

    let error = select_worksheet(&titles, date("2025-01-21")).expect_err("missing");
    assert!(matches!(error, TallyError::WorksheetNotFound(ref pattern) if pattern == "01.21"));
}

#[test]
fn column_letters_follow_spreadsheet_naming() {
    assert_eq!(column_letter(1), "A");
    assert_eq!(column_letter(5), "E");
    assert_eq!(column_letter(10), "J");
    assert_eq!(column_letter(26), "Z");
    assert_eq!(column_letter(27), "AA");
    assert_eq!(column_letter(703), "AAA");
}

#[test]
fn spreadsheet_id_is_taken_from_share_links() {
    assert_eq!(
        spreadsheet_id_from_url("https://docs.google.com/spreadsheets/d/abc_123-XY/edit#gid=0"),
        "abc_123-XY"
    );
    assert_eq!(spreadsheet_id_from_url(" abc_123 "), "abc_123");
}

#[test]
fn trigger_fires_once_per_day_at_the_configured_time() {
    let run_at = NaiveTime::from_hms_opt(11, 29, 0).expect("valid time");

    let mut trigger = DailyTrigger::new(run_at, at("2025-01-20 09:00"));
    assert_eq!(trigger.next_run(), at("2025-01-20 11:29"));
    assert!(!trigger.is_due(at("2025-01-20 11:28")));
    assert!(trigger.is_due(at("2025-01-20 11:30")));

    trigger.advance(at("2025-01-20 11:30"));
    assert_eq!(trigger.next_run(), at("2025-01-21 11:29"));
    assert!(!trigger.is_due(at("2025-01-20 23:59")));

    let late = DailyTrigger::new(run_at, at("2025-01-20 12:00"));
    assert_eq!(late.next_run(), at("2025-01-21 11:29"));

    let mut stalled = DailyTrigger::new(run_at, at("2025-01-20 09:00"));
    stalled.advance(at("2025-01-23 08:00"));
    assert_eq!(stalled.next_run(), at("2025-01-23 11:29"));
}

#[test]
fn time_of_day_parsing() {
    assert_eq!(
        parse_time_of_day("11:29").expect("parsed"),
        NaiveTime::from_hms_opt(11, 29, 0).expect("valid time")
    );
    assert!(parse_time_of_day("noon").is_err());
}

#[test]
fn month_parses_and_displays_as_year_month() {
    let month: Month = "2025-01".parse().expect("month parsed");
    assert_eq!(month.to_string(), "2025-01");
    assert!(month.contains(date("2025-01-31")));
    assert!(!month.contains(date("2024-01-31")));
    assert!("2025-13".parse::<Month>().is_err());
    assert!("January".parse::<Month>().is_err());
}

#[test]
fn empty_config_uses_defaults() {
    let config = Config::from_json("{}").expect("config parsed");
    assert_eq!(config, Config::default());
    assert_eq!(config.layout.start_row, 5);
    assert_eq!(config.layout.total_rows(), 72);
    assert_eq!(config.rerun_policy, RerunPolicy::Replace);
    assert_eq!(config.month_end, MonthEndPolicy::Calendar);
    assert_eq!(config.run_at().expect("run time").to_string(), "11:29:00");
}

#[test]
fn config_overrides_and_validation() {
    let config = Config::from_json(
        r#"{
            "spreadsheet": "https://docs.google.com/spreadsheets/d/xyz/edit",
            "layout": { "group_count": 3 },
            "rerun_policy": "append",
            "month_end": "always",
            "run_at": "08:15"
        }"#,
    )
    .expect("config parsed");
    assert_eq!(config.layout.group_count, 3);
    assert_eq!(config.layout.group_size, 4);
    assert_eq!(config.rerun_policy, RerunPolicy::Append);
    assert_eq!(config.month_end, MonthEndPolicy::Always);

    let error = Config::from_json(r#"{ "layout": { "group_size": 0 } }"#).expect_err("invalid");
    assert!(matches!(error, TallyError::Configuration(_)));
    assert!(Config::from_json(r#"{ "run_at": "25:99" }"#).is_err());
    assert!(Config::from_json(r#"{ "poll_interval_secs": 0 }"#).is_err());
}

#[test]
fn layout_must_fit_on_a_sheet() {
    let overflowing = r#"{ "layout": { "start_row": 4294967290, "group_size": 4, "group_count": 3 } }"#;
    let error = Config::from_json(overflowing).expect_err("overflow rejected");
    assert!(matches!(error, TallyError::Configuration(_)));

    let oversized = r#"{ "layout": { "group_size": 65536, "group_count": 65536 } }"#;
    assert!(Config::from_json(oversized).is_err());

    let past_last_row = r#"{ "layout": { "start_row": 1048570, "group_size": 4, "group_count": 2 } }"#;
    assert!(Config::from_json(past_last_row).is_err());

    let last_row = r#"{ "layout": { "start_row": 1048569, "group_size": 4, "group_count": 2 } }"#;
    assert!(Config::from_json(last_row).is_ok());
}

#[test]
fn unvalidated_layout_saturates_instead_of_overflowing() {
    let layout = GroupLayout {
        start_row: u32::MAX - 5,
        group_size: 4,
        group_count: 3,
        ..GroupLayout::default()
    };
    assert_eq!(layout.total_rows(), 12);

    let members: Vec<String> = Vec::new();
    let records = aggregate_groups(date("2025-01-20"), &layout, &[1.0; 12], &[0.0; 12], &members);

    assert_eq!(records.len(), 3);
    assert_eq!(records[2].start_row, u32::MAX);
    assert_eq!(records[2].end_row, u32::MAX);
    assert_eq!(records[2].metric_a_sum, 4.0);

    let huge = GroupLayout {
        group_size: u32::MAX,
        group_count: u32::MAX,
        ..GroupLayout::default()
    };
    assert_eq!(huge.total_rows(), 1_048_576);
}
