mod common;

use common::{date, strings};
use group_tally::aggregate::aggregate_groups;
use group_tally::coerce::{coerce_values, coerce_window};
use group_tally::model::GroupLayout;

fn layout(start_row: u32, group_size: u32, group_count: u32) -> GroupLayout {
    GroupLayout {
        start_row,
        group_size,
        group_count,
        ..GroupLayout::default()
    }
}

#[test]
fn coercion_defaults_unparseable_cells_to_zero() {
    let raw = strings(&["3", "x", "", " 2.5 ", "=SUM(A1)", "-4", "NaN", "inf"]);
    let values = coerce_values(&raw, raw.len());

    assert_eq!(values, vec![3.0, 0.0, 0.0, 2.5, 0.0, -4.0, 0.0, 0.0]);
    assert!(values.iter().all(|value| value.is_finite()));
}

#[test]
fn coercion_pads_and_truncates_to_requested_length() {
    let raw = strings(&["1", "2"]);
    assert_eq!(coerce_values(&raw, 5), vec![1.0, 2.0, 0.0, 0.0, 0.0]);
    assert_eq!(coerce_values(&raw, 1), vec![1.0]);
    assert!(coerce_values::<String>(&[], 3).iter().all(|value| *value == 0.0));
}

#[test]
fn window_starts_at_the_configured_row() {
    let column = strings(&["header", "", "", "", "7", "8"]);
    assert_eq!(coerce_window(&column, 5, 3), vec![7.0, 8.0, 0.0]);
    assert_eq!(coerce_window(&column, 40, 2), vec![0.0, 0.0]);
}

#[test]
fn single_group_with_text_cell_sums_numbers_only() {
    let metric_a = coerce_values(&strings(&["3", "x", "5", "2"]), 4);
    let metric_b = coerce_values(&strings(&["1", "1", "1", "1"]), 4);
    let mut members = vec![String::new(); 4];
    members.push("Alice".to_string());

    let records = aggregate_groups(
        date("2025-01-20"),
        &layout(5, 4, 1),
        &metric_a,
        &metric_b,
        &members,
    );

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.group_id, 1);
    assert_eq!(record.member_name, "Alice");
    assert_eq!((record.start_row, record.end_row), (5, 8));
    assert_eq!(record.metric_a_sum, 10.0);
    assert_eq!(record.metric_b_sum, 4.0);
    assert_eq!(record.date, date("2025-01-20"));
}

#[test]
fn groups_cover_contiguous_row_windows() {
    let metric_a: Vec<f64> = (1..=12).map(f64::from).collect();
    let metric_b = vec![0.5; 12];
    let members = strings(&["", "", "Ann", "", "", "Ben", "", "", "Cy"]);

    let records = aggregate_groups(
        date("2025-01-21"),
        &layout(3, 3, 4),
        &metric_a,
        &metric_b,
        &members,
    );

    let windows: Vec<(u32, u32, u32)> = records
        .iter()
        .map(|record| (record.group_id, record.start_row, record.end_row))
        .collect();
    assert_eq!(windows, vec![(1, 3, 5), (2, 6, 8), (3, 9, 11), (4, 12, 14)]);

    let sums: Vec<f64> = records.iter().map(|record| record.metric_a_sum).collect();
    assert_eq!(sums, vec![6.0, 15.0, 24.0, 33.0]);

    let names: Vec<&str> = records
        .iter()
        .map(|record| record.member_name.as_str())
        .collect();
    assert_eq!(names, vec!["Ann", "Ben", "Cy", ""]);
}

#[test]
fn short_member_column_yields_empty_names() {
    let records = aggregate_groups(
        date("2025-01-20"),
        &layout(5, 4, 2),
        &[1.0; 8],
        &[2.0; 8],
        &strings(&["only", "a", "few"]),
    );

    assert!(records.iter().all(|record| record.member_name.is_empty()));
}

#[test]
fn group_sums_conserve_column_totals() {
    let metric_a: Vec<f64> = (0..72).map(|index| f64::from(index % 7) * 1.5).collect();
    let metric_b: Vec<f64> = (0..72).map(|index| f64::from(index % 3)).collect();
    let members: Vec<String> = Vec::new();

    let records = aggregate_groups(
        date("2025-01-20"),
        &GroupLayout::default(),
        &metric_a,
        &metric_b,
        &members,
    );

    assert_eq!(records.len(), 18);
    let total_a: f64 = records.iter().map(|record| record.metric_a_sum).sum();
    let total_b: f64 = records.iter().map(|record| record.metric_b_sum).sum();
    assert_eq!(total_a, metric_a.iter().sum::<f64>());
    assert_eq!(total_b, metric_b.iter().sum::<f64>());
}
