//! Persisted per-day and per-month tally tables.

pub mod daily;
pub mod monthly;

pub use daily::{
    DAILY_COLUMNS, DAILY_SHEET, DailyLedger, RerunPolicy, daily_file_name, parse_daily_file_name,
};
pub use monthly::{
    MONTHLY_COLUMNS, MONTHLY_SHEET, MonthlyLedger, daily_ledgers_in, fold_records,
    monthly_file_name,
};

use std::path::Path;

use crate::tally::error::{Result, TallyError};
use crate::tally::io::Cell;

/// Checks that the first row of a loaded table matches `expected` exactly.
fn check_header(path: &Path, header: Option<&Vec<Cell>>, expected: &[&str]) -> Result<()> {
    let found: Vec<String> = header
        .map(|row| row.iter().map(Cell::to_text).collect())
        .unwrap_or_default();
    if found.len() < expected.len()
        || found.iter().zip(expected).any(|(lhs, rhs)| lhs != rhs)
        || found[expected.len()..].iter().any(|extra| !extra.is_empty())
    {
        return Err(TallyError::invalid_ledger(
            path,
            format!("unexpected header {found:?}"),
        ));
    }
    Ok(())
}

/// Reads a positive whole number (group id or row number) from a ledger cell.
fn whole_number(path: &Path, cell: Option<&Cell>, column: &str) -> Result<u32> {
    let value = cell.and_then(Cell::as_number);
    match value {
        Some(number) if number.fract() == 0.0 && number >= 0.0 && number <= u32::MAX as f64 => {
            Ok(number as u32)
        }
        _ => Err(TallyError::invalid_ledger(
            path,
            format!(
                "column '{column}' holds {:?}, expected a whole number",
                cell.map(Cell::to_text).unwrap_or_default()
            ),
        )),
    }
}

/// Reads a metric cell; blanks and text count as zero.
fn metric(cell: Option<&Cell>) -> f64 {
    cell.and_then(Cell::as_number)
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

fn text(cell: Option<&Cell>) -> String {
    cell.map(Cell::to_text).unwrap_or_default()
}

fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_blank)
}
