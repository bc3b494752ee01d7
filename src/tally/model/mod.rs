use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::tally::error::{Result, TallyError};

/// One group's sums for a single day, as written to the daily ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRecord {
    pub date: NaiveDate,
    /// 1-based group index.
    pub group_id: u32,
    /// Name found on the group's first row; empty when the column is short.
    pub member_name: String,
    /// First sheet row of the group window (1-based, inclusive).
    pub start_row: u32,
    /// Last sheet row of the group window (1-based, inclusive).
    pub end_row: u32,
    pub metric_a_sum: f64,
    pub metric_b_sum: f64,
}

/// Cumulative totals for one (group, member) pair across a month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummaryRecord {
    pub group_id: u32,
    pub member_name: String,
    pub metric_a_total: f64,
    pub metric_b_total: f64,
}

/// Last row a spreadsheet can address.
pub const MAX_SHEET_ROWS: u32 = 1_048_576;

/// Fixed position of the grouped block on the remote worksheet.
///
/// Rows and columns are 1-based, matching the way spreadsheet users address
/// cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupLayout {
    pub start_row: u32,
    pub group_size: u32,
    pub group_count: u32,
    pub metric_a_column: u32,
    pub metric_b_column: u32,
    pub member_column: u32,
}

impl GroupLayout {
    /// Number of cells read from each metric column, capped at the sheet's
    /// row count.
    pub fn total_rows(&self) -> usize {
        self.group_size
            .saturating_mul(self.group_count)
            .min(MAX_SHEET_ROWS) as usize
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("start_row", self.start_row),
            ("group_size", self.group_size),
            ("group_count", self.group_count),
            ("metric_a_column", self.metric_a_column),
            ("metric_b_column", self.metric_b_column),
            ("member_column", self.member_column),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(TallyError::Configuration(format!(
                    "layout.{name} must be at least 1"
                )));
            }
        }

        let last_row = self
            .group_size
            .checked_mul(self.group_count)
            .and_then(|rows| rows.checked_add(self.start_row - 1));
        match last_row {
            Some(row) if row <= MAX_SHEET_ROWS => Ok(()),
            _ => Err(TallyError::Configuration(format!(
                "layout reaches past sheet row {MAX_SHEET_ROWS}"
            ))),
        }
    }
}

impl Default for GroupLayout {
    fn default() -> Self {
        Self {
            start_row: 5,
            group_size: 4,
            group_count: 18,
            metric_a_column: 5,
            metric_b_column: 10,
            member_column: 2,
        }
    }
}

/// A calendar month, displayed and parsed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(TallyError::Configuration(format!(
                "month {month} is out of range"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = TallyError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || TallyError::Configuration(format!("'{value}' is not a YYYY-MM month"));
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Month::new(year, month)
    }
}
