use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::tally::error::{Result, TallyError};
use crate::tally::io::excel_read::read_table;
use crate::tally::io::excel_write::write_table;
use crate::tally::io::{Cell, SheetTable};
use crate::tally::ledger::{check_header, is_blank_row, metric, text, whole_number};
use crate::tally::model::AggregationRecord;

/// Sheet holding the daily rows.
pub const DAILY_SHEET: &str = "Summary";

/// Header row of every daily ledger, in column order.
pub const DAILY_COLUMNS: [&str; 7] = [
    "date",
    "group",
    "member",
    "start_row",
    "end_row",
    "metric_a_sum",
    "metric_b_sum",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const FILE_PREFIX: &str = "Summary_";
const FILE_SUFFIX: &str = ".xlsx";

/// File name of the ledger for `date`, e.g. `Summary_2025-01-20.xlsx`.
pub fn daily_file_name(date: NaiveDate) -> String {
    format!("{FILE_PREFIX}{}{FILE_SUFFIX}", date.format(DATE_FORMAT))
}

/// Inverse of [`daily_file_name`]; `None` for any other file name.
pub fn parse_daily_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

/// What recording a run does with rows a previous run left for the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerunPolicy {
    /// Drop existing rows for the run date before appending.
    #[default]
    Replace,
    /// Keep existing rows and append another full set.
    Append,
}

/// Append-only table of group sums for one calendar date.
#[derive(Debug, Clone)]
pub struct DailyLedger {
    date: NaiveDate,
    path: PathBuf,
    rows: Vec<AggregationRecord>,
}

impl DailyLedger {
    /// Loads the ledger for `date` from `dir`, or creates it with just the
    /// header row when no artifact exists yet.
    #[instrument(level = "debug", skip(dir), fields(dir = %dir.display()))]
    pub fn open(dir: &Path, date: NaiveDate) -> Result<Self> {
        let path = dir.join(daily_file_name(date));

        if path.exists() {
            let rows = Self::read_rows(&path)?;
            debug!(row_count = rows.len(), "loaded existing daily ledger");
            return Ok(Self { date, path, rows });
        }

        fs::create_dir_all(dir)?;
        let ledger = Self {
            date,
            path,
            rows: Vec::new(),
        };
        ledger.save()?;
        info!(path = %ledger.path.display(), "created daily ledger");
        Ok(ledger)
    }

    /// Parses every data row of the daily ledger stored at `path`.
    pub fn read_rows(path: &Path) -> Result<Vec<AggregationRecord>> {
        let table = read_table(path, DAILY_SHEET)?;
        check_header(path, table.first(), &DAILY_COLUMNS)?;

        table
            .iter()
            .skip(1)
            .filter(|row| !is_blank_row(row))
            .map(|row| parse_row(path, row))
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[AggregationRecord] {
        &self.rows
    }

    /// Appends the records after the existing rows, preserving their order.
    pub fn append(&mut self, records: &[AggregationRecord]) {
        self.rows.extend_from_slice(records);
    }

    /// Records one run's output according to `policy`, returning how many
    /// earlier rows were dropped. The ledger's date is the replacement key.
    pub fn record(&mut self, records: &[AggregationRecord], policy: RerunPolicy) -> usize {
        let mut dropped = 0;
        if policy == RerunPolicy::Replace {
            let before = self.rows.len();
            let date = self.date;
            self.rows.retain(|row| row.date != date);
            dropped = before - self.rows.len();
        }
        self.append(records);
        dropped
    }

    /// Writes the full table to the ledger's file.
    pub fn save(&self) -> Result<()> {
        let rows = self.rows.iter().map(to_row).collect();
        let table = SheetTable {
            sheet_name: DAILY_SHEET.to_string(),
            columns: DAILY_COLUMNS.iter().map(|column| column.to_string()).collect(),
            rows,
        };
        write_table(&self.path, &table)
    }
}

fn to_row(record: &AggregationRecord) -> Vec<Cell> {
    vec![
        Cell::text(record.date.format(DATE_FORMAT).to_string()),
        Cell::Number(f64::from(record.group_id)),
        Cell::text(record.member_name.clone()),
        Cell::Number(f64::from(record.start_row)),
        Cell::Number(f64::from(record.end_row)),
        Cell::Number(record.metric_a_sum),
        Cell::Number(record.metric_b_sum),
    ]
}

fn parse_row(path: &Path, row: &[Cell]) -> Result<AggregationRecord> {
    let raw_date = text(row.first());
    let date = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT).map_err(|_| {
        TallyError::invalid_ledger(path, format!("column 'date' holds {raw_date:?}"))
    })?;

    Ok(AggregationRecord {
        date,
        group_id: whole_number(path, row.get(1), "group")?,
        member_name: text(row.get(2)),
        start_row: whole_number(path, row.get(3), "start_row")?,
        end_row: whole_number(path, row.get(4), "end_row")?,
        metric_a_sum: metric(row.get(5)),
        metric_b_sum: metric(row.get(6)),
    })
}
