use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::tally::error::Result;
use crate::tally::io::excel_read::read_table;
use crate::tally::io::excel_write::write_table;
use crate::tally::io::{Cell, SheetTable};
use crate::tally::ledger::daily::{DailyLedger, parse_daily_file_name};
use crate::tally::ledger::{check_header, is_blank_row, metric, text, whole_number};
use crate::tally::model::{AggregationRecord, Month, MonthlySummaryRecord};

/// Sheet holding the monthly totals.
pub const MONTHLY_SHEET: &str = "Monthly Summary";

/// Header row of every monthly ledger, in column order.
pub const MONTHLY_COLUMNS: [&str; 4] = ["group", "member", "metric_a_total", "metric_b_total"];

/// File name of the ledger for `month`, e.g. `Monthly_Summary_2025-01.xlsx`.
pub fn monthly_file_name(month: Month) -> String {
    format!("Monthly_Summary_{month}.xlsx")
}

/// Sums daily rows per (group, member).
///
/// The result is ordered by group id, then by member name.
pub fn fold_records<'a, I>(rows: I) -> Vec<MonthlySummaryRecord>
where
    I: IntoIterator<Item = &'a AggregationRecord>,
{
    let mut totals: BTreeMap<(u32, String), (f64, f64)> = BTreeMap::new();

    for row in rows {
        let entry = totals
            .entry((row.group_id, row.member_name.clone()))
            .or_insert((0.0, 0.0));
        entry.0 += row.metric_a_sum;
        entry.1 += row.metric_b_sum;
    }

    totals
        .into_iter()
        .map(
            |((group_id, member_name), (metric_a_total, metric_b_total))| MonthlySummaryRecord {
                group_id,
                member_name,
                metric_a_total,
                metric_b_total,
            },
        )
        .collect()
}

/// Cumulative per-(group, member) totals for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyLedger {
    month: Month,
    records: Vec<MonthlySummaryRecord>,
}

impl MonthlyLedger {
    /// Rebuilds the month's totals from every daily ledger currently in `dir`.
    #[instrument(level = "info", skip(dir, month), fields(dir = %dir.display(), month = %month))]
    pub fn fold(dir: &Path, month: Month) -> Result<Self> {
        let ledgers = daily_ledgers_in(dir, month)?;
        let mut rows = Vec::new();
        for (date, path) in &ledgers {
            let daily = DailyLedger::read_rows(path)?;
            debug!(%date, row_count = daily.len(), "folding daily ledger");
            rows.extend(daily);
        }

        let records = fold_records(&rows);
        info!(
            ledger_count = ledgers.len(),
            record_count = records.len(),
            "monthly totals folded"
        );
        Ok(Self { month, records })
    }

    /// Loads a previously saved monthly ledger.
    pub fn load(dir: &Path, month: Month) -> Result<Self> {
        let path = dir.join(monthly_file_name(month));
        let table = read_table(&path, MONTHLY_SHEET)?;
        check_header(&path, table.first(), &MONTHLY_COLUMNS)?;

        let records = table
            .iter()
            .skip(1)
            .filter(|row| !is_blank_row(row))
            .map(|row| -> Result<MonthlySummaryRecord> {
                Ok(MonthlySummaryRecord {
                    group_id: whole_number(&path, row.first(), "group")?,
                    member_name: text(row.get(1)),
                    metric_a_total: metric(row.get(2)),
                    metric_b_total: metric(row.get(3)),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { month, records })
    }

    pub fn records(&self) -> &[MonthlySummaryRecord] {
        &self.records
    }

    /// Writes the ledger into `dir`, overwriting any earlier artifact for the
    /// same month.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(monthly_file_name(self.month));
        let rows = self
            .records
            .iter()
            .map(|record| {
                vec![
                    Cell::Number(f64::from(record.group_id)),
                    Cell::text(record.member_name.clone()),
                    Cell::Number(record.metric_a_total),
                    Cell::Number(record.metric_b_total),
                ]
            })
            .collect();
        let table = SheetTable {
            sheet_name: MONTHLY_SHEET.to_string(),
            columns: MONTHLY_COLUMNS.iter().map(|column| column.to_string()).collect(),
            rows,
        };
        write_table(&path, &table)?;
        info!(path = %path.display(), "monthly ledger saved");
        Ok(path)
    }
}

/// Daily ledgers in `dir` dated within `month`, in ascending date order.
pub fn daily_ledgers_in(dir: &Path, month: Month) -> Result<Vec<(NaiveDate, PathBuf)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error.into()),
    };

    let mut ledgers = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(date) = name.to_str().and_then(parse_daily_file_name) else {
            continue;
        };
        if month.contains(date) {
            ledgers.push((date, entry.path()));
        }
    }
    ledgers.sort();
    Ok(ledgers)
}
