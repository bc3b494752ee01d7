#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use group_tally::Result;
use group_tally::io::sheets::SheetSource;
use group_tally::model::AggregationRecord;
use tracing_subscriber::fmt::MakeWriter;

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn record(day: &str, group_id: u32, member: &str, a: f64, b: f64) -> AggregationRecord {
    AggregationRecord {
        date: date(day),
        group_id,
        member_name: member.to_string(),
        start_row: 5 + (group_id - 1) * 4,
        end_row: 8 + (group_id - 1) * 4,
        metric_a_sum: a,
        metric_b_sum: b,
    }
}

/// In-memory spreadsheet that counts every read.
#[derive(Debug, Default)]
pub struct FakeSource {
    pub titles: Vec<String>,
    pub columns: HashMap<u32, Vec<String>>,
    pub reads: usize,
}

impl FakeSource {
    pub fn new(titles: &[&str]) -> Self {
        Self {
            titles: strings(titles),
            ..Self::default()
        }
    }

    /// Sets `column` so that `values` start at sheet row `start_row`.
    pub fn with_column(mut self, column: u32, start_row: u32, values: &[&str]) -> Self {
        let mut cells = vec![String::new(); start_row as usize - 1];
        cells.extend(strings(values));
        self.columns.insert(column, cells);
        self
    }
}

impl SheetSource for FakeSource {
    fn worksheet_titles(&mut self) -> Result<Vec<String>> {
        self.reads += 1;
        Ok(self.titles.clone())
    }

    fn column_values(&mut self, _worksheet: &str, column: u32) -> Result<Vec<String>> {
        self.reads += 1;
        Ok(self.columns.get(&column).cloned().unwrap_or_default())
    }
}

/// Writes a workbook with one worksheet per `(title, cells)` entry, where
/// cells are `(row, column, text)` with 1-based coordinates.
pub fn write_source_workbook(path: &Path, sheets: &[(&str, Vec<(u32, u16, &str)>)]) {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    for (title, cells) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*title).expect("sheet name");
        for (row, column, text) in cells {
            match text.parse::<f64>() {
                Ok(number) => worksheet.write_number(row - 1, column - 1, number),
                Err(_) => worksheet.write_string(row - 1, column - 1, *text),
            }
            .expect("cell written");
        }
    }
    workbook.save(path).expect("source workbook saved");
}

/// Log sink shared between a test and a scoped subscriber.
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().expect("log buffer").clone();
        String::from_utf8(bytes)
            .expect("utf-8 log")
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLog {
    type Writer = CapturedLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
