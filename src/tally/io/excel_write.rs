use std::path::Path;

use rust_xlsxwriter::{Table, TableColumn, Workbook};

use crate::tally::error::Result;
use crate::tally::io::{Cell, SheetTable};

/// Writes the table as the only sheet of a new workbook at `path`, replacing
/// any existing file.
pub fn write_table(path: &Path, table: &SheetTable) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let worksheet = workbook_writer.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let sheet_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            match cell {
                Cell::Empty => {}
                Cell::Text(value) => {
                    worksheet.write_string(sheet_row, col_idx as u16, value)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(sheet_row, col_idx as u16, *value)?;
                }
            }
        }
    }

    // Excel tables need at least one data row.
    if !table.rows.is_empty() && !table.columns.is_empty() {
        let headers: Vec<TableColumn> = table
            .columns
            .iter()
            .map(|header| TableColumn::new().set_header(header))
            .collect();
        let mut excel_table = Table::new();
        excel_table.set_autofilter(true).set_columns(&headers);

        let col_end = (table.columns.len() as u16).saturating_sub(1);
        let row_end = table.rows.len() as u32;
        worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}
