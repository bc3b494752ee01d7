use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::tally::error::{Result, TallyError};
use crate::tally::io::Cell;

/// Reads every row of `sheet` in the workbook at `path`, header included.
pub fn read_table(path: &Path, sheet: &str) -> Result<Vec<Vec<Cell>>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = read_required_sheet(&mut workbook, path, sheet)?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| to_cell(Some(cell))).collect())
        .collect())
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    path: &Path,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| TallyError::invalid_ledger(path, format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(TallyError::from)?;
    Ok(range)
}

pub(crate) fn to_cell(cell: Option<&DataType>) -> Cell {
    match cell {
        Some(DataType::String(value)) => Cell::Text(value.clone()),
        Some(DataType::Float(value)) => Cell::Number(*value),
        Some(DataType::Int(value)) => Cell::Number(*value as f64),
        Some(DataType::Bool(value)) => Cell::Text(value.to_string()),
        Some(DataType::Empty) | None => Cell::Empty,
        Some(other) => Cell::Text(other.to_string()),
    }
}
