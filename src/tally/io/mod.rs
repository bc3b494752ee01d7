//! Adapters between the tally records and the outside world: local `.xlsx`
//! artifacts and the remote spreadsheet.

pub mod excel_read;
pub mod excel_write;
pub mod sheets;

/// A single cell of a persisted table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Renders the cell the way it would appear in a spreadsheet column.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.clone(),
            Cell::Number(value) => value.to_string(),
        }
    }

    /// Numeric view of the cell; numeric text is accepted, blanks are `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(value) => value.trim().parse::<f64>().ok(),
            Cell::Empty => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

/// A table that will be materialised as a single Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}
