//! Tolerant conversion of raw cell text into fixed-length numeric columns.

/// Converts raw cell strings into exactly `len` numbers.
///
/// Blank, non-numeric and non-finite cells become `0.0`, and a short input is
/// padded with zeros. Extra input beyond `len` is ignored.
pub fn coerce_values<S: AsRef<str>>(raw: &[S], len: usize) -> Vec<f64> {
    let mut values: Vec<f64> = raw
        .iter()
        .take(len)
        .map(|cell| parse_cell(cell.as_ref()))
        .collect();
    values.resize(len, 0.0);
    values
}

/// Coerces the `len` cells of a whole column that begin at sheet row
/// `start_row` (1-based).
pub fn coerce_window<S: AsRef<str>>(column: &[S], start_row: u32, len: usize) -> Vec<f64> {
    let offset = (start_row as usize).saturating_sub(1);
    let window = column.get(offset..).unwrap_or(&[]);
    coerce_values(window, len)
}

fn parse_cell(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}
