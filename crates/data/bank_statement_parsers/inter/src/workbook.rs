use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

use crate::table::{Cell, RawTable};

/// Decodes one sheet of a workbook (xlsx, xls, ods) into a `RawTable`.
pub fn load_table<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<RawTable> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("Cannot read sheet '{}' in {}", sheet_name, path.display()))?;

    let table = table_from_range(&range);
    tracing::debug!(
        rows = table.height(),
        cols = table.width(),
        sheet = sheet_name,
        "decoded sheet"
    );
    Ok(table)
}

/// Keeps sheet coordinates: a range starting at C5 gets 4 empty rows and 2
/// leading missing cells per row, so row numbers in errors match the sheet.
pub fn table_from_range(range: &Range<Data>) -> RawTable {
    let Some((row_offset, col_offset)) = range.start() else {
        return RawTable::default();
    };

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Missing; col_offset as usize];
        cells.extend(row.iter().map(to_cell));
        rows.push(cells);
    }
    RawTable::new(rows)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::Error(_) | Data::Empty => Cell::Missing,
        other => Cell::Text(other.to_string()),
    }
}
