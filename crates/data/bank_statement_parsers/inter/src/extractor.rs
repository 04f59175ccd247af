use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use models::{ColumnLabels, NoteLayout, Side, TradeRecord};
use regex::Regex;

use crate::error::{NoteError, Result};
use crate::locator::Coord;
use crate::numbers::{cell_count, cell_decimal, is_count, parse_locale_decimal};
use crate::table::{Cell, RawTable};

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9,.\-]").expect("valid regex"));

/// Column indices of the line-item table, resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    title: usize,
    quantity: usize,
    price: usize,
    value: usize,
    side: usize,
    observation: Option<usize>,
}

fn resolve_columns(table: &RawTable, header_row: usize, labels: &ColumnLabels) -> Result<Columns> {
    let header: Vec<String> = table
        .row(header_row)
        .iter()
        .map(|cell| cell.to_string().trim().to_uppercase())
        .collect();

    let required = |label: &str| {
        find_column(&header, label).ok_or_else(|| {
            NoteError::Structural(format!("column {:?} not found in header row", label))
        })
    };

    Ok(Columns {
        title: required(&labels.title)?,
        quantity: required(&labels.quantity)?,
        price: required(&labels.price)?,
        value: required(&labels.value)?,
        side: required(&labels.side)?,
        observation: find_column(&header, &labels.observation),
    })
}

/// Exact (case-insensitive) header match first, then the first header containing the label.
fn find_column(header: &[String], label: &str) -> Option<usize> {
    let label = label.trim().to_uppercase();
    if label.is_empty() {
        return None;
    }
    header
        .iter()
        .position(|name| *name == label)
        .or_else(|| header.iter().position(|name| name.contains(&label)))
}

/// Parses every line item below the header row.
///
/// A row is a line item when its quantity cell is a plain count ("1.500",
/// "100" or a whole number). Repeated headers, blank rows and footers fail
/// that test and are skipped. Running subtotals are dropped by title. Any
/// other problem in an admitted row is an error: either the data is
/// aberrant or the admission rule is wrong, and both must surface.
pub fn extract_trades(
    table: &RawTable,
    header_row: usize,
    layout: &NoteLayout,
) -> Result<Vec<TradeRecord>> {
    let labels = &layout.columns;
    let cols = resolve_columns(table, header_row, labels)?;
    let mut trades = Vec::new();

    for row in (header_row + 1)..table.height() {
        let quantity_cell = table.get(row, cols.quantity);
        if !is_count(quantity_cell) {
            continue;
        }

        let title = table.get(row, cols.title).to_string();
        let instrument_code = title.split_whitespace().next().unwrap_or_default();
        if instrument_code.to_uppercase().contains("SUBTOTAL") {
            tracing::debug!(row, "skipping subtotal row");
            continue;
        }
        if instrument_code.is_empty() {
            return Err(NoteError::parse(row, &labels.title, title));
        }
        let quantity = cell_count(quantity_cell)
            .filter(|q| *q > 0)
            .ok_or_else(|| NoteError::parse(row, &labels.quantity, quantity_cell.to_string()))?;

        let unit_price = decimal_at(table, row, cols.price, &labels.price)?;
        let trade_value = decimal_at(table, row, cols.value, &labels.value)?;

        let side_cell = table.get(row, cols.side).to_string();
        let side = Side::from_indicator(&side_cell)
            .ok_or_else(|| NoteError::parse(row, &labels.side, side_cell.clone()))?;

        let note = cols
            .observation
            .map(|col| table.get(row, col).to_string().trim().to_string())
            .filter(|s| !s.eq_ignore_ascii_case("nan"))
            .unwrap_or_default();

        trades.push(TradeRecord {
            instrument_code: instrument_code.to_string(),
            quantity,
            unit_price,
            trade_value,
            side,
            note,
            row,
        });
    }

    tracing::debug!(count = trades.len(), "extracted line items");
    Ok(trades)
}

fn decimal_at(table: &RawTable, row: usize, col: usize, label: &str) -> Result<f64> {
    let cell = table.get(row, col);
    cell_decimal(cell).ok_or_else(|| NoteError::parse(row, label, cell.to_string()))
}

/// Reads the label/value pairs listed under a summary marker.
///
/// Labels are free text, so rows without a label or without a readable
/// value are skipped rather than reported.
pub fn extract_summary_block(
    table: &RawTable,
    marker: Coord,
    block_rows: usize,
) -> BTreeMap<String, f64> {
    let (marker_row, col) = marker;
    let last = (marker_row + block_rows).min(table.height().saturating_sub(1));
    let mut figures = BTreeMap::new();

    for row in (marker_row + 1)..=last {
        if table.is_blank_row(row) {
            continue;
        }
        let key = normalize_label(&table.get(row, col).to_string());
        if key.is_empty() {
            continue;
        }
        if let Some(value) = cell_decimal(table.get(row, col + 1)) {
            figures.insert(key, value);
        }
    }

    figures
}

/// "Valor das operações:" -> "valor_das_operações"
pub fn normalize_label(raw: &str) -> String {
    raw.replace(':', "").trim().to_lowercase().replace(' ', "_")
}

pub fn extract_note_number(table: &RawTable, at: Option<Coord>) -> Result<u64> {
    let Some((row, col)) = at else {
        return Ok(0);
    };
    let cell = table.get(row, col);
    cell_count(cell).ok_or_else(|| NoteError::Metadata {
        field: "note number",
        value: cell.to_string(),
    })
}

pub fn extract_trading_date(table: &RawTable, at: Option<Coord>) -> Result<Option<NaiveDate>> {
    let Some((row, col)) = at else {
        return Ok(None);
    };
    let cell = table.get(row, col);
    let date = match cell {
        // date-typed cells decode to Excel serials; 8-digit ddmmyyyy numbers never fall in this range
        Cell::Number(n) if (1.0..100000.0).contains(n) => excel_serial_to_date(*n),
        // 15032024 read as a number loses nothing; 05032024 loses its leading zero
        Cell::Number(n) if n.is_finite() && *n >= 0.0 && n.fract() == 0.0 => {
            parse_note_date(&format!("{:08}", *n as u64))
        }
        other => parse_note_date(&other.to_string()),
    };
    date.map(Some).ok_or_else(|| NoteError::Metadata {
        field: "trading date",
        value: cell.to_string(),
    })
}

/// Excel serial date using the 1899-12-30 base (covers the 1900 leap year bug).
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn parse_note_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%d%m%Y", "%d/%m/%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Net settlement in currency units, without sign.
///
/// The cell is stated in minor units and may carry text around the number
/// ("R$ 1.051.000 D"), which is stripped before parsing.
pub fn extract_net_total(table: &RawTable, at: Option<Coord>, scale: f64) -> Result<f64> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(NoteError::Metadata {
            field: "net total scale",
            value: scale.to_string(),
        });
    }
    let Some((row, col)) = at else {
        return Ok(0.0);
    };
    let cell = table.get(row, col);
    let total = match cell {
        Cell::Number(n) if n.is_finite() => *n,
        Cell::Text(s) => {
            let cleaned = NON_NUMERIC.replace_all(s, "");
            if cleaned.is_empty() {
                0.0
            } else {
                parse_locale_decimal(&cleaned).ok_or_else(|| NoteError::Metadata {
                    field: "net total",
                    value: s.clone(),
                })?
            }
        }
        Cell::Number(_) | Cell::Missing => 0.0,
    };
    Ok(total.abs() / scale)
}
