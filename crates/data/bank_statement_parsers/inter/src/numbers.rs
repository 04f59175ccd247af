//! Brazilian number formatting: "1.234,56" means 1234.56.

use crate::table::Cell;

/// Drops dot grouping separators and turns the decimal comma into a point.
pub fn normalize_locale(raw: &str) -> String {
    raw.trim().replace('.', "").replace(',', ".")
}

pub fn parse_locale_decimal(raw: &str) -> Option<f64> {
    let normalized = normalize_locale(raw);
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric cells are taken as decoded; only text goes through locale normalization.
pub fn cell_decimal(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Number(_) => None,
        Cell::Text(s) => parse_locale_decimal(s),
        Cell::Missing => None,
    }
}

/// Whether a cell looks like a count: digits with optional dot grouping, or a
/// whole non-negative number. Says nothing about whether it fits a `u64`.
pub fn is_count(cell: &Cell) -> bool {
    match cell {
        Cell::Number(n) => n.is_finite() && *n >= 0.0 && n.fract() == 0.0,
        Cell::Text(s) => {
            let digits = s.trim().replace('.', "");
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        Cell::Missing => false,
    }
}

/// Whole, non-negative count from a quantity-like cell ("1.500" or 1500.0).
pub fn cell_count(cell: &Cell) -> Option<u64> {
    if !is_count(cell) {
        return None;
    }
    match cell {
        // 2^64 and above do not fit
        Cell::Number(n) if *n < 18_446_744_073_709_551_616.0 => Some(*n as u64),
        Cell::Number(_) => None,
        Cell::Text(s) => s.trim().replace('.', "").parse::<u64>().ok(),
        Cell::Missing => None,
    }
}
