use models::NoteLayout;

use crate::error::{NoteError, Result};
use crate::table::RawTable;

/// (row, col), 0-based.
pub type Coord = (usize, usize);

/// Where each region of a note was found. Nothing outside this module
/// hard-codes sheet coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMap {
    /// Cell holding the line-item header marker.
    pub header: Coord,
    /// Every business summary marker in row order. The last one is authoritative.
    pub business_summaries: Vec<Coord>,
    pub financial_summaries: Vec<Coord>,
    /// Value cells (right of the marker) for the scalar metadata.
    pub note_number: Option<Coord>,
    pub trading_date: Option<Coord>,
    pub net_total: Option<Coord>,
}

impl RegionMap {
    pub fn header_row(&self) -> usize {
        self.header.0
    }

    pub fn last_business_summary(&self) -> Option<Coord> {
        self.business_summaries.last().copied()
    }

    pub fn last_financial_summary(&self) -> Option<Coord> {
        self.financial_summaries.last().copied()
    }
}

pub fn locate(table: &RawTable, layout: &NoteLayout) -> Result<RegionMap> {
    let header = find_first(table, &layout.header_marker).ok_or_else(|| {
        NoteError::Structural(format!("header marker {:?} not found", layout.header_marker))
    })?;

    let regions = RegionMap {
        header,
        business_summaries: find_all(table, &layout.business_summary_marker),
        financial_summaries: find_all(table, &layout.financial_summary_marker),
        note_number: find_value_right_of(table, &layout.note_number_marker),
        trading_date: find_value_right_of(table, &layout.trading_date_marker),
        net_total: find_value_right_of(table, &layout.net_total_marker),
    };

    tracing::debug!(
        header_row = regions.header.0,
        business_summaries = regions.business_summaries.len(),
        financial_summaries = regions.financial_summaries.len(),
        "located note regions"
    );

    Ok(regions)
}

fn find_first(table: &RawTable, marker: &str) -> Option<Coord> {
    table.rows().enumerate().find_map(|(r, row)| {
        row.iter()
            .position(|cell| cell.contains_marker(marker))
            .map(|c| (r, c))
    })
}

/// One hit per row: the leftmost matching cell.
fn find_all(table: &RawTable, marker: &str) -> Vec<Coord> {
    table
        .rows()
        .enumerate()
        .filter_map(|(r, row)| {
            row.iter()
                .position(|cell| cell.contains_marker(marker))
                .map(|c| (r, c))
        })
        .collect()
}

/// First marker cell, in row-scan order, whose right neighbour holds a value.
fn find_value_right_of(table: &RawTable, marker: &str) -> Option<Coord> {
    for (r, row) in table.rows().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if cell.contains_marker(marker) && !table.get(r, c + 1).is_blank() {
                return Some((r, c + 1));
            }
        }
    }
    None
}
