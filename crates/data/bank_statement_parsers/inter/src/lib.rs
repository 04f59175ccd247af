//! Parser for Inter brokerage settlement notes ("notas de corretagem").
//!
//! The note is a single sheet with no fixed schema: line items, summary
//! blocks and metadata sit wherever the back office placed them and are
//! found by marker strings. Parsing runs in three steps:
//!
//! 1. [`locator::locate`] finds the regions,
//! 2. [`extractor`] reads line items, summaries and metadata,
//! 3. [`allocation`] groups trades per instrument and side and spreads the
//!    note costs across them.

pub mod allocation;
pub mod error;
pub mod extractor;
pub mod locator;
pub mod numbers;
pub mod render;
pub mod table;
pub mod workbook;

use std::path::Path;

use chrono::NaiveDate;
use models::{NoteLayout, NoteMetadata, ParseResult, Side};
use sha2::{Digest, Sha256};

pub use crate::error::{NoteError, Result};
pub use crate::locator::RegionMap;
pub use crate::table::{Cell, RawTable};

pub struct InterNoteParser {
    pub layout: NoteLayout,
}

impl InterNoteParser {
    pub fn new() -> Self {
        Self {
            layout: NoteLayout::default(),
        }
    }

    pub fn with_layout(layout: NoteLayout) -> Self {
        Self { layout }
    }

    /// Decodes the configured sheet and parses it.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<ParseResult> {
        let table = workbook::load_table(&path, &self.layout.sheet_name)?;
        let result = self.parse_table(&table)?;
        Ok(result)
    }

    /// Runs the whole pipeline over an already decoded sheet.
    pub fn parse_table(&self, table: &RawTable) -> Result<ParseResult> {
        let layout = &self.layout;
        let regions = locator::locate(table, layout)?;

        let trades = extractor::extract_trades(table, regions.header_row(), layout)?;

        let summary = regions
            .last_business_summary()
            .map(|at| extractor::extract_summary_block(table, at, layout.summary_block_rows))
            .unwrap_or_default();

        let metadata = NoteMetadata {
            note_number: extractor::extract_note_number(table, regions.note_number)?,
            trading_date: extractor::extract_trading_date(table, regions.trading_date)?,
            net_settlement_total: extractor::extract_net_total(
                table,
                regions.net_total,
                layout.net_total_scale,
            )?,
            summary_figures: regions
                .last_financial_summary()
                .map(|at| extractor::extract_summary_block(table, at, layout.summary_block_rows))
                .unwrap_or_default(),
        };

        let allocation::Allocation {
            mut groups,
            aggregate_cost,
        } = allocation::aggregate_and_allocate(&trades, metadata.net_settlement_total);

        for group in &mut groups {
            group.trade_id = make_trade_id(
                metadata.note_number,
                metadata.trading_date,
                &group.instrument_code,
                group.side,
            );
        }

        tracing::info!(
            note = metadata.note_number,
            line_items = trades.len(),
            groups = groups.len(),
            aggregate_cost,
            "parsed settlement note"
        );

        Ok(ParseResult {
            trades: groups,
            metadata,
            summary,
            aggregate_cost,
        })
    }
}

impl Default for InterNoteParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable id for one (note, instrument, side) group.
fn make_trade_id(
    note_number: u64,
    trading_date: Option<NaiveDate>,
    instrument_code: &str,
    side: Side,
) -> String {
    let key = format!(
        "{}|{}|{}|{}",
        note_number,
        trading_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        instrument_code,
        side
    );

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let hash = hasher.finalize();

    format!("INTER-{}", hex::encode(&hash[..12]))
}
