use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// Settings models

/// Header labels of the line-item table, matched against the header row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnLabels {
	pub title: String,
	pub quantity: String,
	pub price: String,
	pub value: String,
	pub side: String,
	pub observation: String,
}

impl Default for ColumnLabels {
	fn default() -> Self {
		Self {
			title: "ESPECIFICAÇÃO DO TÍTULO".to_string(),
			quantity: "QUANTIDADE".to_string(),
			price: "PREÇO DE LIQUIDAÇÃO".to_string(),
			value: "COMPRA/VENDA".to_string(),
			side: "C/V".to_string(),
			observation: "OBS".to_string(),
		}
	}
}

/// Marker strings and scaling rules describing where things live in a note.
///
/// Every field has a default matching the Inter brokerage export, so a
/// settings file only needs to list what differs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoteLayout {
	pub sheet_name: String,
	pub header_marker: String,
	pub business_summary_marker: String,
	pub financial_summary_marker: String,
	pub note_number_marker: String,
	pub trading_date_marker: String,
	pub net_total_marker: String,
	pub columns: ColumnLabels,
	/// Rows read below a summary marker.
	pub summary_block_rows: usize,
	/// The net total cell is stated in minor units.
	pub net_total_scale: f64,
}

impl Default for NoteLayout {
	fn default() -> Self {
		Self {
			sheet_name: "Sheet1".to_string(),
			header_marker: "ESPECIFICAÇÃO DO TÍTULO".to_string(),
			business_summary_marker: "RESUMO DOS NEGÓCIOS".to_string(),
			financial_summary_marker: "RESUMO FINANCEIRO".to_string(),
			note_number_marker: "NUM NOTA".to_string(),
			trading_date_marker: "DATA PREGÃO".to_string(),
			net_total_marker: "LIQ.(A+B) P/".to_string(),
			columns: ColumnLabels::default(),
			summary_block_rows: 9,
			net_total_scale: 100.0,
		}
	}
}

// Trade models

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
	Buy,
	Sell,
}

impl Side {
	/// Reads the buy/sell indicator column ("C"/"V" on Brazilian notes).
	pub fn from_indicator(raw: &str) -> Option<Side> {
		match raw.trim().to_uppercase().as_str() {
			"C" | "COMPRA" | "B" | "BUY" => Some(Side::Buy),
			"V" | "VENDA" | "S" | "SELL" => Some(Side::Sell),
			_ => None,
		}
	}
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Side::Buy => write!(f, "BUY"),
			Side::Sell => write!(f, "SELL"),
		}
	}
}

/// One line item of the note, before grouping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
	pub instrument_code: String,
	pub quantity: u64,
	pub unit_price: f64,
	pub trade_value: f64,
	pub side: Side,
	pub note: String,
	/// 0-based row in the source sheet.
	pub row: usize,
}

/// Trades of one instrument on one side, with their share of the note costs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupedRecord {
	/// Empty until the note metadata is known.
	pub trade_id: String,
	pub instrument_code: String,
	pub side: Side,
	pub quantity: u64,
	pub trade_value: f64,
	pub weighted_price: f64,
	pub proportion: f64,
	pub cost_share: f64,
	pub value_with_cost: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NoteMetadata {
	pub note_number: u64,
	pub trading_date: Option<NaiveDate>,
	pub net_settlement_total: f64,
	pub summary_figures: BTreeMap<String, f64>,
}

// Output models
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParseResult {
	pub trades: Vec<GroupedRecord>,
	pub metadata: NoteMetadata,
	pub summary: BTreeMap<String, f64>,
	pub aggregate_cost: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_side_from_indicator() {
		assert_eq!(Side::from_indicator(" C "), Some(Side::Buy));
		assert_eq!(Side::from_indicator("v"), Some(Side::Sell));
		assert_eq!(Side::from_indicator("Venda"), Some(Side::Sell));
		assert_eq!(Side::from_indicator("D"), None);
		assert_eq!(Side::from_indicator(""), None);
	}

	#[test]
	fn test_layout_partial_settings_keep_defaults() {
		let layout: NoteLayout =
			serde_json::from_str(r#"{"sheet_name": "Nota", "columns": {"side": "D/C"}}"#).unwrap();

		assert_eq!(layout.sheet_name, "Nota");
		assert_eq!(layout.columns.side, "D/C");
		assert_eq!(layout.columns.quantity, "QUANTIDADE");
		assert_eq!(layout.summary_block_rows, 9);
		assert_eq!(layout.net_total_scale, 100.0);
	}

	#[test]
	fn test_side_serializes_uppercase() {
		assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"SELL\"");
		assert_eq!(Side::Buy.to_string(), "BUY");
	}
}
