use models::{GroupedRecord, ParseResult};

const COLUMNS: [&str; 7] = [
    "instrument_code",
    "side",
    "quantity",
    "weighted_price",
    "trade_value",
    "cost_share",
    "value_with_cost",
];

/// Text table of grouped trades. Money is rounded to cents for display only.
pub fn render_trades(trades: &[GroupedRecord]) -> String {
    let rows: Vec<[String; 7]> = trades
        .iter()
        .map(|t| {
            [
                t.instrument_code.clone(),
                t.side.to_string(),
                t.quantity.to_string(),
                format!("{:.2}", t.weighted_price),
                format!("{:.2}", t.trade_value),
                format!("{:.2}", t.cost_share),
                format!("{:.2}", t.value_with_cost),
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = COLUMNS
        .iter()
        .zip(widths)
        .map(|(name, w)| format!("{:>w$}", name, w = w))
        .collect();
    out.push_str(&header.join(" "));
    out.push('\n');

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                // text columns left, numbers right
                if i < 2 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect();
        out.push_str(line.join(" ").trim_end());
        out.push('\n');
    }

    out
}

/// Full console report: trading date, grouped trades, net total.
pub fn render_report(result: &ParseResult) -> String {
    let date = result
        .metadata
        .trading_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "Data {}\n{}Total: R$ {:.2}\n",
        date,
        render_trades(&result.trades),
        result.metadata.net_settlement_total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use models::{NoteMetadata, Side};

    fn record() -> GroupedRecord {
        GroupedRecord {
            trade_id: "INTER-abc".to_string(),
            instrument_code: "VALE3".to_string(),
            side: Side::Buy,
            quantity: 150,
            trade_value: 10500.0,
            weighted_price: 70.0,
            proportion: 1.0,
            cost_share: 10.004,
            value_with_cost: 10510.004,
        }
    }

    #[test]
    fn test_trades_table_rounds_money() {
        let text = render_trades(&[record()]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].trim_start().starts_with("instrument_code"));
        assert!(lines[0].ends_with("value_with_cost"));
        let cells: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(
            cells,
            vec!["VALE3", "BUY", "150", "70.00", "10500.00", "10.00", "10510.00"]
        );
    }

    #[test]
    fn test_report_has_date_and_total() {
        let result = ParseResult {
            trades: vec![record()],
            metadata: NoteMetadata {
                note_number: 1,
                trading_date: NaiveDate::from_ymd_opt(2024, 3, 15),
                net_settlement_total: 10510.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let text = render_report(&result);

        assert!(text.starts_with("Data 15/03/2024\n"));
        assert!(text.ends_with("Total: R$ 10510.00\n"));
    }

    #[test]
    fn test_report_without_date() {
        let text = render_report(&ParseResult::default());
        assert!(text.starts_with("Data -\n"));
    }
}
