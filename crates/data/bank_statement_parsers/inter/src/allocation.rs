use std::collections::HashMap;

use models::{GroupedRecord, Side, TradeRecord};

/// Grouped trades together with the note-level cost spread across them.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub groups: Vec<GroupedRecord>,
    /// Fees, taxes and adjustments not explained by the trade values.
    pub aggregate_cost: f64,
}

struct Accumulator {
    instrument_code: String,
    side: Side,
    quantity: u64,
    trade_value: f64,
}

/// Forward-settlement trades ("PETR4F") fold into their spot instrument.
pub fn normalize_instrument(code: &str) -> &str {
    code.strip_suffix('F').unwrap_or(code)
}

/// Groups trades by (instrument, side) in order of first appearance.
pub fn group_trades(trades: &[TradeRecord]) -> Vec<GroupedRecord> {
    let mut index: HashMap<(String, Side), usize> = HashMap::new();
    let mut groups: Vec<Accumulator> = Vec::new();

    for trade in trades {
        let code = normalize_instrument(&trade.instrument_code).to_string();
        let slot = *index.entry((code.clone(), trade.side)).or_insert_with(|| {
            groups.push(Accumulator {
                instrument_code: code,
                side: trade.side,
                quantity: 0,
                trade_value: 0.0,
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.quantity = group.quantity.saturating_add(trade.quantity);
        group.trade_value += trade.trade_value;
    }

    groups
        .into_iter()
        .map(|g| GroupedRecord {
            trade_id: String::new(),
            weighted_price: if g.quantity > 0 {
                g.trade_value / g.quantity as f64
            } else {
                0.0
            },
            instrument_code: g.instrument_code,
            side: g.side,
            quantity: g.quantity,
            trade_value: g.trade_value,
            proportion: 0.0,
            cost_share: 0.0,
            value_with_cost: g.trade_value,
        })
        .collect()
}

/// Spreads the note cost over the groups by share of absolute traded value.
///
/// The cost is what the net settlement does not explain once sells are
/// netted against buys: `|net_total - |Σ buys - Σ sells||`. Returns it.
pub fn allocate_costs(groups: &mut [GroupedRecord], net_settlement_total: f64) -> f64 {
    let abs_total: f64 = groups.iter().map(|g| g.trade_value.abs()).sum();
    let signed_total: f64 = groups
        .iter()
        .map(|g| match g.side {
            Side::Sell => -g.trade_value,
            Side::Buy => g.trade_value,
        })
        .sum();
    let aggregate_cost = (net_settlement_total - signed_total.abs()).abs();

    if abs_total == 0.0 && aggregate_cost != 0.0 && !groups.is_empty() {
        tracing::warn!(
            aggregate_cost,
            groups = groups.len(),
            "trades have no value, cost of {:.2} left unallocated",
            aggregate_cost
        );
    }

    for group in groups.iter_mut() {
        group.proportion = if abs_total != 0.0 {
            group.trade_value.abs() / abs_total
        } else {
            0.0
        };
        group.cost_share = (aggregate_cost * group.proportion).abs();
        group.value_with_cost = group.trade_value + group.cost_share;
    }

    aggregate_cost
}

pub fn aggregate_and_allocate(trades: &[TradeRecord], net_settlement_total: f64) -> Allocation {
    let mut groups = group_trades(trades);
    let aggregate_cost = allocate_costs(&mut groups, net_settlement_total);
    Allocation {
        groups,
        aggregate_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(code: &str, side: Side, quantity: u64, value: f64) -> TradeRecord {
        TradeRecord {
            instrument_code: code.to_string(),
            quantity,
            unit_price: value / quantity as f64,
            trade_value: value,
            side,
            note: String::new(),
            row: 0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_forward_trades_merge_with_spot() {
        let trades = vec![
            trade("PETR4", Side::Buy, 100, 3800.0),
            trade("PETR4F", Side::Buy, 5, 190.0),
            trade("PETR4", Side::Sell, 50, 1950.0),
        ];

        let groups = group_trades(&trades);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].instrument_code, "PETR4");
        assert_eq!(groups[0].side, Side::Buy);
        assert_eq!(groups[0].quantity, 105);
        assert!(close(groups[0].trade_value, 3990.0));
        assert!(close(groups[0].weighted_price, 38.0));
        assert_eq!(groups[1].side, Side::Sell);
        assert_eq!(groups[1].quantity, 50);
    }

    #[test]
    fn test_only_one_trailing_f_is_stripped() {
        assert_eq!(normalize_instrument("ABCFF"), "ABCF");
        assert_eq!(normalize_instrument("VALE3"), "VALE3");
    }

    #[test]
    fn test_group_order_follows_first_appearance() {
        let trades = vec![
            trade("WEGE3", Side::Buy, 1, 40.0),
            trade("ABEV3", Side::Buy, 1, 12.0),
            trade("WEGE3F", Side::Buy, 1, 40.0),
        ];

        let codes: Vec<_> = group_trades(&trades)
            .into_iter()
            .map(|g| g.instrument_code)
            .collect();
        assert_eq!(codes, vec!["WEGE3", "ABEV3"]);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let trades = vec![
            trade("VALE3", Side::Buy, u64::MAX, 1.0),
            trade("VALE3F", Side::Buy, 10, 1.0),
        ];

        let groups = group_trades(&trades);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].quantity, u64::MAX);
    }

    #[test]
    fn test_single_group_takes_whole_cost() {
        let trades = vec![
            trade("VALE3", Side::Buy, 100, 7000.0),
            trade("VALE3", Side::Buy, 50, 3500.0),
        ];

        let allocation = aggregate_and_allocate(&trades, 10510.0);

        assert!(close(allocation.aggregate_cost, 10.0));
        let group = &allocation.groups[0];
        assert_eq!(group.quantity, 150);
        assert!(close(group.weighted_price, 70.0));
        assert!(close(group.proportion, 1.0));
        assert!(close(group.cost_share, 10.0));
        assert!(close(group.value_with_cost, 10510.0));
    }

    #[test]
    fn test_cost_split_by_absolute_value() {
        // buys 3000, sells 1000: net flow 2000, note charges 2008
        let trades = vec![
            trade("ITUB4", Side::Buy, 100, 3000.0),
            trade("BBDC4", Side::Sell, 50, 1000.0),
        ];

        let allocation = aggregate_and_allocate(&trades, 2008.0);

        assert!(close(allocation.aggregate_cost, 8.0));
        assert!(close(allocation.groups[0].proportion, 0.75));
        assert!(close(allocation.groups[0].cost_share, 6.0));
        assert!(close(allocation.groups[1].cost_share, 2.0));
        assert!(close(allocation.groups[1].value_with_cost, 1002.0));
    }

    #[test]
    fn test_conservation_and_non_negativity() {
        let trades = vec![
            trade("ITUB4", Side::Buy, 100, 3000.0),
            trade("BBDC4", Side::Sell, 50, 1000.0),
            trade("MGLU3", Side::Sell, 10, -25.0),
            trade("PETR4F", Side::Buy, 7, 266.0),
        ];

        for net in [0.0, 100.0, 2241.0, 2500.0, 99999.0] {
            let allocation = aggregate_and_allocate(&trades, net);
            let traded: f64 = allocation.groups.iter().map(|g| g.trade_value).sum();
            let with_cost: f64 = allocation.groups.iter().map(|g| g.value_with_cost).sum();

            assert!(allocation.groups.iter().all(|g| g.cost_share >= 0.0));
            assert!((with_cost - (traded + allocation.aggregate_cost)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_no_trades_yields_no_groups() {
        let allocation = aggregate_and_allocate(&[], 150.0);

        assert!(allocation.groups.is_empty());
        assert!(close(allocation.aggregate_cost, 150.0));
    }

    #[test]
    fn test_zero_value_trades_get_no_cost() {
        let trades = vec![trade("VALE3", Side::Buy, 10, 0.0)];

        let allocation = aggregate_and_allocate(&trades, 12.0);

        assert!(close(allocation.aggregate_cost, 12.0));
        assert_eq!(allocation.groups[0].proportion, 0.0);
        assert_eq!(allocation.groups[0].cost_share, 0.0);
        assert_eq!(allocation.groups[0].value_with_cost, 0.0);
    }
}
