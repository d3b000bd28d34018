//! Cross-day aggregation for a single sweep point (spec §4.7).

use std::collections::BTreeMap;

use crate::domain::DayResult;

/// Fold a sweep point's per-day results into the three headline figures
/// (spec §3: `backtest_profit`, `average_holding_period`,
/// `win_rate_percent`). Every day counts equally regardless of its trade
/// count: `average_holding_period` is the mean of each day's own average,
/// and `win_rate_percent` is the fraction of days with positive net
/// profit, not the fraction of winning trades (spec §4.5, §4.7). Empty
/// input yields zeros, never a division panic (spec §7, "Empty
/// aggregates").
pub fn aggregate(by_day: &BTreeMap<String, DayResult>) -> (f64, f64, i64) {
    let days: Vec<&DayResult> = by_day.values().collect();

    if days.is_empty() {
        return (0.0, 0.0, 0);
    }

    let backtest_profit: f64 = days.iter().map(|d| d.net_profit).sum();
    let backtest_profit = (backtest_profit * 100.0).round() / 100.0;

    let average_holding_period =
        days.iter().map(|d| d.average_holding_period).sum::<f64>() / days.len() as f64;

    let winning_days = days.iter().filter(|d| d.net_profit > 0.0).count();
    let win_rate_percent = ((winning_days as f64 / days.len() as f64) * 100.0).round() as i64;

    (backtest_profit, average_holding_period, win_rate_percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{Direction, Trade};

    fn trade(profit: f64, holding_period: i64) -> Trade {
        Trade {
            open_price: 100.0,
            open_ts: 0,
            close_price: 100.0 + profit,
            close_ts: holding_period,
            direction: Direction::Long,
            profit,
            holding_period,
        }
    }

    #[test]
    fn empty_by_day_yields_zeros() {
        let by_day = BTreeMap::new();
        assert_eq!(aggregate(&by_day), (0.0, 0.0, 0));
    }

    #[test]
    fn aggregates_by_day_not_by_trade() {
        // Day A: two trades, net +1 (a winning day), day-average hp = 80.
        // Day B: one trade, net -5 (a losing day), day-average hp = 60.
        // Flattened across trades this would read 2 wins of 3 -> 67%, but
        // day-level aggregation must read 1 winning day of 2 -> 50%.
        let mut by_day = BTreeMap::new();
        by_day.insert(
            "2023-04-24".to_string(),
            DayResult::from_trades(vec![trade(10.0, 100), trade(-9.0, 60)], 1),
        );
        by_day.insert(
            "2023-04-25".to_string(),
            DayResult::from_trades(vec![trade(-5.0, 60)], 0),
        );

        let (profit, avg_hold, win_rate) = aggregate(&by_day);
        assert_eq!(profit, -4.0);
        // mean of means: (80 + 60) / 2, not the flat mean over 3 trades.
        assert_eq!(avg_hold, 70.0);
        assert_eq!(win_rate, 50);
    }

    #[test]
    fn backtest_profit_is_rounded_to_two_decimals() {
        let mut by_day = BTreeMap::new();
        by_day.insert(
            "2023-04-24".to_string(),
            DayResult::from_trades(vec![trade(1.005, 60), trade(1.0051, 60)], 0),
        );
        let (profit, _, _) = aggregate(&by_day);
        assert_eq!(profit, 2.01);
    }
}
