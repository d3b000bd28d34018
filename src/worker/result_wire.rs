//! Result-cache wire format (spec §6.3, §9). Abbreviated keys
//! (`top`/`to`/`d`/`tcp`/`p`/`hp`/`tc` per trade, `st`/`tt`/`ahp`/`snp` per
//! day) are part of the external contract and must be preserved bit for
//! bit — the reaper's `'net_profit' in result` filter depends on the
//! top-level `net_profit` key this module emits.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::results::{BacktestResult, DayResult};
use crate::domain::trade::{Direction, Trade};

/// The envelope written to `<runtime>-task-meta-<uuid>` (spec §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub status: String,
    pub task_id: String,
    pub result: Value,
}

fn direction_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Long => "long",
        Direction::Short => "short",
    }
}

fn trade_to_wire(trade: &Trade) -> Value {
    json!({
        "top": trade.open_price,
        "to": trade.open_ts,
        "d": direction_str(trade.direction),
        "tcp": trade.close_price,
        "p": trade.profit,
        "hp": trade.holding_period,
        "tc": trade.close_ts,
    })
}

fn day_to_wire(day: &DayResult) -> Value {
    let mut map = Map::new();
    for (i, trade) in day.trades.iter().enumerate() {
        map.insert((i + 1).to_string(), trade_to_wire(trade));
    }
    map.insert("st".to_string(), json!(day.stops_triggered));
    map.insert("tt".to_string(), json!(day.trades_triggered));
    map.insert("ahp".to_string(), json!(day.average_holding_period));
    map.insert("snp".to_string(), json!(day.net_profit));
    Value::Object(map)
}

/// Encode a [`BacktestResult`] into the `result` field body the reaper
/// expects: a top-level `net_profit` (spec §4.6 step 3) alongside
/// aggregated `stops_triggered`/`trades_triggered` and the per-day
/// `trade_stats` abbreviated map.
pub fn result_to_wire(result: &BacktestResult) -> Value {
    let trade_stats: Map<String, Value> = result
        .by_day
        .iter()
        .map(|(date, day)| (date.clone(), day_to_wire(day)))
        .collect();

    let stops_triggered: i64 = result.by_day.values().map(|d| i64::from(d.stops_triggered)).sum();
    let trades_triggered: i64 = result.by_day.values().map(|d| i64::from(d.trades_triggered)).sum();

    json!({
        "backtest_id": result.backtest_id,
        "stop_distance": result.params.stop_distance,
        "stop_count_limit": result.params.stop_count_limit,
        "stop_cooloff_period": result.params.stop_cooloff_period,
        "limit_distance": result.params.limit_distance,
        "stops_triggered": stops_triggered,
        "trades_triggered": trades_triggered,
        "net_profit": result.backtest_profit,
        "average_holding_period": result.average_holding_period,
        "win_rate_percent": result.win_rate_percent,
        "trade_stats": Value::Object(trade_stats),
    })
}

/// Wrap an encoded result into the full success envelope (spec §6.3).
pub fn success_envelope(task_id: &str, result: &BacktestResult) -> ResultEnvelope {
    ResultEnvelope {
        status: "SUCCESS".to_string(),
        task_id: task_id.to_string(),
        result: result_to_wire(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::StrategyParams;
    use std::collections::BTreeMap;

    fn sample_result() -> BacktestResult {
        let trade = Trade::close(100.0, 0, Direction::Long, 105.0, 60);
        let mut by_day = BTreeMap::new();
        by_day.insert("2023-04-24".to_string(), DayResult::from_trades(vec![trade], 0));

        BacktestResult {
            backtest_id: "aB3k9".to_string(),
            params: StrategyParams {
                stop_distance: 0.25,
                stop_count_limit: 4,
                stop_cooloff_period: 30,
                limit_distance: 5.0,
            },
            by_day,
            backtest_profit: 5.0,
            average_holding_period: 60.0,
            win_rate_percent: 100,
        }
    }

    #[test]
    fn top_level_net_profit_key_is_present() {
        let wire = result_to_wire(&sample_result());
        assert!(wire.get("net_profit").is_some());
        assert_eq!(wire["net_profit"], 5.0);
    }

    #[test]
    fn trade_stats_uses_abbreviated_keys() {
        let wire = result_to_wire(&sample_result());
        let day = &wire["trade_stats"]["2023-04-24"];
        assert_eq!(day["1"]["top"], 100.0);
        assert_eq!(day["1"]["tcp"], 105.0);
        assert_eq!(day["1"]["p"], 5.0);
        assert_eq!(day["1"]["d"], "long");
        assert_eq!(day["st"], 0);
        assert_eq!(day["snp"], 5.0);
    }
}
