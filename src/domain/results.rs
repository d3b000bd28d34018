use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::strategy::StrategyParams;
use super::trade::Trade;

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const ID_LEN: usize = 5;

/// Generate a fresh 5-character alphanumeric `backtest_id` (spec §3,
/// ~9·10⁸ space). Collisions are tolerated by the durable store's
/// insert-ignore semantics on its unique key, so no uniqueness check is
/// performed here.
pub fn generate_backtest_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ID_ALPHABET.len());
            ID_ALPHABET[idx] as char
        })
        .collect()
}

/// Per-day simulation output (spec §3). Invariant: `trades_triggered ==
/// trades.len()`; `stops_triggered <= params.stop_count_limit` for the
/// sweep point this day belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayResult {
    pub trades: Vec<Trade>,
    pub stops_triggered: i32,
    pub trades_triggered: i32,
    pub average_holding_period: f64,
    pub net_profit: f64,
}

impl DayResult {
    /// Build from the trades accumulated by the breakout state machine for
    /// one day (spec §4.5). Tolerates the empty-day case without
    /// division-by-zero (spec §7, "Empty aggregates").
    pub fn from_trades(trades: Vec<Trade>, stops_triggered: i32) -> Self {
        let trades_triggered = trades.len() as i32;
        let net_profit: f64 = trades.iter().map(|t| t.profit).sum();
        let average_holding_period = if trades.is_empty() {
            0.0
        } else {
            trades.iter().map(|t| t.holding_period as f64).sum::<f64>() / trades.len() as f64
        };

        Self {
            trades,
            stops_triggered,
            trades_triggered,
            average_holding_period,
            net_profit,
        }
    }
}

/// The full result of one sweep point, across every staged trading day
/// (spec §3). `backtest_id` is a freshly generated 5-character alphanumeric
/// identifier; collisions are tolerated by the durable store's
/// insert-ignore semantics on its unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub backtest_id: String,
    pub params: StrategyParams,
    pub by_day: BTreeMap<String, DayResult>,
    pub backtest_profit: f64,
    pub average_holding_period: f64,
    pub win_rate_percent: i64,
}
