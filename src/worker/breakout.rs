//! The breakout state machine (spec §4.5): the algorithmic core of the
//! backtest worker. Pure CPU, no I/O — runs once per `(sweep point, date)`.

use crate::domain::opening_range::OpeningRange;
use crate::domain::series::CompressedSeries;
use crate::domain::strategy::StrategyParams;
use crate::domain::trade::{Direction, Trade};
use crate::domain::results::DayResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    None,
    Long,
    Short,
}

struct State {
    side: Side,
    open_price: f64,
    open_ts: i64,
    stop_price: f64,
    limit_price: f64,
    stops_triggered: i32,
    stop_cooloff_until: i64,
    trades: Vec<Trade>,
}

impl State {
    fn new() -> Self {
        Self {
            side: Side::None,
            open_price: 0.0,
            open_ts: 0,
            stop_price: 0.0,
            limit_price: 0.0,
            stops_triggered: 0,
            stop_cooloff_until: 0,
            trades: Vec::new(),
        }
    }
}

/// Simulate one trading day against a staged `OpeningRange` and
/// `CompressedSeries` (spec §4.5). Returns the day's [`DayResult`]; an
/// empty series yields an empty, zero-profit result (spec §7).
pub fn simulate_day(range: &OpeningRange, series: &CompressedSeries, params: &StrategyParams) -> DayResult {
    let Some(end_of_day_ts) = series.last_timestamp() else {
        return DayResult::from_trades(Vec::new(), 0);
    };

    let mut state = State::new();

    for (ts, price) in series.iter() {
        // 1. Risk cap.
        if state.stops_triggered == params.stop_count_limit {
            break;
        }

        // 2. Cooldown.
        if ts < state.stop_cooloff_until {
            continue;
        }

        match state.side {
            Side::None => {
                if price > range.high {
                    state.side = Side::Long;
                    state.open_price = price;
                    state.open_ts = ts;
                    state.stop_price = price - params.stop_distance;
                    state.limit_price = price + params.limit_distance;
                } else if price < range.low {
                    state.side = Side::Short;
                    state.open_price = price;
                    state.open_ts = ts;
                    state.stop_price = price + params.stop_distance;
                    state.limit_price = price - params.limit_distance;
                }
            }
            Side::Long => {
                // Tie-break: limit evaluated before stop.
                if price >= state.limit_price || ts == end_of_day_ts {
                    state.trades.push(Trade::close(
                        state.open_price,
                        state.open_ts,
                        Direction::Long,
                        price,
                        ts,
                    ));
                    break;
                } else if price <= state.stop_price {
                    state.trades.push(Trade::close(
                        state.open_price,
                        state.open_ts,
                        Direction::Long,
                        price,
                        ts,
                    ));
                    state.stops_triggered += 1;
                    state.stop_cooloff_until = ts + params.stop_cooloff_period;
                    state.side = Side::None;
                }
            }
            Side::Short => {
                if price <= state.limit_price || ts == end_of_day_ts {
                    state.trades.push(Trade::close(
                        state.open_price,
                        state.open_ts,
                        Direction::Short,
                        price,
                        ts,
                    ));
                    break;
                } else if price >= state.stop_price {
                    state.trades.push(Trade::close(
                        state.open_price,
                        state.open_ts,
                        Direction::Short,
                        price,
                        ts,
                    ));
                    state.stops_triggered += 1;
                    state.stop_cooloff_until = ts + params.stop_cooloff_period;
                    state.side = Side::None;
                }
            }
        }
    }

    DayResult::from_trades(state.trades, state.stops_triggered)
}
