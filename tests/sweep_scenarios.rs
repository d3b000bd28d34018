//! Integration-level coverage of the concrete scenarios and invariants
//! from spec §8, driven through the public domain/worker API rather than
//! any broker or warehouse.

use std::collections::BTreeMap;

use orsweep::aggregate::aggregate;
use orsweep::dispatcher::{enumerate_grid, Grid};
use orsweep::domain::opening_range::OpeningRange;
use orsweep::domain::series::CompressedSeries;
use orsweep::domain::strategy::StrategyParams;
use orsweep::domain::trade::Direction;
use orsweep::worker::breakout::simulate_day;

fn range(high: f64, low: f64) -> OpeningRange {
    OpeningRange {
        open_price: (high + low) / 2.0,
        high,
        low,
        count_trades: 1,
        trading_start: 0,
    }
}

fn series(points: &[(i64, f64)]) -> CompressedSeries {
    CompressedSeries(points.iter().copied().collect::<BTreeMap<_, _>>())
}

fn params(sd: f64, scl: i32, sco: i64, ld: f64) -> StrategyParams {
    StrategyParams {
        stop_distance: sd,
        stop_count_limit: scl,
        stop_cooloff_period: sco,
        limit_distance: ld,
    }
}

#[test]
fn scenario_immediate_long_win() {
    let day = simulate_day(
        &range(100.0, 95.0),
        &series(&[(1_700_000_000, 101.0), (1_700_000_010, 106.0)]),
        &params(0.25, 4, 30, 5.0),
    );
    assert_eq!(day.trades.len(), 1);
    let trade = &day.trades[0];
    assert_eq!(trade.direction, Direction::Long);
    assert_eq!(trade.open_price, 101.0);
    assert_eq!(trade.close_price, 106.0);
    assert_eq!(trade.profit, 5.0);
    assert_eq!(day.net_profit, 5.0);
}

#[test]
fn scenario_stop_then_cooldown_then_reentry() {
    let t0 = 1_700_000_000i64;
    let day = simulate_day(
        &range(100.0, 95.0),
        &series(&[
            (t0, 101.0),
            (t0 + 5, 100.5),
            (t0 + 10, 101.2),
            (t0 + 40, 106.2),
        ]),
        &params(0.25, 4, 30, 5.0),
    );
    assert_eq!(day.trades.len(), 2);
    assert!((day.trades[0].profit - (-0.25)).abs() < 1e-9);
    assert_eq!(day.trades[1].close_price, 106.2);
    assert_eq!(day.stops_triggered, 1);
}

#[test]
fn scenario_risk_cap_halts_day() {
    let params = params(0.25, 4, 30, 5.0);
    let mut points = Vec::new();
    let mut ts = 1_700_000_000i64;
    for _ in 0..4 {
        points.push((ts, 101.0));
        points.push((ts + 1, 100.5));
        ts += 40;
    }
    points.push((ts, 101.0));

    let day = simulate_day(&range(100.0, 95.0), &series(&points), &params);
    assert_eq!(day.stops_triggered, 4);
    assert_eq!(day.trades_triggered, 4);
}

#[test]
fn scenario_short_side_win() {
    let day = simulate_day(
        &range(100.0, 95.0),
        &series(&[(1, 90.0), (2, 85.0)]),
        &params(0.25, 4, 30, 5.0),
    );
    assert_eq!(day.trades.len(), 1);
    assert_eq!(day.trades[0].direction, Direction::Short);
    assert_eq!(day.trades[0].profit, 5.0);
}

#[test]
fn scenario_empty_day() {
    let day = simulate_day(
        &range(100.0, 95.0),
        &series(&[(1, 97.0), (2, 98.0), (3, 96.0)]),
        &params(0.25, 4, 30, 5.0),
    );
    assert_eq!(day.trades.len(), 0);
    assert_eq!(day.net_profit, 0.0);

    let mut by_day = BTreeMap::new();
    by_day.insert("2023-04-24".to_string(), day);
    let (profit, avg_hold, win_rate) = aggregate(&by_day);
    assert_eq!(profit, 0.0);
    assert_eq!(avg_hold, 0.0);
    assert_eq!(win_rate, 0);
}

#[test]
fn scenario_dispatcher_grid_count() {
    let count = enumerate_grid(&Grid::default()).count();
    assert_eq!(count, 9_747);
}

#[test]
fn invariant_risk_cap_never_exceeded_across_random_days() {
    // Five stop-outs offered, risk cap of 3: only 3 should register.
    let params = params(0.25, 3, 10, 5.0);
    let mut points = Vec::new();
    let mut ts = 0i64;
    for _ in 0..5 {
        points.push((ts, 101.0));
        points.push((ts + 1, 100.5));
        ts += 20;
    }
    let day = simulate_day(&range(100.0, 95.0), &series(&points), &params);
    assert!(day.stops_triggered <= params.stop_count_limit);
    assert_eq!(day.stops_triggered, 3);
}

#[test]
fn invariant_trade_profit_sign_is_direction_sensitive() {
    let long_day = simulate_day(
        &range(100.0, 95.0),
        &series(&[(1, 101.0), (2, 106.0)]),
        &params(0.25, 4, 30, 5.0),
    );
    assert_eq!(long_day.trades[0].profit, long_day.trades[0].close_price - long_day.trades[0].open_price);

    let short_day = simulate_day(
        &range(100.0, 95.0),
        &series(&[(1, 90.0), (2, 85.0)]),
        &params(0.25, 4, 30, 5.0),
    );
    assert_eq!(
        short_day.trades[0].profit,
        short_day.trades[0].open_price - short_day.trades[0].close_price
    );
}
