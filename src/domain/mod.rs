//! Core data model (spec §3): ticks, compressed series, opening ranges,
//! strategy parameters, trades, and per-sweep results.

pub mod opening_range;
pub mod results;
pub mod series;
pub mod strategy;
pub mod tick;
pub mod trade;

pub use opening_range::OpeningRange;
pub use results::{generate_backtest_id, BacktestResult, DayResult};
pub use series::CompressedSeries;
pub use strategy::StrategyParams;
pub use tick::Tick;
pub use trade::{Direction, Trade};
